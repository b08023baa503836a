//! Production-record importer from the `SLJobRoutes` IDO (Type `J`).
//!
//! Records planned per-piece times from the norms next to actuals computed
//! from whole-batch totals divided by the released quantity, plus a planned
//! and an actual manning coefficient:
//!
//!   JshSetupHrs               → planned_setup_min = hours * 60
//!   DerRunMchHrs (pcs/hour)   → planned_time_min = 60 / value
//!   DerRunMchHrs/DerRunLbrHrs → manning_coefficient = ratio * 100
//!   SetupHrsT                 → actual_setup_min = hours * 60
//!   RunHrsTMch, RunHrsTLbr    → actual batch totals in minutes
//!   RunHrsT* / JobQtyReleased → actual per-piece minutes
//!   RunHrsTLbr/RunHrsTMch     → actual_manning_coefficient = ratio * 100
//!
//! Skip and cooperation rules match the routing importer.

use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::job_routing_importer::round_to;
use super::kernel::{
    self, EntityImporter, FieldMapping, ImportCounters, ImporterConfig, MappedRow, SKIP_KEY,
};
use crate::errors::Result;
use crate::parts::PartRepositoryTrait;
use crate::production::{
    NewProductionRecord, ProductionRecordUpdate, ProductionRepositoryTrait,
};
use crate::work_centers::WorkCenterResolver;
use gestima_infor::RawRow;

#[derive(Default)]
struct StagedRecords {
    creates: Vec<NewProductionRecord>,
    updates: Vec<ProductionRecordUpdate>,
}

/// Importer for actual production telemetry. The part is resolved per row
/// from the external item code; duplicate detection is by
/// `(part_id, infor_order_number, operation_seq)`.
pub struct ProductionImporter {
    config: ImporterConfig,
    resolver: Arc<WorkCenterResolver>,
    parts: Arc<dyn PartRepositoryTrait>,
    production: Arc<dyn ProductionRepositoryTrait>,
    created_by: Option<String>,
    staged: Mutex<StagedRecords>,
}

impl ProductionImporter {
    pub fn new(
        resolver: Arc<WorkCenterResolver>,
        parts: Arc<dyn PartRepositoryTrait>,
        production: Arc<dyn ProductionRepositoryTrait>,
        created_by: Option<&str>,
    ) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "ProductionRecord",
                ido_name: "SLJobRoutes",
                field_mappings: vec![
                    FieldMapping::new("Job", "infor_order_number").required(),
                    FieldMapping::new("JobItem", "article_number"),
                    FieldMapping::new("Wc", "infor_wc_code"),
                    FieldMapping::new("JshSetupHrs", "planned_setup_hours")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("DerRunMchHrs", "pcs_per_hour_machine")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("DerRunLbrHrs", "pcs_per_hour_labor")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("SetupHrsT", "actual_setup_hours")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("RunHrsTMch", "actual_run_machine_hours")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("RunHrsTLbr", "actual_run_labor_hours")
                        .with_transform(kernel::to_f64),
                    // The gateway returns "49.00" for counts - go through f64.
                    FieldMapping::new("OperNum", "operation_seq").with_transform(kernel::to_i64),
                    FieldMapping::new("JobQtyReleased", "batch_quantity")
                        .with_transform(kernel::to_i64),
                ],
                duplicate_check_field: "infor_order_number",
            },
            resolver,
            parts,
            production,
            created_by: created_by.map(str::to_string),
            staged: Mutex::new(StagedRecords::default()),
        }
    }

    fn insert_f64(row: &mut MappedRow, key: &str, value: Option<f64>) {
        row.insert(
            key.to_string(),
            value.map(Value::from).unwrap_or(Value::Null),
        );
    }
}

#[async_trait]
impl EntityImporter for ProductionImporter {
    fn config(&self) -> &ImporterConfig {
        &self.config
    }

    async fn map_row_custom(&self, raw: &RawRow, basic: &MappedRow) -> Result<MappedRow> {
        let mut custom = MappedRow::new();

        let wc_code = kernel::row_str(basic, "infor_wc_code").unwrap_or_default();
        let wc_code = wc_code.trim();

        if wc_code.starts_with("CLO") || wc_code == "CADCAM" {
            custom.insert(SKIP_KEY.to_string(), Value::Bool(true));
            return Ok(custom);
        }
        if !kernel::row_str(raw, "ObsDate").unwrap_or_default().is_empty() {
            custom.insert(SKIP_KEY.to_string(), Value::Bool(true));
            return Ok(custom);
        }

        let is_coop = wc_code.starts_with("KOO");

        // Part lookup by the external item code. Dispatchers pre-resolve and
        // override this, but the importer stays usable standalone.
        if let Some(article_number) = kernel::row_str(basic, "article_number") {
            let part_id = self
                .parts
                .get_by_article_number(&article_number)?
                .map(|p| p.id);
            if part_id.is_none() {
                warn!("Part not found for article_number '{article_number}'");
            }
            custom.insert(
                "part_id".to_string(),
                part_id.map(Value::from).unwrap_or(Value::Null),
            );
        } else {
            custom.insert("part_id".to_string(), Value::Null);
        }

        if !wc_code.is_empty() {
            let (wc_id, warning) = self.resolver.resolve(wc_code)?;
            custom.insert(
                "work_center_id".to_string(),
                wc_id.map(Value::from).unwrap_or(Value::Null),
            );
            if let Some(warning) = warning {
                warn!(
                    "WC resolution failed for seq {:?}: {warning}",
                    basic.get("operation_seq")
                );
            }
        } else {
            custom.insert("work_center_id".to_string(), Value::Null);
        }

        let pcs_per_hour_mch = kernel::row_f64(basic, "pcs_per_hour_machine");
        let pcs_per_hour_lbr = kernel::row_f64(basic, "pcs_per_hour_labor");
        let batch_qty = kernel::row_i64(basic, "batch_quantity");

        if is_coop {
            // Subcontracted step: times have no meaning.
            custom.insert("planned_time_min".to_string(), Value::from(0.0));
            custom.insert("planned_labor_time_min".to_string(), Value::from(0.0));
            custom.insert("planned_setup_min".to_string(), Value::from(0.0));
            custom.insert("manning_coefficient".to_string(), Value::from(100.0));
            for key in [
                "actual_manning_coefficient",
                "actual_time_min",
                "actual_labor_time_min",
                "actual_setup_min",
                "actual_run_machine_min",
                "actual_run_labor_min",
            ] {
                custom.insert(key.to_string(), Value::Null);
            }
        } else {
            // Planned per piece, from the norms.
            let planned_time_min = match pcs_per_hour_mch {
                Some(mch) if mch > 0.0 => round_to(60.0 / mch, 4),
                _ => 0.0,
            };
            custom.insert("planned_time_min".to_string(), Value::from(planned_time_min));

            let planned_labor_time_min = match pcs_per_hour_lbr {
                Some(lbr) if lbr > 0.0 => round_to(60.0 / lbr, 4),
                _ => 0.0,
            };
            custom.insert(
                "planned_labor_time_min".to_string(),
                Value::from(planned_labor_time_min),
            );

            let planned_setup_min = kernel::row_f64(basic, "planned_setup_hours")
                .filter(|h| *h > 0.0)
                .map(|h| round_to(h * 60.0, 2))
                .unwrap_or(0.0);
            custom.insert("planned_setup_min".to_string(), Value::from(planned_setup_min));

            // An operator attending two machines halves the labor rate.
            let manning = match (pcs_per_hour_mch, pcs_per_hour_lbr) {
                (Some(mch), Some(lbr)) if lbr > 0.0 && mch > 0.0 => {
                    round_to(mch / lbr * 100.0, 1)
                }
                _ => 100.0,
            };
            custom.insert("manning_coefficient".to_string(), Value::from(manning));

            let actual_setup_min = kernel::row_f64(basic, "actual_setup_hours")
                .filter(|h| *h > 0.0)
                .map(|h| round_to(h * 60.0, 2));
            Self::insert_f64(&mut custom, "actual_setup_min", actual_setup_min);

            let actual_run_mch = kernel::row_f64(basic, "actual_run_machine_hours")
                .filter(|h| *h > 0.0);
            Self::insert_f64(
                &mut custom,
                "actual_run_machine_min",
                actual_run_mch.map(|h| round_to(h * 60.0, 2)),
            );

            let actual_run_lbr = kernel::row_f64(basic, "actual_run_labor_hours")
                .filter(|h| *h > 0.0);
            Self::insert_f64(
                &mut custom,
                "actual_run_labor_min",
                actual_run_lbr.map(|h| round_to(h * 60.0, 2)),
            );

            // Actual per piece, from batch totals over released quantity.
            let actual_time_min = match (actual_run_mch, batch_qty) {
                (Some(hours), Some(qty)) if qty > 0 => {
                    Some(round_to(hours * 60.0 / qty as f64, 4))
                }
                _ => None,
            };
            Self::insert_f64(&mut custom, "actual_time_min", actual_time_min);

            let actual_labor_time_min = match (actual_run_lbr, batch_qty) {
                (Some(hours), Some(qty)) if qty > 0 => {
                    Some(round_to(hours * 60.0 / qty as f64, 4))
                }
                _ => None,
            };
            Self::insert_f64(&mut custom, "actual_labor_time_min", actual_labor_time_min);

            let actual_manning = match (actual_run_mch, actual_run_lbr) {
                (Some(mch), Some(lbr)) if mch > 0.0 => Some(round_to(lbr / mch * 100.0, 1)),
                _ => None,
            };
            Self::insert_f64(&mut custom, "actual_manning_coefficient", actual_manning);
        }

        custom.insert("source".to_string(), Value::from("infor"));

        // Working fields, not part of the entity.
        for temp in [
            "article_number",
            "planned_setup_hours",
            "pcs_per_hour_machine",
            "pcs_per_hour_labor",
            "actual_setup_hours",
            "actual_run_machine_hours",
            "actual_run_labor_hours",
        ] {
            custom.insert(temp.to_string(), Value::Null);
        }

        Ok(custom)
    }

    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>> {
        let (Some(part_id), Some(order), Some(seq)) = (
            kernel::row_i64(mapped, "part_id"),
            kernel::row_str(mapped, "infor_order_number"),
            kernel::row_i64(mapped, "operation_seq"),
        ) else {
            return Ok(None);
        };

        Ok(self
            .production
            .find_duplicate(part_id, &order, seq as i32)?
            .map(|record| record.id))
    }

    async fn stage_create(&self, mapped: &MappedRow) -> Result<()> {
        let Some(part_id) = kernel::row_i64(mapped, "part_id") else {
            // No local part - nothing to attach the telemetry to.
            return Ok(());
        };

        self.staged.lock().unwrap().creates.push(NewProductionRecord {
            part_id,
            infor_order_number: kernel::row_str(mapped, "infor_order_number").unwrap_or_default(),
            operation_seq: kernel::row_i64(mapped, "operation_seq").map(|v| v as i32),
            work_center_id: kernel::row_i64(mapped, "work_center_id"),
            batch_quantity: kernel::row_i64(mapped, "batch_quantity").map(|v| v as i32),
            planned_time_min: kernel::row_f64(mapped, "planned_time_min").unwrap_or(0.0),
            planned_labor_time_min: kernel::row_f64(mapped, "planned_labor_time_min")
                .unwrap_or(0.0),
            planned_setup_min: kernel::row_f64(mapped, "planned_setup_min").unwrap_or(0.0),
            actual_setup_min: kernel::row_f64(mapped, "actual_setup_min"),
            actual_run_machine_min: kernel::row_f64(mapped, "actual_run_machine_min"),
            actual_run_labor_min: kernel::row_f64(mapped, "actual_run_labor_min"),
            actual_time_min: kernel::row_f64(mapped, "actual_time_min"),
            actual_labor_time_min: kernel::row_f64(mapped, "actual_labor_time_min"),
            manning_coefficient: kernel::row_f64(mapped, "manning_coefficient").unwrap_or(100.0),
            actual_manning_coefficient: kernel::row_f64(mapped, "actual_manning_coefficient"),
            source: "infor".to_string(),
            created_by: self.created_by.clone(),
        });
        Ok(())
    }

    async fn stage_update(&self, existing_id: i64, mapped: &MappedRow) -> Result<()> {
        self.staged.lock().unwrap().updates.push(ProductionRecordUpdate {
            id: existing_id,
            work_center_id: kernel::row_i64(mapped, "work_center_id"),
            batch_quantity: kernel::row_i64(mapped, "batch_quantity").map(|v| v as i32),
            planned_time_min: kernel::row_f64(mapped, "planned_time_min").unwrap_or(0.0),
            planned_labor_time_min: kernel::row_f64(mapped, "planned_labor_time_min")
                .unwrap_or(0.0),
            planned_setup_min: kernel::row_f64(mapped, "planned_setup_min").unwrap_or(0.0),
            actual_setup_min: kernel::row_f64(mapped, "actual_setup_min"),
            actual_run_machine_min: kernel::row_f64(mapped, "actual_run_machine_min"),
            actual_run_labor_min: kernel::row_f64(mapped, "actual_run_labor_min"),
            actual_time_min: kernel::row_f64(mapped, "actual_time_min"),
            actual_labor_time_min: kernel::row_f64(mapped, "actual_labor_time_min"),
            manning_coefficient: kernel::row_f64(mapped, "manning_coefficient").unwrap_or(100.0),
            actual_manning_coefficient: kernel::row_f64(mapped, "actual_manning_coefficient"),
            updated_by: self.created_by.clone(),
        });
        Ok(())
    }

    async fn commit_staged(&self) -> Result<ImportCounters> {
        let staged = {
            let mut guard = self.staged.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        let (created, updated) = self
            .production
            .apply_import(staged.creates, staged.updates)
            .await?;
        Ok(ImportCounters { created, updated })
    }
}
