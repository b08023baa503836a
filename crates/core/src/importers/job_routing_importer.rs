//! Operation importer from the `SLJobRoutes` IDO (Type `S`, planned routing).
//!
//! Field conversions:
//!   DerRunMchHrs (pieces/hour, machine) → operation_time_min = 60 / DerRunMchHrs
//!   DerRunMchHrs / DerRunLbrHrs         → manning_coefficient = ratio * 100
//!   JshSetupHrs (hours)                 → setup_time_min = JshSetupHrs * 60,
//!                                         falling back to JshSchedHrs * 60
//!
//! Work-center handling:
//!   Wc starting `CLO`, or `CADCAM`, or a set ObsDate → row skipped
//!   Wc starting `KOO` → cooperation: times zeroed, manning 100%

use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::kernel::{
    self, EntityImporter, FieldMapping, ImportCounters, ImporterConfig, MappedRow, SKIP_KEY,
};
use crate::errors::Result;
use crate::operations::{NewOperation, OperationImportUpdate, OperationRepositoryTrait};
use crate::work_centers::WorkCenterResolver;
use gestima_infor::RawRow;

#[derive(Default)]
struct StagedOperations {
    creates: Vec<NewOperation>,
    updates: Vec<OperationImportUpdate>,
}

/// Importer for one part's planned routing. Requires the part context;
/// duplicate detection is by `(part_id, seq)`.
pub struct JobRoutingImporter {
    config: ImporterConfig,
    part_id: i64,
    resolver: Arc<WorkCenterResolver>,
    operations: Arc<dyn OperationRepositoryTrait>,
    created_by: Option<String>,
    staged: Mutex<StagedOperations>,
}

impl JobRoutingImporter {
    pub fn new(
        part_id: i64,
        resolver: Arc<WorkCenterResolver>,
        operations: Arc<dyn OperationRepositoryTrait>,
        created_by: Option<&str>,
    ) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "Operation",
                ido_name: "SLJobRoutes",
                field_mappings: vec![
                    FieldMapping::new("OperNum", "seq")
                        .required()
                        .with_transform(kernel::to_i64),
                    FieldMapping::new("Wc", "infor_wc_code"),
                    FieldMapping::new("DerRunMchHrs", "pcs_per_hour_machine")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("DerRunLbrHrs", "pcs_per_hour_labor")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("JshSetupHrs", "setup_time_hours")
                        .with_transform(kernel::to_f64),
                    FieldMapping::new("JshSchedHrs", "sched_time_hours")
                        .with_transform(kernel::to_f64),
                ],
                duplicate_check_field: "seq",
            },
            part_id,
            resolver,
            operations,
            created_by: created_by.map(str::to_string),
            staged: Mutex::new(StagedOperations::default()),
        }
    }
}

/// Rounds to the given number of decimal places.
pub(super) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[async_trait]
impl EntityImporter for JobRoutingImporter {
    fn config(&self) -> &ImporterConfig {
        &self.config
    }

    async fn map_row_custom(&self, raw: &RawRow, basic: &MappedRow) -> Result<MappedRow> {
        let mut custom = MappedRow::new();

        let wc_code = kernel::row_str(basic, "infor_wc_code").unwrap_or_default();
        let wc_code = wc_code.trim();

        // CLO* and CADCAM routings are internal bookkeeping rows; obsolete
        // rows carry ObsDate.
        if wc_code.starts_with("CLO") || wc_code == "CADCAM" {
            custom.insert(SKIP_KEY.to_string(), Value::Bool(true));
            return Ok(custom);
        }
        if !kernel::row_str(raw, "ObsDate").unwrap_or_default().is_empty() {
            custom.insert(SKIP_KEY.to_string(), Value::Bool(true));
            return Ok(custom);
        }

        let is_coop = wc_code.starts_with("KOO");
        custom.insert("is_coop".to_string(), Value::Bool(is_coop));

        // Cooperation still resolves its work center (KOO has its own).
        if !wc_code.is_empty() {
            let (wc_id, warning) = self.resolver.resolve(wc_code)?;
            custom.insert("work_center_id".to_string(), wc_id.map(Value::from).unwrap_or(Value::Null));
            if let Some(warning) = warning {
                warn!(
                    "WC resolution failed for seq {:?}: {warning}",
                    basic.get("seq")
                );
            }
        } else {
            custom.insert("work_center_id".to_string(), Value::Null);
        }

        let pcs_per_hour_mch = kernel::row_f64(basic, "pcs_per_hour_machine");
        let pcs_per_hour_lbr = kernel::row_f64(basic, "pcs_per_hour_labor");

        if is_coop {
            // Subcontracted step: machine times have no meaning.
            custom.insert("operation_time_min".to_string(), Value::from(0.0));
            custom.insert("manning_coefficient".to_string(), Value::from(100.0));
        } else {
            // pieces/hour → minutes/piece
            let operation_time_min = match pcs_per_hour_mch {
                Some(mch) if mch > 0.0 => round_to(60.0 / mch, 4),
                _ => 0.0,
            };
            custom.insert("operation_time_min".to_string(), Value::from(operation_time_min));

            // Machine 100 pcs/h, operator 303 pcs/h → operator attends this
            // machine 33% of the time.
            let manning = match (pcs_per_hour_mch, pcs_per_hour_lbr) {
                (Some(mch), Some(lbr)) if lbr > 0.0 && mch > 0.0 => {
                    round_to(mch / lbr * 100.0, 1)
                }
                _ => 100.0,
            };
            custom.insert("manning_coefficient".to_string(), Value::from(manning));
        }

        let setup_hours = kernel::row_f64(basic, "setup_time_hours");
        let sched_hours = kernel::row_f64(basic, "sched_time_hours");
        let setup_time_min = match (setup_hours, sched_hours) {
            (Some(setup), _) if setup > 0.0 => round_to(setup * 60.0, 2),
            (_, Some(sched)) if sched > 0.0 => round_to(sched * 60.0, 2),
            _ => 0.0,
        };
        custom.insert("setup_time_min".to_string(), Value::from(setup_time_min));

        // Working fields, not part of the entity.
        for temp in [
            "pcs_per_hour_machine",
            "pcs_per_hour_labor",
            "setup_time_hours",
            "sched_time_hours",
        ] {
            custom.insert(temp.to_string(), Value::Null);
        }

        Ok(custom)
    }

    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>> {
        let Some(seq) = kernel::row_i64(mapped, "seq") else {
            return Ok(None);
        };
        Ok(self
            .operations
            .find_by_part_and_seq(self.part_id, seq as i32)?
            .map(|op| op.id))
    }

    async fn stage_create(&self, mapped: &MappedRow) -> Result<()> {
        let is_coop = kernel::row_bool(mapped, "is_coop");
        self.staged.lock().unwrap().creates.push(NewOperation {
            part_id: self.part_id,
            seq: kernel::row_i64(mapped, "seq").unwrap_or(0) as i32,
            name: kernel::row_str(mapped, "name").unwrap_or_default(),
            work_center_id: kernel::row_i64(mapped, "work_center_id"),
            setup_time_min: kernel::row_f64(mapped, "setup_time_min").unwrap_or(0.0),
            operation_time_min: kernel::row_f64(mapped, "operation_time_min").unwrap_or(0.0),
            manning_coefficient: kernel::row_f64(mapped, "manning_coefficient").unwrap_or(100.0),
            machine_utilization_coefficient: 100.0,
            is_coop,
            created_by: self.created_by.clone(),
            ..NewOperation::default()
        });
        Ok(())
    }

    async fn stage_update(&self, existing_id: i64, mapped: &MappedRow) -> Result<()> {
        self.staged
            .lock()
            .unwrap()
            .updates
            .push(OperationImportUpdate {
                id: existing_id,
                work_center_id: kernel::row_i64(mapped, "work_center_id"),
                setup_time_min: kernel::row_f64(mapped, "setup_time_min").unwrap_or(0.0),
                operation_time_min: kernel::row_f64(mapped, "operation_time_min").unwrap_or(0.0),
                manning_coefficient: kernel::row_f64(mapped, "manning_coefficient")
                    .unwrap_or(100.0),
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
            .operations
            .apply_import(staged.creates, staged.updates)
            .await?;
        Ok(ImportCounters { created, updated })
    }
}
