//! Batch service: pricing-set freeze and best-batch matching.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

use super::batches_model::{
    Batch, BatchFreeze, BatchMatch, BatchSet, BatchSetStatus, BatchSnapshot, BatchCostSnapshot,
    generate_batch_set_name, NewBatchSet,
};
use super::batches_traits::BatchRepositoryTrait;
use crate::errors::Result;
use crate::numbering::{NumberClass, NumberingService};
use crate::quotes::QuoteError;

pub struct BatchService {
    repository: Arc<dyn BatchRepositoryTrait>,
    numbering: Arc<NumberingService>,
}

impl BatchService {
    pub fn new(
        repository: Arc<dyn BatchRepositoryTrait>,
        numbering: Arc<NumberingService>,
    ) -> Self {
        Self {
            repository,
            numbering,
        }
    }

    /// Creates a new draft set, auto-numbered and auto-named when no name is
    /// given.
    pub async fn create_set(
        &self,
        part_id: Option<i64>,
        name: Option<String>,
        created_by: Option<&str>,
    ) -> Result<BatchSet> {
        let set_number = self.numbering.generate(NumberClass::BatchSet)?;
        self.repository
            .create_set(NewBatchSet {
                set_number,
                part_id,
                name: Some(name.unwrap_or_else(generate_batch_set_name)),
                created_by: created_by.map(str::to_string),
            })
            .await
    }

    /// Freezes a whole set: every active batch gets its prices written into
    /// the frozen columns together with a minimal cost snapshot.
    ///
    /// Irreversible. A frozen set cannot be frozen again.
    pub async fn freeze_set(&self, set_id: i64, frozen_by: Option<&str>) -> Result<BatchSet> {
        let set = self.repository.get_set_by_id(set_id)?;
        if set.status == BatchSetStatus::Frozen {
            return Err(QuoteError::InvalidStateTransition {
                from: "frozen".to_string(),
                to: "frozen".to_string(),
            }
            .into());
        }

        let batches = self.repository.list_for_set(set_id)?;
        let frozen_at = Utc::now().naive_utc();

        let freezes: Vec<BatchFreeze> = batches
            .iter()
            .map(|batch| {
                let snapshot = BatchSnapshot {
                    batch_number: batch.batch_number.clone(),
                    quantity: batch.quantity,
                    costs: BatchCostSnapshot {
                        material_cost: batch.material_cost,
                        machining_cost: batch.machining_cost,
                        setup_cost: batch.setup_cost,
                        overhead_cost: batch.overhead_cost,
                        margin_cost: batch.margin_cost,
                        coop_cost: batch.coop_cost,
                        unit_cost: batch.unit_cost,
                        total_cost: batch.total_cost,
                    },
                    frozen_at,
                    frozen_by: frozen_by.map(str::to_string),
                };
                Ok(BatchFreeze {
                    batch_id: batch.id,
                    snapshot_data: serde_json::to_value(&snapshot)?,
                    unit_price_frozen: batch.unit_cost,
                    total_price_frozen: batch.total_cost,
                })
            })
            .collect::<Result<_>>()?;

        self.repository
            .apply_freeze(set_id, frozen_at, frozen_by.map(str::to_string), freezes)
            .await?;

        info!(
            "Froze batch set {} ({} batches) by {}",
            set.set_number,
            batches.len(),
            frozen_by.unwrap_or("system")
        );

        self.repository.get_set_by_id(set_id)
    }

    /// Finds the best frozen batch for a requested quantity.
    ///
    /// 1. Exact quantity match.
    /// 2. Largest batch below the requested quantity, with a warning.
    /// 3. Nothing suitable: `(None, Missing, warning listing what exists)`.
    pub fn find_best_batch(
        &self,
        part_id: i64,
        requested_quantity: i32,
    ) -> Result<(Option<Batch>, BatchMatch, Vec<String>)> {
        let frozen = self.repository.list_frozen_for_part(part_id)?;

        if frozen.is_empty() {
            warn!("No frozen batches for part {part_id}");
            return Ok((
                None,
                BatchMatch::Missing,
                vec![format!("Part {part_id} has no frozen pricing set")],
            ));
        }

        if let Some(exact) = frozen.iter().find(|b| b.quantity == requested_quantity) {
            debug!(
                "Exact batch match: part={part_id}, qty={requested_quantity}, batch={}",
                exact.batch_number
            );
            return Ok((Some(exact.clone()), BatchMatch::Exact, vec![]));
        }

        let nearest_lower = frozen
            .iter()
            .filter(|b| b.quantity < requested_quantity)
            .max_by_key(|b| b.quantity);

        if let Some(batch) = nearest_lower {
            let warning = format!(
                "No batch of {requested_quantity} pcs exists - used the {} pcs batch. \
                 Consider creating an exact batch.",
                batch.quantity
            );
            debug!(
                "Lower batch match: part={part_id}, requested={requested_quantity}, used={}",
                batch.quantity
            );
            return Ok((Some(batch.clone()), BatchMatch::Lower, vec![warning]));
        }

        let available: Vec<String> = frozen.iter().map(|b| format!("{} pcs", b.quantity)).collect();
        let warning = format!(
            "Smallest available batch is {} pcs (requested {requested_quantity} pcs). \
             Available batches: {}",
            frozen[0].quantity,
            available.join(", ")
        );
        warn!("No suitable batch: part={part_id}, requested={requested_quantity}");
        Ok((None, BatchMatch::Missing, vec![warning]))
    }
}
