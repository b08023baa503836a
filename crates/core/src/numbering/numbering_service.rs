//! Unique entity number allocation.
//!
//! Random classes sample candidates from their reserved range with an
//! adaptive buffer (more collisions expected at higher utilization), filter
//! out existing numbers in a single query, and retry with a fresh sample when
//! the batch cannot be satisfied. Work centers are sequential instead -
//! easier for operators, no collision handling needed.

use log::{debug, warn};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

use super::numbering_model::{
    NumberClass, NumberError, NumberRange, QuoteNumberRange, BATCH_RANGE, BATCH_SET_RANGE,
    MATERIAL_RANGE, PARTNER_RANGE, PART_RANGE, QUOTE_RANGE_HIGH, QUOTE_RANGE_LOW,
    WORK_CENTER_RANGE,
};
use super::numbering_traits::NumberingRepositoryTrait;
use crate::errors::Result;

const MAX_RETRIES: usize = 10;
const MAX_BATCH_SIZE: usize = 1000;

/// Service issuing unique decimal identifiers per entity class.
pub struct NumberingService {
    repository: Arc<dyn NumberingRepositoryTrait>,
    quote_range: QuoteNumberRange,
}

impl NumberingService {
    pub fn new(
        repository: Arc<dyn NumberingRepositoryTrait>,
        quote_range: QuoteNumberRange,
    ) -> Self {
        Self {
            repository,
            quote_range,
        }
    }

    pub fn range(&self, class: NumberClass) -> NumberRange {
        match class {
            NumberClass::Part => PART_RANGE,
            NumberClass::Material => MATERIAL_RANGE,
            NumberClass::Batch => BATCH_RANGE,
            NumberClass::BatchSet => BATCH_SET_RANGE,
            NumberClass::Partner => PARTNER_RANGE,
            NumberClass::WorkCenter => WORK_CENTER_RANGE,
            NumberClass::Quote => match self.quote_range {
                QuoteNumberRange::High => QUOTE_RANGE_HIGH,
                QuoteNumberRange::Low => QUOTE_RANGE_LOW,
            },
        }
    }

    /// Allocates `count` unique numbers for the class in one shot.
    ///
    /// This is the primitive; single-number allocation is the degenerate call
    /// with `count = 1`. Work centers must go through
    /// [`next_work_center_number`](Self::next_work_center_number).
    pub fn generate_batch(&self, class: NumberClass, count: usize) -> Result<Vec<String>> {
        if class == NumberClass::WorkCenter {
            return Ok(vec![self.next_work_center_number()?]);
        }

        if count == 0 || count > MAX_BATCH_SIZE {
            return Err(NumberError::InvalidBatchSize(count as i64).into());
        }

        let range = self.range(class);

        for attempt in 1..=MAX_RETRIES {
            let multiplier = self.buffer_multiplier(class, range)?;
            let buffer_size = (count as f64 * multiplier) as usize;

            // Sample distinct candidates. The iteration bound guarantees
            // termination even when the range is nearly saturated and fresh
            // candidates keep colliding with each other.
            let mut rng = rand::thread_rng();
            let mut candidates: HashSet<String> = HashSet::with_capacity(buffer_size);
            let max_iterations = buffer_size * 10;
            let mut iterations = 0;
            while candidates.len() < buffer_size && iterations < max_iterations {
                candidates.insert(rng.gen_range(range.min..=range.max).to_string());
                iterations += 1;
            }
            if iterations >= max_iterations {
                warn!(
                    "Hit iteration limit ({max_iterations}) sampling {} numbers; \
                     got {}/{buffer_size} candidates",
                    class.entity_name(),
                    candidates.len()
                );
            }

            let candidates: Vec<String> = candidates.into_iter().collect();

            // Single query to check all candidates at once.
            let existing: HashSet<String> = self
                .repository
                .existing_in(class, &candidates)?
                .into_iter()
                .collect();

            let available: Vec<String> = candidates
                .into_iter()
                .filter(|c| !existing.contains(c))
                .collect();

            if available.len() >= count {
                debug!(
                    "Generated {count} {} numbers on attempt {attempt}",
                    class.entity_name()
                );
                return Ok(available.into_iter().take(count).collect());
            }

            warn!(
                "Attempt {attempt}: only {}/{count} unique {} numbers generated \
                 (collision rate high)",
                available.len(),
                class.entity_name()
            );
        }

        Err(NumberError::Exhausted {
            entity: class.entity_name().to_string(),
            reason: format!(
                "failed to generate {count} unique numbers after {MAX_RETRIES} attempts; \
                 range may be near capacity"
            ),
        }
        .into())
    }

    /// Allocates a single number (delegates to the batch primitive).
    pub fn generate(&self, class: NumberClass) -> Result<String> {
        let mut numbers = self.generate_batch(class, 1)?;
        Ok(numbers.remove(0))
    }

    /// Next sequential work-center number: `max(existing) + 1`, or the range
    /// minimum when no work center exists yet.
    pub fn next_work_center_number(&self) -> Result<String> {
        let range = WORK_CENTER_RANGE;

        let max_number = self.repository.max_work_center_number()?;

        let next = match max_number {
            None => range.min,
            Some(current) => {
                let current: u32 = current.parse().map_err(|_| NumberError::Exhausted {
                    entity: NumberClass::WorkCenter.entity_name().to_string(),
                    reason: format!("stored number '{current}' is not numeric"),
                })?;
                current + 1
            }
        };

        if next > range.max {
            return Err(NumberError::Exhausted {
                entity: NumberClass::WorkCenter.entity_name().to_string(),
                reason: format!("sequential space exhausted (max {})", range.max),
            }
            .into());
        }

        debug!("Generated work center number: {next}");
        Ok(next.to_string())
    }

    /// Buffer multiplier from current range utilization: the fuller the
    /// range, the more collisions a sample will hit.
    fn buffer_multiplier(&self, class: NumberClass, range: NumberRange) -> Result<f64> {
        let count = self.repository.count(class)?.max(0) as u64;
        let utilization = count as f64 / range.capacity() as f64;

        Ok(if utilization < 0.5 {
            2.0
        } else if utilization < 0.8 {
            3.0
        } else {
            5.0
        })
    }
}
