//! Number classes and their reserved decimal ranges.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the number allocator.
#[derive(Error, Debug)]
pub enum NumberError {
    /// The range is saturated or the collision rate stayed too high across
    /// every retry.
    #[error("Number space exhausted for {entity}: {reason}")]
    Exhausted { entity: String, reason: String },

    /// Requested batch size is out of bounds (n <= 0 or n > 1000).
    #[error("Invalid batch size: {0} (must be 1..=1000)")]
    InvalidBatchSize(i64),
}

/// Entity classes that receive numbers from reserved decimal ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberClass {
    Part,
    Material,
    Batch,
    BatchSet,
    Partner,
    WorkCenter,
    Quote,
}

impl NumberClass {
    pub fn entity_name(&self) -> &'static str {
        match self {
            NumberClass::Part => "Part",
            NumberClass::Material => "MaterialItem",
            NumberClass::Batch => "Batch",
            NumberClass::BatchSet => "BatchSet",
            NumberClass::Partner => "Partner",
            NumberClass::WorkCenter => "WorkCenter",
            NumberClass::Quote => "Quote",
        }
    }
}

/// Inclusive decimal range a class allocates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub fn capacity(&self) -> u64 {
        u64::from(self.max - self.min) + 1
    }
}

/// Which reserved range quote numbers come from. Selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteNumberRange {
    /// 85000000-85999999
    #[default]
    High,
    /// 50000000-50999999
    Low,
}

pub(crate) const PART_RANGE: NumberRange = NumberRange { min: 10_000_000, max: 10_999_999 };
pub(crate) const MATERIAL_RANGE: NumberRange = NumberRange { min: 20_000_000, max: 20_999_999 };
pub(crate) const BATCH_RANGE: NumberRange = NumberRange { min: 30_000_000, max: 30_999_999 };
pub(crate) const BATCH_SET_RANGE: NumberRange = NumberRange { min: 35_000_000, max: 35_999_999 };
pub(crate) const PARTNER_RANGE: NumberRange = NumberRange { min: 70_000_000, max: 70_999_999 };
// Work centers are sequential, starting past the range floor.
pub(crate) const WORK_CENTER_RANGE: NumberRange = NumberRange { min: 80_000_001, max: 80_999_999 };
pub(crate) const QUOTE_RANGE_HIGH: NumberRange = NumberRange { min: 85_000_000, max: 85_999_999 };
pub(crate) const QUOTE_RANGE_LOW: NumberRange = NumberRange { min: 50_000_000, max: 50_999_999 };
