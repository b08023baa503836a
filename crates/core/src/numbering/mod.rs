//! Numbering module - unique entity number allocation.

mod numbering_model;
mod numbering_service;
mod numbering_traits;

pub use numbering_model::{NumberClass, NumberError, NumberRange, QuoteNumberRange};
pub use numbering_service::NumberingService;
pub use numbering_traits::NumberingRepositoryTrait;

#[cfg(test)]
mod numbering_service_tests;
