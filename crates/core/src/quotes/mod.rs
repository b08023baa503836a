//! Quotes module - quotation lifecycle with snapshot freezing.

mod quotes_model;
mod quotes_service;
mod quotes_traits;

pub use quotes_model::{
    BatchMatchInfo, NewQuote, NewQuoteItem, PartMatch, PartnerSnapshot, Quote, QuoteError,
    QuoteHeaderUpdate, QuoteItem, QuoteItemSnapshot, QuoteItemUpdate, QuoteSnapshot, QuoteStatus,
    QuoteTotals,
};
pub use quotes_service::QuoteService;
pub use quotes_traits::QuoteRepositoryTrait;

#[cfg(test)]
mod quotes_service_tests;
