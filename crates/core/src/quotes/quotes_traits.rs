//! Quote repository and engine traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use super::quotes_model::{
    NewQuote, NewQuoteItem, Quote, QuoteHeaderUpdate, QuoteItem, QuoteItemUpdate, QuoteTotals,
};
use crate::errors::Result;

/// Persistence contract for quotes and their items. Update methods enforce
/// the optimistic version guard and fail with `VersionConflict` on mismatch.
#[async_trait]
pub trait QuoteRepositoryTrait: Send + Sync {
    async fn create(&self, new_quote: NewQuote) -> Result<Quote>;

    fn get_by_id(&self, id: i64) -> Result<Quote>;

    fn list_items(&self, quote_id: i64) -> Result<Vec<QuoteItem>>;

    fn get_item(&self, item_id: i64) -> Result<QuoteItem>;

    async fn update_header(&self, update: QuoteHeaderUpdate) -> Result<Quote>;

    async fn insert_item(&self, new_item: NewQuoteItem) -> Result<QuoteItem>;

    async fn update_item(&self, update: QuoteItemUpdate) -> Result<QuoteItem>;

    async fn soft_delete_item(&self, item_id: i64, deleted_by: Option<String>) -> Result<()>;

    async fn save_totals(
        &self,
        quote_id: i64,
        totals: QuoteTotals,
        updated_by: Option<String>,
    ) -> Result<()>;

    async fn mark_sent(
        &self,
        quote_id: i64,
        snapshot: Value,
        sent_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote>;

    async fn mark_approved(
        &self,
        quote_id: i64,
        approved_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote>;

    async fn mark_rejected(
        &self,
        quote_id: i64,
        rejected_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote>;

    async fn soft_delete(&self, quote_id: i64, deleted_by: Option<String>) -> Result<()>;

    /// Inserts a cloned quote together with its items in one transaction.
    async fn insert_clone(&self, new_quote: NewQuote, items: Vec<NewQuoteItem>) -> Result<Quote>;
}
