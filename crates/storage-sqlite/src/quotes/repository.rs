//! Quote repository backed by SQLite.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::Value;

use gestima_core::errors::{DatabaseError, Error, Result};
use gestima_core::quotes::{
    NewQuote, NewQuoteItem, Quote, QuoteHeaderUpdate, QuoteItem, QuoteItemUpdate,
    QuoteRepositoryTrait, QuoteStatus, QuoteTotals,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{quote_items, quotes};
use crate::utils::dec_to_db;

use super::model::{NewQuoteDB, NewQuoteItemDB, QuoteDB, QuoteItemDB};

pub struct QuoteRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl QuoteRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_quote(conn: &mut SqliteConnection, quote_id: i64) -> Result<QuoteDB> {
    quotes::table
        .filter(quotes::id.eq(quote_id))
        .filter(quotes::deleted_at.is_null())
        .select(QuoteDB::as_select())
        .first(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("quote {quote_id}"))))
}

fn set_status(
    conn: &mut SqliteConnection,
    quote_id: i64,
    new_status: QuoteStatus,
    stamp_column: StatusStamp,
    stamp: NaiveDateTime,
    updated_by: Option<String>,
) -> Result<Quote> {
    let base = diesel::update(
        quotes::table
            .filter(quotes::id.eq(quote_id))
            .filter(quotes::deleted_at.is_null()),
    );

    match stamp_column {
        StatusStamp::Sent => base
            .set((
                quotes::status.eq(new_status.as_str()),
                quotes::sent_at.eq(stamp),
                quotes::updated_at.eq(stamp),
                quotes::updated_by.eq(updated_by),
                quotes::version.eq(quotes::version + 1),
            ))
            .execute(conn)
            .into_core()?,
        StatusStamp::Approved => base
            .set((
                quotes::status.eq(new_status.as_str()),
                quotes::approved_at.eq(stamp),
                quotes::updated_at.eq(stamp),
                quotes::updated_by.eq(updated_by),
                quotes::version.eq(quotes::version + 1),
            ))
            .execute(conn)
            .into_core()?,
        StatusStamp::Rejected => base
            .set((
                quotes::status.eq(new_status.as_str()),
                quotes::rejected_at.eq(stamp),
                quotes::updated_at.eq(stamp),
                quotes::updated_by.eq(updated_by),
                quotes::version.eq(quotes::version + 1),
            ))
            .execute(conn)
            .into_core()?,
    };

    Ok(load_quote(conn, quote_id)?.into())
}

enum StatusStamp {
    Sent,
    Approved,
    Rejected,
}

#[async_trait]
impl QuoteRepositoryTrait for QuoteRepository {
    async fn create(&self, new_quote: NewQuote) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                let db_quote: NewQuoteDB = new_quote.into();
                let inserted: QuoteDB = diesel::insert_into(quotes::table)
                    .values(&db_quote)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    fn get_by_id(&self, quote_id: i64) -> Result<Quote> {
        let mut conn = get_connection(&self.pool)?;
        Ok(load_quote(&mut conn, quote_id)?.into())
    }

    fn list_items(&self, quote: i64) -> Result<Vec<QuoteItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<QuoteItemDB> = quote_items::table
            .filter(quote_items::quote_id.eq(quote))
            .filter(quote_items::deleted_at.is_null())
            .order(quote_items::id.asc())
            .select(QuoteItemDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn get_item(&self, item_id: i64) -> Result<QuoteItem> {
        let mut conn = get_connection(&self.pool)?;
        let item: QuoteItemDB = quote_items::table
            .filter(quote_items::id.eq(item_id))
            .filter(quote_items::deleted_at.is_null())
            .select(QuoteItemDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("quote item {item_id}")))
            })?;
        Ok(item.into())
    }

    async fn update_header(&self, update: QuoteHeaderUpdate) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                let existing = load_quote(conn, update.id)?;
                if existing.version != update.version {
                    return Err(Error::VersionConflict {
                        entity: "Quote".to_string(),
                        expected: update.version,
                        actual: existing.version,
                    });
                }

                let now = Utc::now().naive_utc();
                diesel::update(quotes::table.filter(quotes::id.eq(update.id)))
                    .set((
                        quotes::partner_id.eq(update.partner_id.or(existing.partner_id)),
                        quotes::title.eq(update.title.unwrap_or(existing.title)),
                        quotes::description.eq(update.description.or(existing.description)),
                        quotes::valid_until.eq(update.valid_until.or(existing.valid_until)),
                        quotes::discount_percent.eq(update
                            .discount_percent
                            .map(dec_to_db)
                            .unwrap_or(existing.discount_percent)),
                        quotes::tax_percent.eq(update
                            .tax_percent
                            .map(dec_to_db)
                            .unwrap_or(existing.tax_percent)),
                        quotes::notes.eq(update.notes.or(existing.notes)),
                        quotes::updated_at.eq(now),
                        quotes::updated_by.eq(update.updated_by),
                        quotes::version.eq(existing.version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;

                Ok(load_quote(conn, update.id)?.into())
            })
            .await
    }

    async fn insert_item(&self, new_item: NewQuoteItem) -> Result<QuoteItem> {
        self.writer
            .exec(move |conn| {
                let db_item: NewQuoteItemDB = new_item.into();
                let inserted: QuoteItemDB = diesel::insert_into(quote_items::table)
                    .values(&db_item)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    async fn update_item(&self, update: QuoteItemUpdate) -> Result<QuoteItem> {
        self.writer
            .exec(move |conn| {
                let existing: QuoteItemDB = quote_items::table
                    .filter(quote_items::id.eq(update.id))
                    .filter(quote_items::deleted_at.is_null())
                    .select(QuoteItemDB::as_select())
                    .first(conn)
                    .optional()
                    .into_core()?
                    .ok_or_else(|| {
                        Error::Database(DatabaseError::NotFound(format!(
                            "quote item {}",
                            update.id
                        )))
                    })?;

                if existing.version != update.version {
                    return Err(Error::VersionConflict {
                        entity: "QuoteItem".to_string(),
                        expected: update.version,
                        actual: existing.version,
                    });
                }

                let now = Utc::now().naive_utc();
                diesel::update(quote_items::table.filter(quote_items::id.eq(update.id)))
                    .set((
                        quote_items::quantity.eq(update.quantity),
                        quote_items::unit_price.eq(dec_to_db(update.unit_price)),
                        quote_items::line_total.eq(dec_to_db(update.line_total)),
                        quote_items::notes.eq(update.notes),
                        quote_items::updated_at.eq(now),
                        quote_items::updated_by.eq(update.updated_by),
                        quote_items::version.eq(existing.version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;

                let refreshed: QuoteItemDB = quote_items::table
                    .filter(quote_items::id.eq(update.id))
                    .select(QuoteItemDB::as_select())
                    .first(conn)
                    .into_core()?;
                Ok(refreshed.into())
            })
            .await
    }

    async fn soft_delete_item(&self, item_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let affected = diesel::update(
                    quote_items::table
                        .filter(quote_items::id.eq(item_id))
                        .filter(quote_items::deleted_at.is_null()),
                )
                .set((
                    quote_items::deleted_at.eq(now),
                    quote_items::deleted_by.eq(deleted_by),
                    quote_items::updated_at.eq(now),
                    quote_items::version.eq(quote_items::version + 1),
                ))
                .execute(conn)
                .into_core()?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "quote item {item_id}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    async fn save_totals(
        &self,
        quote_id: i64,
        totals: QuoteTotals,
        updated_by: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                diesel::update(
                    quotes::table
                        .filter(quotes::id.eq(quote_id))
                        .filter(quotes::deleted_at.is_null()),
                )
                .set((
                    quotes::subtotal.eq(dec_to_db(totals.subtotal)),
                    quotes::discount_amount.eq(dec_to_db(totals.discount_amount)),
                    quotes::tax_amount.eq(dec_to_db(totals.tax_amount)),
                    quotes::total.eq(dec_to_db(totals.total)),
                    quotes::updated_at.eq(now),
                    quotes::updated_by.eq(updated_by),
                    quotes::version.eq(quotes::version + 1),
                ))
                .execute(conn)
                .into_core()?;
                Ok(())
            })
            .await
    }

    async fn mark_sent(
        &self,
        quote_id: i64,
        snapshot: Value,
        sent_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                let snapshot_raw = serde_json::to_string(&snapshot)
                    .map_err(|e| Error::Unexpected(e.to_string()))?;
                diesel::update(
                    quotes::table
                        .filter(quotes::id.eq(quote_id))
                        .filter(quotes::deleted_at.is_null()),
                )
                .set(quotes::snapshot_data.eq(snapshot_raw))
                .execute(conn)
                .into_core()?;

                set_status(
                    conn,
                    quote_id,
                    QuoteStatus::Sent,
                    StatusStamp::Sent,
                    sent_at,
                    updated_by,
                )
            })
            .await
    }

    async fn mark_approved(
        &self,
        quote_id: i64,
        approved_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                set_status(
                    conn,
                    quote_id,
                    QuoteStatus::Approved,
                    StatusStamp::Approved,
                    approved_at,
                    updated_by,
                )
            })
            .await
    }

    async fn mark_rejected(
        &self,
        quote_id: i64,
        rejected_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                set_status(
                    conn,
                    quote_id,
                    QuoteStatus::Rejected,
                    StatusStamp::Rejected,
                    rejected_at,
                    updated_by,
                )
            })
            .await
    }

    async fn soft_delete(&self, quote_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();

                // Items follow the quote (cascade policy).
                diesel::update(
                    quote_items::table
                        .filter(quote_items::quote_id.eq(quote_id))
                        .filter(quote_items::deleted_at.is_null()),
                )
                .set((
                    quote_items::deleted_at.eq(now),
                    quote_items::deleted_by.eq(deleted_by.clone()),
                    quote_items::updated_at.eq(now),
                    quote_items::version.eq(quote_items::version + 1),
                ))
                .execute(conn)
                .into_core()?;

                let affected = diesel::update(
                    quotes::table
                        .filter(quotes::id.eq(quote_id))
                        .filter(quotes::deleted_at.is_null()),
                )
                .set((
                    quotes::deleted_at.eq(now),
                    quotes::deleted_by.eq(deleted_by),
                    quotes::updated_at.eq(now),
                    quotes::version.eq(quotes::version + 1),
                ))
                .execute(conn)
                .into_core()?;

                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "quote {quote_id}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    async fn insert_clone(&self, new_quote: NewQuote, items: Vec<NewQuoteItem>) -> Result<Quote> {
        self.writer
            .exec(move |conn| {
                let db_quote: NewQuoteDB = new_quote.into();
                let inserted: QuoteDB = diesel::insert_into(quotes::table)
                    .values(&db_quote)
                    .get_result(conn)
                    .into_core()?;

                for mut item in items {
                    item.quote_id = inserted.id;
                    let db_item: NewQuoteItemDB = item.into();
                    diesel::insert_into(quote_items::table)
                        .values(&db_item)
                        .execute(conn)
                        .into_core()?;
                }

                Ok(inserted.into())
            })
            .await
    }
}
