//! Database models for quotes and quote items.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use log::error;

use gestima_core::quotes::{NewQuote, NewQuoteItem, Quote, QuoteItem, QuoteStatus};

use crate::utils::{audit_from_columns, dec_from_db, dec_to_db};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteDB {
    pub id: i64,
    pub quote_number: String,
    pub partner_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,
    pub status: String,
    pub sent_at: Option<NaiveDateTime>,
    pub approved_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub subtotal: String,
    pub discount_percent: String,
    pub discount_amount: String,
    pub tax_percent: String,
    pub tax_amount: String,
    pub total: String,
    pub snapshot_data: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<QuoteDB> for Quote {
    fn from(db: QuoteDB) -> Self {
        let snapshot_data = db.snapshot_data.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| error!("Corrupted quote snapshot for {}: {e}", db.quote_number))
                .ok()
        });
        Quote {
            id: db.id,
            quote_number: db.quote_number,
            partner_id: db.partner_id,
            title: db.title,
            description: db.description,
            valid_until: db.valid_until,
            status: QuoteStatus::parse(&db.status),
            sent_at: db.sent_at,
            approved_at: db.approved_at,
            rejected_at: db.rejected_at,
            subtotal: dec_from_db(&db.subtotal, "subtotal"),
            discount_percent: dec_from_db(&db.discount_percent, "discount_percent"),
            discount_amount: dec_from_db(&db.discount_amount, "discount_amount"),
            tax_percent: dec_from_db(&db.tax_percent, "tax_percent"),
            tax_amount: dec_from_db(&db.tax_amount, "tax_amount"),
            total: dec_from_db(&db.total, "total"),
            snapshot_data,
            notes: db.notes,
            audit: audit_from_columns((
                db.created_at,
                db.updated_at,
                db.created_by,
                db.updated_by,
                db.deleted_at,
                db.deleted_by,
                db.version,
            )),
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::quotes)]
pub struct NewQuoteDB {
    pub quote_number: String,
    pub partner_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,
    pub status: String,
    pub subtotal: String,
    pub discount_percent: String,
    pub discount_amount: String,
    pub tax_percent: String,
    pub tax_amount: String,
    pub total: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewQuote> for NewQuoteDB {
    fn from(new_quote: NewQuote) -> Self {
        let now = Utc::now().naive_utc();
        NewQuoteDB {
            quote_number: new_quote.quote_number,
            partner_id: new_quote.partner_id,
            title: new_quote.title,
            description: new_quote.description,
            valid_until: new_quote.valid_until,
            status: QuoteStatus::Draft.as_str().to_string(),
            subtotal: "0".to_string(),
            discount_percent: dec_to_db(new_quote.discount_percent),
            discount_amount: "0".to_string(),
            tax_percent: dec_to_db(new_quote.tax_percent),
            tax_amount: "0".to_string(),
            total: "0".to_string(),
            notes: new_quote.notes,
            created_at: now,
            updated_at: now,
            created_by: new_quote.created_by.clone(),
            updated_by: new_quote.created_by,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::quote_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteItemDB {
    pub id: i64,
    pub quote_id: i64,
    pub part_id: Option<i64>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<QuoteItemDB> for QuoteItem {
    fn from(db: QuoteItemDB) -> Self {
        QuoteItem {
            id: db.id,
            quote_id: db.quote_id,
            part_id: db.part_id,
            part_number: db.part_number,
            part_name: db.part_name,
            quantity: db.quantity,
            unit_price: dec_from_db(&db.unit_price, "unit_price"),
            line_total: dec_from_db(&db.line_total, "line_total"),
            notes: db.notes,
            audit: audit_from_columns((
                db.created_at,
                db.updated_at,
                db.created_by,
                db.updated_by,
                db.deleted_at,
                db.deleted_by,
                db.version,
            )),
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::quote_items)]
pub struct NewQuoteItemDB {
    pub quote_id: i64,
    pub part_id: Option<i64>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewQuoteItem> for NewQuoteItemDB {
    fn from(new_item: NewQuoteItem) -> Self {
        let now = Utc::now().naive_utc();
        NewQuoteItemDB {
            quote_id: new_item.quote_id,
            part_id: new_item.part_id,
            part_number: new_item.part_number,
            part_name: new_item.part_name,
            quantity: new_item.quantity,
            unit_price: dec_to_db(new_item.unit_price),
            line_total: dec_to_db(new_item.line_total),
            notes: new_item.notes,
            created_at: now,
            updated_at: now,
            created_by: new_item.created_by.clone(),
            updated_by: new_item.created_by,
        }
    }
}
