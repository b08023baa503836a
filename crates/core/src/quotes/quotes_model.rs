//! Quote and QuoteItem domain models.
//!
//! Workflow: DRAFT is editable; SENT is immutable and carries the snapshot;
//! APPROVED/REJECTED are terminal. Item rows denormalize part identifiers so
//! the snapshot stays readable after the part changes.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::Audit;
use crate::batches::BatchMatch;

/// Quote workflow errors.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// The quote is read-only; every mutation on a non-draft quote fails
    /// with this error. Clone to edit.
    #[error("Quote is read-only (status: {0}). Clone to edit.")]
    EditLocked(String),

    /// Auto-pricing found no frozen pricing set for the part. The caller
    /// must freeze a batch first.
    #[error("Part {part_id} has no frozen pricing set. Freeze a batch before quoting.")]
    NoFrozenPricing { part_id: i64 },

    /// Recomputed totals disagree with stored values beyond tolerance.
    /// Fatal: the transaction is aborted, inconsistent totals are never
    /// persisted.
    #[error("Data integrity error: {0}")]
    InvariantViolation(String),

    #[error("{0}")]
    DeleteForbidden(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "sent" => QuoteStatus::Sent,
            "approved" => QuoteStatus::Approved,
            "rejected" => QuoteStatus::Rejected,
            _ => QuoteStatus::Draft,
        }
    }

    pub fn is_editable(&self) -> bool {
        *self == QuoteStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    pub quote_number: String,
    pub partner_id: Option<i64>,

    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,

    pub status: QuoteStatus,
    pub sent_at: Option<NaiveDateTime>,
    pub approved_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,

    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub tax_percent: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,

    /// Written once on the transition to SENT; never recomputed afterwards.
    pub snapshot_data: Option<serde_json::Value>,

    pub notes: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub id: i64,
    pub quote_id: i64,
    pub part_id: Option<i64>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    pub quote_number: String,
    pub partner_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteHeaderUpdate {
    pub id: i64,
    pub partner_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,
    pub discount_percent: Option<Decimal>,
    pub tax_percent: Option<Decimal>,
    pub notes: Option<String>,
    pub version: i32,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteItem {
    pub quote_id: i64,
    pub part_id: Option<i64>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemUpdate {
    pub id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
    pub version: i32,
    pub updated_by: Option<String>,
}

/// Recomputed money columns persisted together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

// === Snapshot document (written on the transition to SENT) ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSnapshot {
    pub partner_number: String,
    pub company_name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemSnapshot {
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub quote_number: String,
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDateTime>,
    pub partner: Option<PartnerSnapshot>,
    pub items: Vec<QuoteItemSnapshot>,
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub tax_percent: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub sent_at: NaiveDateTime,
    pub sent_by: Option<String>,
}

// === Request-driven quote creation (part + batch matching) ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMatchInfo {
    pub batch_id: Option<i64>,
    pub batch_quantity: Option<i32>,
    pub status: BatchMatch,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartMatch {
    pub part_id: Option<i64>,
    pub part_number: Option<String>,
    pub part_exists: bool,
    pub article_number: String,
    pub drawing_number: Option<String>,
    pub name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub batch_match: BatchMatchInfo,
}
