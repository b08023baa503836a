//! Shared conversion helpers for DB models.

use chrono::NaiveDateTime;
use gestima_core::audit::Audit;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Money columns are stored as TEXT to keep Decimal exactness.
pub(crate) fn dec_to_db(value: Decimal) -> String {
    value.to_string()
}

/// Tolerant parse: a corrupted money column logs and falls back to zero
/// instead of poisoning every read of the row.
pub(crate) fn dec_from_db(value: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value) {
        Ok(decimal) => decimal,
        Err(e) => {
            log::error!("Failed to parse {field_name} '{value}' as Decimal: {e}");
            Decimal::ZERO
        }
    }
}

pub(crate) fn opt_dec_to_db(value: Option<Decimal>) -> Option<String> {
    value.map(dec_to_db)
}

pub(crate) fn opt_dec_from_db(value: Option<&String>, field_name: &str) -> Option<Decimal> {
    value.map(|v| dec_from_db(v, field_name))
}

/// Audit column tuple shared by every audited table, in schema order.
pub(crate) type AuditColumns = (
    NaiveDateTime,
    NaiveDateTime,
    Option<String>,
    Option<String>,
    Option<NaiveDateTime>,
    Option<String>,
    i32,
);

pub(crate) fn audit_from_columns(columns: AuditColumns) -> Audit {
    let (created_at, updated_at, created_by, updated_by, deleted_at, deleted_by, version) =
        columns;
    Audit {
        created_at,
        updated_at,
        created_by,
        updated_by,
        deleted_at,
        deleted_by,
        version,
    }
}
