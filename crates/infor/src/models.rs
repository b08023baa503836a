//! Request and response models for the IDO client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single normalized IDO row: property name → value.
pub type RawRow = serde_json::Map<String, Value>;

/// Pagination load type for `LoadCollection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadType {
    First,
    Next,
    Previous,
    Last,
}

impl LoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::First => "FIRST",
            LoadType::Next => "NEXT",
            LoadType::Previous => "PREVIOUS",
            LoadType::Last => "LAST",
        }
    }
}

/// Parameters for a `LoadCollection` call.
///
/// `record_cap` semantics follow the IDO API: `0` = unlimited, `-1` = don't
/// send the parameter (API default of 200 applies), any positive value is an
/// explicit limit.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub ido_name: String,
    pub properties: Vec<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub record_cap: i64,
    pub load_type: Option<LoadType>,
    pub bookmark: Option<String>,
    pub distinct: bool,
}

impl CollectionRequest {
    pub fn new(ido_name: impl Into<String>, properties: &[&str]) -> Self {
        Self {
            ido_name: ido_name.into(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
            filter: None,
            order_by: None,
            record_cap: 0,
            load_type: None,
            bookmark: None,
            distinct: false,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_record_cap(mut self, record_cap: i64) -> Self {
        self.record_cap = record_cap;
        self
    }

    pub fn with_bookmark(mut self, bookmark: Option<String>) -> Self {
        self.load_type = bookmark.as_ref().map(|_| LoadType::Next);
        self.bookmark = bookmark;
        self
    }
}

/// One page of `LoadCollection` results.
#[derive(Debug, Clone, Default)]
pub struct CollectionPage {
    pub data: Vec<RawRow>,
    pub bookmark: Option<String>,
    pub has_more: bool,
}
