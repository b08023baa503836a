//! Startup configuration, read from the environment.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::numbering::QuoteNumberRange;
use crate::sync::SyncSettings;
use gestima_infor::InforConnection;

/// Application configuration. Read once at startup; the work-center mapping
/// is a JSON object `{"InforWcCode": "WorkCenterNumber"}`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub infor: InforConnection,
    pub wc_mapping: HashMap<String, String>,
    pub sync: SyncSettings,
    pub quote_number_range: QuoteNumberRange,
    pub uploads_dir: PathBuf,
    pub database_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let infor = InforConnection {
            base_url: require("INFOR_API_URL")?,
            config: std::env::var("INFOR_CONFIG").unwrap_or_else(|_| "TEST".to_string()),
            username: std::env::var("INFOR_USERNAME").unwrap_or_default(),
            password: std::env::var("INFOR_PASSWORD").unwrap_or_default(),
            accept_invalid_certs: std::env::var("INFOR_VERIFY_SSL")
                .map(|v| v == "0" || v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        };

        let wc_mapping = match std::env::var("INFOR_WC_MAPPING") {
            Ok(raw) if !raw.is_empty() => serde_json::from_str(&raw).map_err(|e| {
                Error::ConfigIO(format!("INFOR_WC_MAPPING is not a JSON object: {e}"))
            })?,
            _ => HashMap::new(),
        };

        let initial_lookback_days = std::env::var("INFOR_SYNC_INITIAL_LOOKBACK_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let quote_number_range = match std::env::var("QUOTE_NUMBER_RANGE").as_deref() {
            Ok("low") | Ok("50") => QuoteNumberRange::Low,
            _ => QuoteNumberRange::High,
        };

        Ok(Self {
            infor,
            wc_mapping,
            sync: SyncSettings {
                initial_lookback_days,
            },
            quote_number_range,
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("gestima.db")),
        })
    }
}

fn require(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::MissingConfigKey(key.to_string()))
}
