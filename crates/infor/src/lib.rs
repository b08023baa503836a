//! Gestima Infor Crate
//!
//! Read-only client for the Infor CloudSuite Industrial IDO REST API.
//!
//! # Overview
//!
//! The crate supports:
//! - Token-based authentication with process-wide caching
//! - `LoadCollection` (reading rows from an IDO) with bookmark pagination
//! - `InvokeMethod` (IDO business methods)
//! - `GetIDOInfo` (field discovery)
//!
//! Responses from `LoadCollection` arrive in several shapes (object rows,
//! positional arrays, name/value pair arrays); the client normalizes all of
//! them into uniform map rows before they reach any importer.
//!
//! # Safety
//!
//! The client refuses to be constructed against a production configuration
//! (`LIVE`, `PROD`, `PRODUCTION`, `SL`). This is a hard constructor error so a
//! misconfigured deployment cannot touch production data.

pub mod client;
pub mod errors;
pub mod filter;
pub mod models;

pub use client::{InforApiClient, InforClientTrait, InforConnection};
pub use errors::InforError;
pub use filter::format_filter_datetime;
pub use models::{CollectionPage, CollectionRequest, LoadType, RawRow};
