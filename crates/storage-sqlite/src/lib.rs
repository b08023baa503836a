//! SQLite storage implementation for Gestima.
//!
//! All database-related functionality lives here, built on Diesel with
//! SQLite: connection pooling, embedded migrations, the single-writer
//! actor, and the repository implementations for every domain trait from
//! `gestima-core`.
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel exists.
//! Everything above it is database-agnostic and works with traits:
//!
//! ```text
//!   core (domain)        infor (ERP client)
//!        │                      │
//!        └──────────┬───────────┘
//!                   │
//!                   ▼
//!          storage-sqlite (this crate)
//!                   │
//!                   ▼
//!               SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

// Repository implementations
pub mod batches;
pub mod files;
pub mod materials;
pub mod numbering;
pub mod operations;
pub mod partners;
pub mod parts;
pub mod production;
pub mod quotes;
pub mod sync;
pub mod work_centers;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repository types for wiring
pub use batches::BatchRepository;
pub use files::FileRepository;
pub use materials::MaterialRepository;
pub use numbering::NumberingRepository;
pub use operations::OperationRepository;
pub use partners::PartnerRepository;
pub use parts::PartRepository;
pub use production::ProductionRepository;
pub use quotes::QuoteRepository;
pub use sync::{SyncLogRepository, SyncStateRepository};
pub use work_centers::WorkCenterRepository;

// Re-export from gestima-core for convenience
pub use gestima_core::errors::{DatabaseError, Error, Result};
