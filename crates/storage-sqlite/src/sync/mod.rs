mod model;
mod repository;

pub use repository::{SyncLogRepository, SyncStateRepository};
