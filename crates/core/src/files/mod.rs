//! Files module - deduplicating blob store with polymorphic entity links.

mod files_model;
mod files_service;
mod files_traits;
pub mod validation;

pub use files_model::{
    FileError, FileLink, FileLinkRequest, FileRecord, FileStatus, NewFileRecord, ServedFile,
};
pub use files_service::{sha256_hex, FileService, StoreBytes, TEMP_EXPIRY_HOURS};
pub use files_traits::FileRepositoryTrait;

#[cfg(test)]
mod files_service_tests;
