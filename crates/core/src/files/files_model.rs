//! File store domain models.
//!
//! `FileRecord` is the physical blob registry: one record per file on disk.
//! `FileLink` carries the business metadata (primary flag, revision, link
//! type) and links a record to any entity through an opaque
//! `(entity_type, entity_id)` pair - there is no database-level foreign key
//! behind it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::audit::Audit;

/// File store errors.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unsupported file type: .{0}")]
    UnsupportedType(String),

    /// The content does not start with the magic bytes its extension
    /// promises. Security-critical check for pdf and step.
    #[error("Invalid {0} file (magic bytes check failed)")]
    MagicBytesMismatch(String),

    #[error("File too large (max {max_mb} MB for {file_type})")]
    FileTooLarge { file_type: String, max_mb: u64 },

    #[error("Empty file not allowed")]
    EmptyFile,

    /// No active FileRecord with this id.
    #[error("File not found: id {0}")]
    NotFound(i64),

    /// The record exists but the blob is gone from disk.
    #[error("File missing on disk: {0}")]
    MissingOnDisk(String),

    #[error("Link not found: file {file_id} -> {entity_type}:{entity_id}")]
    LinkNotFound {
        file_id: i64,
        entity_type: String,
        entity_id: i64,
    },
}

/// Lifecycle status of a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Awaiting attachment; subject to expiry collection.
    Temp,
    #[default]
    Active,
    Archived,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Temp => "temp",
            FileStatus::Active => "active",
            FileStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "temp" => FileStatus::Temp,
            "archived" => FileStatus::Archived,
            _ => FileStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    /// SHA-256 hex digest. Not unique - the same content may be uploaded
    /// more than once under different paths.
    pub file_hash: String,
    /// Path relative to the uploads root; unique.
    pub file_path: String,
    pub original_filename: String,
    pub file_size: i64,
    pub file_type: String,
    pub mime_type: String,
    pub status: FileStatus,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFileRecord {
    pub file_hash: String,
    pub file_path: String,
    pub original_filename: String,
    pub file_size: i64,
    pub file_type: String,
    pub mime_type: String,
    pub status: FileStatus,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLink {
    pub id: i64,
    pub file_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub is_primary: bool,
    pub revision: Option<String>,
    pub link_type: String,

    #[serde(flatten)]
    pub audit: Audit,
}

/// Parameters for the link UPSERT.
#[derive(Debug, Clone)]
pub struct FileLinkRequest {
    pub file_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub is_primary: bool,
    pub revision: Option<String>,
    pub link_type: String,
    pub created_by: Option<String>,
}

/// Everything a transport layer needs to stream a stored file.
#[derive(Debug, Clone)]
pub struct ServedFile {
    pub path: PathBuf,
    pub mime_type: String,
    pub filename: String,
    /// Always "inline": browsers render PDFs in-page instead of downloading.
    pub disposition: &'static str,
}
