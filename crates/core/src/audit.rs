//! Audit envelope shared by every mutable entity.
//!
//! Carries creation/update/deletion metadata plus the optimistic-concurrency
//! version counter. "Active" queries always filter on `deleted_at IS NULL`;
//! the storage layer increments `version` on every successful write and
//! rejects writes whose expected version does not match.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl Audit {
    pub fn new(created_by: Option<&str>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            created_at: now,
            updated_at: now,
            created_by: created_by.map(str::to_string),
            updated_by: created_by.map(str::to_string),
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    /// Marks a modification: bumps `updated_at`, `updated_by` and `version`.
    pub fn touch(&mut self, updated_by: Option<&str>) {
        self.updated_at = Utc::now().naive_utc();
        if let Some(user) = updated_by {
            self.updated_by = Some(user.to_string());
        }
        self.version += 1;
    }

    /// Soft delete: the row is tombstoned, never physically removed here.
    pub fn tombstone(&mut self, deleted_by: Option<&str>) {
        self.deleted_at = Some(Utc::now().naive_utc());
        self.deleted_by = deleted_by.map(str::to_string);
        self.touch(deleted_by);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_bumps_version() {
        let mut audit = Audit::new(Some("alice"));
        assert_eq!(audit.version, 1);
        audit.touch(Some("bob"));
        assert_eq!(audit.version, 2);
        assert_eq!(audit.updated_by.as_deref(), Some("bob"));
        assert_eq!(audit.created_by.as_deref(), Some("alice"));
    }

    #[test]
    fn test_tombstone_sets_deleted_fields() {
        let mut audit = Audit::new(None);
        assert!(!audit.is_deleted());
        audit.tombstone(Some("admin"));
        assert!(audit.is_deleted());
        assert_eq!(audit.deleted_by.as_deref(), Some("admin"));
        assert_eq!(audit.version, 2);
    }
}
