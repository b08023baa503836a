//! Recovery module - re-attach orphaned drawing files to parts.

mod share_recovery;

pub use share_recovery::{RecoveryReport, ShareRecoveryImporter};
