//! Backup health monitor.
//!
//! Read-only auditing of a backup directory: storage usage for its partition,
//! per-date archive presence and integrity against the configured retention
//! calendar, and email alerting when either check crosses a threshold.
//!
//! Report operations never panic or return `Err`; unexpected failures are
//! embedded in the returned report (`status: error`) so a scheduled caller in
//! a long-lived process keeps running.

mod alert;
mod monitor;
mod report;

pub use alert::AlertMailer;
pub use monitor::Monitor;
pub use report::{BackupEntry, BackupState, HealthReport, HealthState, StorageState, StorageStatus};
