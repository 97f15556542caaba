//! Shared foundation for the lockbox backup tools: configuration loading,
//! the error taxonomy and logging initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BackupConfig, BackupSchedule, EmailConfig, Frequency};
pub use error::{BackupError, BackupResult};
