//! Unified crate for the lockbox backup tools.
//!
//! Re-exports the encryption vault, the backup health monitor and the shared
//! configuration so consumers depend on a single crate.

pub mod cli;

pub use lockbox_common::{
    config::{BackupConfig, BackupSchedule, EmailConfig, Frequency},
    error::{BackupError, BackupResult},
    logging,
};
pub use lockbox_monitor::{
    AlertMailer, BackupEntry, BackupState, HealthReport, HealthState, Monitor, StorageState,
    StorageStatus,
};
pub use lockbox_vault::{KeyStore, RotationOutcome, Vault, VaultKey, ENCRYPTED_EXT};
