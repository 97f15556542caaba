//! Configuration for the vault and the monitor.
//!
//! Loaded once from a JSON document and treated as immutable for the lifetime
//! of every component constructed from it; changing the configuration means
//! reconstructing the component. Loading is lenient: a missing or malformed
//! document degrades to the defaults with a logged warning rather than a hard
//! failure, so an unattended scheduler keeps running.

use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration shared by the vault and the monitor.
///
/// Unknown keys in the document are ignored; missing keys take the defaults
/// below.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory where encrypted archives live.
    #[serde(default = "default_backup_location")]
    pub backup_location: PathBuf,
    /// Path of the persisted symmetric key, distinct from the backup location.
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
    /// Gzip plaintext before encrypting.
    #[serde(default = "default_compress_backups")]
    pub compress_backups: bool,
    /// Abort key rotation wholesale on the first failing archive instead of
    /// rotating what it can and persisting the new key regardless.
    #[serde(default)]
    pub atomic_key_rotation: bool,
    #[serde(default)]
    pub backup_schedule: BackupSchedule,
    #[serde(default)]
    pub email_notifications: EmailConfig,
}

/// Expected backup cadence and how many backup points to audit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupSchedule {
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_retention_period")]
    pub retention_period: u32,
}

/// Backup cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

/// SMTP alert settings, consumed only by the alert-dispatch operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub recipient_email: String,
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_backup_location() -> PathBuf {
    PathBuf::from("backups")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("config/backup.key")
}

fn default_compress_backups() -> bool {
    true
}

fn default_retention_period() -> u32 {
    7
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_location: default_backup_location(),
            key_path: default_key_path(),
            compress_backups: default_compress_backups(),
            atomic_key_rotation: false,
            backup_schedule: BackupSchedule::default(),
            email_notifications: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender_email: String::new(),
            recipient_email: String::new(),
            smtp_server: String::new(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            use_tls: default_use_tls(),
        }
    }
}

impl Default for BackupSchedule {
    fn default() -> Self {
        Self {
            frequency: Frequency::default(),
            retention_period: default_retention_period(),
        }
    }
}

impl BackupConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing file or malformed JSON degrades to the defaults with a logged
    /// warning; this never fails.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    error!("Invalid JSON in config file {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found: {}", path.display());
                Self::default()
            }
            Err(e) => {
                error!("Error reading config file {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
