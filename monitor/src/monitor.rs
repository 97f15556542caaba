//! The backup health monitor.

use chrono::{DateTime, Duration, Local};
use lockbox_common::{BackupConfig, BackupError, BackupResult, Frequency};
use log::{error, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use walkdir::WalkDir;

use crate::alert::AlertMailer;
use crate::report::{
    BackupEntry, BackupState, HealthReport, HealthState, StorageState, StorageStatus,
};

/// Storage usage above this percentage flips the storage status to warning.
const STORAGE_WARNING_PERCENT: f64 = 80.0;

/// How much of each archive is hashed for the integrity fingerprint.
const FINGERPRINT_PREFIX_LEN: u64 = 1024 * 1024;

/// Read-only monitor over the backup directory described by a configuration.
///
/// Shares no runtime state with the vault; the two communicate only through
/// the archives on disk.
pub struct Monitor {
    config: BackupConfig,
    mailer: AlertMailer,
}

impl Monitor {
    /// Build a monitor, ensuring the backup location exists.
    pub fn open(config: BackupConfig) -> BackupResult<Self> {
        std::fs::create_dir_all(&config.backup_location)?;
        let mailer = AlertMailer::new(config.email_notifications.clone());
        Ok(Self { config, mailer })
    }

    /// Storage usage of the partition holding the backup location, plus the
    /// logical size of the backups themselves.
    ///
    /// Pure read; unexpected failures come back as `status: error` instead of
    /// an `Err`, so a scheduled caller never crashes here.
    pub async fn check_storage_usage(&self) -> StorageStatus {
        match self.storage_snapshot().await {
            Ok(status) => status,
            Err(e) => {
                error!("Error checking storage usage: {e}");
                StorageStatus::failed(e.to_string())
            }
        }
    }

    async fn storage_snapshot(&self) -> BackupResult<StorageStatus> {
        let canonical = tokio::fs::canonicalize(&self.config.backup_location).await?;

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|d| canonical.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| {
                BackupError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("No disk found for {}", canonical.display()),
                ))
            })?;

        let total_space = disk.total_space();
        if total_space == 0 {
            return Err(BackupError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Disk at {} reports zero capacity", disk.mount_point().display()),
            )));
        }

        let free_space = disk.available_space();
        let used_space = total_space.saturating_sub(free_space);
        let usage_percent = used_space as f64 / total_space as f64 * 100.0;

        Ok(StorageStatus {
            total_space,
            used_space,
            free_space,
            usage_percent,
            backup_size: directory_size(&canonical),
            status: storage_state(usage_percent),
            error: None,
        })
    }

    /// Audit archive presence and integrity for every expected backup date.
    ///
    /// Expected dates walk back from now at the configured cadence for
    /// `retention_period` steps. Read-only, performs no repair.
    pub async fn check_backup_health(&self) -> HealthReport {
        let schedule = &self.config.backup_schedule;
        let step = match schedule.frequency {
            Frequency::Daily => Duration::days(1),
            Frequency::Weekly => Duration::weeks(1),
        };

        let now = Local::now();
        let mut entries = Vec::with_capacity(schedule.retention_period as usize);
        for i in 0..schedule.retention_period {
            let date = step
                .checked_mul(i as i32)
                .and_then(|offset| now.checked_sub_signed(offset));
            let Some(date) = date else {
                return HealthReport::failed(format!(
                    "Retention step {i} exceeds the representable time range"
                ));
            };
            let path = self.archive_path(date);
            entries.push(inspect_archive(path, date).await);
        }

        HealthReport::from_entries(entries)
    }

    /// Send a plain-text alert through the configured email channel.
    ///
    /// No-op returning `false` when notifications are disabled; transport
    /// failures also degrade to `false` with a logged cause.
    pub async fn send_alert(&self, subject: &str, message: &str) -> bool {
        self.mailer.send(subject, message).await
    }

    /// Run both checks and alert on anything out of bounds.
    ///
    /// Every invocation that finds a bad state re-sends; there is no
    /// deduplication across calls.
    pub async fn check_and_alert(&self) {
        let storage = self.check_storage_usage().await;
        if storage.status == StorageState::Warning {
            let free_gib = storage.free_space as f64 / (1024.0 * 1024.0 * 1024.0);
            self.send_alert(
                "Backup Storage Warning",
                &format!(
                    "Backup storage usage is at {:.1}%.\nFree space: {free_gib:.1} GB",
                    storage.usage_percent
                ),
            )
            .await;
        }

        let health = self.check_backup_health().await;
        if matches!(
            health.overall_status,
            HealthState::Warning | HealthState::Critical
        ) {
            self.send_alert(
                "Backup Health Warning",
                &format!(
                    "Backup health check failed:\n\
                     Status: {}\n\
                     Healthy backups: {}\n\
                     Corrupted backups: {}\n\
                     Missing backups: {}",
                    health.overall_status,
                    health.healthy_backups,
                    health.corrupted_backups,
                    health.missing_backups
                ),
            )
            .await;
        }
    }

    /// Deterministic archive path for a backup date: `backup_<YYYYMMDD>.enc`.
    ///
    /// This exact pattern is shared with the vault's output naming and must
    /// stay bit-for-bit stable for existing archives to keep matching.
    fn archive_path(&self, date: DateTime<Local>) -> PathBuf {
        self.config
            .backup_location
            .join(format!("backup_{}.enc", date.format("%Y%m%d")))
    }
}

fn storage_state(usage_percent: f64) -> StorageState {
    if usage_percent > STORAGE_WARNING_PERCENT {
        StorageState::Warning
    } else {
        StorageState::Ok
    }
}

fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Classify one expected archive: missing, healthy or corrupted.
async fn inspect_archive(path: PathBuf, date: DateTime<Local>) -> BackupEntry {
    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return BackupEntry {
                date,
                path,
                status: BackupState::Missing,
                size: 0,
                last_modified: None,
                fingerprint: None,
                error: None,
            };
        }
        Err(e) => {
            warn!("Error inspecting archive {}: {e}", path.display());
            return BackupEntry {
                date,
                path,
                status: BackupState::Corrupted,
                size: 0,
                last_modified: None,
                fingerprint: None,
                error: Some(e.to_string()),
            };
        }
    };

    let last_modified = meta.modified().ok().map(DateTime::<Local>::from);

    match fingerprint(&path).await {
        Ok(fp) => BackupEntry {
            date,
            path,
            status: BackupState::Healthy,
            size: meta.len(),
            last_modified,
            fingerprint: Some(fp),
            error: None,
        },
        Err(e) => {
            warn!("Archive {} failed integrity read: {e}", path.display());
            BackupEntry {
                date,
                path,
                status: BackupState::Corrupted,
                size: meta.len(),
                last_modified,
                fingerprint: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// SHA-256 over the first mebibyte of the archive.
async fn fingerprint(path: &Path) -> std::io::Result<String> {
    use tokio::io::AsyncReadExt;

    let file = tokio::fs::File::open(path).await?;
    let mut prefix = Vec::new();
    file.take(FINGERPRINT_PREFIX_LEN)
        .read_to_end(&mut prefix)
        .await?;
    Ok(hex::encode(Sha256::digest(&prefix)))
}
