//! Report types returned by the monitor.
//!
//! Everything here is `Serialize` so external consumers (dashboard, CLI) can
//! republish the snapshots as JSON verbatim. Reports are computed, never
//! persisted.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// Partition-level storage snapshot for the backup location.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub total_space: u64,
    pub used_space: u64,
    pub free_space: u64,
    pub usage_percent: f64,
    /// Logical size of everything under the backup directory.
    pub backup_size: u64,
    pub status: StorageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageState {
    Ok,
    Warning,
    Error,
}

impl StorageStatus {
    pub(crate) fn failed(message: String) -> Self {
        Self {
            total_space: 0,
            used_space: 0,
            free_space: 0,
            usage_percent: 0.0,
            backup_size: 0,
            status: StorageState::Error,
            error: Some(message),
        }
    }
}

/// One expected backup point, classified.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub date: DateTime<Local>,
    pub path: PathBuf,
    pub status: BackupState,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Local>>,
    /// SHA-256 of the first mebibyte, a cheap gross-corruption signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupState {
    Healthy,
    Corrupted,
    Missing,
}

/// Audit of every expected backup point in the retention window.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub total_backups: usize,
    pub healthy_backups: usize,
    pub corrupted_backups: usize,
    pub missing_backups: usize,
    pub backups: Vec<BackupEntry>,
    pub overall_status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Warning,
    Critical,
    Error,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HealthState::Healthy => "healthy",
            HealthState::Warning => "warning",
            HealthState::Critical => "critical",
            HealthState::Error => "error",
        };
        f.write_str(name)
    }
}

impl HealthReport {
    /// Aggregate per-entry classifications.
    ///
    /// Precedence: any corrupted archive is `critical`; otherwise any missing
    /// one is `warning`; otherwise `healthy`.
    pub(crate) fn from_entries(backups: Vec<BackupEntry>) -> Self {
        let healthy = count(&backups, BackupState::Healthy);
        let corrupted = count(&backups, BackupState::Corrupted);
        let missing = count(&backups, BackupState::Missing);

        let overall_status = if corrupted > 0 {
            HealthState::Critical
        } else if missing > 0 {
            HealthState::Warning
        } else {
            HealthState::Healthy
        };

        Self {
            total_backups: backups.len(),
            healthy_backups: healthy,
            corrupted_backups: corrupted,
            missing_backups: missing,
            backups,
            overall_status,
            error: None,
        }
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            total_backups: 0,
            healthy_backups: 0,
            corrupted_backups: 0,
            missing_backups: 0,
            backups: Vec::new(),
            overall_status: HealthState::Error,
            error: Some(message),
        }
    }
}

fn count(backups: &[BackupEntry], state: BackupState) -> usize {
    backups.iter().filter(|b| b.status == state).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: BackupState) -> BackupEntry {
        BackupEntry {
            date: Local::now(),
            path: PathBuf::from("backups/backup_20260101.enc"),
            status,
            size: 0,
            last_modified: None,
            fingerprint: None,
            error: None,
        }
    }

    #[test]
    fn corrupted_outranks_missing() {
        let report = HealthReport::from_entries(vec![
            entry(BackupState::Healthy),
            entry(BackupState::Missing),
            entry(BackupState::Corrupted),
        ]);
        assert_eq!(report.overall_status, HealthState::Critical);
        assert_eq!(report.healthy_backups, 1);
        assert_eq!(report.missing_backups, 1);
        assert_eq!(report.corrupted_backups, 1);
        assert_eq!(report.total_backups, 3);
    }

    #[test]
    fn missing_alone_is_warning() {
        let report =
            HealthReport::from_entries(vec![entry(BackupState::Healthy), entry(BackupState::Missing)]);
        assert_eq!(report.overall_status, HealthState::Warning);
    }

    #[test]
    fn all_healthy() {
        let report = HealthReport::from_entries(vec![entry(BackupState::Healthy)]);
        assert_eq!(report.overall_status, HealthState::Healthy);
    }

    #[test]
    fn states_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&HealthState::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(serde_json::to_string(&StorageState::Ok).unwrap(), "\"ok\"");
    }
}
