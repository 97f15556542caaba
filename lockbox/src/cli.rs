//! Command line interface over the vault and monitor operations.
//!
//! Each subcommand maps to exactly one public operation so an external
//! scheduler (cron, systemd timer) can drive the whole system. Report
//! subcommands print the snapshot as JSON for the dashboard consumer.

use clap::{Parser, Subcommand};
use lockbox_common::{BackupConfig, BackupError, BackupResult};
use lockbox_monitor::Monitor;
use lockbox_vault::Vault;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lockbox", about = "Encrypted backup vault and health monitor", version)]
pub struct Cli {
    /// Path of the JSON configuration document.
    #[arg(long, global = true, default_value = "config/config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encrypt a single file.
    Encrypt {
        input: PathBuf,
        /// Output path (default: input with `.enc` appended).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decrypt a single file.
    Decrypt {
        input: PathBuf,
        /// Output path (default: input with `.enc` stripped).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Pack a directory into a tar container and encrypt it.
    EncryptDir {
        input: PathBuf,
        /// Output path (default: `<dir>.tar.enc`).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decrypt a directory archive and extract it.
    DecryptDir {
        input: PathBuf,
        /// Destination directory (default: input with `.enc` stripped).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a fresh key and re-encrypt every stored archive.
    RotateKeys,
    /// Print the storage usage report as JSON.
    Storage,
    /// Print the backup health report as JSON.
    Health,
    /// Run both checks and send alerts for anything out of bounds.
    Check,
}

pub async fn run(cli: Cli) -> BackupResult<()> {
    let config = BackupConfig::load(&cli.config);

    match cli.command {
        Command::Encrypt { input, output } => {
            let vault = Vault::open(config).await?;
            let written = vault.encrypt_file(&input, output.as_deref()).await?;
            println!("{}", written.display());
        }
        Command::Decrypt { input, output } => {
            let vault = Vault::open(config).await?;
            let written = vault.decrypt_file(&input, output.as_deref()).await?;
            println!("{}", written.display());
        }
        Command::EncryptDir { input, output } => {
            let vault = Vault::open(config).await?;
            let written = vault.encrypt_directory(&input, output.as_deref()).await?;
            println!("{}", written.display());
        }
        Command::DecryptDir { input, output } => {
            let vault = Vault::open(config).await?;
            let extracted = vault.decrypt_directory(&input, output.as_deref()).await?;
            println!("{}", extracted.display());
        }
        Command::RotateKeys => {
            let mut vault = Vault::open(config).await?;
            let outcome = vault.rotate_keys().await?;
            println!(
                "rotated {} archive(s), {} left under the old key",
                outcome.rotated,
                outcome.failed.len()
            );
            for path in &outcome.failed {
                eprintln!("  failed: {}", path.display());
            }
        }
        Command::Storage => {
            let monitor = Monitor::open(config)?;
            let report = monitor.check_storage_usage().await;
            println!("{}", to_json(&report)?);
        }
        Command::Health => {
            let monitor = Monitor::open(config)?;
            let report = monitor.check_backup_health().await;
            println!("{}", to_json(&report)?);
        }
        Command::Check => {
            let monitor = Monitor::open(config)?;
            monitor.check_and_alert().await;
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(report: &T) -> BackupResult<String> {
    serde_json::to_string_pretty(report).map_err(BackupError::from)
}
