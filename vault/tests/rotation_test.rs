//! Key rotation under both policies.

use lockbox_common::{BackupConfig, BackupError};
use lockbox_vault::Vault;
use std::path::{Path, PathBuf};

fn test_config(root: &Path, atomic: bool) -> BackupConfig {
    let mut config = BackupConfig::default();
    config.backup_location = root.join("backups");
    config.key_path = root.join("config/backup.key");
    config.atomic_key_rotation = atomic;
    config
}

/// Encrypt `body` into `backups/<name>` and return the archive path.
async fn store_archive(vault: &Vault, root: &Path, name: &str, body: &[u8]) -> PathBuf {
    let backups = root.join("backups");
    tokio::fs::create_dir_all(&backups).await.unwrap();

    let plain = root.join("scratch.txt");
    tokio::fs::write(&plain, body).await.unwrap();

    let archive = backups.join(name);
    vault.encrypt_file(&plain, Some(&archive)).await.unwrap();
    archive
}

#[tokio::test]
async fn rotation_moves_archives_to_the_new_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);

    let mut vault = Vault::open(config.clone()).await.unwrap();
    let archive = store_archive(&vault, dir.path(), "backup_20260101.enc", b"january").await;

    let old_key_blob = tokio::fs::read(&config.key_path).await.unwrap();
    let outcome = vault.rotate_keys().await.unwrap();
    assert_eq!(outcome.rotated, 1);
    assert!(outcome.failed.is_empty());
    assert_ne!(tokio::fs::read(&config.key_path).await.unwrap(), old_key_blob);

    // A vault opened against the persisted (new) key decrypts the archive.
    let fresh = Vault::open(config.clone()).await.unwrap();
    let restored = dir.path().join("restored.txt");
    fresh.decrypt_file(&archive, Some(&restored)).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"january");

    // A vault forced back onto the old key does not.
    tokio::fs::write(&config.key_path, &old_key_blob).await.unwrap();
    let stale = Vault::open(config).await.unwrap();
    let err = stale.decrypt_file(&archive, Some(&restored)).await.unwrap_err();
    assert!(matches!(err, BackupError::Crypto(_)));
}

#[tokio::test]
async fn rotating_vault_keeps_decrypting_without_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut vault = Vault::open(test_config(dir.path(), false)).await.unwrap();
    let archive = store_archive(&vault, dir.path(), "backup_20260102.enc", b"february").await;

    vault.rotate_keys().await.unwrap();

    let restored = dir.path().join("restored.txt");
    vault.decrypt_file(&archive, Some(&restored)).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"february");
}

#[tokio::test]
async fn availability_rotation_skips_bad_archives_and_persists_anyway() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);

    let mut vault = Vault::open(config.clone()).await.unwrap();
    let good = store_archive(&vault, dir.path(), "backup_20260103.enc", b"march").await;

    // Not ciphertext at all; decryption with any key fails.
    let bad = dir.path().join("backups/backup_20251225.enc");
    tokio::fs::write(&bad, b"zzzz not sealed zzzz").await.unwrap();

    let old_key_blob = tokio::fs::read(&config.key_path).await.unwrap();
    let outcome = vault.rotate_keys().await.unwrap();
    assert_eq!(outcome.rotated, 1);
    assert_eq!(outcome.failed, vec![bad.clone()]);

    // The new key was persisted regardless of the failure.
    assert_ne!(tokio::fs::read(&config.key_path).await.unwrap(), old_key_blob);

    // The good archive rotated; the bad one is byte-identical.
    let fresh = Vault::open(config).await.unwrap();
    let restored = dir.path().join("restored.txt");
    fresh.decrypt_file(&good, Some(&restored)).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"march");
    assert_eq!(
        tokio::fs::read(&bad).await.unwrap(),
        b"zzzz not sealed zzzz"
    );
}

#[tokio::test]
async fn atomic_rotation_aborts_wholesale_on_a_bad_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);

    let mut vault = Vault::open(config.clone()).await.unwrap();
    let good = store_archive(&vault, dir.path(), "backup_20260104.enc", b"april").await;

    let bad = dir.path().join("backups/backup_20251226.enc");
    tokio::fs::write(&bad, b"garbage").await.unwrap();

    let old_key_blob = tokio::fs::read(&config.key_path).await.unwrap();
    let err = vault.rotate_keys().await.unwrap_err();
    assert!(matches!(err, BackupError::KeyRotation(_)));

    // Old key still active on disk, good archive untouched and decryptable.
    assert_eq!(tokio::fs::read(&config.key_path).await.unwrap(), old_key_blob);
    let reopened = Vault::open(config).await.unwrap();
    let restored = dir.path().join("restored.txt");
    reopened.decrypt_file(&good, Some(&restored)).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"april");

    // No staging files left behind.
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir.path().join("backups")).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name());
    }
    assert!(names.iter().all(|n| !n.to_string_lossy().ends_with(".rotate")));
}

#[tokio::test]
async fn rotation_over_an_empty_backup_dir_still_replaces_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);

    let mut vault = Vault::open(config.clone()).await.unwrap();
    let old_key_blob = tokio::fs::read(&config.key_path).await.unwrap();

    let outcome = vault.rotate_keys().await.unwrap();
    assert_eq!(outcome.rotated, 0);
    assert!(outcome.failed.is_empty());
    assert_ne!(tokio::fs::read(&config.key_path).await.unwrap(), old_key_blob);
}
