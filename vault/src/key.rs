//! Symmetric key material and its on-disk store.
//!
//! The key is a 32-byte AES-256 secret persisted base64-encoded at a fixed
//! path distinct from the backup location. Exactly one active key exists at a
//! time; the store has no versioning, a rotation fully replaces the blob.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lockbox_common::{BackupError, BackupResult};
use log::{debug, info};
use rand::RngCore;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Active symmetric key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn decode(encoded: &[u8]) -> BackupResult<Self> {
        let text = std::str::from_utf8(encoded)
            .map_err(|e| BackupError::Crypto(format!("Invalid key encoding: {e}")))?;
        let raw = BASE64
            .decode(text.trim())
            .map_err(|e| BackupError::Crypto(format!("Invalid key encoding: {e}")))?;
        let mut bytes: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| {
                BackupError::Crypto(format!(
                    "Invalid key length: expected {KEY_LEN}, got {}",
                    raw.len()
                ))
            })?;
        let key = Self { bytes };
        bytes.zeroize();
        Ok(key)
    }

    fn encode(&self) -> String {
        BASE64.encode(self.bytes)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

/// On-disk key store at a fixed path.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted key, or generate and persist a fresh one if the
    /// store is empty.
    ///
    /// A present but undecodable key file is a `Crypto` error, never silently
    /// replaced: regenerating here would orphan every existing archive.
    pub async fn load_or_generate(&self) -> BackupResult<VaultKey> {
        match tokio::fs::read(&self.path).await {
            Ok(encoded) => {
                debug!("Loaded encryption key from {}", self.path.display());
                VaultKey::decode(&encoded)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = VaultKey::generate();
                self.persist(&key).await?;
                info!("Generated new encryption key at {}", self.path.display());
                Ok(key)
            }
            Err(e) => Err(BackupError::Crypto(format!(
                "Error loading key from {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Persist a key, replacing any previous blob.
    pub async fn persist(&self, key: &VaultKey) -> BackupResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, key.encode()).await?;

        // Only the owner may read the key material.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_once_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("backup.key"));

        let first = store.load_or_generate().await.unwrap();
        let second = store.load_or_generate().await.unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[tokio::test]
    async fn garbage_key_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.key");
        tokio::fs::write(&path, b"not base64 at all!!").await.unwrap();

        let err = KeyStore::new(&path).load_or_generate().await.unwrap_err();
        assert!(matches!(err, BackupError::Crypto(_)));
    }

    #[tokio::test]
    async fn persist_replaces_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("backup.key"));

        let old = store.load_or_generate().await.unwrap();
        let new = VaultKey::generate();
        store.persist(&new).await.unwrap();

        let loaded = store.load_or_generate().await.unwrap();
        assert_eq!(loaded.as_bytes(), new.as_bytes());
        assert_ne!(loaded.as_bytes(), old.as_bytes());
    }
}
