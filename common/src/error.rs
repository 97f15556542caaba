use thiserror::Error;

/// Errors shared by the vault and the monitor.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Missing input path, unwritable output path, filesystem exhaustion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key load/generate failure or encryption/decryption primitive failure
    /// (tampered ciphertext, wrong key).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Malformed directory-archive container on extraction.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Malformed configuration document.
    #[error("Config error: {0}")]
    Config(String),

    /// Key rotation aborted without replacing the active key.
    #[error("Key rotation error: {0}")]
    KeyRotation(String),

    /// Alert transport failure (SMTP connect, auth, send).
    #[error("Alert error: {0}")]
    Alert(String),
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        BackupError::Config(err.to_string())
    }
}

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;
