//! Encryption vault for backup archives.
//!
//! Turns plaintext files and directories into encrypted, optionally gzipped
//! archives and reverses the transform. A single symmetric key, persisted
//! outside the backup location, is owned by the [`Vault`] instance; key
//! rotation re-encrypts every stored archive under a fresh key.
//!
//! No internal locking: callers must serialize a rotation against any other
//! vault operation on the same key path and backup directory.

mod archive;
mod cipher;
mod compress;
mod key;
mod vault;

pub use key::{KeyStore, VaultKey, KEY_LEN};
pub use vault::{RotationOutcome, Vault, ENCRYPTED_EXT};
