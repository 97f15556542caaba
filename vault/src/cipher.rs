//! AES-256-GCM sealing of archive payloads.
//!
//! Wire layout: `[nonce: 12 bytes][ciphertext + tag]`. A fresh random nonce is
//! generated for every encryption.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead},
    Aes256Gcm, KeyInit,
};
use lockbox_common::{BackupError, BackupResult};
use rand::RngCore;

use crate::key::VaultKey;

/// AES-GCM nonce length in bytes.
pub(crate) const NONCE_LEN: usize = 12;

pub(crate) fn encrypt(key: &VaultKey, plaintext: &[u8]) -> BackupResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = GenericArray::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| BackupError::Crypto(format!("Encryption failed: {e}")))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub(crate) fn decrypt(key: &VaultKey, sealed: &[u8]) -> BackupResult<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(BackupError::Crypto(format!(
            "Ciphertext too short: {} bytes, need at least {NONCE_LEN}",
            sealed.len()
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let nonce = GenericArray::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| BackupError::Crypto("Decryption failed: wrong key or tampered data".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KEY_LEN;

    #[test]
    fn roundtrip() {
        let key = VaultKey::generate();
        let plaintext = b"the quick brown fox";
        let sealed = encrypt(&key, plaintext).unwrap();
        assert_ne!(&sealed[NONCE_LEN..], plaintext.as_slice());
        assert_eq!(decrypt(&key, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt(&VaultKey::generate(), b"secret").unwrap();
        let err = decrypt(&VaultKey::generate(), &sealed).unwrap_err();
        assert!(matches!(err, BackupError::Crypto(_)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = VaultKey::generate();
        let mut sealed = encrypt(&key, b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(matches!(
            decrypt(&key, &sealed),
            Err(BackupError::Crypto(_))
        ));
    }

    #[test]
    fn truncated_input_fails() {
        let key = VaultKey::generate();
        assert!(matches!(
            decrypt(&key, &[0u8; 4]),
            Err(BackupError::Crypto(_))
        ));
    }

    #[test]
    fn key_len_matches_aes256() {
        assert_eq!(KEY_LEN, 32);
    }
}
