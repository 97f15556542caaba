//! Gzip compression of archive payloads.

use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use lockbox_common::{BackupError, BackupResult};
use std::io::Read;

pub(crate) fn compress(data: &[u8]) -> BackupResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(data, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| BackupError::Crypto(format!("Gzip compression failed: {e}")))?;
    Ok(compressed)
}

pub(crate) fn decompress(data: &[u8]) -> BackupResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| BackupError::Crypto(format!("Gzip decompression failed: {e}")))?;
    Ok(decompressed)
}
