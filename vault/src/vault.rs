//! The encryption vault: file/directory encryption and key rotation.

use lockbox_common::{BackupConfig, BackupError, BackupResult};
use log::{error, info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive;
use crate::cipher;
use crate::compress;
use crate::key::{KeyStore, VaultKey};

/// Extension of encrypted archive files.
pub const ENCRYPTED_EXT: &str = "enc";

/// First byte of the authenticated plaintext: how the payload is framed.
const MARKER_RAW: u8 = 0x00;
const MARKER_GZIP: u8 = 0x01;

/// What a key rotation accomplished.
#[derive(Debug, Default)]
pub struct RotationOutcome {
    /// Archives re-encrypted under the new key.
    pub rotated: usize,
    /// Archives left under the old key (availability policy only).
    pub failed: Vec<PathBuf>,
}

/// Encryption vault over a backup directory and a persisted symmetric key.
///
/// The key is loaded (or generated) once at construction and owned
/// exclusively by this instance. Rotation mutates the key store; callers must
/// not run a rotation concurrently with any other operation on the same key
/// path or backup directory.
pub struct Vault {
    config: BackupConfig,
    store: KeyStore,
    key: VaultKey,
}

impl Vault {
    /// Open the vault described by `config`, loading the persisted key or
    /// generating one on first use.
    pub async fn open(config: BackupConfig) -> BackupResult<Self> {
        let store = KeyStore::new(config.key_path.clone());
        let key = store.load_or_generate().await?;
        Ok(Self { config, store, key })
    }

    /// Encrypt a single file.
    ///
    /// The whole input is read into memory, gzipped when `compress_backups`
    /// is set, sealed under the active key and written via a temporary file
    /// plus atomic rename. The input is left untouched. Default output:
    /// input path with `.enc` appended.
    pub async fn encrypt_file(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> BackupResult<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| append_extension(input, ENCRYPTED_EXT));

        let data = tokio::fs::read(input).await?;

        let mut payload;
        if self.config.compress_backups {
            let packed = compress::compress(&data)?;
            payload = Vec::with_capacity(1 + packed.len());
            payload.push(MARKER_GZIP);
            payload.extend_from_slice(&packed);
        } else {
            payload = Vec::with_capacity(1 + data.len());
            payload.push(MARKER_RAW);
            payload.extend_from_slice(&data);
        }

        let sealed = cipher::encrypt(&self.key, &payload)?;
        write_atomic(&output, &sealed).await?;

        info!("Encrypted {} -> {}", input.display(), output.display());
        Ok(output)
    }

    /// Decrypt a single file.
    ///
    /// The payload marker written by [`Vault::encrypt_file`] decides whether
    /// the decrypted bytes are gunzipped or written raw. Default output:
    /// input path with a trailing `.enc` stripped, else `.dec` appended.
    pub async fn decrypt_file(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> BackupResult<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| strip_encrypted_extension(input));

        let sealed = tokio::fs::read(input).await?;
        let payload = cipher::decrypt(&self.key, &sealed)?;

        let data = match payload.split_first() {
            Some((&MARKER_GZIP, rest)) => compress::decompress(rest)?,
            Some((&MARKER_RAW, rest)) => rest.to_vec(),
            Some((&marker, _)) => {
                return Err(BackupError::Crypto(format!(
                    "Unknown payload marker: {marker:#04x}"
                )))
            }
            None => return Err(BackupError::Crypto("Empty payload".into())),
        };

        write_atomic(&output, &data).await?;

        info!("Decrypted {} -> {}", input.display(), output.display());
        Ok(output)
    }

    /// Encrypt a whole directory.
    ///
    /// The directory is packed into a temporary tar container next to it,
    /// the container is encrypted like a single file, then removed (the
    /// removal on the failure path is best-effort). Default output:
    /// `<dir>.tar.enc`.
    pub async fn encrypt_directory(
        &self,
        input_dir: &Path,
        output: Option<&Path>,
    ) -> BackupResult<PathBuf> {
        let meta = tokio::fs::metadata(input_dir).await?;
        if !meta.is_dir() {
            return Err(BackupError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a directory: {}", input_dir.display()),
            )));
        }

        let container = append_extension(input_dir, "tar");
        archive::pack_to_file(input_dir, &container)?;

        let result = self.encrypt_file(&container, output).await;

        if let Err(e) = tokio::fs::remove_file(&container).await {
            warn!(
                "Failed to remove temporary container {}: {e}",
                container.display()
            );
        }

        result
    }

    /// Decrypt a directory archive.
    ///
    /// The ciphertext is decrypted into a scratch directory and the contained
    /// tar is extracted into `output_dir`. Default output dir: input path
    /// with `.enc` stripped.
    pub async fn decrypt_directory(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
    ) -> BackupResult<PathBuf> {
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| strip_encrypted_extension(input));

        let scratch = tempfile::tempdir()?;
        let container = scratch.path().join("decrypted.tar");

        self.decrypt_file(input, Some(&container)).await?;
        archive::unpack_file(&container, &output_dir)?;

        info!(
            "Extracted directory archive {} -> {}",
            input.display(),
            output_dir.display()
        );
        Ok(output_dir)
    }

    /// Replace the active key and re-encrypt every archive under the backup
    /// location.
    ///
    /// Policy is chosen by `atomic_key_rotation`:
    ///
    /// - availability (default): per-archive failures are logged and the
    ///   archive stays under the old key, but the new key is persisted after
    ///   every archive has been attempted. Favors key freshness over strict
    ///   consistency.
    /// - atomic: every rewrite is staged first; any failure discards the
    ///   staging and keeps the old key active.
    pub async fn rotate_keys(&mut self) -> BackupResult<RotationOutcome> {
        let new_key = VaultKey::generate();
        let archives = self.enumerate_archives();

        let outcome = if self.config.atomic_key_rotation {
            self.rotate_atomic(&new_key, &archives).await?
        } else {
            self.rotate_available(&new_key, &archives).await?
        };

        self.key = new_key;
        info!(
            "Rotated encryption key: {} archives re-encrypted, {} left behind",
            outcome.rotated,
            outcome.failed.len()
        );
        Ok(outcome)
    }

    fn enumerate_archives(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.config.backup_location)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == ENCRYPTED_EXT)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    async fn rotate_available(
        &self,
        new_key: &VaultKey,
        archives: &[PathBuf],
    ) -> BackupResult<RotationOutcome> {
        let mut outcome = RotationOutcome::default();

        for path in archives {
            match self.reseal(path, new_key, path).await {
                Ok(()) => {
                    info!("Re-encrypted archive: {}", path.display());
                    outcome.rotated += 1;
                }
                Err(e) => {
                    error!("Error re-encrypting archive {}: {e}", path.display());
                    outcome.failed.push(path.clone());
                }
            }
        }

        // The new key is persisted even after per-archive failures; archives
        // left under the old key must be recovered out of band.
        self.store.persist(new_key).await?;
        Ok(outcome)
    }

    async fn rotate_atomic(
        &self,
        new_key: &VaultKey,
        archives: &[PathBuf],
    ) -> BackupResult<RotationOutcome> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();

        for path in archives {
            let stage = append_extension(path, "rotate");
            if let Err(e) = self.reseal(path, new_key, &stage).await {
                for (_, staged_path) in &staged {
                    let _ = tokio::fs::remove_file(staged_path).await;
                }
                let _ = tokio::fs::remove_file(&stage).await;
                return Err(BackupError::KeyRotation(format!(
                    "Aborted: {} could not be re-encrypted: {e}",
                    path.display()
                )));
            }
            staged.push((path.clone(), stage));
        }

        for (path, stage) in &staged {
            tokio::fs::rename(stage, path).await?;
        }

        self.store.persist(new_key).await?;
        Ok(RotationOutcome {
            rotated: staged.len(),
            failed: Vec::new(),
        })
    }

    /// Decrypt `path` with the active key and rewrite it to `dest` under
    /// `new_key`, preserving the payload framing untouched.
    async fn reseal(&self, path: &Path, new_key: &VaultKey, dest: &Path) -> BackupResult<()> {
        let sealed = tokio::fs::read(path).await?;
        let payload = cipher::decrypt(&self.key, &sealed)?;
        let resealed = cipher::encrypt(new_key, &payload)?;
        write_atomic(dest, &resealed).await
    }
}

/// `path` with `ext` appended after the existing name, `foo.txt` -> `foo.txt.enc`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Strip a trailing `.enc`; without one, append `.dec` instead of risking an
/// in-place overwrite of the input.
fn strip_encrypted_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == ENCRYPTED_EXT) {
        path.with_extension("")
    } else {
        append_extension(path, "dec")
    }
}

/// Write via a temporary sibling plus rename, so an interrupted write never
/// leaves a half-written file at the final path.
async fn write_atomic(path: &Path, data: &[u8]) -> BackupResult<()> {
    let tmp = append_extension(path, "tmp");
    tokio::fs::write(&tmp, data).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
