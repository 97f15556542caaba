//! Tar packing and unpacking for directory archives.
//!
//! Directories are packed into a single uncompressed tar container with the
//! directory's own name as the top-level entry, so extraction under any
//! destination reproduces `<dirname>/...`.

use lockbox_common::{BackupError, BackupResult};
use std::path::Path;

/// Pack `dir` into an uncompressed tar container at `container`.
pub(crate) fn pack_to_file(dir: &Path, container: &Path) -> BackupResult<()> {
    let arcname = dir
        .file_name()
        .ok_or_else(|| {
            BackupError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Directory has no name: {}", dir.display()),
            ))
        })?
        .to_owned();

    let file = std::fs::File::create(container)?;
    let mut builder = tar::Builder::new(file);
    builder.append_dir_all(&arcname, dir)?;
    builder.into_inner()?.sync_all()?;
    Ok(())
}

/// Extract the tar container at `container` into `dest`, creating it if
/// needed.
///
/// A malformed container surfaces as `Archive`, not `Io`.
pub(crate) fn unpack_file(container: &Path, dest: &Path) -> BackupResult<()> {
    std::fs::create_dir_all(dest)?;
    let file = std::fs::File::open(container)?;
    let mut archive = tar::Archive::new(file);
    archive
        .unpack(dest)
        .map_err(|e| BackupError::Archive(format!("Failed to extract container: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_preserves_layout() {
        let src = tempfile::tempdir().unwrap();
        let root = src.path().join("data");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        std::fs::write(root.join("nested/b.bin"), [0u8, 1, 2, 3]).unwrap();

        let scratch = tempfile::tempdir().unwrap();
        let container = scratch.path().join("data.tar");
        pack_to_file(&root, &container).unwrap();

        let dest = tempfile::tempdir().unwrap();
        unpack_file(&container, dest.path()).unwrap();

        assert_eq!(
            std::fs::read(dest.path().join("data/a.txt")).unwrap(),
            b"alpha"
        );
        assert_eq!(
            std::fs::read(dest.path().join("data/nested/b.bin")).unwrap(),
            [0u8, 1, 2, 3]
        );
    }

    #[test]
    fn garbage_container_is_archive_error() {
        let scratch = tempfile::tempdir().unwrap();
        let container = scratch.path().join("bogus.tar");
        std::fs::write(&container, vec![b'x'; 1024]).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let err = unpack_file(&container, dest.path()).unwrap_err();
        assert!(matches!(err, BackupError::Archive(_)));
    }
}
