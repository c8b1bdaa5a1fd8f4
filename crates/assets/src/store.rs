//! Content-addressed asset store.
//!
//! Each asset is named after a hash of the locator it was archived under, so
//! the same resource always lands in the same file and is written only once.

use deck_core::{AssetKind, AssetRef, AssetSink, Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Hex characters of the digest kept in an asset id.
const ID_LEN: usize = 16;

/// Stable identifier for a locator: the first 16 hex characters of its SHA-256.
pub fn asset_id(locator: &str) -> String {
    let digest = Sha256::digest(locator.as_bytes());
    digest
        .iter()
        .take(ID_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// File name an asset is stored under.
pub fn asset_file_name(id: &str, kind: AssetKind) -> String {
    format!("img_{}.{}", id, kind.extension())
}

/// Write `dst` through a sibling `.part` file renamed into place, so a failed
/// write never leaves a truncated file under the final name.
pub(crate) fn write_atomic<F>(dst: &Path, write: F) -> std::io::Result<()>
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    let mut partial = dst.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = write(&partial).and_then(|()| fs::rename(&partial, dst)) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    Ok(())
}

/// Directory of materialized assets for one archive.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` for `locator` unless a file with its name already exists.
    pub fn store(&self, locator: &str, kind: AssetKind, bytes: &[u8]) -> Result<AssetRef> {
        let id = asset_id(locator);
        let path = self.root.join(asset_file_name(&id, kind));

        if path.exists() {
            log::debug!("Asset {} already stored", path.display());
        } else {
            fs::create_dir_all(&self.root).map_err(|e| {
                Error::AssetError(format!("Failed to create {}: {}", self.root.display(), e))
            })?;
            write_atomic(&path, |tmp| fs::write(tmp, bytes)).map_err(|e| {
                Error::AssetError(format!("Failed to write {}: {}", path.display(), e))
            })?;
            log::debug!("Stored {} ({} bytes) for {}", path.display(), bytes.len(), locator);
        }

        Ok(AssetRef::new(id, kind, path))
    }
}

impl AssetSink for AssetStore {
    fn materialize(&self, locator: &str, content_type: &str, bytes: &[u8]) -> Result<AssetRef> {
        self.store(locator, AssetKind::from_content_type(content_type), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id() {
        // SHA-256("abc") = ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(asset_id("abc"), "ba7816bf8f01cfea");
        assert_eq!(asset_id("https://a/x.png").len(), 16);
        assert_eq!(asset_id("https://a/x.png"), asset_id("https://a/x.png"));
        assert_ne!(asset_id("https://a/x.png"), asset_id("https://a/x.png?wx_fmt=png"));
    }

    #[test]
    fn test_materialize_names_file_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("assets"));

        let png = store.materialize("https://a/x", "image/png", b"png").unwrap();
        assert_eq!(png.kind, AssetKind::Png);
        assert_eq!(png.file_name(), format!("img_{}.png", asset_id("https://a/x")));
        assert_eq!(fs::read(&png.path).unwrap(), b"png");

        let jpg = store.materialize("https://a/y", "image/jpeg", b"jpg").unwrap();
        assert!(jpg.file_name().ends_with(".jpg"));

        let gif = store.materialize("https://a/z", "image/gif", b"gif").unwrap();
        assert!(gif.file_name().ends_with(".img"));
    }

    #[test]
    fn test_store_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());

        let first = store.store("loc", AssetKind::Webp, b"first").unwrap();
        let second = store.store("loc", AssetKind::Webp, b"second").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&first.path).unwrap(), b"first");
    }

    #[test]
    fn test_stale_partial_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let name = asset_file_name(&asset_id("loc"), AssetKind::Png);
        fs::write(dir.path().join(format!("{name}.part")), b"trunc").unwrap();

        let asset = store.store("loc", AssetKind::Png, b"complete").unwrap();
        assert_eq!(fs::read(&asset.path).unwrap(), b"complete");
        assert!(!dir.path().join(format!("{name}.part")).exists());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let name = asset_file_name(&asset_id("loc"), AssetKind::Png);
        // A directory in the way of the partial file makes the write fail
        fs::create_dir(dir.path().join(format!("{name}.part"))).unwrap();

        assert!(store.store("loc", AssetKind::Png, b"x").is_err());
        assert!(!dir.path().join(&name).exists());
    }

    #[test]
    fn test_write_failure_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let store = AssetStore::new(blocker.join("assets"));
        let result = store.store("loc", AssetKind::Png, b"x");
        assert!(matches!(result, Err(Error::AssetError(_))));
    }
}
