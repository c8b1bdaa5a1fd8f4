//! Asset references shared between the archive reader, the asset store,
//! and the renderer.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image format of a materialized asset, derived from the part content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Png,
    Jpeg,
    Webp,
    Other,
}

impl AssetKind {
    /// Classify a MIME content type such as `image/png`.
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/webp" => Self::Webp,
            _ => Self::Other,
        }
    }

    /// File extension used when storing an asset of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Other => "img",
        }
    }
}

/// A handle to a stored asset: its identifier, format, and location.
///
/// Blocks and slides carry this instead of the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Content-derived identifier (stable across runs for the same locator).
    pub id: String,

    /// Format of the stored file.
    pub kind: AssetKind,

    /// Where the stored file lives.
    pub path: PathBuf,
}

impl AssetRef {
    pub fn new(id: impl Into<String>, kind: AssetKind, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            kind,
            path: path.into(),
        }
    }

    /// File name component of the stored path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("img_{}.{}", self.id, self.kind.extension()))
    }

    /// Same asset relocated to `path`, possibly in another format.
    pub fn relocated(&self, kind: AssetKind, path: &Path) -> Self {
        Self {
            id: self.id.clone(),
            kind,
            path: path.to_path_buf(),
        }
    }
}

/// Destination for binary assets found while reading an archive.
///
/// The archive reader hands every image part to a sink and records the
/// returned reference under the part's locator.
pub trait AssetSink {
    /// Store `bytes` for `locator` and return a reference to the stored copy.
    ///
    /// Storing the same locator twice must be harmless.
    fn materialize(&self, locator: &str, content_type: &str, bytes: &[u8]) -> Result<AssetRef>;
}
