//! Gathering of referenced assets into the shared output directory.
//!
//! Formats every slide viewer can show are copied unchanged. WebP images are
//! decoded and re-encoded as PNG.

use crate::store::{asset_file_name, write_atomic};
use deck_core::{Article, AssetKind, AssetRef, ContentBlock, Error, Result};
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Copies or converts assets into one shared directory.
#[derive(Debug, Clone)]
pub struct AssetUnifier {
    dest: PathBuf,
}

impl AssetUnifier {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    /// Bring one asset into the shared directory and return its new location.
    ///
    /// An existing destination file is reused as is.
    pub fn unify(&self, asset: &AssetRef) -> Result<AssetRef> {
        fs::create_dir_all(&self.dest)?;

        match asset.kind {
            AssetKind::Webp => {
                let target = self.dest.join(asset_file_name(&asset.id, AssetKind::Png));
                if !target.exists() {
                    convert_to_png(&asset.path, &target)?;
                    log::debug!("Converted {} to {}", asset.path.display(), target.display());
                }
                Ok(asset.relocated(AssetKind::Png, &target))
            }
            kind => {
                let target = self.dest.join(asset.file_name());
                if !target.exists() {
                    write_atomic(&target, |tmp| copy_file(&asset.path, tmp)).map_err(|e| {
                        Error::AssetError(format!("Failed to copy {}: {}", asset.path.display(), e))
                    })?;
                }
                Ok(asset.relocated(kind, &target))
            }
        }
    }

    /// Unify every image of an article.
    ///
    /// Returns the article with its image blocks pointing into the shared
    /// directory, and the number of image blocks dropped because their asset
    /// could not be brought over.
    pub fn unify_article(&self, article: &Article) -> (Article, usize) {
        let mut dropped = 0;

        let blocks = article
            .blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Image { asset, caption } => match self.unify(asset) {
                    Ok(unified) => Some(ContentBlock::image(unified, caption.clone())),
                    Err(e) => {
                        log::warn!("Dropping image {}: {}", asset.path.display(), e);
                        dropped += 1;
                        None
                    }
                },
                other => Some(other.clone()),
            })
            .collect();

        let unified = Article {
            blocks,
            ..article.clone()
        };
        (unified, dropped)
    }

    /// Copy an arbitrary file (such as a cover banner) into the shared
    /// directory under its own name.
    pub fn adopt(&self, path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::AssetError(format!("No file name in {}", path.display())))?;
        fs::create_dir_all(&self.dest)?;

        let target = self.dest.join(name);
        if !target.exists() {
            write_atomic(&target, |tmp| copy_file(path, tmp)).map_err(|e| {
                Error::AssetError(format!("Failed to copy {}: {}", path.display(), e))
            })?;
        }
        Ok(target)
    }
}

/// Decode an image file and write it back out as PNG.
fn convert_to_png(src: &Path, dst: &Path) -> Result<()> {
    let bytes = fs::read(src)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::ImageError(format!("Failed to decode {}: {}", src.display(), e)))?;

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::ImageError(format!("Failed to encode PNG: {}", e)))?;

    write_atomic(dst, |tmp| fs::write(tmp, buffer.get_ref()))?;
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
