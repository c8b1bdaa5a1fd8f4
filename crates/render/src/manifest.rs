//! Writing rendered slides to disk and the manifest listing them.

use crate::html::SlideRenderer;
use deck_core::{Error, Result, Slide};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the `n`th slide (1-based).
pub fn slide_file_name(n: usize) -> String {
    format!("slide{:03}.html", n)
}

/// Ordered list of the slide documents produced for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub slides_dir: PathBuf,
    pub slides_count: usize,
    pub slides: Vec<PathBuf>,
}

impl Manifest {
    /// Write the manifest as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::SerializeError(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(path, json)?;
        log::debug!("Wrote manifest {}", path.display());
        Ok(())
    }
}

/// Renders slides into numbered files in one directory.
#[derive(Debug, Clone)]
pub struct DeckWriter {
    slides_dir: PathBuf,
    renderer: SlideRenderer,
}

impl DeckWriter {
    pub fn new(slides_dir: impl Into<PathBuf>, renderer: SlideRenderer) -> Self {
        Self {
            slides_dir: slides_dir.into(),
            renderer,
        }
    }

    /// Render and write every slide in order, returning the manifest.
    pub fn write(&self, slides: &[Slide]) -> Result<Manifest> {
        fs::create_dir_all(&self.slides_dir).map_err(|e| {
            Error::RenderError(format!(
                "Failed to create {}: {}",
                self.slides_dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::with_capacity(slides.len());
        for (idx, slide) in slides.iter().enumerate() {
            let path = self.slides_dir.join(slide_file_name(idx + 1));
            fs::write(&path, self.renderer.render(slide)).map_err(|e| {
                Error::RenderError(format!("Failed to write {}: {}", path.display(), e))
            })?;
            paths.push(path);
        }

        log::debug!(
            "Rendered {} slides into {}",
            paths.len(),
            self.slides_dir.display()
        );

        Ok(Manifest {
            slides_dir: self.slides_dir.clone(),
            slides_count: paths.len(),
            slides: paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::CoverInfo;
    use deck_core::SlideItem;

    fn deck() -> Vec<Slide> {
        vec![
            Slide::Cover,
            Slide::ArticleTitle {
                title: "T".to_string(),
                author: None,
                published_at: None,
            },
            Slide::TextBody {
                items: vec![SlideItem::Text { text: "body".to_string() }],
                article_label: "T".to_string(),
            },
        ]
    }

    #[test]
    fn test_slide_file_name() {
        assert_eq!(slide_file_name(1), "slide001.html");
        assert_eq!(slide_file_name(42), "slide042.html");
        assert_eq!(slide_file_name(1234), "slide1234.html");
    }

    #[test]
    fn test_write_deck_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SlideRenderer::new(CoverInfo::new("Deck"));
        let writer = DeckWriter::new(dir.path().join("slides"), renderer);

        let manifest = writer.write(&deck()).unwrap();
        assert_eq!(manifest.slides_count, 3);
        assert_eq!(manifest.slides_dir, dir.path().join("slides"));
        assert_eq!(
            manifest.slides,
            vec![
                dir.path().join("slides/slide001.html"),
                dir.path().join("slides/slide002.html"),
                dir.path().join("slides/slide003.html"),
            ]
        );
        let third = fs::read_to_string(&manifest.slides[2]).unwrap();
        assert!(third.contains("<p class=\"text\">body</p>"));

        let manifest_path = dir.path().join("manifest.json");
        manifest.write(&manifest_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(json["slides_count"], 3);
        assert_eq!(json["slides"].as_array().unwrap().len(), 3);
        let read: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(read, manifest);
    }

    #[test]
    fn test_empty_deck() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SlideRenderer::new(CoverInfo::default());
        let writer = DeckWriter::new(dir.path().join("slides"), renderer);
        let manifest = writer.write(&[]).unwrap();
        assert_eq!(manifest.slides_count, 0);
        assert!(manifest.slides.is_empty());
        assert!(dir.path().join("slides").is_dir());
    }
}
