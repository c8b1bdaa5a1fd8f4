//! Archive-to-deck orchestration and output layout.
//!
//! ```text
//! <output>/
//!   articles/<archive stem>/assets/   images stored while reading the archive
//!   articles/<archive stem>/article.html
//!   assets/                           images used by the deck, webp converted
//!   slides/slideNNN.html
//!   manifest.json
//! ```

use anyhow::{Context, Result};
use deck_assets::{AssetStore, AssetUnifier};
use deck_core::{Article, Slide, SlidePacker};
use deck_mhtml::ArchiveParser;
use deck_render::{CoverInfo, DeckWriter, Manifest, SlideRenderer};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters not allowed in file names on common filesystems.
static UNSAFE_FILE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

const ARTICLES_DIR: &str = "articles";
const ASSETS_DIR: &str = "assets";
const SLIDES_DIR: &str = "slides";
const MANIFEST_FILE: &str = "manifest.json";

/// Replace characters that cannot appear in a file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_FILE_NAME_REGEX.replace_all(name, "_").into_owned()
}

/// Outcome of reading one archive.
#[derive(Debug, Clone)]
pub struct ArticleReport {
    /// The article, with image blocks pointing into the shared assets directory.
    pub article: Article,

    /// Images referenced by the markup but missing from the archive.
    pub unresolved: usize,

    /// Images dropped because storing or converting them failed.
    pub failed: usize,
}

/// Turns archives into a rendered deck under one output directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    output: PathBuf,
    parser: ArchiveParser,
    packer: SlidePacker,
    cover: CoverInfo,
    cover_image: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            parser: ArchiveParser::new(),
            packer: SlidePacker::new(),
            cover: CoverInfo::default(),
            cover_image: None,
        }
    }

    pub fn with_parser(mut self, parser: ArchiveParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_packer(mut self, packer: SlidePacker) -> Self {
        self.packer = packer;
        self
    }

    pub fn with_cover(mut self, cover: CoverInfo) -> Self {
        self.cover = cover;
        self
    }

    /// Banner image copied into the shared assets and shown on the cover.
    pub fn with_cover_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover_image = Some(path.into());
        self
    }

    /// Create the output directory.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output).with_context(|| {
            format!("Failed to create output directory: {}", self.output.display())
        })
    }

    /// Read one archive into an article.
    ///
    /// Returns `None` when the archive holds no markup document.
    pub fn read_article(&self, input: &Path) -> Result<Option<ArticleReport>> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "article".to_string());
        let article_dir = self.output.join(ARTICLES_DIR).join(sanitize_file_name(&stem));

        let store = AssetStore::new(article_dir.join(ASSETS_DIR));
        let parsed = self
            .parser
            .parse_file(input, &store)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let Some(markup) = &parsed.markup else {
            return Ok(None);
        };

        fs::create_dir_all(&article_dir)
            .with_context(|| format!("Failed to create {}", article_dir.display()))?;
        let markup_path = article_dir.join("article.html");
        fs::write(&markup_path, markup)
            .with_context(|| format!("Failed to write {}", markup_path.display()))?;

        let unifier = AssetUnifier::new(self.output.join(ASSETS_DIR));
        let (article, dropped) = unifier.unify_article(&parsed.article);
        if dropped > 0 {
            log::warn!(
                "'{}': dropped {} image(s) that could not be unified",
                article.title,
                dropped
            );
        }

        Ok(Some(ArticleReport {
            article,
            unresolved: parsed.unresolved.len(),
            failed: parsed.failed_assets + dropped,
        }))
    }

    /// Read every archive in order. Archives that fail are reported on
    /// stderr and skipped.
    pub fn read_articles(&self, inputs: &[PathBuf]) -> Vec<Article> {
        let mut articles = Vec::new();

        for input in inputs {
            match self.read_article(input) {
                Ok(Some(report)) => {
                    log::debug!(
                        "{}: {} blocks, {} unresolved, {} failed images",
                        input.display(),
                        report.article.blocks.len(),
                        report.unresolved,
                        report.failed
                    );
                    articles.push(report.article);
                }
                Ok(None) => {
                    log::warn!("Skipping {}: no HTML document in archive", input.display());
                }
                Err(e) => {
                    eprintln!("Error processing {}: {}", input.display(), e);
                }
            }
        }

        articles
    }

    /// Deck slides for the articles: the cover, then each article in order.
    pub fn slides(&self, articles: &[Article]) -> Vec<Slide> {
        self.packer.build_deck(articles)
    }

    /// Render slides and write the manifest.
    pub fn render(&self, slides: &[Slide]) -> Result<Manifest> {
        let mut cover = self.cover.clone();
        if let Some(image) = &self.cover_image {
            let unifier = AssetUnifier::new(self.output.join(ASSETS_DIR));
            match unifier.adopt(image) {
                Ok(adopted) => {
                    if let Some(name) = adopted.file_name() {
                        cover = cover.with_banner(name.to_string_lossy());
                    }
                }
                Err(e) => log::warn!("Cover image {} not used: {}", image.display(), e),
            }
        }

        let renderer = SlideRenderer::new(cover).with_assets_dir(ASSETS_DIR);
        let writer = DeckWriter::new(self.output.join(SLIDES_DIR), renderer);
        let manifest = writer.write(slides).map_err(|e| anyhow::anyhow!("{}", e))?;

        let manifest_path = self.output.join(MANIFEST_FILE);
        manifest
            .write(&manifest_path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        Ok(manifest)
    }

    /// Read, pack and render in one go.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<Manifest> {
        self.prepare()?;
        let articles = self.read_articles(inputs);
        let slides = self.slides(&articles);
        self.render(&slides)
    }
}
