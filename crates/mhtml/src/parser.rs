//! MHTML archive parser implementation.

use crate::archive::Archive;
use crate::charset::decode_markup;
use crate::dom::parse_html;
use crate::extract::BlockExtractor;
use crate::locator::AssetMap;
use crate::metadata::ArticleMeta;
use deck_core::{Article, AssetSink, Error, Result};
use std::path::Path;

/// Everything read from one archive.
#[derive(Debug, Clone)]
pub struct ParsedArchive {
    /// Decoded markup of the primary document, if the archive had one.
    pub markup: Option<String>,

    /// The extracted article. Empty when there was no markup.
    pub article: Article,

    /// Image locators referenced by the markup but absent from the archive.
    pub unresolved: Vec<String>,

    /// Image parts the asset sink failed to store.
    pub failed_assets: usize,
}

impl ParsedArchive {
    /// Whether the archive had no markup document (callers skip these).
    pub fn is_empty(&self) -> bool {
        self.markup.is_none()
    }
}

/// Parser for MHTML (saved web page) files.
#[derive(Debug, Clone, Default)]
pub struct ArchiveParser {
    extractor: BlockExtractor,
}

impl ArchiveParser {
    /// Create a parser with the default content region rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom block extractor.
    pub fn with_extractor(mut self, extractor: BlockExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Parse an archive file. The file stem is the fallback title.
    pub fn parse_file(&self, path: &Path, sink: &dyn AssetSink) -> Result<ParsedArchive> {
        let data = std::fs::read(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                let msg = format!("No file name in {}", path.display());
                Error::IoError(std::io::Error::other(msg))
            })?;
        self.parse(&data, &stem, sink)
    }

    /// Parse raw archive bytes, storing every embedded image through `sink`.
    ///
    /// `fallback_title` is used when the page has no title of its own.
    pub fn parse(
        &self,
        data: &[u8],
        fallback_title: &str,
        sink: &dyn AssetSink,
    ) -> Result<ParsedArchive> {
        let archive = Archive::parse(data)?;

        let (assets, failed_assets) = materialize_images(&archive, sink);

        let Some(part) = archive.markup_part() else {
            log::warn!("Archive '{}' has no markup part", fallback_title);
            return Ok(ParsedArchive {
                markup: None,
                article: Article::new(fallback_title),
                unresolved: Vec::new(),
                failed_assets,
            });
        };

        let markup = decode_markup(part);
        let dom = parse_html(&markup);
        let meta = ArticleMeta::from_document(&dom.document);
        let extraction = self.extractor.extract_document(&dom.document, &assets);

        if extraction.dropped_images() > 0 {
            log::warn!(
                "'{}': dropped {} image(s) with no archived resource",
                fallback_title,
                extraction.dropped_images()
            );
        }

        let article = Article {
            title: meta.title_or(fallback_title),
            author: meta.author,
            published_at: meta.published_at,
            blocks: extraction.blocks,
        };

        log::debug!(
            "Parsed '{}': {} blocks, {} images",
            article.title,
            article.blocks.len(),
            article.image_count()
        );

        Ok(ParsedArchive {
            markup: Some(markup),
            article,
            unresolved: extraction.unresolved,
            failed_assets,
        })
    }
}

/// Hand every located, non-empty image part to the sink.
///
/// A part the sink rejects is logged and left out of the map, so blocks
/// referring to it are dropped during extraction.
fn materialize_images(archive: &Archive, sink: &dyn AssetSink) -> (AssetMap, usize) {
    let mut assets = AssetMap::new();
    let mut failed = 0;

    for part in archive.image_parts() {
        let Some(locator) = part.location.as_deref().filter(|l| !l.is_empty()) else {
            continue;
        };
        if part.body.is_empty() {
            continue;
        }

        match sink.materialize(locator, &part.content_type, &part.body) {
            Ok(asset) => assets.insert(locator, asset),
            Err(e) => {
                log::warn!("Failed to store asset {}: {}", locator, e);
                failed += 1;
            }
        }
    }

    (assets, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{AssetKind, AssetRef, ContentBlock};
    use std::cell::RefCell;

    /// Sink that records locators in memory and rejects one of them.
    #[derive(Default)]
    struct MemorySink {
        stored: RefCell<Vec<String>>,
        reject: Option<&'static str>,
    }

    impl AssetSink for MemorySink {
        fn materialize(
            &self,
            locator: &str,
            content_type: &str,
            _bytes: &[u8],
        ) -> Result<AssetRef> {
            if self.reject == Some(locator) {
                return Err(Error::AssetError(format!("refused {locator}")));
            }
            let mut stored = self.stored.borrow_mut();
            stored.push(locator.to_string());
            let id = format!("{:016}", stored.len());
            let kind = AssetKind::from_content_type(content_type);
            let path = format!("img_{}.{}", id, kind.extension());
            Ok(AssetRef::new(id, kind, path))
        }
    }

    fn archive(html: &str) -> String {
        format!(
            "From: <Saved by Blink>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/related;\r\n\
\ttype=\"text/html\";\r\n\
\tboundary=\"----B\"\r\n\
\r\n\
------B\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: 8bit\r\n\
Content-Location: https://mp.example.com/s/abc\r\n\
\r\n\
{html}\r\n\
------B\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Location: https://img.example.com/one.png?wx_fmt=png\r\n\
\r\n\
iVBORw0KGgo=\r\n\
------B\r\n\
Content-Type: image/webp\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Location: https://img.example.com/two.webp\r\n\
\r\n\
UklGRg==\r\n\
------B\r\n\
Content-Type: image/gif\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
R0lGODlh\r\n\
------B--\r\n"
        )
    }

    const PAGE: &str = "<html><head><title>Tab</title></head><body>\
<h1 id=\"activity-name\"> 论文解读 </h1><span id=\"js_author_name\">Li</span>\
<div id=\"js_content\"><h2>背景</h2><p>第一段。</p>\
<p>看图<img data-src=\"https://img.example.com/one.png\" data-caption=\"图1\">继续</p>\
<img src=\"https://img.example.com/two.webp#x\"><img src=\"https://img.example.com/missing.png\">\
</div></body></html>";

    #[test]
    fn test_parse_archive() {
        let sink = MemorySink::default();
        let parsed = ArchiveParser::new()
            .parse(archive(PAGE).as_bytes(), "saved", &sink)
            .unwrap();

        assert!(!parsed.is_empty());
        // The untitled gif part has no locator and is never stored
        assert_eq!(
            *sink.stored.borrow(),
            vec![
                "https://img.example.com/one.png?wx_fmt=png",
                "https://img.example.com/two.webp"
            ]
        );

        let article = &parsed.article;
        assert_eq!(article.title, "论文解读");
        assert_eq!(article.author.as_deref(), Some("Li"));
        assert_eq!(article.published_at, None);
        assert_eq!(article.blocks.len(), 6);
        assert_eq!(article.blocks[0], ContentBlock::heading("背景"));
        assert_eq!(article.blocks[1], ContentBlock::text("第一段。"));
        assert_eq!(article.blocks[2], ContentBlock::text("看图"));
        match &article.blocks[3] {
            ContentBlock::Image { asset, caption } => {
                assert_eq!(asset.kind, AssetKind::Png);
                assert_eq!(caption, "图1");
            }
            other => panic!("expected image, got {:?}", other),
        }
        assert_eq!(article.blocks[4], ContentBlock::text("继续"));
        assert_eq!(article.blocks[5].asset().unwrap().kind, AssetKind::Webp);

        assert_eq!(parsed.unresolved, vec!["https://img.example.com/missing.png"]);
        assert_eq!(parsed.failed_assets, 0);
    }

    #[test]
    fn test_rejected_asset_drops_its_block() {
        let sink = MemorySink {
            reject: Some("https://img.example.com/two.webp"),
            ..Default::default()
        };
        let parsed = ArchiveParser::new()
            .parse(archive(PAGE).as_bytes(), "saved", &sink)
            .unwrap();

        assert_eq!(parsed.failed_assets, 1);
        assert_eq!(parsed.article.image_count(), 1);
        assert_eq!(parsed.unresolved.len(), 2);
    }

    #[test]
    fn test_fallback_title_and_missing_region() {
        let page = "<html><head></head><frameset></frameset></html>";
        let parsed = ArchiveParser::new()
            .parse(archive(page).as_bytes(), "my-archive", &MemorySink::default())
            .unwrap();
        assert_eq!(parsed.article.title, "my-archive");
        assert!(parsed.article.blocks.is_empty());
    }

    #[test]
    fn test_archive_without_markup() {
        let raw = "Content-Type: multipart/related; boundary=B\n\n\
--B\nContent-Type: image/png\nContent-Transfer-Encoding: base64\nContent-Location: a.png\n\niVBORw0KGgo=\n\
--B--\n";
        let parsed = ArchiveParser::new()
            .parse(raw.as_bytes(), "images-only", &MemorySink::default())
            .unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.article, Article::new("images-only"));
    }

    #[test]
    fn test_custom_content_region() {
        let page = "<body><div id=\"post\"><p>inside</p></div><p>outside</p></body>";
        let extractor = BlockExtractor::new().with_content_id("post");
        let parser = ArchiveParser::new().with_extractor(extractor);
        let parsed = parser
            .parse(archive(page).as_bytes(), "x", &MemorySink::default())
            .unwrap();
        assert_eq!(parsed.article.blocks, vec![ContentBlock::text("inside")]);
    }

    #[test]
    fn test_malformed_multipart_is_an_error() {
        let raw = "Content-Type: multipart/related\n\n<p>no boundary</p>";
        let result = ArchiveParser::new().parse(raw.as_bytes(), "bad", &MemorySink::default());
        assert!(matches!(result, Err(Error::MimeError(_))));
    }
}
