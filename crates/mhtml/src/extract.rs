//! Flattening of the article markup into ordered content blocks.
//!
//! The content region (by id, then by class, then `<body>`) is walked depth
//! first. Headings, paragraphs, blockquotes and images are emitted wherever
//! they sit; every other element is descended into without emitting anything.
//! Paragraphs that contain images are split into text and image blocks in
//! reading order.

use crate::dom::{self, children, contains_tag, element_text, is_tag, tag_name};
use crate::locator::AssetMap;
use deck_core::normalize::join_pieces;
use deck_core::ContentBlock;
use markup5ever_rcdom::{Handle, NodeData};

/// Container id of the article body on the supported page template.
pub const DEFAULT_CONTENT_ID: &str = "js_content";

/// Container class of the article body on the supported page template.
pub const DEFAULT_CONTENT_CLASS: &str = "rich_media_content";

/// Elements that become blocks.
const EMITTABLE_TAGS: &[&str] = &["h2", "h3", "h4", "p", "blockquote", "img"];

const HEADING_TAGS: &[&str] = &["h2", "h3", "h4"];

/// Result of extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Blocks in document order.
    pub blocks: Vec<ContentBlock>,

    /// Locators of images that had no matching asset and were dropped.
    pub unresolved: Vec<String>,
}

impl Extraction {
    /// Number of images dropped because their locator did not resolve.
    pub fn dropped_images(&self) -> usize {
        self.unresolved.len()
    }
}

/// What one emittable node turned into.
enum Extracted {
    Block(ContentBlock),
    Unresolved(String),
}

/// A piece of a mixed paragraph, in reading order.
enum Inline {
    Text(String),
    Image(Handle),
}

/// Extracts content blocks from article markup.
#[derive(Debug, Clone)]
pub struct BlockExtractor {
    /// Id of the element holding the article body.
    content_id: String,

    /// Class of the element holding the article body.
    content_class: String,
}

impl Default for BlockExtractor {
    fn default() -> Self {
        Self {
            content_id: DEFAULT_CONTENT_ID.to_string(),
            content_class: DEFAULT_CONTENT_CLASS.to_string(),
        }
    }
}

impl BlockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id tried first when locating the content region.
    pub fn with_content_id(mut self, id: impl Into<String>) -> Self {
        self.content_id = id.into();
        self
    }

    /// Set the class tried second when locating the content region.
    pub fn with_content_class(mut self, class: impl Into<String>) -> Self {
        self.content_class = class.into();
        self
    }

    /// Parse `html` and extract its blocks.
    pub fn extract(&self, html: &str, assets: &AssetMap) -> Extraction {
        let dom = dom::parse_html(html);
        self.extract_document(&dom.document, assets)
    }

    /// Extract blocks from an already parsed document.
    pub fn extract_document(&self, document: &Handle, assets: &AssetMap) -> Extraction {
        let mut extraction = Extraction::default();

        let Some(region) = self.content_region(document) else {
            log::debug!("No content region found");
            return extraction;
        };

        for node in flatten(&region) {
            for item in self.node_blocks(&node, assets) {
                match item {
                    Extracted::Block(block) => extraction.blocks.push(block),
                    Extracted::Unresolved(locator) => extraction.unresolved.push(locator),
                }
            }
        }

        log::debug!(
            "Extracted {} blocks, dropped {} unresolved images",
            extraction.blocks.len(),
            extraction.dropped_images()
        );
        extraction
    }

    /// The element holding the article body.
    pub fn content_region(&self, document: &Handle) -> Option<Handle> {
        dom::find_by_id(document, &self.content_id)
            .or_else(|| dom::find_first(document, |n| dom::has_class(n, &self.content_class)))
            .or_else(|| dom::find_by_tag(document, "body"))
    }

    /// Blocks for one emittable node.
    fn node_blocks(&self, node: &Handle, assets: &AssetMap) -> Vec<Extracted> {
        let Some(tag) = tag_name(node) else {
            return Vec::new();
        };

        if tag == "img" {
            return image_block(node, assets).into_iter().collect();
        }

        if HEADING_TAGS.contains(&tag.as_str()) {
            let text = element_text(node, " ");
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Extracted::Block(ContentBlock::heading(text))];
        }

        if contains_tag(node, "img") {
            return mixed_blocks(node, assets);
        }

        let text = element_text(node, " ");
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Extracted::Block(ContentBlock::text(text))]
        }
    }
}

/// Emittable nodes below `node`, in document order, at any depth.
fn flatten(node: &Handle) -> Vec<Handle> {
    let mut nodes = Vec::new();
    for child in children(node) {
        match tag_name(&child) {
            Some(tag) if EMITTABLE_TAGS.contains(&tag.as_str()) => nodes.push(child),
            Some(_) => nodes.extend(flatten(&child)),
            None => {}
        }
    }
    nodes
}

/// Resolve an `<img>` to an image block.
///
/// Returns `None` for an image with no source at all.
fn image_block(node: &Handle, assets: &AssetMap) -> Option<Extracted> {
    let locator = image_locator(node)?;
    match assets.resolve(&locator) {
        Some(asset) => {
            let caption = dom::attr(node, "data-caption")
                .map(|c| c.trim().to_string())
                .unwrap_or_default();
            Some(Extracted::Block(ContentBlock::image(asset.clone(), caption)))
        }
        None => {
            log::debug!("Dropping image with unresolved locator {}", locator);
            Some(Extracted::Unresolved(locator))
        }
    }
}

/// Lazy-load source first, then the standard source.
fn image_locator(node: &Handle) -> Option<String> {
    ["data-src", "src"]
        .iter()
        .filter_map(|name| dom::attr(node, name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Split a paragraph holding images into text and image blocks in reading order.
fn mixed_blocks(node: &Handle, assets: &AssetMap) -> Vec<Extracted> {
    let mut blocks = Vec::new();
    let mut buffer: Vec<String> = Vec::new();

    for inline in inline_pieces(node) {
        match inline {
            Inline::Text(text) => buffer.push(text),
            Inline::Image(img) => {
                blocks.extend(flush_text(&mut buffer));
                blocks.extend(image_block(&img, assets));
            }
        }
    }
    blocks.extend(flush_text(&mut buffer));

    blocks
}

/// Children of a mixed paragraph as text runs and images. Inline wrappers
/// that contain images are opened up so their images keep their position.
fn inline_pieces(node: &Handle) -> Vec<Inline> {
    let mut pieces = Vec::new();
    for child in children(node) {
        match &child.data {
            NodeData::Text { contents } => pieces.push(Inline::Text(contents.borrow().to_string())),
            NodeData::Element { .. } => {
                if is_tag(&child, "img") {
                    pieces.push(Inline::Image(child.clone()));
                } else if contains_tag(&child, "img") {
                    pieces.extend(inline_pieces(&child));
                } else {
                    pieces.push(Inline::Text(element_text(&child, " ")));
                }
            }
            _ => {}
        }
    }
    pieces
}

/// Turn buffered text into a text block, if it is not blank.
fn flush_text(buffer: &mut Vec<String>) -> Option<Extracted> {
    let text = join_pieces(buffer.drain(..), " ");
    (!text.is_empty()).then(|| Extracted::Block(ContentBlock::text(text)))
}
