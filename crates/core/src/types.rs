//! Domain types for extracted article content and the slides built from it.

use crate::asset::AssetRef;
use crate::normalize::char_len;
use serde::{Deserialize, Serialize};

/// One semantic unit of article content, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A section heading (h2-h4 in the source).
    Heading { text: String },

    /// A run of paragraph text.
    Text { text: String },

    /// An embedded image resolved to a stored asset.
    Image { asset: AssetRef, caption: String },
}

impl ContentBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading { text: text.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(asset: AssetRef, caption: impl Into<String>) -> Self {
        Self::Image {
            asset,
            caption: caption.into(),
        }
    }

    /// The asset this block refers to, if it is an image.
    pub fn asset(&self) -> Option<&AssetRef> {
        match self {
            Self::Image { asset, .. } => Some(asset),
            _ => None,
        }
    }
}

/// One article extracted from one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Display title, also used as the label on the article's body slides.
    pub title: String,

    /// Author line, if the page shows one.
    pub author: Option<String>,

    /// Publication time as displayed on the page.
    pub published_at: Option<String>,

    /// Content blocks in source order.
    pub blocks: Vec<ContentBlock>,
}

impl Article {
    /// Create an article with no metadata beyond its title and no content.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            published_at: None,
            blocks: Vec::new(),
        }
    }

    /// Number of image blocks in the article.
    pub fn image_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.asset().is_some()).count()
    }
}

/// A line of content on a text-body slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideItem {
    Heading { text: String },
    Text { text: String },
}

impl SlideItem {
    pub fn text(&self) -> &str {
        match self {
            Self::Heading { text } | Self::Text { text } => text,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }

    /// Length of the item's text in characters.
    pub fn len(&self) -> usize {
        char_len(self.text())
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// One output slide, rendered independently of the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slide {
    /// The single opening slide of the deck.
    Cover,

    /// Opening slide of one article.
    ArticleTitle {
        title: String,
        author: Option<String>,
        published_at: Option<String>,
    },

    /// Headings and text, in order.
    TextBody {
        items: Vec<SlideItem>,
        article_label: String,
    },

    /// One image with its caption.
    Image {
        asset: AssetRef,
        caption: String,
        article_label: String,
    },
}

impl Slide {
    /// Title slide for an article.
    pub fn article_title(article: &Article) -> Self {
        Self::ArticleTitle {
            title: article.title.clone(),
            author: article.author.clone(),
            published_at: article.published_at.clone(),
        }
    }

    /// Short name of the slide kind, matching the serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::ArticleTitle { .. } => "article_title",
            Self::TextBody { .. } => "text_body",
            Self::Image { .. } => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;

    #[test]
    fn test_slide_kind_tag_matches_serde() {
        let slide = Slide::TextBody {
            items: vec![SlideItem::Heading { text: "H".into() }],
            article_label: "A".into(),
        };
        assert_eq!(slide.kind(), "text_body");
        assert_eq!(Slide::Cover.kind(), "cover");
    }

    #[test]
    fn test_slide_item_len_counts_chars() {
        let item = SlideItem::Text { text: "深度求索".into() };
        assert_eq!(item.len(), 4);
        assert!(!item.is_heading());
    }

    #[test]
    fn test_article_image_count() {
        let mut article = Article::new("T");
        article.blocks.push(ContentBlock::heading("H"));
        article.blocks.push(ContentBlock::image(
            AssetRef::new("abc", AssetKind::Png, "img_abc.png"),
            "",
        ));
        assert_eq!(article.image_count(), 1);
    }
}
