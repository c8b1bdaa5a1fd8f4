//! Article metadata read from the page chrome around the content region.

use crate::dom::{self, element_text};
use markup5ever_rcdom::Handle;

/// Element id of the article headline.
const TITLE_ID: &str = "activity-name";

/// Element id of the author line.
const AUTHOR_ID: &str = "js_author_name";

/// Element id of the publication time.
const PUBLISHED_ID: &str = "publish_time";

/// Title, author and publication time of one page. Missing or blank values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

impl ArticleMeta {
    /// Read metadata from a parsed document.
    ///
    /// The title comes from the `<h1>` headline, falling back to `<title>`.
    pub fn from_document(document: &Handle) -> Self {
        let title = dom::find_first(document, |n| {
            dom::is_tag(n, "h1") && dom::attr(n, "id").as_deref() == Some(TITLE_ID)
        })
        .and_then(|n| non_blank_text(&n))
        .or_else(|| dom::find_by_tag(document, "title").and_then(|n| non_blank_text(&n)));

        Self {
            title,
            author: dom::find_by_id(document, AUTHOR_ID).and_then(|n| non_blank_text(&n)),
            published_at: dom::find_by_id(document, PUBLISHED_ID).and_then(|n| non_blank_text(&n)),
        }
    }

    /// The title, or `fallback` when the page has none.
    pub fn title_or(&self, fallback: &str) -> String {
        self.title.clone().unwrap_or_else(|| fallback.to_string())
    }
}

fn non_blank_text(node: &Handle) -> Option<String> {
    let text = element_text(node, "");
    (!text.is_empty()).then_some(text)
}
