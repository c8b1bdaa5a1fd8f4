//! Small helpers over the html5ever reference-counted DOM.

use deck_core::normalize::join_pieces;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Elements whose text is never content.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Parse an HTML document. html5ever recovers from any malformed input.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// Lowercased tag name of an element node.
pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

/// Whether `node` is an element with the given (lowercase) tag name.
pub fn is_tag(node: &Handle, tag: &str) -> bool {
    tag_name(node).as_deref() == Some(tag)
}

/// Value of the named attribute on an element node.
pub fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.to_string().eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Whether the element's `class` attribute lists `class`.
pub fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

/// First node below `root` (in document order, `root` included) matching `pred`.
pub fn find_first<F>(root: &Handle, pred: F) -> Option<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if pred(&node) {
            return Some(node);
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    None
}

pub fn find_by_id(root: &Handle, id: &str) -> Option<Handle> {
    find_first(root, |n| attr(n, "id").as_deref() == Some(id))
}

pub fn find_by_tag(root: &Handle, tag: &str) -> Option<Handle> {
    find_first(root, |n| is_tag(n, tag))
}

/// Whether any element strictly below `node` has the given tag name.
pub fn contains_tag(node: &Handle, tag: &str) -> bool {
    node.children
        .borrow()
        .iter()
        .any(|child| find_by_tag(child, tag).is_some())
}

/// Text of every text node below `node`, in document order, skipping
/// script-like elements.
pub fn text_pieces(node: &Handle) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        match &current.data {
            NodeData::Text { contents } => pieces.push(contents.borrow().to_string()),
            NodeData::Element { .. } => {
                if tag_name(&current).is_some_and(|t| NON_CONTENT_TAGS.contains(&t.as_str())) {
                    continue;
                }
                stack.extend(current.children.borrow().iter().rev().cloned());
            }
            NodeData::Document => {
                stack.extend(current.children.borrow().iter().rev().cloned());
            }
            _ => {}
        }
    }

    pieces
}

/// Trimmed text pieces below `node` joined by `separator`, whitespace collapsed.
pub fn element_text(node: &Handle, separator: &str) -> String {
    join_pieces(text_pieces(node), separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_id_and_class() {
        let dom = parse_html(
            "<body><div id=\"a\" class=\"x rich_media_content\"><p>in</p></div></body>",
        );
        let div = find_by_id(&dom.document, "a").unwrap();
        assert!(is_tag(&div, "div"));
        assert!(has_class(&div, "rich_media_content"));
        assert!(!has_class(&div, "rich_media"));
        assert!(find_by_id(&dom.document, "missing").is_none());
    }

    #[test]
    fn test_find_first_is_document_order() {
        let dom = parse_html("<div><p id=\"one\">1</p></div><p id=\"two\">2</p>");
        let p = find_by_tag(&dom.document, "p").unwrap();
        assert_eq!(attr(&p, "id").as_deref(), Some("one"));
    }

    #[test]
    fn test_element_text_skips_scripts() {
        let dom = parse_html(
            "<p>  Hello <b>bold</b>\n world<script>var x = 1;</script><style>p{}</style></p>",
        );
        let p = find_by_tag(&dom.document, "p").unwrap();
        assert_eq!(element_text(&p, " "), "Hello bold world");
        assert_eq!(element_text(&p, ""), "Helloboldworld");
    }

    #[test]
    fn test_contains_tag() {
        let dom = parse_html("<p>text <span><img src=\"a.png\"></span></p><p>plain</p>");
        let body = find_by_tag(&dom.document, "body").unwrap();
        let paragraphs: Vec<Handle> = children(&body)
            .into_iter()
            .filter(|n| is_tag(n, "p"))
            .collect();
        assert!(contains_tag(&paragraphs[0], "img"));
        assert!(!contains_tag(&paragraphs[1], "img"));
    }
}
