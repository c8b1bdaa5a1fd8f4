//! Character set selection for the markup payload.
//!
//! The part's declared charset is tried first (UTF-8 when absent or unknown).
//! If the decoded document itself declares a different `charset=`, and that
//! label names an encoding we know, the bytes are decoded again with it.
//! Decoding never fails: undecodable bytes become U+FFFD.

use crate::archive::ArchivePart;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Regex to find an in-document charset declaration.
static CHARSET_DECLARATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([\w-]+)"#).unwrap());

/// Decode a markup part to text.
pub fn decode_markup(part: &ArchivePart) -> String {
    decode_with_declared(&part.body, part.charset.as_deref())
}

/// Decode `bytes` given the transport-declared charset label, if any.
pub fn decode_with_declared(bytes: &[u8], declared: Option<&str>) -> String {
    let declared_encoding = declared
        .and_then(|label| {
            let encoding = Encoding::for_label(label.trim().as_bytes());
            if encoding.is_none() {
                log::warn!("Unknown declared charset '{}', using UTF-8", label);
            }
            encoding
        })
        .unwrap_or(UTF_8);

    let (text, _, malformed) = declared_encoding.decode(bytes);
    if malformed {
        log::debug!(
            "Markup is not clean {}; substituted undecodable bytes",
            declared_encoding.name()
        );
    }

    let Some(in_document) = in_document_charset(&text) else {
        return text.into_owned();
    };
    match Encoding::for_label(in_document.as_bytes()) {
        Some(encoding) if encoding != declared_encoding => {
            log::debug!(
                "Re-decoding markup as {} (declared in document)",
                encoding.name()
            );
            let (text, _, _) = encoding.decode(bytes);
            text.into_owned()
        }
        _ => text.into_owned(),
    }
}

/// The first `charset=` label found in the text, lowercased.
fn in_document_charset(text: &str) -> Option<String> {
    CHARSET_DECLARATION_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_default() {
        let html = "<meta charset=\"utf-8\"><p>深度求索</p>";
        assert_eq!(decode_with_declared(html.as_bytes(), None), html);
    }

    #[test]
    fn test_in_document_charset_overrides_declared() {
        let (bytes, _, _) = encoding_rs::GBK.encode("<meta charset=gbk><p>论文</p>");
        let text = decode_with_declared(&bytes, Some("utf-8"));
        assert_eq!(text, "<meta charset=gbk><p>论文</p>");
    }

    #[test]
    fn test_declared_charset_used_without_document_declaration() {
        let (bytes, _, _) = encoding_rs::GBK.encode("<p>论文</p>");
        assert_eq!(decode_with_declared(&bytes, Some("GB2312")), "<p>论文</p>");
    }

    #[test]
    fn test_unknown_document_charset_keeps_declared_decoding() {
        let html = "<meta charset=\"x-made-up\"><p>ok</p>";
        assert_eq!(decode_with_declared(html.as_bytes(), Some("utf-8")), html);
    }

    #[test]
    fn test_invalid_bytes_are_substituted() {
        let text = decode_with_declared(b"ok \xff\xfe end", None);
        assert!(text.starts_with("ok "));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with(" end"));
    }

    #[test]
    fn test_in_document_charset_regex() {
        assert_eq!(
            in_document_charset("content=\"text/html; Charset = 'UTF-8'\""),
            Some("utf-8".to_string())
        );
        assert_eq!(in_document_charset("<p>no declaration</p>"), None);
    }
}
