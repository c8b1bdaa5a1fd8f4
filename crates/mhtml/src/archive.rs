//! MIME multipart container parsing for saved web pages (MHTML).
//!
//! An archive is a MIME message whose `multipart/related` body holds the page
//! markup followed by every resource the page embedded. Each part carries a
//! `Content-Type`, usually a `Content-Location` naming the original URL, and a
//! transfer encoding (`quoted-printable` for markup, `base64` for images).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use deck_core::{Error, Result};
use memchr::memmem;

/// Deepest multipart nesting we follow.
const MAX_NESTING_DEPTH: usize = 8;

/// Base64 engine that accepts missing or surplus padding.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One leaf part of an archive, with its payload already transfer-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePart {
    /// Lowercased MIME type, e.g. `text/html`.
    pub content_type: String,

    /// Declared `charset` parameter, if any.
    pub charset: Option<String>,

    /// `Content-Location` header: the resource's original URL.
    pub location: Option<String>,

    /// Decoded payload bytes.
    pub body: Vec<u8>,
}

impl ArchivePart {
    /// Whether this part holds a markup document.
    pub fn is_markup(&self) -> bool {
        matches!(
            self.content_type.as_str(),
            "text/html" | "application/xhtml+xml"
        )
    }

    /// Whether this part holds an image.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// A parsed archive: its leaf parts in document order.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    parts: Vec<ArchivePart>,
}

impl Archive {
    /// Parse raw archive bytes.
    ///
    /// Nested multiparts are flattened into one part list. Undecodable
    /// payloads become empty rather than failing the archive; only a
    /// multipart with no usable boundary is an error.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut parts = Vec::new();
        collect_parts(data, 0, &mut parts)?;
        log::debug!("Archive holds {} parts", parts.len());
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[ArchivePart] {
        &self.parts
    }

    /// The primary markup part: the first one found.
    pub fn markup_part(&self) -> Option<&ArchivePart> {
        self.parts.iter().find(|p| p.is_markup())
    }

    /// All image parts, in document order.
    pub fn image_parts(&self) -> impl Iterator<Item = &ArchivePart> {
        self.parts.iter().filter(|p| p.is_image())
    }
}

/// Parse one MIME entity, pushing its leaf parts onto `parts`.
fn collect_parts(data: &[u8], depth: usize, parts: &mut Vec<ArchivePart>) -> Result<()> {
    let (head, body) = split_entity(data);
    let headers = Headers::parse(&String::from_utf8_lossy(head));
    let content_type = headers
        .get("content-type")
        .map(ContentType::parse)
        .unwrap_or_else(ContentType::plain_text);

    if content_type.is_multipart() {
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::MimeError(format!(
                "multipart nesting deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        let boundary = content_type.param("boundary").ok_or_else(|| {
            Error::MimeError(format!("{} declares no boundary", content_type.mime))
        })?;

        let sections = split_multipart(body, boundary);
        if sections.is_empty() {
            return Err(Error::MimeError(format!(
                "no parts found for boundary '{}'",
                boundary
            )));
        }

        for section in sections {
            if let Err(e) = collect_parts(section, depth + 1, parts) {
                log::warn!("Skipping malformed nested part: {}", e);
            }
        }
        return Ok(());
    }

    let transfer_encoding = headers
        .get("content-transfer-encoding")
        .map(|e| e.trim().to_ascii_lowercase());

    parts.push(ArchivePart {
        charset: content_type.param("charset").map(str::to_string),
        content_type: content_type.mime,
        location: headers
            .get("content-location")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        body: decode_transfer(body, transfer_encoding.as_deref()),
    });

    Ok(())
}

/// Split an entity into its header block and body at the first blank line.
fn split_entity(data: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = data.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = data.strip_prefix(b"\n") {
        return (&[], rest);
    }

    let crlf = memmem::find(data, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = memmem::find(data, b"\n\n").map(|i| (i, i + 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((head_end, body_start)) => (&data[..head_end], &data[body_start..]),
        None => (data, &[]),
    }
}

/// Split a multipart body into its sections.
///
/// Delimiters are whole lines holding `--boundary`; `--boundary--` closes
/// the multipart. The line break before a delimiter belongs to the delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let finder = memmem::Finder::new(delimiter.as_bytes());
    let starts: Vec<usize> = finder
        .find_iter(body)
        .filter(|&pos| pos == 0 || body[pos - 1] == b'\n')
        .filter(|&pos| ends_delimiter_line(&body[pos + delimiter.len()..]))
        .collect();

    let mut sections = Vec::new();
    for (idx, &pos) in starts.iter().enumerate() {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }

        let Some(newline) = memchr::memchr(b'\n', &body[after..]) else {
            break;
        };
        let content_start = after + newline + 1;

        let content_end = match starts.get(idx + 1) {
            Some(&next) => {
                let mut end = next;
                if end > content_start && body[end - 1] == b'\n' {
                    end -= 1;
                    if end > content_start && body[end - 1] == b'\r' {
                        end -= 1;
                    }
                }
                end
            }
            None => body.len(),
        }
        .max(content_start);

        sections.push(&body[content_start..content_end]);
    }

    sections
}

/// Whether the bytes following `--boundary` finish a delimiter line: an
/// optional closing `--`, then only spaces or tabs up to the line end.
fn ends_delimiter_line(rest: &[u8]) -> bool {
    let rest = rest.strip_prefix(b"--").unwrap_or(rest);
    let line_end = memchr::memchr(b'\n', rest).unwrap_or(rest.len());
    let line = &rest[..line_end];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.iter().all(|&b| b == b' ' || b == b'\t')
}

/// Undo a part's `Content-Transfer-Encoding`.
fn decode_transfer(body: &[u8], encoding: Option<&str>) -> Vec<u8> {
    match encoding {
        Some("base64") => decode_base64(body),
        Some("quoted-printable") => decode_quoted_printable(body),
        _ => body.to_vec(),
    }
}

fn decode_base64(body: &[u8]) -> Vec<u8> {
    let compact: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    match BASE64_LENIENT.decode(&compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!(
                "Undecodable base64 payload ({} bytes), treating as empty: {}",
                compact.len(),
                e
            );
            Vec::new()
        }
    }
}

/// Decode quoted-printable bytes. Malformed escapes are kept literally.
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        match (input.get(i + 1).copied(), input.get(i + 2).copied()) {
            // Soft line breaks
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\n'), _) => i += 2,
            (Some(hi), Some(lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    out.push(b'=');
                    i += 1;
                }
            },
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }

    out
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

/// Header fields of one entity, names lowercased, folded lines joined.
#[derive(Debug, Clone, Default)]
struct Headers(Vec<(String, String)>);

impl Headers {
    fn parse(raw: &str) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in raw.lines() {
            if line.starts_with(|c: char| c == ' ' || c == '\t') {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                fields.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        Self(fields)
    }

    /// First value of the named header.
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentType {
    mime: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    fn plain_text() -> Self {
        Self {
            mime: "text/plain".to_string(),
            params: Vec::new(),
        }
    }

    fn parse(value: &str) -> Self {
        let mut pieces = split_params(value).into_iter();
        let mime = pieces
            .next()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "text/plain".to_string());

        let params = pieces
            .filter_map(|piece| {
                let (key, value) = piece.split_once('=')?;
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((key.trim().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        Self { mime, params }
    }

    fn is_multipart(&self) -> bool {
        self.mime.starts_with("multipart/")
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Split a header value on `;`, ignoring separators inside double quotes.
fn split_params(value: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in value.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    pieces.push(current);

    pieces
}
