//! Turns a fetched message into canonical plain text.
//!
//! The pipeline walks MIME multiparts (nested included), decodes
//! quoted-printable and base64 transfer encodings, strips markup from
//! HTML parts and joins everything into one plain-text string that the
//! matcher and extractor operate on. Normalizing already-canonical text
//! is a no-op, so the result can be fed back in safely.

use std::sync::OnceLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ordersentry_imap::{BodySection, RawMessage};
use regex::Regex;

/// Subject used when the message carries none.
pub const NO_SUBJECT: &str = "(no subject)";

/// A message reduced to the fields the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// The Subject header, or [`NO_SUBJECT`].
    pub subject: String,
    /// Canonical plain text of every textual body part.
    pub text: String,
}

/// Normalizes one fetched message.
#[must_use]
pub fn normalize(raw: &RawMessage) -> NormalizedMessage {
    let subject = raw
        .header_value("Subject")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    let content_type = raw.header_value("Content-Type").unwrap_or_default();
    let body = raw
        .section(BodySection::Text)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();

    let mut plains = Vec::new();
    let mut htmls = Vec::new();
    collect_texts(&content_type, &body, &mut plains, &mut htmls, 0);

    let mut canonical = plains.join("\n");
    // Markup is a fallback source: used when no plain text was found,
    // and appended otherwise so HTML-only order details are not lost.
    if !htmls.is_empty() {
        let stripped = strip_markup(&htmls.join("\n"));
        if !stripped.is_empty() {
            if !canonical.trim().is_empty() {
                canonical.push('\n');
            } else {
                canonical.clear();
            }
            canonical.push_str(&stripped);
        }
    }

    NormalizedMessage { subject, text: canonical.trim().to_string() }
}

/// Recursively gathers decoded text/plain and text/html part bodies.
fn collect_texts(
    content_type: &str,
    body: &str,
    plains: &mut Vec<String>,
    htmls: &mut Vec<String>,
    depth: u8,
) {
    const MAX_DEPTH: u8 = 8;
    if depth > MAX_DEPTH {
        return;
    }

    if let Some(boundary) = extract_boundary(content_type) {
        for part in split_multipart(body, &boundary) {
            let (headers, part_body) = split_headers_body(part);
            let part_type = header_lookup(headers, "Content-Type").unwrap_or_default();
            let encoding = header_lookup(headers, "Content-Transfer-Encoding").unwrap_or_default();
            if part_type.to_lowercase().contains("multipart/") {
                collect_texts(&part_type, part_body, plains, htmls, depth + 1);
            } else if part_type.to_lowercase().contains("text/html") {
                htmls.push(decode_transfer(part_body, &encoding));
            } else if part_type.to_lowercase().contains("text/plain") || part_type.is_empty() {
                plains.push(decode_transfer(part_body, &encoding));
            }
        }
        return;
    }

    // Single-part message: the section payload is the body itself.
    if content_type.to_lowercase().contains("text/html") {
        htmls.push(body.to_string());
    } else {
        plains.push(body.to_string());
    }
}

/// Pulls the `boundary=` parameter out of a multipart Content-Type.
fn extract_boundary(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    if !lower.contains("multipart/") {
        return None;
    }
    let start = lower.find("boundary=")? + "boundary=".len();
    let rest = &content_type[start..];
    let boundary = if let Some(quoted) = rest.strip_prefix('"') {
        quoted.split('"').next()?
    } else {
        rest.split([';', ' ', '\r', '\n']).next()?
    };
    (!boundary.is_empty()).then(|| boundary.to_string())
}

/// Splits a multipart body on its boundary markers, dropping the
/// preamble and the epilogue after the closing `--boundary--`.
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let marker = format!("--{boundary}");
    let mut parts = Vec::new();
    for chunk in body.split(marker.as_str()).skip(1) {
        if chunk.starts_with("--") {
            break;
        }
        parts.push(chunk.trim_start_matches(['\r', '\n']));
    }
    parts
}

/// Splits one MIME part into its header block and body.
fn split_headers_body(part: &str) -> (&str, &str) {
    for sep in ["\r\n\r\n", "\n\n"] {
        if let Some(idx) = part.find(sep) {
            return (&part[..idx], &part[idx + sep.len()..]);
        }
    }
    ("", part)
}

/// Case-insensitive header lookup within a part's header block,
/// unfolding continuation lines.
fn header_lookup(headers: &str, name: &str) -> Option<String> {
    let mut value: Option<String> = None;
    for line in headers.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(v) = value.as_mut() {
                v.push(' ');
                v.push_str(line.trim());
            }
            continue;
        }
        if value.is_some() {
            break;
        }
        if let Some((key, rest)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case(name) {
                value = Some(rest.trim().to_string());
            }
        }
    }
    value
}

/// Undoes the content transfer encoding of a part body.
///
/// Unknown encodings and corrupt payloads fall back to the raw text so
/// a bad part degrades to "no extra tokens" rather than a lost message.
fn decode_transfer(body: &str, encoding: &str) -> String {
    match encoding.trim().to_lowercase().as_str() {
        "base64" => {
            let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
            BASE64
                .decode(compact.as_bytes())
                .map_or_else(|_| body.to_string(), |bytes| String::from_utf8_lossy(&bytes).into_owned())
        }
        "quoted-printable" => decode_quoted_printable(body),
        _ => body.to_string(),
    }
}

/// Quoted-printable per RFC 2045: `=XX` hex escapes and soft line breaks.
fn decode_quoted_printable(body: &str) -> String {
    let mut out = Vec::with_capacity(body.len());
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft break: `=` at end of line joins it to the next.
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }
            if let (Some(hi), Some(lo)) = (hex_val(bytes.get(i + 1)), hex_val(bytes.get(i + 2))) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(byte: Option<&u8>) -> Option<u8> {
    match byte? {
        b @ b'0'..=b'9' => Some(b - b'0'),
        b @ b'A'..=b'F' => Some(b - b'A' + 10),
        b @ b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Reduces HTML to visible text: script and style blocks dropped whole,
/// tags removed, common entities decoded, whitespace collapsed to single
/// spaces, result trimmed.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let blocks = BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)\s*>").expect("hard-coded pattern")
    });
    #[allow(clippy::expect_used)]
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("hard-coded pattern"));
    #[allow(clippy::expect_used)]
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("hard-coded pattern"));

    let text = blocks.replace_all(html, " ");
    let text = tags.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"");
    spaces.replace_all(&text, " ").trim().to_string()
}
