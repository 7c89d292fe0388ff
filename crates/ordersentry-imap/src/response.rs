//! Minimal response handling.
//!
//! Only the reply shapes a read-only scanner meets are recognized: tagged
//! status lines, untagged `SEARCH` results, untagged `BYE`, and untagged
//! `FETCH` replies carrying peeked body sections. Anything else is ignored
//! by the session loop.

/// Status of a tagged reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Command completed.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command rejected (protocol error).
    Bad,
}

/// A parsed tagged reply line.
#[derive(Debug, Clone)]
pub struct TaggedReply {
    /// Command tag the reply answers.
    pub tag: String,
    /// Reply status.
    pub status: ReplyStatus,
    /// Human-readable response text.
    pub text: String,
}

/// Which body section a fetched part came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySection {
    /// `HEADER.FIELDS (...)` section.
    Header,
    /// `TEXT` section (the full MIME body).
    Text,
}

/// One fetched message: sequence number plus its labeled body sections.
///
/// The parts are protocol-level payloads; interpreting them (MIME splitting,
/// markup stripping) is the scan pipeline's job.
#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    /// Server-assigned sequence number within the open box.
    pub seq: u32,
    parts: Vec<(BodySection, Vec<u8>)>,
}

impl RawMessage {
    /// Returns the first part fetched from the given section, if any.
    #[must_use]
    pub fn section(&self, which: BodySection) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(kind, _)| *kind == which)
            .map(|(_, data)| data.as_slice())
    }

    /// Returns a header field value from the fetched header section,
    /// unfolding continuation lines. Field name match is case-insensitive.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<String> {
        let header = self.section(BodySection::Header)?;
        let text = String::from_utf8_lossy(header);

        let mut value: Option<String> = None;
        for line in text.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                // Continuation of the previous field.
                if let Some(v) = value.as_mut() {
                    v.push(' ');
                    v.push_str(line.trim());
                }
                continue;
            }
            if value.is_some() {
                break;
            }
            if let Some((field, rest)) = line.split_once(':')
                && field.trim().eq_ignore_ascii_case(name)
            {
                value = Some(rest.trim().to_string());
            }
        }
        value
    }

    /// Assembles a message from already-fetched section payloads.
    #[must_use]
    pub fn with_parts(seq: u32, parts: Vec<(BodySection, Vec<u8>)>) -> Self {
        Self { seq, parts }
    }
}

/// Parses a tagged status line, `<tag> OK|NO|BAD <text>`.
pub(crate) fn parse_tagged(reply: &[u8], tag: &str) -> Option<TaggedReply> {
    let line = String::from_utf8_lossy(reply);
    let line = line.trim_end();
    let rest = line.strip_prefix(tag)?.strip_prefix(' ')?;

    let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let status = match word.to_ascii_uppercase().as_str() {
        "OK" => ReplyStatus::Ok,
        "NO" => ReplyStatus::No,
        "BAD" => ReplyStatus::Bad,
        _ => return None,
    };

    Some(TaggedReply {
        tag: tag.to_string(),
        status,
        text: text.to_string(),
    })
}

/// Parses an untagged `* BYE <text>` line.
pub(crate) fn parse_bye(reply: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(reply);
    let rest = line.trim_end().strip_prefix("* ")?;
    let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
    word.eq_ignore_ascii_case("BYE").then(|| text.to_string())
}

/// Parses an untagged `* SEARCH n n n...` line into sequence numbers.
pub(crate) fn parse_search(reply: &[u8]) -> Option<Vec<u32>> {
    let line = String::from_utf8_lossy(reply);
    let rest = line.trim_end().strip_prefix("* ")?;
    let ids = rest.strip_prefix("SEARCH").or_else(|| rest.strip_prefix("search"))?;

    Some(
        ids.split_ascii_whitespace()
            .filter_map(|n| n.parse().ok())
            .collect(),
    )
}

/// Parses an untagged FETCH reply into a [`RawMessage`].
///
/// Expected shape: `* <seq> FETCH (BODY[<section>] <data> ...)` where each
/// `<data>` is a literal (already inlined by the transport layer, with its
/// `{n}\r\n` announcement preceding the raw bytes), a quoted string, or NIL.
pub(crate) fn parse_fetch(reply: &[u8]) -> Option<RawMessage> {
    let rest = reply.strip_prefix(b"* ")?;
    let digits_end = rest.iter().position(|b| !b.is_ascii_digit())?;
    let seq: u32 = std::str::from_utf8(&rest[..digits_end]).ok()?.parse().ok()?;

    let rest = &rest[digits_end..];
    let keyword = b" FETCH ";
    if rest.len() < keyword.len() || !rest[..keyword.len()].eq_ignore_ascii_case(keyword) {
        return None;
    }

    let mut parts = Vec::new();
    let mut cursor = &rest[keyword.len()..];

    while let Some(pos) = find(cursor, b"BODY[") {
        cursor = &cursor[pos + b"BODY[".len()..];
        let close = cursor.iter().position(|&b| b == b']')?;
        let section_name = &cursor[..close];
        cursor = &cursor[close + 1..];

        // Skip the separating space before the data item.
        while cursor.first() == Some(&b' ') {
            cursor = &cursor[1..];
        }

        let (data, remaining) = take_data(cursor)?;
        cursor = remaining;

        let kind = classify_section(section_name);
        if let (Some(kind), Some(data)) = (kind, data) {
            parts.push((kind, data));
        }
    }

    Some(RawMessage { seq, parts })
}

fn classify_section(name: &[u8]) -> Option<BodySection> {
    let upper = name.to_ascii_uppercase();
    if upper.starts_with(b"HEADER") {
        Some(BodySection::Header)
    } else if upper == b"TEXT" {
        Some(BodySection::Text)
    } else {
        None
    }
}

/// Consumes one data item: `{n}\r\n<bytes>`, `"quoted"` or `NIL`.
fn take_data(input: &[u8]) -> Option<(Option<Vec<u8>>, &[u8])> {
    match input.first()? {
        b'{' => {
            let close = input.iter().position(|&b| b == b'}')?;
            let digits = std::str::from_utf8(&input[1..close]).ok()?;
            let len: usize = digits.trim_end_matches('+').parse().ok()?;
            let rest = input[close + 1..].strip_prefix(b"\r\n")?;
            if rest.len() < len {
                return None;
            }
            Some((Some(rest[..len].to_vec()), &rest[len..]))
        }
        b'"' => {
            let mut out = Vec::new();
            let mut i = 1;
            while i < input.len() {
                match input[i] {
                    b'\\' if i + 1 < input.len() => {
                        out.push(input[i + 1]);
                        i += 2;
                    }
                    b'"' => return Some((Some(out), &input[i + 1..])),
                    b => {
                        out.push(b);
                        i += 1;
                    }
                }
            }
            None
        }
        b'N' | b'n' => {
            let rest = input.get(3..)?;
            input[..3]
                .eq_ignore_ascii_case(b"NIL")
                .then_some((None, rest))
        }
        _ => None,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
