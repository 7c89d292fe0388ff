//! Command construction: tags, quoting and query serialization.

use std::fmt::Write as _;

use chrono::NaiveDate;

/// Generates sequential command tags, `C0001`, `C0002`, ...
///
/// Tags match commands with their tagged responses. A session owns exactly
/// one generator, so no synchronization is needed.
#[derive(Debug, Default)]
pub struct TagGenerator {
    counter: u32,
}

impl TagGenerator {
    /// Creates a new generator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Returns the next tag.
    pub fn next(&mut self) -> String {
        self.counter = self.counter.wrapping_add(1);
        format!("C{:04}", self.counter)
    }
}

/// Server-side search query, compiled by the scan pipeline and serialized
/// here into RFC 3501 search keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// All messages in the open box.
    All,
    /// Messages with an internal date on or after the given day.
    Since(NaiveDate),
    /// Messages whose body contains the given substring.
    Body(String),
    /// Conjunction of queries (IMAP search keys are AND by juxtaposition).
    And(Vec<SearchQuery>),
}

impl SearchQuery {
    /// Serializes the query into the argument portion of a SEARCH command.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::All => out.push_str("ALL"),
            Self::Since(date) => {
                out.push_str("SINCE ");
                out.push_str(&imap_date(*date));
            }
            Self::Body(text) => {
                out.push_str("BODY ");
                write_astring(out, text);
            }
            Self::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    part.write_to(out);
                }
            }
        }
    }
}

/// Body sections requested by a FETCH.
///
/// A scan always peeks: fetching must never set `\Seen` on the messages it
/// inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    /// Header field names to request, e.g. `FROM TO SUBJECT DATE`.
    pub header_fields: Vec<&'static str>,
    /// Whether to request the full text section of the body.
    pub body_text: bool,
}

impl FetchSpec {
    /// The fetch spec used by a scan cycle: routing headers plus
    /// `CONTENT-TYPE` (so multipart bodies can be split), and the text
    /// section carrying whichever representations the message has.
    #[must_use]
    pub fn scan_default() -> Self {
        Self {
            header_fields: vec!["FROM", "TO", "SUBJECT", "DATE", "CONTENT-TYPE"],
            body_text: true,
        }
    }

    /// Serializes the items portion of a FETCH command.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut items = Vec::new();
        if !self.header_fields.is_empty() {
            items.push(format!(
                "BODY.PEEK[HEADER.FIELDS ({})]",
                self.header_fields.join(" ")
            ));
        }
        if self.body_text {
            items.push("BODY.PEEK[TEXT]".to_string());
        }
        format!("({})", items.join(" "))
    }
}

/// Formats a date as IMAP date-text, e.g. `17-Aug-2026`.
#[must_use]
pub fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Writes an astring: a bare atom, or a quoted string when needed.
pub(crate) fn write_astring(out: &mut String, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        out.push('"');
        for c in s.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(s);
    }
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Serializes a set of message sequence numbers, collapsing runs into
/// `lo:hi` ranges.
#[must_use]
pub(crate) fn sequence_set(seqs: &[u32]) -> String {
    let mut sorted: Vec<u32> = seqs.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = String::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let mut end = start;
        while i + 1 < sorted.len() && sorted[i + 1] == end + 1 {
            i += 1;
            end = sorted[i];
        }
        if !out.is_empty() {
            out.push(',');
        }
        if start == end {
            let _ = write!(out, "{start}");
        } else {
            let _ = write!(out, "{start}:{end}");
        }
        i += 1;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_sequential() {
        let mut tags = TagGenerator::new();
        assert_eq!(tags.next(), "C0001");
        assert_eq!(tags.next(), "C0002");
    }

    #[test]
    fn date_text_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 17).unwrap();
        assert_eq!(imap_date(date), "17-Aug-2026");
    }

    #[test]
    fn since_query() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(SearchQuery::Since(date).serialize(), "SINCE 03-Jan-2026");
    }

    #[test]
    fn body_query_quotes_spaces() {
        let q = SearchQuery::Body("Credit Card".to_string());
        assert_eq!(q.serialize(), "BODY \"Credit Card\"");
    }

    #[test]
    fn and_query_juxtaposes() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let q = SearchQuery::And(vec![
            SearchQuery::Since(date),
            SearchQuery::Body("United Kingdom".to_string()),
        ]);
        assert_eq!(q.serialize(), "SINCE 03-Jan-2026 BODY \"United Kingdom\"");
    }

    #[test]
    fn astring_atom_passthrough() {
        let mut out = String::new();
        write_astring(&mut out, "INBOX");
        assert_eq!(out, "INBOX");
    }

    #[test]
    fn astring_quotes_and_escapes() {
        let mut out = String::new();
        write_astring(&mut out, "[Gmail]/All Mail");
        assert_eq!(out, "\"[Gmail]/All Mail\"");

        let mut out = String::new();
        write_astring(&mut out, "a\"b");
        assert_eq!(out, "\"a\\\"b\"");
    }

    #[test]
    fn fetch_spec_serialization() {
        let spec = FetchSpec::scan_default();
        assert_eq!(
            spec.serialize(),
            "(BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE CONTENT-TYPE)] BODY.PEEK[TEXT])"
        );
    }

    #[test]
    fn sequence_sets_collapse_ranges() {
        assert_eq!(sequence_set(&[5]), "5");
        assert_eq!(sequence_set(&[1, 2, 3, 7, 9, 10]), "1:3,7,9:10");
        assert_eq!(sequence_set(&[10, 9, 7, 3, 2, 1]), "1:3,7,9:10");
        assert_eq!(sequence_set(&[]), "");
    }
}
