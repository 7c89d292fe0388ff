//! Best-effort field extraction from canonical message text.
//!
//! Each field has an ordered rule table; the first rule that matches
//! wins and later rules are not consulted. A message with no matching
//! rule still yields a record, just with that field absent.

use std::sync::OnceLock;

use regex::Regex;

/// Fields recovered from one matched message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderRecord {
    /// Numeric order identifier, digits only.
    pub order_id: Option<String>,
    /// Monetary total as it appeared in the text, without the currency sign.
    pub amount: Option<String>,
}

impl OrderRecord {
    /// True when neither field was recovered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.order_id.is_none() && self.amount.is_none()
    }
}

/// Runs both rule tables over `text`.
#[must_use]
pub fn extract(text: &str) -> OrderRecord {
    OrderRecord {
        order_id: first_capture(order_id_rules(), text),
        amount: first_capture(amount_rules(), text),
    }
}

/// Ordered from most to least specific; first match wins.
fn order_id_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| compile(&[r"(?i)your\s+order\s*#\s*(\d+)", r"(?i)order\s*#\s*(\d+)"]))
}

/// The strict rule requires the "(Incl. Tax)" qualifier; the loose rule
/// accepts any text between the label and the amount, across lines.
fn amount_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            r"(?i)grand\s+total\s*\(incl\.?\s*tax\)\s*£\s*([0-9][0-9.]*)",
            r"(?is)grand\s+total.*?£\s*([0-9][0-9.]*)",
        ])
    })
}

#[allow(clippy::expect_used)]
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("hard-coded pattern"))
        .collect()
}

fn first_capture(rules: &[Regex], text: &str) -> Option<String> {
    rules
        .iter()
        .find_map(|rule| rule.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_order_id_and_amount() {
        let record = extract(
            "Thank you! Your Order #000021753 has been received. \
             Grand Total (Incl.Tax) £14.19",
        );
        assert_eq!(record.order_id.as_deref(), Some("000021753"));
        assert_eq!(record.amount.as_deref(), Some("14.19"));
    }

    #[test]
    fn falls_back_to_the_generic_order_rule() {
        let record = extract("Re: order # 42 update");
        assert_eq!(record.order_id.as_deref(), Some("42"));
    }

    #[test]
    fn strict_amount_rule_takes_priority() {
        // The loose rule would pick up the later figure if consulted first.
        let record = extract(
            "Grand Total (Incl. Tax) £14.19\nStore credit total £5.00",
        );
        assert_eq!(record.amount.as_deref(), Some("14.19"));
    }

    #[test]
    fn loose_amount_rule_spans_markup_remnants() {
        let record = extract("Grand Total\n(inc. VAT)\n£ 103.50");
        assert_eq!(record.amount.as_deref(), Some("103.50"));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let record = extract("nothing to see here");
        assert!(record.is_empty());

        let partial = extract("Your Order #7");
        assert_eq!(partial.order_id.as_deref(), Some("7"));
        assert_eq!(partial.amount, None);
    }

    #[test]
    fn rules_ignore_case_and_flexible_spacing() {
        let record = extract("YOUR ORDER  #  88 GRAND TOTAL (INCL TAX) £ 9.99");
        assert_eq!(record.order_id.as_deref(), Some("88"));
        assert_eq!(record.amount.as_deref(), Some("9.99"));
    }
}
