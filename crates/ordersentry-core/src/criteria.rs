//! Search criteria for a scan cycle.
//!
//! The server-side query is an optimization only: every candidate it
//! returns is re-verified locally against the full token list, so a
//! server that ignores `BODY` filters (or matches them loosely) still
//! produces correct results.

use chrono::{Days, NaiveDate, Utc};
use ordersentry_imap::SearchQuery;

/// What to ask the server for when listing candidate messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Only consider messages dated on or after this day.
    pub since: Option<NaiveDate>,
    /// Substring filters pushed down to the server, best effort.
    pub server_tokens: Vec<String>,
}

impl SearchCriteria {
    /// Criteria with no constraints; the server returns every message.
    #[must_use]
    pub const fn new() -> Self {
        Self { since: None, server_tokens: Vec::new() }
    }

    /// Criteria covering the last `days` days, measured from today (UTC).
    ///
    /// `days <= 0` disables the date bound entirely.
    #[must_use]
    pub fn lookback(days: i64) -> Self {
        Self::lookback_from(Utc::now().date_naive(), days)
    }

    /// Like [`SearchCriteria::lookback`] but with an explicit reference day.
    #[must_use]
    pub fn lookback_from(today: NaiveDate, days: i64) -> Self {
        let since = u64::try_from(days)
            .ok()
            .filter(|d| *d > 0)
            .and_then(|d| today.checked_sub_days(Days::new(d)));
        Self { since, server_tokens: Vec::new() }
    }

    /// Adds substring filters to push down to the server.
    #[must_use]
    pub fn with_server_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the wire-level query. Empty criteria become `ALL`.
    #[must_use]
    pub fn to_query(&self) -> SearchQuery {
        let mut parts = Vec::new();
        if let Some(since) = self.since {
            parts.push(SearchQuery::Since(since));
        }
        for token in &self.server_tokens {
            parts.push(SearchQuery::Body(token.clone()));
        }
        match parts.len() {
            0 => SearchQuery::All,
            1 => parts.remove(0),
            _ => SearchQuery::And(parts),
        }
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_criteria_search_everything() {
        assert_eq!(SearchCriteria::new().to_query(), SearchQuery::All);
    }

    #[test]
    fn lookback_subtracts_whole_days() {
        let criteria = SearchCriteria::lookback_from(day(2026, 1, 17), 14);
        assert_eq!(criteria.since, Some(day(2026, 1, 3)));
        assert_eq!(criteria.to_query(), SearchQuery::Since(day(2026, 1, 3)));
    }

    #[test]
    fn non_positive_lookback_disables_the_date_bound() {
        assert_eq!(SearchCriteria::lookback_from(day(2026, 1, 17), 0).since, None);
        assert_eq!(SearchCriteria::lookback_from(day(2026, 1, 17), -3).since, None);
    }

    #[test]
    fn tokens_and_date_combine_into_a_conjunction() {
        let criteria = SearchCriteria::lookback_from(day(2026, 1, 17), 7)
            .with_server_tokens(["Credit Card", "United Kingdom"]);
        let query = criteria.to_query();
        assert_eq!(
            query,
            SearchQuery::And(vec![
                SearchQuery::Since(day(2026, 1, 10)),
                SearchQuery::Body("Credit Card".into()),
                SearchQuery::Body("United Kingdom".into()),
            ])
        );
    }

    #[test]
    fn a_single_part_is_not_wrapped() {
        let criteria = SearchCriteria::new().with_server_tokens(["Credit Card"]);
        assert_eq!(criteria.to_query(), SearchQuery::Body("Credit Card".into()));
    }
}
