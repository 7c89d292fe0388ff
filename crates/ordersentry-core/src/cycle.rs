//! One scan cycle: connect, resolve, search, verify, report, close.
//!
//! A cycle either completes with a [`CycleReport`] or fails with a
//! single classified [`Error`]; either way the connection is closed
//! before returning, so a failed cycle never leaks a socket into the
//! next one.

use tokio::io::{AsyncRead, AsyncWrite};

use ordersentry_imap::{FetchSpec, Session, SessionConfig};

use crate::criteria::SearchCriteria;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::matcher::contains_all;
use crate::normalize::normalize;
use crate::report::{MatchSink, OrderMatch};
use crate::resolver::resolve_box;

/// Everything one cycle needs to run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Connection and credential settings.
    pub session: SessionConfig,
    /// Mailbox to scan.
    pub mailbox: String,
    /// Boxes tried when `mailbox` cannot be opened.
    pub fallback_boxes: Vec<String>,
    /// Tokens that must all appear in a message's canonical text.
    pub required_tokens: Vec<String>,
    /// Days of history to consider; `<= 0` scans everything.
    pub lookback_days: i64,
    /// Upper bound on messages examined per cycle, newest first.
    pub max_messages: usize,
    /// Push the token filters down to the server's SEARCH. Local
    /// verification runs either way; this only trims the candidate set.
    pub server_filter: bool,
}

/// What one completed cycle saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The mailbox actually scanned (may be a fallback).
    pub mailbox: String,
    /// Candidates the server returned before capping.
    pub candidates: usize,
    /// Messages fetched and verified locally.
    pub processed: usize,
    /// Messages that passed local verification and were reported.
    pub matched: usize,
}

/// Runs one full cycle against a live server.
///
/// # Errors
/// Any [`Error`] variant; see the per-phase operations for details.
pub async fn run_cycle(config: &ScanConfig, sink: &dyn MatchSink) -> Result<CycleReport> {
    let mut session = Session::connect(&config.session).await.map_err(Error::from_connect)?;
    let outcome = scan(&mut session, config, sink).await;
    session.close().await;
    outcome
}

/// The post-connect portion of a cycle, over any transport.
///
/// # Errors
/// [`Error::BoxUnavailable`], [`Error::Search`] or [`Error::Fetch`].
pub async fn scan<S>(
    session: &mut Session<S>,
    config: &ScanConfig,
    sink: &dyn MatchSink,
) -> Result<CycleReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mailbox = resolve_box(session, &config.mailbox, &config.fallback_boxes).await?;

    let mut criteria = SearchCriteria::lookback(config.lookback_days);
    if config.server_filter {
        criteria = criteria.with_server_tokens(config.required_tokens.iter().cloned());
    }
    let mut seqs = session.search(&criteria.to_query()).await.map_err(Error::Search)?;
    let candidates = seqs.len();

    // Newest first, bounded per cycle.
    seqs.sort_unstable();
    seqs.reverse();
    if config.max_messages > 0 {
        seqs.truncate(config.max_messages);
    }
    tracing::debug!(mailbox = %mailbox, candidates, examining = seqs.len(), "search complete");

    let spec = FetchSpec::scan_default();
    let mut processed = 0;
    let mut matched = 0;
    for seq in seqs {
        let messages = session.fetch(&[seq], &spec).await.map_err(Error::Fetch)?;
        processed += 1;
        let Some(raw) = messages.into_iter().next() else {
            tracing::warn!(seq, "server returned no data for candidate, skipping");
            continue;
        };

        let normal = normalize(&raw);
        if !contains_all(&normal.text, &config.required_tokens) {
            continue;
        }
        let record = extract(&normal.text);
        matched += 1;
        sink.report(&OrderMatch { seq, subject: normal.subject, record });
    }

    Ok(CycleReport { mailbox, candidates, processed, matched })
}
