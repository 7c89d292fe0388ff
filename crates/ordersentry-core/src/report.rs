//! Delivery of matches to the operator.
//!
//! Matches are reported one at a time, as soon as they are confirmed,
//! so results found before a mid-cycle failure are never lost.

use std::sync::Mutex;

use crate::extract::OrderRecord;

/// One confirmed order-confirmation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMatch {
    /// Sequence number within the scanned mailbox.
    pub seq: u32,
    /// Subject line, or the no-subject placeholder.
    pub subject: String,
    /// Best-effort extracted fields.
    pub record: OrderRecord,
}

/// Where confirmed matches go.
pub trait MatchSink: Send + Sync {
    /// Delivers one match. Must not fail; delivery is fire-and-forget.
    fn report(&self, found: &OrderMatch);
}

/// Reports matches to the log, one structured event per match.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MatchSink for LogSink {
    fn report(&self, found: &OrderMatch) {
        tracing::info!(
            seq = found.seq,
            subject = %found.subject,
            order_id = found.record.order_id.as_deref().unwrap_or("-"),
            amount = found.record.amount.as_deref().unwrap_or("-"),
            "order match",
        );
    }
}

/// Collects matches in memory. Used by tests and embedders that want
/// to inspect results programmatically.
#[derive(Debug, Default)]
pub struct MemorySink {
    matches: Mutex<Vec<OrderMatch>>,
}

impl MemorySink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    ///
    /// # Panics
    /// Panics if a previous reporter panicked while holding the lock.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn matches(&self) -> Vec<OrderMatch> {
        self.matches.lock().unwrap().clone()
    }
}

impl MatchSink for MemorySink {
    #[allow(clippy::unwrap_used)]
    fn report(&self, found: &OrderMatch) {
        self.matches.lock().unwrap().push(found.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_arrival_order() {
        let sink = MemorySink::new();
        for seq in [9, 3, 7] {
            sink.report(&OrderMatch {
                seq,
                subject: format!("Order {seq}"),
                record: OrderRecord::default(),
            });
        }
        let seqs: Vec<u32> = sink.matches().iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![9, 3, 7]);
    }
}
