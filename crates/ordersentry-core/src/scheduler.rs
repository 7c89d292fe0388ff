//! The polling loop around cycles.
//!
//! The scheduler is deliberately dumb: run a cycle, log the outcome,
//! wait, repeat. Cycle failures are absorbed; only the configured run
//! mode ever stops the loop.

use std::future::Future;
use std::time::Duration;

use crate::cycle::CycleReport;
use crate::error::Result;

/// What happens after the single cycle in run-once mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnceMode {
    /// Return from the loop so the process can exit.
    Exit,
    /// Stay alive without scanning again, keeping sidecars (such as a
    /// liveness endpoint) reachable.
    Hold,
}

/// How many cycles to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll forever with the configured delay between cycles.
    Forever,
    /// Run exactly one cycle.
    Once(OnceMode),
}

/// Drives repeated scan cycles.
#[derive(Debug, Clone, Copy)]
pub struct PollScheduler {
    delay: Duration,
    mode: RunMode,
}

impl PollScheduler {
    /// A scheduler that waits `delay` after each completed cycle.
    ///
    /// The delay starts when a cycle finishes, not when it starts, so
    /// a slow cycle never overlaps the next one.
    #[must_use]
    pub const fn new(delay: Duration, mode: RunMode) -> Self {
        Self { delay, mode }
    }

    /// Runs cycles until the run mode says stop.
    ///
    /// `cycle` is invoked once per tick. Errors are logged and
    /// swallowed; a failing server costs one tick, not the process.
    pub async fn run<F, Fut>(&self, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CycleReport>>,
    {
        loop {
            match cycle().await {
                Ok(report) => {
                    tracing::info!(
                        mailbox = %report.mailbox,
                        candidates = report.candidates,
                        processed = report.processed,
                        matched = report.matched,
                        "cycle complete",
                    );
                }
                Err(err) => {
                    tracing::error!(error = %err, source = ?std::error::Error::source(&err), "cycle failed");
                }
            }

            match self.mode {
                RunMode::Once(OnceMode::Exit) => return,
                RunMode::Once(OnceMode::Hold) => {
                    tracing::info!("single cycle done, holding");
                    std::future::pending::<()>().await;
                }
                RunMode::Forever => {
                    tracing::debug!(delay = ?self.delay, "sleeping until next cycle");
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;
    use ordersentry_imap as imap;

    fn report() -> CycleReport {
        CycleReport { mailbox: "INBOX".into(), candidates: 0, processed: 0, matched: 0 }
    }

    #[tokio::test]
    async fn once_exit_runs_exactly_one_cycle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = PollScheduler::new(Duration::from_secs(60), RunMode::Once(OnceMode::Exit));
        scheduler
            .run(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(report()) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn once_exit_returns_even_on_failure() {
        let scheduler = PollScheduler::new(Duration::from_secs(60), RunMode::Once(OnceMode::Exit));
        scheduler
            .run(|| async { Err(Error::Network(imap::Error::Bye("gone".into()))) })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = PollScheduler::new(Duration::from_millis(10), RunMode::Forever);
        let run = scheduler.run(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 2 == 0 {
                    Err(Error::Search(imap::Error::Bad("broken".into())))
                } else {
                    Ok(report())
                }
            }
        });
        // Paused time auto-advances, so this bounds iterations, not wall time.
        let _ = tokio::time::timeout(Duration::from_millis(55), run).await;
        assert!(calls.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn hold_mode_keeps_the_task_alive_without_rescanning() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = PollScheduler::new(Duration::from_millis(1), RunMode::Once(OnceMode::Hold));
        let run = scheduler.run(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(report()) }
        });
        assert!(tokio::time::timeout(Duration::from_secs(5), run).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
