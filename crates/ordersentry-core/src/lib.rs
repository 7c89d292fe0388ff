//! Mailbox scanning pipeline.
//!
//! Everything between the wire protocol and the binary lives here: what
//! to search for ([`criteria`]), turning fetched messages into canonical
//! text ([`normalize`]), deciding whether a message is an order
//! confirmation ([`matcher`]), pulling fields out of it ([`extract`]),
//! delivering results ([`report`]), and running the whole thing on a
//! schedule ([`cycle`], [`scheduler`]).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod criteria;
pub mod cycle;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod scheduler;

pub use criteria::SearchCriteria;
pub use cycle::{CycleReport, ScanConfig, run_cycle, scan};
pub use error::{Error, Result};
pub use extract::{OrderRecord, extract};
pub use matcher::contains_all;
pub use normalize::{NO_SUBJECT, NormalizedMessage, normalize, strip_markup};
pub use report::{LogSink, MatchSink, MemorySink, OrderMatch};
pub use resolver::{FALLBACK_BOXES, default_fallbacks, resolve_box};
pub use scheduler::{OnceMode, PollScheduler, RunMode};
