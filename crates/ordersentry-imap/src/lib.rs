//! # ordersentry-imap
//!
//! A minimal async IMAP4rev1 client, sized for a polling mailbox scanner.
//!
//! This crate speaks exactly the slice of RFC 3501 that a scan cycle needs:
//! LOGIN, EXAMINE, SEARCH, FETCH of peeked body sections, CLOSE and LOGOUT.
//! It does not implement IDLE, flag mutation, or mailbox management.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ordersentry_imap::{Session, SessionConfig, SearchQuery, FetchSpec};
//!
//! let config = SessionConfig::new("imap.example.com", 993)
//!     .credentials("user@example.com", "secret");
//!
//! let mut session = Session::connect(&config).await?;
//! session.open("INBOX").await?;
//!
//! let seqs = session.search(&SearchQuery::All).await?;
//! let messages = session.fetch(&seqs, &FetchSpec::scan_default()).await?;
//! session.close().await;
//! ```
//!
//! ## Design
//!
//! - **TLS via rustls**: no OpenSSL dependency; certificate validation can be
//!   relaxed for servers with self-signed certificates.
//! - **Framed I/O**: CRLF-terminated lines with IMAP literal (`{n}`) support.
//! - **Line-oriented responses**: tagged status lines, `* SEARCH` results and
//!   FETCH body sections are recognized; everything else is ignored, which is
//!   all a read-only scanner requires.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod command;
mod error;
mod framed;
mod response;
mod session;
mod stream;

pub use command::{FetchSpec, SearchQuery, TagGenerator, imap_date};
pub use error::{Error, Result};
pub use response::{BodySection, RawMessage, ReplyStatus, TaggedReply};
pub use session::{Session, SessionConfig};
pub use stream::{ImapStream, connect_plain, connect_tls, tls_connector};
