//! Mailbox resolution with fallbacks.
//!
//! Store-specific mailboxes are often provider folders that disappear
//! when a label is renamed. Rather than fail the cycle outright, the
//! resolver walks a fallback chain until some box opens.

use tokio::io::{AsyncRead, AsyncWrite};

use ordersentry_imap::Session;

use crate::error::{Error, Result};

/// Boxes tried after the configured one, in order. The Gmail and
/// Google Mail spellings cover both namespace variants in the wild.
pub const FALLBACK_BOXES: &[&str] = &["INBOX", "[Gmail]/All Mail", "[Google Mail]/All Mail"];

/// Opens `requested`, falling back through `fallbacks` on failure.
///
/// Returns the name actually opened. Falling back is logged at warn
/// level since it usually means the configured box no longer exists.
///
/// # Errors
/// [`Error::BoxUnavailable`] when every candidate fails, carrying the
/// full attempt chain.
pub async fn resolve_box<S>(
    session: &mut Session<S>,
    requested: &str,
    fallbacks: &[String],
) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut attempted = Vec::new();

    attempted.push(requested.to_string());
    match session.open(requested).await {
        Ok(()) => return Ok(requested.to_string()),
        Err(err) => {
            tracing::debug!(mailbox = requested, error = %err, "mailbox did not open");
        }
    }

    for name in fallbacks {
        if name == requested {
            continue;
        }
        attempted.push(name.clone());
        match session.open(name).await {
            Ok(()) => {
                tracing::warn!(requested, opened = %name, "requested mailbox unavailable, using fallback");
                return Ok(name.clone());
            }
            Err(err) => {
                tracing::debug!(mailbox = %name, error = %err, "mailbox did not open");
            }
        }
    }

    Err(Error::BoxUnavailable { requested: requested.to_string(), attempted })
}

/// The default fallback chain as owned strings.
#[must_use]
pub fn default_fallbacks() -> Vec<String> {
    FALLBACK_BOXES.iter().map(ToString::to_string).collect()
}
