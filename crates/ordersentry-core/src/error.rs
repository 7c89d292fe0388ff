//! Error taxonomy for a scan cycle.
//!
//! Every variant maps to one phase of the cycle so that logs make it
//! obvious where a cycle died. None of these are fatal to the process:
//! the scheduler absorbs them and tries again on the next tick.

use ordersentry_imap as imap;

/// A convenience wrapper for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single scan cycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server rejected the configured credentials.
    #[error("authentication failed")]
    Auth(#[source] imap::Error),

    /// Connecting, TLS setup or the greeting exchange failed.
    #[error("connection failed")]
    Network(#[source] imap::Error),

    /// Neither the requested mailbox nor any fallback could be opened.
    #[error("mailbox {requested:?} unavailable (tried {attempted:?})")]
    BoxUnavailable {
        /// The mailbox the operator asked for.
        requested: String,
        /// Every name that was attempted, in order.
        attempted: Vec<String>,
    },

    /// The SEARCH command failed after the mailbox was opened.
    #[error("search failed")]
    Search(#[source] imap::Error),

    /// A FETCH failed mid-batch; matches reported before this point stand.
    #[error("fetch failed")]
    Fetch(#[source] imap::Error),
}

impl Error {
    /// Classifies a connect-phase failure: credential rejections become
    /// [`Error::Auth`], everything else is a network problem.
    pub fn from_connect(err: imap::Error) -> Self {
        match err {
            imap::Error::Auth(_) => Self::Auth(err),
            _ => Self::Network(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_split_auth_from_network() {
        let auth = Error::from_connect(imap::Error::Auth("LOGIN failed".into()));
        assert!(matches!(auth, Error::Auth(_)));

        let net = Error::from_connect(imap::Error::Bye("shutting down".into()));
        assert!(matches!(net, Error::Network(_)));
    }

    #[test]
    fn box_unavailable_lists_the_attempt_chain() {
        let err = Error::BoxUnavailable {
            requested: "MAGENTO_ORDERS".into(),
            attempted: vec!["MAGENTO_ORDERS".into(), "INBOX".into()],
        };
        let text = err.to_string();
        assert!(text.contains("MAGENTO_ORDERS"));
        assert!(text.contains("INBOX"));
    }
}
