//! High-level IMAP session.
//!
//! A [`Session`] owns one authenticated connection and at most one open box
//! at a time. It is built per scan cycle and discarded afterwards:
//! `connect` → `open` → `search`/`fetch` → `close`. `close` is idempotent
//! and safe to call after a partial failure, so a cycle can unconditionally
//! close on every exit path.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::{FetchSpec, SearchQuery, TagGenerator, sequence_set, write_astring};
use crate::framed::Transport;
use crate::response::{RawMessage, ReplyStatus, TaggedReply};
use crate::stream::{ImapStream, connect_plain, connect_tls};
use crate::{Error, Result, response};

/// Connection parameters for one IMAP account.
///
/// Immutable for the process lifetime; a fresh [`Session`] borrows it each
/// cycle.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username for LOGIN.
    pub username: String,
    /// Secret for LOGIN.
    pub secret: String,
    /// Use implicit TLS (recommended; plaintext is for testing only).
    pub tls: bool,
    /// Validate the server certificate against the webpki roots.
    pub verify_certs: bool,
    /// Timeout covering connect, greeting and LOGIN.
    pub auth_timeout: Duration,
}

impl SessionConfig {
    /// Creates a configuration with TLS, strict certificate validation and
    /// a 20 second authentication timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            secret: String::new(),
            tls: true,
            verify_certs: true,
            auth_timeout: Duration::from_secs(20),
        }
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, secret: impl Into<String>) -> Self {
        self.username = username.into();
        self.secret = secret.into();
        self
    }

    /// Enables or disables implicit TLS.
    #[must_use]
    pub const fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Enables or disables strict certificate validation.
    #[must_use]
    pub const fn verify_certs(mut self, verify: bool) -> Self {
        self.verify_certs = verify;
        self
    }

    /// Sets the authentication timeout.
    #[must_use]
    pub const fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }
}

/// One authenticated IMAP connection.
pub struct Session<S = ImapStream> {
    transport: Option<Transport<S>>,
    tags: TagGenerator,
    open_box: Option<String>,
}

impl Session<ImapStream> {
    /// Connects, reads the greeting and authenticates, all bounded by the
    /// configured authentication timeout.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the server rejects LOGIN; [`Error::Timeout`],
    /// [`Error::Io`] or [`Error::Tls`] for transport failures.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        tracing::debug!(
            host = %config.host,
            port = config.port,
            tls = config.tls,
            "connecting"
        );
        if config.tls && !config.verify_certs {
            tracing::warn!("certificate validation disabled");
        }

        let handshake = async {
            let stream = if config.tls {
                connect_tls(&config.host, config.port, config.verify_certs).await?
            } else {
                connect_plain(&config.host, config.port).await?
            };
            Session::login(stream, &config.username, &config.secret).await
        };

        tokio::time::timeout(config.auth_timeout, handshake)
            .await
            .map_err(|_| Error::Timeout(config.auth_timeout))?
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates over an established stream.
    ///
    /// Exposed generically so tests can drive the session over a mock
    /// stream; production code goes through [`Session::connect`].
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the server rejects the LOGIN command.
    pub async fn login(stream: S, username: &str, secret: &str) -> Result<Self> {
        let mut transport = Transport::new(stream);

        // Greeting. A BYE here means the server refused the connection.
        let greeting = transport.read_reply().await?;
        if let Some(text) = response::parse_bye(&greeting) {
            return Err(Error::Bye(text));
        }

        let mut session = Self {
            transport: Some(transport),
            tags: TagGenerator::new(),
            open_box: None,
        };

        let mut cmd = String::from("LOGIN ");
        write_astring(&mut cmd, username);
        cmd.push(' ');
        write_astring(&mut cmd, secret);

        match session.command(&cmd).await {
            Ok(_) => Ok(session),
            Err(Error::No(text) | Error::Bad(text)) => Err(Error::Auth(text)),
            Err(e) => Err(e),
        }
    }

    /// Opens a box read-only via EXAMINE.
    ///
    /// The scan pipeline never mutates messages, so read-only access is
    /// sufficient and avoids resetting \Recent state on the server.
    ///
    /// # Errors
    ///
    /// [`Error::No`] or [`Error::Bad`] when the box cannot be opened.
    pub async fn open(&mut self, name: &str) -> Result<()> {
        let mut cmd = String::from("EXAMINE ");
        write_astring(&mut cmd, name);

        self.open_box = None;
        self.command(&cmd).await?;
        self.open_box = Some(name.to_string());
        Ok(())
    }

    /// Returns the currently open box name, if any.
    #[must_use]
    pub fn open_box(&self) -> Option<&str> {
        self.open_box.as_deref()
    }

    /// Searches the open box, returning matching sequence numbers in
    /// server order (ascending).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when no box is open; [`Error::No`] or
    /// [`Error::Bad`] when the server rejects the query.
    pub async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>> {
        if self.open_box.is_none() {
            return Err(Error::InvalidState("no box open".to_string()));
        }

        let cmd = format!("SEARCH {}", query.serialize());
        let replies = self.command(&cmd).await?;

        let mut seqs = Vec::new();
        for reply in &replies {
            if let Some(ids) = response::parse_search(reply) {
                seqs.extend(ids);
            }
        }
        Ok(seqs)
    }

    /// Fetches the given messages' sections per the fetch spec.
    ///
    /// Sections are peeked; fetching never sets `\Seen`. Messages the
    /// server did not answer for are simply absent from the result.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when no box is open; [`Error::No`] or
    /// [`Error::Bad`] on server rejection.
    pub async fn fetch(&mut self, seqs: &[u32], spec: &FetchSpec) -> Result<Vec<RawMessage>> {
        if self.open_box.is_none() {
            return Err(Error::InvalidState("no box open".to_string()));
        }
        if seqs.is_empty() {
            return Ok(Vec::new());
        }

        let cmd = format!("FETCH {} {}", sequence_set(seqs), spec.serialize());
        let replies = self.command(&cmd).await?;

        let mut messages = Vec::new();
        for reply in &replies {
            if let Some(msg) = response::parse_fetch(reply) {
                messages.push(msg);
            }
        }
        Ok(messages)
    }

    /// Closes the session: best-effort LOGOUT, then drops the connection.
    ///
    /// Idempotent and infallible; errors during logout are discarded since
    /// the connection is being torn down either way.
    pub async fn close(&mut self) {
        self.open_box = None;
        if let Some(mut transport) = self.transport.take() {
            let tag = self.tags.next();
            let line = format!("{tag} LOGOUT\r\n");
            if transport.send(line.as_bytes()).await.is_ok() {
                // Drain until the tagged reply or until the server hangs up.
                for _ in 0..8 {
                    match transport.read_reply().await {
                        Ok(reply) => {
                            if response::parse_tagged(&reply, &tag).is_some() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    }

    /// Returns true when the connection has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Sends one command and reads replies until its tagged completion,
    /// returning the untagged replies seen on the way.
    async fn command(&mut self, cmd: &str) -> Result<Vec<Vec<u8>>> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| Error::InvalidState("session closed".to_string()))?;

        let tag = self.tags.next();
        let line = format!("{tag} {cmd}\r\n");
        transport.send(line.as_bytes()).await?;

        let mut untagged = Vec::new();
        loop {
            let reply = transport.read_reply().await?;

            if let Some(TaggedReply { status, text, .. }) = response::parse_tagged(&reply, &tag) {
                return match status {
                    ReplyStatus::Ok => Ok(untagged),
                    ReplyStatus::No => Err(Error::No(text)),
                    ReplyStatus::Bad => Err(Error::Bad(text)),
                };
            }
            if let Some(text) = response::parse_bye(&reply) {
                return Err(Error::Bye(text));
            }
            untagged.push(reply);
        }
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open_box", &self.open_box)
            .field("closed", &self.transport.is_none())
            .finish_non_exhaustive()
    }
}
