//! Retrieving mail over POP3.

use crate::account::{Security, ServerConfig};
use crate::codec::TextTransform;
use mailbridge_mime::{Mailbox, Message};
use mailbridge_pop3::connection::{connect, connect_tls};
use mailbridge_pop3::{Authorization, Client, Pop3Stream, ScanListing, Transaction};

/// Errors that can occur while retrieving.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// Dialing, the TLS handshake, or login failed.
    #[error("Connection failed: {0}")]
    Connection(#[source] mailbridge_pop3::Error),

    /// Mailbox status could not be read.
    #[error("Status query failed: {0}")]
    Status(#[source] mailbridge_pop3::Error),

    /// The listing as a whole failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] mailbridge_pop3::Error),

    /// A message could not be marked for deletion.
    #[error("Delete failed: {0}")]
    Delete(#[source] mailbridge_pop3::Error),
}

/// A message fetched from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedMessage {
    /// Sender.
    pub from: Mailbox,
    /// First recipient.
    pub to: Mailbox,
    /// Decoded subject.
    pub subject: String,
    /// `Date` header as sent.
    pub date: String,
    /// Plain-text body, after the decode hook if one was given.
    pub body: String,
    /// Server sequence number, usable with [`MailReceiver::delete_message`].
    pub index: u32,
}

impl RetrievedMessage {
    /// Extracts the displayed fields from a raw message.
    ///
    /// Returns `None` when the data carries no header at all.
    #[must_use]
    pub fn parse(raw: &[u8], index: u32) -> Option<Self> {
        let message = Message::parse(raw);
        if message.headers().is_empty() {
            return None;
        }

        Some(Self {
            from: message.from(),
            to: message.to(),
            subject: message.subject(),
            date: message.date().to_string(),
            body: message.text_body(),
            index,
        })
    }
}

/// Outcome of [`MailReceiver::list_messages`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Retrieved messages, newest first.
    pub messages: Vec<RetrievedMessage>,
    /// Messages in the listing range that could not be fetched or parsed.
    pub skipped: usize,
    /// Messages in the mailbox.
    pub total: u32,
    /// Size of the listing range.
    pub requested: usize,
}

/// POP3 receiver bound to one server configuration.
///
/// The connection is opened by [`MailReceiver::connect`], or lazily by
/// [`MailReceiver::message_count`] and [`MailReceiver::list_messages`].
#[derive(Debug)]
pub struct MailReceiver {
    config: ServerConfig,
    client: Option<Client<Transaction>>,
}

impl MailReceiver {
    /// Creates a disconnected receiver.
    #[must_use]
    pub const fn new(config: ServerConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Server configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Checks if a session is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Dials the server and logs in.
    ///
    /// Calling this while connected keeps the existing session.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if dialing, the TLS handshake, or
    /// login fails.
    pub async fn connect(&mut self) -> Result<(), ReceiveError> {
        if self.is_connected() {
            tracing::debug!("POP3 session already open");
            return Ok(());
        }

        let host = self.config.host.as_str();
        let port = self.config.port;
        let stream = match self.config.security {
            Security::Tls => connect_tls(host, port).await,
            Security::StartTls | Security::None => connect(host, port).await,
        }
        .map_err(ReceiveError::Connection)?;

        self.connect_with(stream).await
    }

    /// Runs the greeting, optional STLS, and login over an established stream.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if any step fails.
    pub async fn connect_with(&mut self, stream: Pop3Stream) -> Result<(), ReceiveError> {
        let mut client = Client::from_stream(stream)
            .await
            .map_err(ReceiveError::Connection)?;

        let client = if self.config.security == Security::StartTls {
            ensure_stls(&mut client).await?;
            client
                .stls(&self.config.host)
                .await
                .map_err(ReceiveError::Connection)?
        } else {
            client
        };

        let client = client
            .login(&self.config.username, &self.config.password)
            .await
            .map_err(ReceiveError::Connection)?;

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            "Connected to POP3 server"
        );
        self.client = Some(client);
        Ok(())
    }

    async fn client(&mut self) -> Result<&mut Client<Transaction>, ReceiveError> {
        self.connect().await?;
        self.client.as_mut().ok_or_else(|| {
            ReceiveError::Connection(mailbridge_pop3::Error::InvalidState(
                "no POP3 session".into(),
            ))
        })
    }

    /// Number of messages in the mailbox, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if the lazy connect fails, or
    /// [`ReceiveError::Status`] if STAT fails.
    pub async fn message_count(&mut self) -> Result<u32, ReceiveError> {
        let stat = self.client().await?.stat().await.map_err(ReceiveError::Status)?;
        Ok(stat.count)
    }

    /// Size of every message, from LIST.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if the lazy connect fails, or
    /// [`ReceiveError::Status`] if LIST fails.
    pub async fn message_sizes(&mut self) -> Result<Vec<ScanListing>, ReceiveError> {
        self.client().await?.list().await.map_err(ReceiveError::Status)
    }

    /// Fetches up to `max_count` messages, newest first.
    ///
    /// Messages are fetched from sequence number `total` downwards. A message
    /// that cannot be retrieved or has no headers is skipped and counted in
    /// [`Listing::skipped`]. If the connection drops, the listing stops with
    /// what was fetched so far, the rest of the range counts as skipped, and
    /// the session is discarded. `transform` is applied to each body; when it
    /// fails the body is kept as received.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if the lazy connect fails, or
    /// [`ReceiveError::Fetch`] if STAT fails.
    pub async fn list_messages(
        &mut self,
        max_count: Option<usize>,
        transform: Option<&dyn TextTransform>,
    ) -> Result<Listing, ReceiveError> {
        let client = self.client().await?;
        let total = client.stat().await.map_err(ReceiveError::Fetch)?.count;

        let available = usize::try_from(total).unwrap_or(usize::MAX);
        let requested = max_count.map_or(available, |max| max.min(available));
        let mut listing = Listing {
            messages: Vec::with_capacity(requested),
            skipped: 0,
            total,
            requested,
        };

        let mut connection_lost = false;
        for (position, index) in (1..=total).rev().take(requested).enumerate() {
            let raw = match client.retr(index).await {
                Ok(raw) => raw,
                Err(e) if e.is_connection_lost() => {
                    tracing::warn!(index, error = %e, "Connection lost, ending listing early");
                    listing.skipped += requested - position;
                    connection_lost = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping message that could not be retrieved");
                    listing.skipped += 1;
                    continue;
                }
            };

            let Some(mut message) = RetrievedMessage::parse(&raw, index) else {
                tracing::warn!(index, "Skipping message without headers");
                listing.skipped += 1;
                continue;
            };

            if let Some(transform) = transform {
                match transform.apply(&message.body) {
                    Ok(body) => message.body = body,
                    Err(e) => {
                        tracing::warn!(index, error = %e, "Body transform failed, keeping original");
                    }
                }
            }
            listing.messages.push(message);
        }

        if connection_lost {
            self.client = None;
        }

        tracing::info!(
            retrieved = listing.messages.len(),
            skipped = listing.skipped,
            total,
            "Listed messages"
        );
        Ok(listing)
    }

    /// Marks a message for deletion; the server removes it at QUIT.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if the lazy connect fails, or
    /// [`ReceiveError::Delete`] if DELE fails.
    pub async fn delete_message(&mut self, index: u32) -> Result<(), ReceiveError> {
        self.client()
            .await?
            .dele(index)
            .await
            .map_err(ReceiveError::Delete)?;
        tracing::info!(index, "Message marked for deletion");
        Ok(())
    }

    /// Unmarks every message marked for deletion in this session.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Connection`] if the lazy connect fails, or
    /// [`ReceiveError::Delete`] if RSET fails.
    pub async fn reset(&mut self) -> Result<(), ReceiveError> {
        self.client()
            .await?
            .rset()
            .await
            .map_err(ReceiveError::Delete)
    }

    /// Ends the session with QUIT, committing deletions.
    ///
    /// A failed QUIT is logged, not returned; the session is closed either way.
    pub async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            match client.quit().await {
                Ok(()) => tracing::info!(host = %self.config.host, "Disconnected from POP3 server"),
                Err(e) => tracing::warn!(error = %e, "POP3 QUIT failed"),
            }
        }
    }

    /// Connects, runs `f`, and disconnects whatever `f` returned.
    ///
    /// # Errors
    ///
    /// Returns the connection error, or whatever `f` returned.
    pub async fn session<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T, E>,
        E: From<ReceiveError>,
    {
        self.connect().await?;
        let result = f(self).await;
        self.disconnect().await;
        result
    }
}

/// Refuses to continue when CAPA shows the server cannot do STLS. Servers
/// without CAPA get the benefit of the doubt.
async fn ensure_stls(client: &mut Client<Authorization>) -> Result<(), ReceiveError> {
    match client.capa().await {
        Ok(caps) if caps.supports_stls() => Ok(()),
        Ok(_) => Err(ReceiveError::Connection(mailbridge_pop3::Error::NotSupported(
            "STLS".into(),
        ))),
        Err(e) if e.is_negative() => {
            tracing::debug!(error = %e, "CAPA not implemented, trying STLS anyway");
            Ok(())
        }
        Err(e) => Err(ReceiveError::Connection(e)),
    }
}

impl Drop for MailReceiver {
    fn drop(&mut self) {
        if self.client.is_some() {
            tracing::warn!(
                host = %self.config.host,
                "MailReceiver dropped while connected; closing without QUIT"
            );
        }
    }
}
