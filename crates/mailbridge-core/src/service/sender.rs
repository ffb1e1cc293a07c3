//! Sending mail over SMTP.

use crate::account::{Security, ServerConfig};
use crate::codec::{TextTransform, TransformError};
use mailbridge_mime::{Attachment, MessageBuilder};
use mailbridge_smtp::connection::{connect, connect_tls};
use mailbridge_smtp::{Address, Authenticated, Client, Envelope, SmtpStream};
use std::path::PathBuf;

/// Hostname announced in EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

/// Errors that can occur while sending.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Dialing, the TLS handshake, or authentication failed.
    #[error("Connection failed: {0}")]
    Connection(#[source] mailbridge_smtp::Error),

    /// The server refused the message or the transport failed mid-transaction.
    #[error("Send failed: {0}")]
    Send(#[source] mailbridge_smtp::Error),

    /// An attachment could not be read; nothing was sent.
    #[error("Attachment error: {0}")]
    Attachment(#[from] mailbridge_mime::Error),

    /// Sender or recipient address is malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The body transform failed; nothing was sent.
    #[error("Body transform failed: {0}")]
    Transform(#[source] TransformError),
}

/// An email message to send.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses; used for delivery only, never shown in headers.
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Files to attach.
    pub attachments: Vec<PathBuf>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Adds a file attachment.
    #[must_use]
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// Returns all recipients (to, cc, bcc).
    fn all_recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
    }
}

/// SMTP sender bound to one server configuration.
///
/// The connection is opened by [`MailSender::connect`], or lazily by the
/// first [`MailSender::send_message`]. [`MailSender::session`] pairs connect
/// and disconnect around a block of work.
#[derive(Debug)]
pub struct MailSender {
    config: ServerConfig,
    client: Option<Client<Authenticated>>,
}

impl MailSender {
    /// Creates a disconnected sender.
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

    /// Dials the server and authenticates.
    ///
    /// Implicit TLS or STARTTLS is used according to the configured security
    /// mode. Calling this while connected keeps the existing session.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Connection`] if dialing, the TLS handshake, or
    /// authentication fails.
    pub async fn connect(&mut self) -> Result<(), SendError> {
        if self.is_connected() {
            tracing::debug!("SMTP session already open");
            return Ok(());
        }

        let host = self.config.host.as_str();
        let port = self.config.port;
        let stream = match self.config.security {
            Security::Tls => connect_tls(host, port).await,
            Security::StartTls | Security::None => connect(host, port).await,
        }
        .map_err(SendError::Connection)?;

        self.connect_with(stream).await
    }

    /// Runs the session handshake over an already established stream.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Connection`] if the greeting, EHLO, STARTTLS or
    /// authentication fails.
    pub async fn connect_with(&mut self, stream: SmtpStream) -> Result<(), SendError> {
        let client = Client::from_stream(stream)
            .await
            .map_err(SendError::Connection)?
            .ehlo(CLIENT_HOSTNAME)
            .await
            .map_err(SendError::Connection)?;

        let client = if self.config.security == Security::StartTls {
            client
                .starttls(&self.config.host, CLIENT_HOSTNAME)
                .await
                .map_err(SendError::Connection)?
        } else {
            client
        };

        let client = client
            .authenticate(&self.config.username, &self.config.password)
            .await
            .map_err(SendError::Connection)?;

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            "Connected to SMTP server"
        );
        self.client = Some(client);
        Ok(())
    }

    /// Composes and submits a message.
    ///
    /// `transform`, if given, is applied to the body before it is embedded.
    /// The envelope holds every To, Cc and Bcc address; Bcc never appears in
    /// the headers. Attachments are read before anything is sent, so a bad
    /// file aborts the whole send.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform fails, an attachment cannot be read,
    /// an address is malformed, connecting fails, or the server refuses the
    /// message.
    pub async fn send_message(
        &mut self,
        message: &OutgoingMessage,
        transform: Option<&dyn TextTransform>,
    ) -> Result<(), SendError> {
        let body = match transform {
            Some(transform) => transform
                .apply(&message.body)
                .map_err(SendError::Transform)?,
            None => message.body.clone(),
        };

        let attachments = message
            .attachments
            .iter()
            .map(Attachment::from_file)
            .collect::<Result<Vec<_>, _>>()?;

        let from = Address::new(self.config.username.as_str())
            .map_err(|e| SendError::InvalidAddress(e.to_string()))?;
        let recipients = message
            .all_recipients()
            .map(Address::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SendError::InvalidAddress(e.to_string()))?;
        let envelope = Envelope::new(from, recipients);

        let mut builder = MessageBuilder::new()
            .from(self.config.username.as_str())
            .to(message.to.iter().cloned())
            .cc(message.cc.iter().cloned())
            .subject(message.subject.as_str())
            .text_body(body);
        for attachment in attachments {
            builder = builder.attach(attachment);
        }
        let raw = builder.build();

        self.connect().await?;
        let Some(client) = self.client.as_mut() else {
            return Err(SendError::Connection(mailbridge_smtp::Error::InvalidState(
                "no SMTP session".into(),
            )));
        };

        client
            .send_mail(&envelope, raw.as_bytes())
            .await
            .map_err(SendError::Send)?;

        tracing::info!(
            recipients = envelope.recipients.len(),
            attachments = message.attachments.len(),
            "Message sent"
        );
        Ok(())
    }

    /// Ends the session with QUIT.
    ///
    /// A failed QUIT is logged, not returned; the session is closed either way.
    pub async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            match client.quit().await {
                Ok(()) => tracing::info!(host = %self.config.host, "Disconnected from SMTP server"),
                Err(e) => tracing::warn!(error = %e, "SMTP QUIT failed"),
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
        E: From<SendError>,
    {
        self.connect().await?;
        let result = f(self).await;
        self.disconnect().await;
        result
    }
}

impl Drop for MailSender {
    fn drop(&mut self) {
        if self.client.is_some() {
            tracing::warn!(
                host = %self.config.host,
                "MailSender dropped while connected; closing without QUIT"
            );
        }
    }
}
