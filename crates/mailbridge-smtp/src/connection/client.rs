//! SMTP session client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{AuthMechanism, Envelope, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;

/// State marker: greeted by the server, not yet authenticated.
#[derive(Debug)]
pub struct Connected;

/// State marker: authenticated and ready to submit mail.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client whose state is tracked in the type.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = expect_success(read_reply(&mut stream).await?)?;

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        tracing::debug!(%hostname, "SMTP greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .command(&Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;

        // First line is the server's greeting text, the rest are extensions.
        self.server_info.set_extensions(reply.message.iter().skip(1));
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str, client_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.command(&Command::StartTls).await?;
        self.stream = self.stream.upgrade_to_tls(hostname).await?;
        tracing::debug!(hostname, "Upgraded SMTP session to TLS");

        self.ehlo(client_hostname).await
    }

    /// Authenticates with the best password mechanism the server offers.
    ///
    /// # Errors
    ///
    /// Returns an error if no password mechanism is offered or the credentials
    /// are rejected.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        match self.server_info.preferred_password_mechanism() {
            Some(AuthMechanism::Login) => self.auth_login(username, password).await,
            Some(_) => self.auth_plain(username, password).await,
            None => Err(Error::NotSupported("AUTH PLAIN or AUTH LOGIN".into())),
        }
    }

    /// Authenticates using the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let credentials = format!("\0{username}\0{password}");
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(STANDARD.encode(credentials.as_bytes())),
        };

        self.command(&cmd).await?;
        Ok(self.into_state())
    }

    /// Authenticates using the LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not prompt as expected or rejects
    /// the credentials.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        self.challenge(&cmd).await?;
        self.challenge(&Command::AuthResponse(STANDARD.encode(username)))
            .await?;
        self.command(&Command::AuthResponse(STANDARD.encode(password)))
            .await?;

        Ok(self.into_state())
    }

    async fn challenge(&mut self, cmd: &Command) -> Result<()> {
        let reply = self.send_command(cmd).await?;
        if reply.code == ReplyCode::AUTH_CONTINUE {
            Ok(())
        } else {
            Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()))
        }
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

impl Client<Authenticated> {
    /// Submits one message to every recipient of the envelope.
    ///
    /// The message should be RFC 5322 formatted; line endings are normalized
    /// to CRLF and lines starting with `.` are stuffed. When the server rejects
    /// a step of the transaction it is reset, so the session stays usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the sender, a recipient or the
    /// data, or if the transport fails.
    pub async fn send_mail(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if let Some(limit) = self.server_info.max_message_size()
            && limit > 0
            && message.len() > limit
        {
            return Err(Error::MessageTooLarge {
                size: message.len(),
                limit,
            });
        }

        match self.transaction(envelope, message).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.is_recoverable()
                    && let Err(reset_err) = self.reset().await
                {
                    tracing::warn!(error = %reset_err, "RSET after failed transaction failed");
                }
                Err(err)
            }
        }
    }

    async fn transaction(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let size = self
            .server_info
            .max_message_size()
            .map(|_| message.len());
        self.command(&Command::MailFrom {
            from: envelope.from.clone(),
            size,
        })
        .await?;

        for to in &envelope.recipients {
            self.command(&Command::RcptTo { to: to.clone() }).await?;
        }

        let reply = self.send_command(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        self.stream.write_all(&dot_stuff(message)).await?;
        expect_success(read_reply(&mut self.stream).await?)?;

        tracing::debug!(
            recipients = envelope.recipients.len(),
            bytes = message.len(),
            "Message accepted by server"
        );
        Ok(())
    }

    /// Aborts the current transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(&mut self) -> Result<()> {
        self.command(&Command::Rset).await.map(drop)
    }
}

impl<S> Client<S> {
    /// Returns the server information.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(())
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        tracing::trace!(command = %cmd.redacted(), "SMTP >");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    async fn command(&mut self, cmd: &Command) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        expect_success(reply)
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

fn expect_success(reply: Reply) -> Result<Reply> {
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()))
    }
}

/// Normalizes line endings, stuffs leading dots and appends the end-of-data line.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let body = message.strip_suffix(b"\n").unwrap_or(message);

    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b".\r\n");
    out
}
