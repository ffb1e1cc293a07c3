//! POP3 session client.

use super::{Capabilities, Pop3Stream};
use crate::command::Command;
use crate::error::Result;
use crate::parser::{parse_scan_listing, parse_stat, parse_status, unstuff_line};
use crate::types::{ScanListing, Stat};
use std::marker::PhantomData;

/// State marker: greeted by the server, credentials not yet accepted.
#[derive(Debug)]
pub struct Authorization;

/// State marker: logged in, the maildrop is locked for this session.
#[derive(Debug)]
pub struct Transaction;

/// POP3 client whose state is tracked in the type.
#[derive(Debug)]
pub struct Client<State> {
    stream: Pop3Stream,
    greeting: String,
    _state: PhantomData<State>,
}

impl Client<Authorization> {
    /// Creates a client from a stream and reads the `+OK` greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read or is negative.
    pub async fn from_stream(mut stream: Pop3Stream) -> Result<Self> {
        let line = stream.read_line().await?;
        let greeting = parse_status(&line)?.to_string();
        tracing::debug!(%greeting, "POP3 greeting received");

        Ok(Self {
            stream,
            greeting,
            _state: PhantomData,
        })
    }

    /// Asks the server for its capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not implement CAPA.
    pub async fn capa(&mut self) -> Result<Capabilities> {
        self.command(&Command::Capa).await?;
        let body = self.read_multiline().await?;
        Ok(Capabilities::from_lines(
            body.iter().map(|line| String::from_utf8_lossy(line)),
        ))
    }

    /// Upgrades the connection to TLS using STLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses STLS or the handshake fails.
    pub async fn stls(mut self, hostname: &str) -> Result<Self> {
        self.command(&Command::Stls).await?;
        self.stream = self.stream.upgrade_to_tls(hostname).await?;
        tracing::debug!(hostname, "Upgraded POP3 session to TLS");
        Ok(self)
    }

    /// Logs in with `USER` and `PASS`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Negative`] if the server rejects either credential.
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<Transaction>> {
        self.command(&Command::User(username.to_string())).await?;
        self.command(&Command::Pass(password.to_string())).await?;

        Ok(Client {
            stream: self.stream,
            greeting: self.greeting,
            _state: PhantomData,
        })
    }
}

impl Client<Transaction> {
    /// Returns the message count and total size of the maildrop.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is negative or malformed.
    pub async fn stat(&mut self) -> Result<Stat> {
        let text = self.command(&Command::Stat).await?;
        parse_stat(&text)
    }

    /// Returns the scan listing of every message.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is negative or a line is malformed.
    pub async fn list(&mut self) -> Result<Vec<ScanListing>> {
        self.command(&Command::List).await?;
        self.read_multiline()
            .await?
            .iter()
            .map(|line| parse_scan_listing(&String::from_utf8_lossy(line)))
            .collect()
    }

    /// Retrieves the raw bytes of a message, lines joined with CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if the message does not exist or the transfer breaks.
    pub async fn retr(&mut self, index: u32) -> Result<Vec<u8>> {
        self.command(&Command::Retr(index)).await?;
        let lines = self.read_multiline().await?;

        let mut message = Vec::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
        for line in lines {
            message.extend_from_slice(&line);
            message.extend_from_slice(b"\r\n");
        }
        tracing::trace!(index, bytes = message.len(), "Message retrieved");
        Ok(message)
    }

    /// Marks a message as deleted; it is removed when the session quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the message does not exist or is already deleted.
    pub async fn dele(&mut self, index: u32) -> Result<()> {
        self.command(&Command::Dele(index)).await.map(drop)
    }

    /// Unmarks every message marked as deleted in this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn rset(&mut self) -> Result<()> {
        self.command(&Command::Rset).await.map(drop)
    }
}

impl<S> Client<S> {
    /// Returns the text of the server greeting.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// In the transaction state this commits pending deletions.
    ///
    /// # Errors
    ///
    /// Returns an error if the server reports a failure while updating.
    pub async fn quit(mut self) -> Result<()> {
        self.command(&Command::Quit).await.map(drop)
    }

    /// Sends a command and returns the text after `+OK`.
    async fn command(&mut self, cmd: &Command) -> Result<String> {
        tracing::trace!(command = %cmd.redacted(), "POP3 >");
        self.stream.write_all(&cmd.serialize()).await?;
        let line = self.stream.read_line().await?;
        parse_status(&line).map(ToString::to_string)
    }

    async fn read_multiline(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        loop {
            let raw = self.stream.read_raw_line().await?;
            match unstuff_line(&raw) {
                Some(line) => lines.push(line.to_vec()),
                None => return Ok(lines),
            }
        }
    }
}
