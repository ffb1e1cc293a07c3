//! Low-level POP3 stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Upper bound for dialing plus the TLS handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Any bidirectional byte stream that can carry a POP3 session.
pub trait AsyncIo: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncIo for T {}

/// POP3 stream (TCP, TLS, or a caller-supplied transport).
pub enum Pop3Stream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
    /// Caller-supplied transport.
    Io(BufReader<Box<dyn AsyncIo>>),
}

impl fmt::Debug for Pop3Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Tcp(_) => "Tcp",
            Self::Tls(_) => "Tls",
            Self::Io(_) => "Io",
        };
        f.debug_tuple("Pop3Stream").field(&kind).finish()
    }
}

impl Pop3Stream {
    /// Wraps an arbitrary transport.
    pub fn from_io(io: impl AsyncIo + 'static) -> Self {
        Self::Io(BufReader::new(Box::new(io)))
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one raw line including its line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or an I/O error.
    pub async fn read_raw_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_until(b'\n', &mut line).await?,
            Self::Tls(reader) => reader.read_until(b'\n', &mut line).await?,
            Self::Io(reader) => reader.read_until(b'\n', &mut line).await?,
        };
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(line)
    }

    /// Reads a status line as text, without the trailing line break.
    ///
    /// Bytes that are not UTF-8 are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or an I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        let raw = self.read_raw_line().await?;
        Ok(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Io(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not plain TCP or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::InvalidState("Already using TLS".into())),
            Self::Io(_) => {
                return Err(Error::InvalidState(
                    "Cannot upgrade a custom transport to TLS".into(),
                ));
            }
        };

        let tls_stream = handshake(hostname, tcp_stream).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

/// Connects to a POP3 server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails or exceeds [`CONNECT_TIMEOUT`].
pub async fn connect(hostname: &str, port: u16) -> Result<Pop3Stream> {
    let stream = dial(hostname, port).await?;
    Ok(Pop3Stream::Tcp(BufReader::new(stream)))
}

/// Connects to a POP3 server over implicit TLS (port 995).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<Pop3Stream> {
    let tcp_stream = dial(hostname, port).await?;
    let tls_stream = handshake(hostname, tcp_stream).await?;
    Ok(Pop3Stream::Tls(Box::new(BufReader::new(tls_stream))))
}

async fn dial(hostname: &str, port: u16) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    tracing::debug!(%addr, "Dialing POP3 server");
    with_timeout(TcpStream::connect(addr)).await
}

async fn handshake(
    hostname: &str,
    tcp_stream: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidHostname(hostname.to_string()))?;

    with_timeout(connector.connect(server_name, tcp_stream)).await
}

async fn with_timeout<T>(fut: impl Future<Output = std::io::Result<T>>) -> Result<T> {
    tokio::time::timeout(CONNECT_TIMEOUT, fut)
        .await
        .map_err(|_| Error::Timeout(CONNECT_TIMEOUT))?
        .map_err(Into::into)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn raw_lines_keep_non_utf8_bytes() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut stream = Pop3Stream::from_io(client);

        server.write_all(b"caf\xe9\r\n+OK done\r\n").await.unwrap();
        assert_eq!(stream.read_raw_line().await.unwrap(), b"caf\xe9\r\n");
        assert_eq!(stream.read_line().await.unwrap(), "+OK done");
    }

    #[tokio::test]
    async fn closed_stream_is_reported() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut stream = Pop3Stream::from_io(client);

        assert!(matches!(
            stream.read_line().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn custom_transport_cannot_upgrade() {
        let (client, _server) = tokio::io::duplex(64);
        let stream = Pop3Stream::from_io(client);
        assert!(matches!(
            stream.upgrade_to_tls("pop.example.com").await,
            Err(Error::InvalidState(_))
        ));
    }
}
