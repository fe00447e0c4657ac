use std::fmt;
use std::io;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use thiserror::Error as ThisError;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::tls;
use crate::Error;

const SCHEME: &str = "redis://";

/// Hosts of managed Redis offerings that only accept TLS connections.
pub const MANAGED_TLS_HOSTS: &[&str] = &["upstash.io", "redislabs.com", "redis-cloud.com"];

/// Where and how to reach the store, parsed from `redis://<user>:<password>@<host>:<port>`.
///
/// The user part is accepted but not kept: only the password form of AUTH is ever sent. Parsing
/// picks `transport` from the host with [`TransportKind::for_host`].
#[derive(Clone, PartialEq)]
pub struct ConnectionInfo {
    pub password: String,
    pub host: String,
    pub port: u16,
    pub transport: TransportKind,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("transport", &self.transport)
            .finish()
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum ParseError {
    #[error("connection string must start with redis://")]
    InvalidScheme,
    #[error("connection string is missing the <user>:<password>@ credentials")]
    MissingCredentials,
    #[error("connection string has an empty password")]
    EmptyPassword,
    #[error("connection string is missing the <host>:<port> address")]
    MissingAddress,
    #[error("connection string has an invalid host {0:?}")]
    InvalidHost(String),
    #[error("connection string has an invalid port {0:?}")]
    InvalidPort(String),
}

impl FromStr for ConnectionInfo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(SCHEME).ok_or(ParseError::InvalidScheme)?;

        // The password may itself contain '@', so the address starts after the last one.
        let (credentials, address) = rest
            .rsplit_once('@')
            .ok_or(ParseError::MissingCredentials)?;
        let (_user, password) = credentials
            .split_once(':')
            .ok_or(ParseError::MissingCredentials)?;
        if password.is_empty() {
            return Err(ParseError::EmptyPassword);
        }

        let (host, port) = address
            .rsplit_once(':')
            .ok_or(ParseError::MissingAddress)?;
        if host.is_empty() || host.contains([':', '/', '@']) {
            return Err(ParseError::InvalidHost(host.to_string()));
        }

        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidPort(port.to_string()));
        }
        let port = match port.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => return Err(ParseError::InvalidPort(port.to_string())),
        };

        Ok(ConnectionInfo {
            password: password.to_string(),
            host: host.to_string(),
            port,
            transport: TransportKind::for_host(host),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Plain,
    /// TLS without certificate verification.
    Tls,
}

impl TransportKind {
    pub fn for_host(host: &str) -> TransportKind {
        if MANAGED_TLS_HOSTS.iter().any(|managed| host.contains(managed)) {
            TransportKind::Tls
        } else {
            TransportKind::Plain
        }
    }
}

/// An open socket to the store. Dropping it closes the socket.
pub enum Transport {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Transport {
    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::Plain(_) => TransportKind::Plain,
            Transport::Tls(_) => TransportKind::Tls,
        }
    }
}

/// Opens a single connection to the store, wrapping it in TLS when `info.transport` calls for it.
///
/// There are no retries: a failed attempt is returned to the caller as is.
pub async fn connect(info: &ConnectionInfo) -> Result<Transport, Error> {
    let stream = TcpStream::connect((info.host.as_str(), info.port)).await?;
    stream.set_nodelay(true)?;

    match info.transport {
        TransportKind::Plain => {
            debug!(host = %info.host, port = info.port, "connected over plain TCP");
            Ok(Transport::Plain(stream))
        }
        TransportKind::Tls => {
            let server_name = ServerName::try_from(info.host.clone())?;
            let stream = tls::connector()?.connect(server_name, stream).await?;
            debug!(host = %info.host, port = info.port, "connected over TLS");
            Ok(Transport::Tls(Box::new(stream)))
        }
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}
