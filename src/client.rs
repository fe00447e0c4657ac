use futures::{SinkExt, StreamExt};
use tokio::time::{self, Duration, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, instrument, warn};

use crate::codec::RespCodec;
use crate::commands::auth::Auth;
use crate::commands::Command;
use crate::connection::{self, ConnectionInfo};
use crate::frame::Frame;
use crate::Error;

/// How long a command may take, from invocation to its reply, before it is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// What a command resolved to. Failures of any kind surface as [`Reply::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Integer(i64),
    Text(String),
    Absent,
}

impl Reply {
    /// The reply as a number, whether the store sent an integer or a numeric string.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            Reply::Text(s) => s.trim().parse().ok(),
            Reply::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Reply::Absent)
    }
}

impl From<Frame> for Reply {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Integer(i) => Reply::Integer(i),
            Frame::Simple(s) | Frame::Error(s) => Reply::Text(s),
            Frame::Bulk(bytes) => Reply::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Frame::Null | Frame::Array(_) => Reply::Absent,
        }
    }
}

/// Sends one command per invocation over a fresh, authenticated connection.
///
/// `execute` never fails: an unconfigured client, an unreachable or slow store and a garbled
/// reply all resolve to [`Reply::Absent`]. Each call opens its own socket and closes it
/// before returning, so clones can be used concurrently without interfering.
#[derive(Debug, Clone)]
pub struct Client {
    info: Option<ConnectionInfo>,
    timeout: Duration,
}

impl Client {
    pub fn new(info: Option<ConnectionInfo>) -> Client {
        Client {
            info,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a client from an optional connection string. A missing or malformed string yields
    /// an unconfigured client.
    pub fn from_url(url: Option<&str>) -> Client {
        let info = match url.map(str::parse::<ConnectionInfo>) {
            Some(Ok(info)) => Some(info),
            Some(Err(e)) => {
                warn!("ignoring connection string: {}", e);
                None
            }
            None => None,
        };

        Client::new(info)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Client {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.info.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(name = "command", skip(self, cmd), fields(command = cmd.name()))]
    pub async fn execute(&self, cmd: Command) -> Reply {
        let Some(info) = &self.info else {
            debug!("no store configured");
            return Reply::Absent;
        };

        let started = Instant::now();

        // Dropping the in-flight future on timeout drops the transport, closing the socket.
        match time::timeout(self.timeout, round_trip(info, cmd)).await {
            Ok(Ok(Frame::Error(msg))) => {
                warn!("store replied with an error: {}", msg);
                Reply::Text(msg)
            }
            Ok(Ok(frame)) => {
                debug!(elapsed = ?started.elapsed(), "received reply: {}", frame);
                Reply::from(frame)
            }
            Ok(Err(e)) => {
                warn!("command failed: {}", e);
                Reply::Absent
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "command timed out");
                Reply::Absent
            }
        }
    }
}

/// Authenticates and runs `cmd` on a new connection, returning the reply to `cmd`.
async fn round_trip(info: &ConnectionInfo, cmd: Command) -> Result<Frame, Error> {
    let transport = connection::connect(info).await?;
    let mut framed = Framed::new(transport, RespCodec::new());

    let auth = Command::Auth(Auth {
        password: info.password.clone(),
    });

    // Both commands leave in a single flush. The store answers them in order, so there is no
    // need to wait for the AUTH reply first.
    framed.feed(Frame::from(auth)).await?;
    framed.feed(Frame::from(cmd)).await?;
    framed.flush().await?;

    let auth_reply = next_reply(&mut framed).await?;
    if let Frame::Error(msg) = &auth_reply {
        debug!("authentication rejected: {}", msg);
    }

    next_reply(&mut framed).await
}

async fn next_reply(framed: &mut Framed<connection::Transport, RespCodec>) -> Result<Frame, Error> {
    match framed.next().await {
        Some(frame) => frame,
        None => Err("connection closed before the reply arrived".into()),
    }
}
