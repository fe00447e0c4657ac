pub mod auth;
pub mod get;
pub mod incr;

use bytes::Bytes;

use crate::frame::Frame;

use auth::Auth;
use get::Get;
use incr::Incr;

/// The commands this client ever sends to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Auth(Auth),
    Get(Get),
    Incr(Incr),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Auth(_) => "AUTH",
            Command::Get(_) => "GET",
            Command::Incr(_) => "INCR",
        }
    }
}

impl From<Command> for Frame {
    fn from(cmd: Command) -> Frame {
        match cmd {
            Command::Auth(cmd) => cmd.into(),
            Command::Get(cmd) => cmd.into(),
            Command::Incr(cmd) => cmd.into(),
        }
    }
}

/// Commands travel as an array of bulk strings: the command name followed by its arguments.
fn bulk_array<const N: usize>(parts: [Bytes; N]) -> Frame {
    Frame::Array(parts.into_iter().map(Frame::Bulk).collect())
}
