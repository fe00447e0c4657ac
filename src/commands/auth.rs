use bytes::Bytes;
use std::fmt;

use crate::commands::bulk_array;
use crate::frame::Frame;

/// Authenticates the connection using the single-argument (password only) form.
///
/// Ref: <https://redis.io/docs/latest/commands/auth/>
#[derive(Clone, PartialEq)]
pub struct Auth {
    pub password: String,
}

// Keeps the password out of logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth").field("password", &"<redacted>").finish()
    }
}

impl From<Auth> for Frame {
    fn from(cmd: Auth) -> Frame {
        bulk_array([Bytes::from_static(b"AUTH"), Bytes::from(cmd.password)])
    }
}
