use bytes::Bytes;

use crate::commands::bulk_array;
use crate::frame::Frame;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, Clone, PartialEq)]
pub struct Get {
    pub key: String,
}

impl From<Get> for Frame {
    fn from(cmd: Get) -> Frame {
        bulk_array([Bytes::from_static(b"GET"), Bytes::from(cmd.key)])
    }
}
