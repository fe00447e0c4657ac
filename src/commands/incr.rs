use bytes::Bytes;

use crate::commands::bulk_array;
use crate::frame::Frame;

/// Increments the number stored at key by one.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, Clone, PartialEq)]
pub struct Incr {
    pub key: String,
}

impl From<Incr> for Frame {
    fn from(cmd: Incr) -> Frame {
        bulk_array([Bytes::from_static(b"INCR"), Bytes::from(cmd.key)])
    }
}
