use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

// Replies to AUTH, INCR and GET are a handful of bytes; anything this large is not a reply we
// asked for.
const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024;

/// Turns the bytes read from the store into frames, and frames into bytes to write.
///
/// Bytes accumulate in the read buffer owned by `Framed` until a whole frame is available, so a
/// reply may arrive in any number of chunks.
#[derive(Debug, Clone)]
pub struct RespCodec {
    max_frame_size: usize,
}

impl RespCodec {
    pub fn new() -> RespCodec {
        RespCodec {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl Default for RespCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RespCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position = usize::try_from(cursor.position())?;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for RespCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.serialize());
        Ok(())
    }
}
