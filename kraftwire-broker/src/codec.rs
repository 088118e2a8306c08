//! Request framing.
//!
//! # Wire Format
//!
//! ```text
//! ┌─────────────────┬────────────────────────────────────────────────┐
//! │  Length (4B)    │                  Payload                       │
//! │   big-endian    │  RequestHeader + RequestBody                   │
//! └─────────────────┴────────────────────────────────────────────────┘
//! ```
//!
//! Responses are framed by `Response::encode_framed` in the protocol crate.

use bytes::{Buf, Bytes, BytesMut};
use kraftwire_protocol::encoder::FRAME_HEADER_SIZE;

use crate::error::{BrokerError, BrokerResult};

/// Read a length-prefixed frame from the buffer.
///
/// Returns `None` if not enough data is available yet.
/// Returns `Some(bytes)` with the frame payload (excluding length prefix).
///
/// # Errors
///
/// Returns an error if the declared length exceeds `max_message_size`.
pub fn read_frame(buf: &mut BytesMut, max_message_size: usize) -> BrokerResult<Option<Bytes>> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Ok(None);
    }

    // Peek at the length (don't consume yet).
    let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if length > max_message_size {
        return Err(BrokerError::FrameTooLarge {
            length,
            max: max_message_size,
        });
    }

    if buf.len() < FRAME_HEADER_SIZE + length {
        return Ok(None);
    }

    buf.advance(FRAME_HEADER_SIZE);
    Ok(Some(buf.split_to(length).freeze()))
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::config::MAX_MESSAGE_SIZE;

    #[test]
    fn test_read_frame_incomplete() {
        let mut buf = BytesMut::from(&[0, 0, 0, 10][..]); // Length = 10, but no payload.
        let result = read_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 4); // Buffer unchanged.
    }

    #[test]
    fn test_read_frame_short_prefix() {
        let mut buf = BytesMut::from(&[0, 0][..]);
        assert!(read_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().is_none());
    }

    #[test]
    fn test_read_frame_complete() {
        let mut buf = BytesMut::new();
        buf.put_u32(5);
        buf.put_slice(b"hello");
        buf.put_u32(1);

        let result = read_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"hello")));
        assert_eq!(&buf[..], &[0, 0, 0, 1]); // Next frame left in place.
    }

    #[test]
    fn test_read_frame_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32(1025);

        let err = read_frame(&mut buf, 1024).unwrap_err();
        assert!(matches!(err, BrokerError::FrameTooLarge { length: 1025, max: 1024 }));
    }
}
