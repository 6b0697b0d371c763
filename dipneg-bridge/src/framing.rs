//! Length-prefixed message framing.
//!
//! Each frame is a 4-byte big-endian length followed by one encoded protobuf
//! message.

use prost::Message;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Bridge did not answer in time")]
    Timeout,
    #[error("Failed to decode bridge message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Frame of {0} bytes exceeds maximum {max}", max = MAX_FRAME_BYTES)]
    FrameTooLarge(usize),
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),
}

impl BridgeError {
    /// Map socket timeouts onto [`BridgeError::Timeout`].
    pub(crate) fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => BridgeError::Timeout,
            _ => BridgeError::Io(e),
        }
    }
}

pub fn write_frame<W: Write, M: Message>(writer: &mut W, message: &M) -> Result<(), BridgeError> {
    let body = message.encode_to_vec();
    if body.len() > MAX_FRAME_BYTES {
        return Err(BridgeError::FrameTooLarge(body.len()));
    }
    let len = u32::try_from(body.len()).map_err(|_| BridgeError::FrameTooLarge(body.len()))?;

    writer
        .write_all(&len.to_be_bytes())
        .map_err(BridgeError::from_io)?;
    writer.write_all(&body).map_err(BridgeError::from_io)?;
    writer.flush().map_err(BridgeError::from_io)?;
    Ok(())
}

pub fn read_frame<R: Read, M: Message + Default>(reader: &mut R) -> Result<M, BridgeError> {
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .map_err(BridgeError::from_io)?;

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(BridgeError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).map_err(BridgeError::from_io)?;
    Ok(M::decode(body.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{DefendUnit, ProvinceData};
    use std::io::Cursor;

    #[test]
    fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(
            &mut buf,
            &DefendUnit {
                execute: true,
                region: 3,
            },
        )
        .unwrap();
        assert_eq!(buf, vec![0, 0, 0, 4, 0x08, 0x01, 0x10, 0x03]);

        let decoded: DefendUnit = read_frame(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded.region, 3);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buf = ((MAX_FRAME_BYTES + 1) as u32).to_be_bytes().to_vec();
        buf.extend([0u8; 8]);
        let result: Result<ProvinceData, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(BridgeError::FrameTooLarge(_))));
    }

    #[test]
    fn test_truncated_frame_is_io_error() {
        let buf = vec![0, 0, 0, 10, 0x08];
        let result: Result<ProvinceData, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let buf = vec![0, 0, 0, 2, 0xff, 0xff];
        let result: Result<ProvinceData, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(BridgeError::Decode(_))));
    }
}
