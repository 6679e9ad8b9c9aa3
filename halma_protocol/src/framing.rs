// Length-delimited JSON frames over any byte stream.
//
// Wire format: a 4-byte big-endian payload length, then a JSON document. The
// raw `write_frame` / `read_frame` pair moves bytes; `send` / `recv` add the
// serde_json step so callers deal in typed messages.
//
// `MAX_FRAME_SIZE` bounds the allocation a malformed or hostile length prefix
// can trigger. The largest legitimate frame is a lobby `GameList`, a few KB.

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ProtocolError;

pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

/// Write one frame and flush.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or(ProtocolError::FrameTooLarge {
            len: payload.len(),
        })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame.
///
/// A stream that closes before or inside a frame yields
/// `ProtocolError::Io` with kind `UnexpectedEof`.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge { len: len as usize });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Serialize `message` as JSON and write it as one frame.
pub fn send<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), ProtocolError> {
    let json = serde_json::to_vec(message)?;
    write_frame(writer, &json)
}

/// Read one frame and deserialize it.
pub fn recv<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, ProtocolError> {
    let payload = read_frame(reader)?;
    Ok(serde_json::from_slice(&payload)?)
}
