//! Buffered reading of RESP frames from a socket.
//!
//! Bytes are accumulated until a complete frame is available, so commands
//! split across reads and several commands in one read are both handled.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{RespError, RespValue, decode_snapshot_payload};

const READ_BUFFER_SIZE: usize = 4096;

/// Errors that can occur while reading frames from a stream.
#[derive(Error, Debug)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Protocol(#[from] RespError),
}

#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_buffered(reader, &[])
    }

    /// Starts from bytes already read from `reader` by someone else.
    pub fn with_buffered(reader: R, buffered: &[u8]) -> Self {
        let mut buffer = BytesMut::with_capacity(READ_BUFFER_SIZE.max(buffered.len()));
        buffer.extend_from_slice(buffered);

        Self { reader, buffer }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Splits into the reader and whatever was buffered but not consumed.
    pub fn into_parts(self) -> (R, Bytes) {
        (self.reader, self.buffer.freeze())
    }

    /// Reads once from the stream into the buffer. Cancel safe.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of bytes read
    /// * `Err(CommandReadError::ConnectionClosed)` - If the peer closed the stream
    /// * `Err(CommandReadError::Io)` - If reading fails
    pub async fn fill(&mut self) -> Result<usize, CommandReadError> {
        self.buffer.reserve(READ_BUFFER_SIZE);

        match self.reader.read_buf(&mut self.buffer).await? {
            0 => Err(CommandReadError::ConnectionClosed),
            n => Ok(n),
        }
    }

    /// Decodes the next buffered frame without reading. Returns the frame
    /// with the number of bytes it occupied.
    pub fn next_frame(&mut self) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((value, consumed)) = RespValue::decode_next(&self.buffer)? else {
            return Ok(None);
        };

        self.buffer.advance(consumed);

        Ok(Some((value, consumed)))
    }

    /// Reads until a whole frame is available.
    pub async fn read_frame(&mut self) -> Result<RespValue, CommandReadError> {
        loop {
            if let Some((value, _)) = self.next_frame()? {
                return Ok(value);
            }

            self.fill().await?;
        }
    }

    /// Reads the snapshot frame that follows `+FULLRESYNC`.
    pub async fn read_snapshot(&mut self) -> Result<Bytes, CommandReadError> {
        loop {
            if let Some((payload, consumed)) = decode_snapshot_payload(&self.buffer)? {
                self.buffer.advance(consumed);
                return Ok(payload);
            }

            self.fill().await?;
        }
    }
}
