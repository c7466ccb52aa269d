//! Framed read/write primitives over one emulator connection.
//!
//! Reads are unbuffered: lines are assembled one byte at a time so nothing
//! past the current message is ever consumed from the socket. A blob read
//! only takes as many bytes as it was told to expect.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{AppError, Result};

/// Longest text line accepted from the emulator: 1 MiB.
///
/// A peer that never sends `\n` would otherwise grow the line without bound.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Largest blob accepted from the emulator: 64 MiB.
///
/// The length arrives from the peer; anything above this is refused before
/// a buffer is allocated for it.
pub const MAX_BLOB_BYTES: usize = 64 * 1_048_576;

/// Exclusive owner of the emulator connection.
#[derive(Debug)]
pub struct EmulatorChannel<S> {
    stream: S,
}

impl<S> EmulatorChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Send `number` as a decimal line. No acknowledgement is read back.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the write fails.
    pub async fn send_number(&mut self, number: i64) -> Result<()> {
        self.send_string(&number.to_string()).await
    }

    /// Send `message` followed by `\n`. No acknowledgement is read back.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the write fails.
    pub async fn send_string(&mut self, message: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(message.len() + 1);
        bytes.extend_from_slice(message.as_bytes());
        bytes.push(b'\n');

        self.stream
            .write_all(&bytes)
            .await
            .map_err(|err| AppError::Transport(format!("write failed: {err}")))?;
        self.stream
            .flush()
            .await
            .map_err(|err| AppError::Transport(format!("flush failed: {err}")))?;
        trace!(message, "sent line");
        Ok(())
    }

    /// Read one `\n`-terminated line, trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// - `AppError::Disconnected` if the peer closes before the terminator,
    ///   including a clean close with nothing pending.
    /// - `AppError::Protocol` if the line exceeds [`MAX_LINE_BYTES`] or is
    ///   not UTF-8.
    /// - `AppError::Transport` on a read failure.
    pub async fn receive_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        let mut byte = [0_u8; 1];

        loop {
            let read = self
                .stream
                .read(&mut byte)
                .await
                .map_err(|err| AppError::Transport(format!("read failed: {err}")))?;
            if read == 0 {
                debug!(pending = line.len(), "peer closed while reading a line");
                return Err(AppError::Disconnected(format!(
                    "peer closed with {} byte(s) of an unterminated line",
                    line.len()
                )));
            }
            if byte[0] == b'\n' {
                break;
            }
            if line.len() == MAX_LINE_BYTES {
                return Err(AppError::Protocol(format!(
                    "line too long: exceeded {MAX_LINE_BYTES} bytes"
                )));
            }
            line.push(byte[0]);
        }

        let text = String::from_utf8(line)
            .map_err(|err| AppError::Protocol(format!("line is not utf-8: {err}")))?;
        Ok(text.trim().to_owned())
    }

    /// Read one line and parse it as a decimal integer.
    ///
    /// # Errors
    ///
    /// Everything [`receive_line`](Self::receive_line) returns, plus
    /// `AppError::Protocol` if the line is not an integer.
    pub async fn receive_int(&mut self) -> Result<i64> {
        let line = self.receive_line().await?;
        line.parse::<i64>()
            .map_err(|err| AppError::Protocol(format!("expected integer, got '{line}': {err}")))
    }

    /// Read exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// - `AppError::Protocol` if `len` exceeds [`MAX_BLOB_BYTES`].
    /// - `AppError::Disconnected` if the peer closes before `len` bytes arrive.
    /// - `AppError::Transport` on a read failure.
    pub async fn receive_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len > MAX_BLOB_BYTES {
            return Err(AppError::Protocol(format!(
                "blob of {len} bytes exceeds {MAX_BLOB_BYTES} bytes"
            )));
        }
        let mut buf = BytesMut::zeroed(len);
        let mut filled = 0;

        while filled < len {
            let read = self
                .stream
                .read(&mut buf[filled..])
                .await
                .map_err(|err| AppError::Transport(format!("read failed: {err}")))?;
            if read == 0 {
                return Err(AppError::Disconnected(format!(
                    "peer closed after {filled} of {len} byte(s)"
                )));
            }
            filled += read;
        }

        Ok(buf.freeze())
    }

    /// Read a length line followed by that many bytes.
    ///
    /// # Errors
    ///
    /// `AppError::Protocol` for a negative length or one above
    /// [`MAX_BLOB_BYTES`], otherwise as
    /// [`receive_int`](Self::receive_int) and
    /// [`receive_bytes`](Self::receive_bytes).
    pub async fn receive_blob(&mut self) -> Result<Bytes> {
        let len = self.receive_int().await?;
        let len = usize::try_from(len)
            .map_err(|_| AppError::Protocol(format!("invalid blob length {len}")))?;
        self.receive_bytes(len).await
    }
}
