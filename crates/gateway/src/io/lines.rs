use bytes::BytesMut;

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidUtf8,
}

/// A type for reading newline-delimited text from a chunk stream.
///
/// Chunk boundaries carry no meaning here: a logical line, and even a
/// single multi-byte UTF-8 code point, can be split across chunks. The
/// reader owns a leftover byte buffer (for split code points) feeding
/// a leftover text buffer (for split lines); neither is exposed to the
/// caller.
pub struct Lines {
    chunks: Chunks,
    bytes_buf: BytesMut,
    text_buf: String,
    eof: bool,
}

impl Lines {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            chunks,
            bytes_buf: BytesMut::new(),
            text_buf: String::new(),
            eof: false,
        }
    }

    /// Reads the next complete line, with the terminating `\n` (and a
    /// trailing `\r`, if any) stripped.
    ///
    /// Returns `None` once the underlying stream has ended and no
    /// complete line remains. A final partial line with no terminating
    /// newline is discarded; the gateway always terminates its frames
    /// with a newline.
    pub async fn next_line(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.decode(&bytes)?,
                None => self.eof = true,
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let eol_idx = self.text_buf.find('\n')?;
        let mut line: String = self.text_buf.drain(..=eol_idx).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Appends a chunk and moves as many bytes as currently form valid
    /// UTF-8 into the text buffer, retaining an incomplete trailing
    /// code point for the next chunk.
    fn decode(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.bytes_buf.extend_from_slice(bytes);
        let valid_up_to = match str::from_utf8(&self.bytes_buf) {
            Ok(s) => s.len(),
            Err(err) => {
                if err.error_len().is_some() {
                    // A definitively invalid sequence, not merely an
                    // incomplete one.
                    return Err(Error::InvalidUtf8);
                }
                err.valid_up_to()
            }
        };
        let valid = self.bytes_buf.split_to(valid_up_to);
        // SAFETY: The prefix up to `valid_up_to` has just been
        // validated as UTF-8.
        let valid_text = unsafe { str::from_utf8_unchecked(&valid) };
        self.text_buf.push_str(valid_text);
        Ok(())
    }
}
