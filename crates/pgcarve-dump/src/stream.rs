use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::errors::Result;

/// Splits the chunked byte stream of a `COPY ... TO STDOUT` transfer into
/// complete text rows.
///
/// The connection delivers arbitrarily sized chunks; a row may span several
/// chunks and a chunk may hold several rows. Bytes are buffered until a
/// newline terminator arrives, so the caller always sees whole rows without
/// the terminator. Pulling the next row is the pipeline's only suspension
/// point.
pub struct CopyRowStream<'c> {
    chunks: BoxStream<'c, sqlx::Result<Bytes>>,
    buf: Vec<u8>,
    done: bool,
}

impl<'c> CopyRowStream<'c> {
    pub fn new(chunks: BoxStream<'c, sqlx::Result<Bytes>>) -> Self {
        Self {
            chunks,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Pull the next complete row, or `None` at end of stream.
    ///
    /// A trailing fragment without a terminator is yielded as the final
    /// row. Non-UTF-8 data is an error; the dump file contract is UTF-8.
    pub async fn next_row(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(idx) = self.buf.iter().position(|byte| *byte == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=idx).collect();
                line.pop();
                return Ok(Some(String::from_utf8(line)?));
            }

            if self.done {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buf);
                return Ok(Some(String::from_utf8(line)?));
            }

            match self.chunks.next().await {
                Some(chunk) => self.buf.extend_from_slice(&chunk?),
                None => self.done = true,
            }
        }
    }
}
