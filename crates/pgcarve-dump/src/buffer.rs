use std::io::{self, Write};

/// Append-only accumulation buffer for not-yet-flushed dump output.
///
/// Output is buffered per table and written out in one pass; the buffer is
/// never read back. Accumulate-then-flush is a deliberate latency/IO
/// trade-off, not an implementation accident: one write call per table
/// instead of one per row.
#[derive(Debug, Default)]
pub struct DumpBuffer {
    chunks: Vec<String>,
}

impl DumpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk verbatim.
    pub fn push(&mut self, chunk: impl Into<String>) {
        self.chunks.push(chunk.into());
    }

    /// Append a chunk followed by a newline.
    pub fn push_line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        let mut chunk = String::with_capacity(line.len() + 1);
        chunk.push_str(line);
        chunk.push('\n');
        self.chunks.push(chunk);
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Write all buffered chunks to `writer` in order and clear the buffer.
    pub fn flush(&mut self, writer: &mut impl Write) -> io::Result<()> {
        for chunk in &self.chunks {
            writer.write_all(chunk.as_bytes())?;
        }
        writer.flush()?;
        self.chunks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_writes_in_order_and_clears() {
        let mut buffer = DumpBuffer::new();
        buffer.push("a");
        buffer.push_line("b");
        buffer.push("c\n");

        let mut out = Vec::new();
        buffer.flush(&mut out).expect("flush");

        assert_eq!(out, b"ab\nc\n");
        assert!(buffer.is_empty());

        buffer.flush(&mut out).expect("second flush");
        assert_eq!(out, b"ab\nc\n");
    }
}
