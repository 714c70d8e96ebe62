use std::io::Write;

use mockgraph_core::{Result, Table};

/// Pretty-printed JSON array document.
pub fn write_array<W: Write>(writer: W, table: &Table) -> Result<u64> {
    let mut counting = CountingWriter::new(writer);
    serde_json::to_writer_pretty(&mut counting, table)?;
    counting.write_all(b"\n")?;
    counting.flush()?;
    Ok(counting.bytes_written())
}

/// One compact JSON object per line.
pub fn write_lines<W: Write>(writer: W, table: &Table) -> Result<u64> {
    let mut counting = CountingWriter::new(writer);
    for record in table {
        serde_json::to_writer(&mut counting, record)?;
        counting.write_all(b"\n")?;
    }
    counting.flush()?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
