use std::io;

/// Growable write buffer handing out contiguous spans.
///
/// `reserve(n)` advances the write cursor by exactly `n` and returns the
/// span, so encoders can fill length fields retroactively through the same
/// slice instead of allocating intermediate buffers.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            pos: 0,
        }
    }

    /// Reserves `n` writable bytes and advances the cursor past them.
    pub fn reserve(&mut self, n: usize) -> &mut [u8] {
        let end = self.pos + n;
        if self.buf.len() < end {
            self.grow(end);
        }
        let span = &mut self.buf[self.pos..end];
        self.pos = end;
        span
    }

    // grows to the next KiB multiple that fits `end`
    fn grow(&mut self, end: usize) {
        self.buf.resize(((end >> 10) + 1) << 10, 0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Yields the accumulated bytes and resets the buffer.
    pub fn take(&mut self) -> Vec<u8> {
        let bytes = self.buf[..self.pos].to_vec();
        self.pos = 0;
        bytes
    }

    pub fn clear(&mut self) {
        self.pos = 0;
    }
}

impl io::Write for ByteWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.reserve(buf.len()).copy_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Bounded-lookahead reader over an in-memory window.
///
/// `peek(n)` is cumulative without commit: each call first discards the
/// previous peek, so a caller can walk the window by peeking alone and
/// either `commit()` everything inspected so far or drop the reader and
/// leave the window untouched. Returns `None` when fewer than `n` bytes
/// remain, letting an incrementally fed caller retry after the next fill.
#[derive(Debug)]
pub struct BytesReader<'a> {
    buf: &'a [u8],
    pos: usize,
    peeked: usize,
}

impl<'a> BytesReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            peeked: 0,
        }
    }

    pub fn peek(&mut self, n: usize) -> Option<&'a [u8]> {
        self.commit();
        let end = self.pos + n;
        if self.buf.len() < end {
            return None;
        }
        self.peeked = n;
        Some(&self.buf[self.pos..end])
    }

    /// Discards the pending peek, making everything peeked so far consumed.
    pub fn commit(&mut self) {
        self.pos += self.peeked;
        self.peeked = 0;
    }

    pub fn read(&mut self, n: usize) -> Option<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.commit();
        Some(bytes)
    }

    /// Bytes consumed from the window, excluding any uncommitted peek.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos - self.peeked
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteWriter, BytesReader};
    use std::io::Write;

    #[test]
    fn writer_reserve_spans() {
        let mut writer = ByteWriter::new();
        writer.reserve(3).copy_from_slice(b"abc");
        let span = writer.reserve(2);
        span[0] = b'd';
        span[1] = b'e';
        assert_eq!(writer.bytes(), b"abcde");
        assert_eq!(writer.take(), b"abcde");
        assert!(writer.is_empty());
    }

    #[test]
    fn writer_grows_to_kib_multiples() {
        let mut writer = ByteWriter::new();
        writer.reserve(1).fill(1);
        writer.reserve(1500).fill(2);
        assert_eq!(writer.len(), 1501);
        assert_eq!(writer.bytes()[0], 1);
        assert_eq!(writer.bytes()[1500], 2);
    }

    #[test]
    fn writer_implements_io_write() {
        let mut writer = ByteWriter::new();
        writer.write_all(b"head").unwrap();
        writer.write_all(b"tail").unwrap();
        assert_eq!(writer.take(), b"headtail");
    }

    #[test]
    fn reader_peek_is_cumulative() {
        let data = b"abcdef";
        let mut reader = BytesReader::new(data);
        assert_eq!(reader.peek(2).unwrap(), b"ab");
        // the second peek discards the first
        assert_eq!(reader.peek(2).unwrap(), b"cd");
        assert_eq!(reader.consumed(), 2);
        reader.commit();
        assert_eq!(reader.consumed(), 4);
        assert_eq!(reader.read(2).unwrap(), b"ef");
        assert!(reader.peek(1).is_none());
    }

    #[test]
    fn reader_short_window() {
        let mut reader = BytesReader::new(b"abc");
        assert!(reader.peek(4).is_none());
        // a failed peek leaves the cursor alone
        assert_eq!(reader.consumed(), 0);
        assert_eq!(reader.peek(3).unwrap(), b"abc");
    }

    #[test]
    fn reader_zero_length_peek() {
        let mut reader = BytesReader::new(b"");
        assert_eq!(reader.peek(0).unwrap(), b"");
        assert_eq!(reader.remaining(), 0);
    }
}
