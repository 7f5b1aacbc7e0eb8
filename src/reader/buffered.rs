//! Buffered document source
//!
//! Reads from any source implementing Read, refilling an internal buffer on
//! demand. Every scan either completes and consumes its token or consumes
//! nothing, so callers can try one scan and fall back to another.

use crate::core::scanner::{find_delimiter, scan_name, whitespace_len, NameScan};
use memchr::{memchr, memchr_iter};
use std::io::{self, Read};
use tracing::trace;

/// Buffer size for reading chunks
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Incremental byte source with backtracking-safe scan primitives
pub struct BufferedSource<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    /// Absolute stream offset of `buffer[0]`
    base: u64,
    /// 1-based line of `buffer[pos]`
    line: usize,
}

impl<R: Read> BufferedSource<R> {
    /// Create a new source with the default buffer size
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new source with the given initial buffer capacity.
    /// The buffer grows when a single token does not fit.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        BufferedSource {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            pos: 0,
            end: 0,
            eof: false,
            base: 0,
            line: 1,
        }
    }

    /// Fill the buffer from the reader. Returns false once the stream is exhausted.
    fn fill_buffer(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        // Compact: consumed bytes are never revisited
        if self.pos > 0 {
            let remaining = self.end - self.pos;
            if remaining > 0 {
                self.buffer.copy_within(self.pos..self.end, 0);
            }
            self.base += self.pos as u64;
            self.end = remaining;
            self.pos = 0;
        }

        if self.end == self.buffer.len() {
            let grown = self.buffer.len() * 2;
            self.buffer.resize(grown, 0);
        }

        let read = loop {
            match self.reader.read(&mut self.buffer[self.end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if read == 0 {
            self.eof = true;
            Ok(false)
        } else {
            self.end += read;
            trace!(read, buffered = self.end, "refilled source buffer");
            Ok(true)
        }
    }

    /// Unread bytes currently in the buffer
    #[inline]
    fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..self.end]
    }

    /// Consume n buffered bytes, keeping the line counter current
    fn advance(&mut self, n: usize) {
        let n = n.min(self.end - self.pos);
        self.line += memchr_iter(b'\n', &self.buffer[self.pos..self.pos + n]).count();
        self.pos += n;
    }

    /// Refill until at least `n` unread bytes are buffered.
    /// Returns false if the stream ends first.
    pub fn ensure_lookahead(&mut self, n: usize) -> io::Result<bool> {
        while self.end - self.pos < n {
            if !self.fill_buffer()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Absolute offset of the next unread byte
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Line of the next unread byte
    pub fn line(&self) -> usize {
        self.line
    }

    /// True once every byte of the stream has been consumed
    pub fn is_eof(&mut self) -> io::Result<bool> {
        Ok(!self.ensure_lookahead(1)?)
    }

    /// Peek at the next byte without consuming it
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        self.peek_at(0)
    }

    /// Peek at the byte `offset` positions ahead
    pub fn peek_at(&mut self, offset: usize) -> io::Result<Option<u8>> {
        if self.ensure_lookahead(offset + 1)? {
            Ok(Some(self.buffer[self.pos + offset]))
        } else {
            Ok(None)
        }
    }

    /// True if the unread input starts with `text`. Consumes nothing.
    pub fn lookahead_is(&mut self, text: &[u8]) -> io::Result<bool> {
        Ok(self.ensure_lookahead(text.len())? && self.buffered().starts_with(text))
    }

    /// Consume `text` if the unread input starts with it
    pub fn scan_literal(&mut self, text: &[u8]) -> io::Result<bool> {
        if self.lookahead_is(text)? {
            self.advance(text.len());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Skip whitespace, returning how many bytes were skipped
    pub fn skip_whitespace(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let n = whitespace_len(self.buffered());
            self.advance(n);
            skipped += n;
            if self.pos < self.end || !self.fill_buffer()? {
                return Ok(skipped);
            }
        }
    }

    /// Scan a name. `extra` lists bytes allowed after the first character
    /// besides letters, digits and underscore.
    pub fn scan_identifier(&mut self, extra: &[u8]) -> io::Result<Option<Vec<u8>>> {
        loop {
            match scan_name(self.buffered(), extra) {
                NameScan::NoName => return Ok(None),
                NameScan::Complete(len) => return Ok(Some(self.take(len))),
                NameScan::Incomplete => {
                    if !self.fill_buffer()? {
                        let len = self.end - self.pos;
                        return Ok((len > 0).then(|| self.take(len)));
                    }
                }
            }
        }
    }

    /// Scan a quoted value. Returns the bytes between `open` and `close`;
    /// consumes nothing if the value is missing or unterminated.
    pub fn scan_quoted(&mut self, open: u8, close: u8) -> io::Result<Option<Vec<u8>>> {
        if self.peek()? != Some(open) {
            return Ok(None);
        }
        let mut searched = 1;
        loop {
            if let Some(i) = memchr(close, &self.buffer[self.pos + searched..self.end]) {
                let value = self.buffer[self.pos + 1..self.pos + searched + i].to_vec();
                self.advance(searched + i + 1);
                return Ok(Some(value));
            }
            searched = self.end - self.pos;
            if !self.fill_buffer()? {
                return Ok(None);
            }
        }
    }

    /// Seek past the next occurrence of `delimiter`, returning the bytes
    /// before it. Consumes nothing if the stream ends first.
    pub fn seek_to(&mut self, delimiter: &[u8]) -> io::Result<Option<Vec<u8>>> {
        let mut searched = 0;
        loop {
            let available = self.buffered();
            if let Some(i) = find_delimiter(&available[searched..], delimiter) {
                let found = searched + i;
                let bytes = available[..found].to_vec();
                self.advance(found + delimiter.len());
                return Ok(Some(bytes));
            }
            // a partial delimiter may straddle the refill
            searched = available.len().saturating_sub(delimiter.len().saturating_sub(1));
            if !self.fill_buffer()? {
                return Ok(None);
            }
        }
    }

    /// Consume bytes up to (not including) `delimiter` or the end of the
    /// stream, whichever comes first
    pub fn take_until(&mut self, delimiter: u8) -> io::Result<Vec<u8>> {
        let mut searched = 0;
        loop {
            if let Some(i) = memchr(delimiter, &self.buffered()[searched..]) {
                return Ok(self.take(searched + i));
            }
            searched = self.end - self.pos;
            if !self.fill_buffer()? {
                return Ok(self.take(searched));
            }
        }
    }

    fn take(&mut self, len: usize) -> Vec<u8> {
        let bytes = self.buffer[self.pos..self.pos + len].to_vec();
        self.advance(len);
        bytes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `chunk` bytes per read call
    pub(crate) struct ChunkedReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl ChunkedReader {
        pub(crate) fn new(data: &[u8], chunk: usize) -> Self {
            ChunkedReader {
                data: data.to_vec(),
                pos: 0,
                chunk: chunk.max(1),
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn tiny(data: &[u8]) -> BufferedSource<ChunkedReader> {
        BufferedSource::with_capacity(ChunkedReader::new(data, 1), 2)
    }

    #[test]
    fn test_peek_and_literal() {
        let mut source = BufferedSource::new(Cursor::new(b"<?xml?><root/>".to_vec()));
        assert_eq!(source.peek().unwrap(), Some(b'<'));
        assert!(!source.scan_literal(b"<root").unwrap());
        assert!(source.scan_literal(b"<?").unwrap());
        assert_eq!(source.position(), 2);
    }

    #[test]
    fn test_identifier_across_refills() {
        let mut source = tiny(b"element-name attr");
        assert_eq!(source.scan_identifier(b"-").unwrap().as_deref(), Some(&b"element-name"[..]));
        assert_eq!(source.skip_whitespace().unwrap(), 1);
        assert_eq!(source.scan_identifier(b"").unwrap().as_deref(), Some(&b"attr"[..]));
        assert!(source.is_eof().unwrap());
    }

    #[test]
    fn test_failed_scan_consumes_nothing() {
        let mut source = tiny(b"'unterminated");
        assert_eq!(source.scan_identifier(b"").unwrap(), None);
        assert_eq!(source.scan_quoted(b'"', b'"').unwrap(), None);
        assert_eq!(source.scan_quoted(b'\'', b'\'').unwrap(), None);
        assert_eq!(source.position(), 0);
        assert_eq!(source.peek().unwrap(), Some(b'\''));
    }

    #[test]
    fn test_quoted() {
        let mut source = tiny(b"\"a > b\" rest");
        assert_eq!(source.scan_quoted(b'"', b'"').unwrap().as_deref(), Some(&b"a > b"[..]));
        assert_eq!(source.peek().unwrap(), Some(b' '));
    }

    #[test]
    fn test_seek_to_straddling_delimiter() {
        let mut source = tiny(b"a comment -- still --> after");
        assert_eq!(
            source.seek_to(b"-->").unwrap().as_deref(),
            Some(&b"a comment -- still "[..])
        );
        assert!(source.scan_literal(b" after").unwrap());
    }

    #[test]
    fn test_seek_to_missing() {
        let mut source = tiny(b"no end here");
        assert_eq!(source.seek_to(b"?>").unwrap(), None);
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn test_take_until() {
        let mut source = tiny(b"text<b>");
        assert_eq!(source.take_until(b'<').unwrap(), b"text");
        assert_eq!(source.peek().unwrap(), Some(b'<'));

        let mut source = tiny(b"trailing");
        assert_eq!(source.take_until(b'<').unwrap(), b"trailing");
        assert!(source.is_eof().unwrap());
    }

    #[test]
    fn test_line_tracking() {
        let mut source = tiny(b"\n\n  <a>");
        source.skip_whitespace().unwrap();
        assert_eq!(source.line(), 3);
        assert_eq!(source.position(), 4);
    }

    #[test]
    fn test_buffer_grows_for_long_token() {
        let name = "x".repeat(100);
        let mut source = BufferedSource::with_capacity(ChunkedReader::new(name.as_bytes(), 7), 4);
        assert_eq!(source.scan_identifier(b"").unwrap().map(|v| v.len()), Some(100));
    }
}
