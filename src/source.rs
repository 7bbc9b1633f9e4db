//! Character sources feeding the tokenizer.
//!
//! A [`CharSource`] is pulled on demand: the tokenizer only asks for more
//! characters when its buffer cannot satisfy a read or a lookahead. Whatever
//! the tokenizer has not consumed when an interchange ends is handed to the
//! next reader together with the source, so one physical stream can carry
//! several interchanges back to back.

use crate::error::{Error, Result};
use std::io::{self, Read};

const REPLACEMENT: char = '\u{FFFD}';

/// A pull-based stream of characters.
pub trait CharSource {
    /// Appends up to `max` characters to `buf` and returns how many were
    /// appended. Returning zero signals end of input.
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        (**self).read_chars(buf, max)
    }
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        (**self).read_chars(buf, max)
    }
}

/// An in-memory character source.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{CharSource, StrSource};
///
/// let mut source = StrSource::new("UNB+UNOA");
/// let mut buf = Vec::new();
/// assert_eq!(source.read_chars(&mut buf, 3).unwrap(), 3);
/// assert_eq!(source.remaining(), "+UNOA");
/// ```
#[derive(Debug, Clone)]
pub struct StrSource {
    text: String,
    pos: usize,
}

impl StrSource {
    pub fn new(text: impl Into<String>) -> Self {
        StrSource {
            text: text.into(),
            pos: 0,
        }
    }

    /// The text not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.text[self.pos..]
    }
}

impl From<&str> for StrSource {
    fn from(text: &str) -> Self {
        StrSource::new(text)
    }
}

impl From<String> for StrSource {
    fn from(text: String) -> Self {
        StrSource::new(text)
    }
}

impl CharSource for StrSource {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        let mut count = 0;
        let mut consumed = 0;
        for c in self.text[self.pos..].chars().take(max) {
            buf.push(c);
            consumed += c.len_utf8();
            count += 1;
        }
        self.pos += consumed;
        Ok(count)
    }
}

/// A character source decoding UTF-8 from any [`io::Read`].
///
/// Multi-byte sequences split across reads are reassembled. Invalid
/// sequences decode to U+FFFD rather than failing, since EDI payloads in the
/// wild are frequently mislabelled single-byte text.
pub struct ReadSource<R> {
    inner: R,
    pending: Vec<u8>,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, 8192)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        ReadSource {
            inner,
            pending: Vec::new(),
            chunk_size: chunk_size.max(4),
            eof: false,
        }
    }

    /// Gives back the wrapped reader. Bytes already pulled from it but not
    /// yet decoded are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn decode_pending(&mut self, buf: &mut Vec<char>, max: usize) -> usize {
        let mut produced = 0;
        let mut consumed = 0;
        while produced < max && consumed < self.pending.len() {
            let rest = &self.pending[consumed..];
            let (valid, invalid) = match std::str::from_utf8(rest) {
                Ok(_) => (rest.len(), None),
                Err(e) => (e.valid_up_to(), Some(e.error_len())),
            };
            let text = std::str::from_utf8(&rest[..valid]).unwrap_or_default();
            for c in text.chars() {
                if produced == max {
                    break;
                }
                buf.push(c);
                produced += 1;
                consumed += c.len_utf8();
            }
            if produced == max {
                break;
            }
            match invalid {
                Some(Some(len)) => {
                    buf.push(REPLACEMENT);
                    produced += 1;
                    consumed += len;
                }
                // incomplete trailing sequence: wait for more bytes
                Some(None) => break,
                None => {}
            }
        }
        self.pending.drain(..consumed);
        produced
    }

    fn fill_pending(&mut self) -> Result<()> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e)),
            }
        };
        if n == 0 {
            self.eof = true;
        } else {
            self.pending.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}

impl<R: Read> CharSource for ReadSource<R> {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        if max == 0 {
            return Ok(0);
        }
        loop {
            let produced = self.decode_pending(buf, max);
            if produced > 0 {
                return Ok(produced);
            }
            if self.eof {
                if self.pending.is_empty() {
                    return Ok(0);
                }
                // truncated sequence at end of input
                self.pending.clear();
                buf.push(REPLACEMENT);
                return Ok(1);
            }
            self.fill_pending()?;
        }
    }
}
