//! Character-level tokenizer.
//!
//! The tokenizer pulls characters from a [`CharSource`] into a compacting
//! buffer, classifies each one against the active [`Delimiters`] and
//! assembles them into [`Token`]s and whole [`Segment`]s.
//!
//! ## Buffering
//!
//! The buffer is filled on demand only: a read or lookahead that the buffer
//! can already satisfy never touches the source. Before reading more, the
//! consumed prefix is dropped (keeping one character so [`Tokenizer::unget_char`]
//! keeps working), so the buffer stays near its configured capacity no matter
//! how long the stream is.
//!
//! ## Handoff
//!
//! When an interchange ends, [`Tokenizer::into_remainder`] returns the
//! characters already buffered but not consumed together with the source.
//! A tokenizer built from that [`Remainder`] sees exactly the rest of the
//! stream, with nothing dropped or duplicated.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{Delimiters, ReaderOptions, StrSource, Tokenizer};
//!
//! let delimiters = Delimiters::new('*', '~').with_sub_element(':');
//! let mut tokenizer = Tokenizer::new(
//!     StrSource::new("N1*ST*ACME:EAST~"),
//!     delimiters,
//!     &ReaderOptions::default(),
//! );
//! let segment = tokenizer.next_segment().unwrap().unwrap();
//! assert_eq!(segment.id, "N1");
//! assert_eq!(segment.text(1), "ST");
//! assert_eq!(segment.component(2, 2), Some("EAST"));
//! ```

use crate::delimiters::{CharClass, Delimiters};
use crate::error::{Error, Result};
use crate::options::ReaderOptions;
use crate::source::CharSource;
use serde::Serialize;

const PAD: char = '?';
const BOM: char = '\u{FEFF}';
const MAX_TAG_LENGTH: usize = 8;

/// A half-open range of stream character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One character read from the stream and its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    /// The character; `'\0'` when `class` is [`CharClass::Eof`].
    pub ch: char,
    pub class: CharClass,
}

/// The content of one element occurrence.
///
/// A composite holds its sub-elements in order; each sub-element is split
/// further only when a sub-sub-element delimiter occurs in it, so the inner
/// vector normally has exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldValue {
    Simple(String),
    Composite(Vec<Vec<String>>),
}

impl FieldValue {
    /// The simple value, or the first sub-element of a composite.
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Simple(value) => value,
            FieldValue::Composite(parts) => parts
                .first()
                .and_then(|pieces| pieces.first())
                .map(String::as_str)
                .unwrap_or(""),
        }
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldValue::Composite(_))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Simple(value) => value.is_empty(),
            FieldValue::Composite(parts) => parts.iter().flatten().all(String::is_empty),
        }
    }
}

/// What a [`Token`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Simple(String),
    Composite(Vec<Vec<String>>),
    SegmentEnd,
    EndOfData,
}

/// A classified unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// This occurrence followed a repetition separator.
    pub repeat: bool,
}

/// One element occurrence inside a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// 1-based element position; repeated occurrences share a position.
    pub position: usize,
    pub repeat: bool,
    pub value: FieldValue,
    pub span: Span,
}

/// A tokenized segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub id: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

impl Segment {
    /// First occurrence of the element at `position` (1-based).
    #[must_use]
    pub fn element(&self, position: usize) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.position == position)
            .map(|field| &field.value)
    }

    /// Text of the element at `position`, or `""` when absent.
    ///
    /// For a composite this is its first sub-element.
    #[must_use]
    pub fn text(&self, position: usize) -> &str {
        self.element(position).map(FieldValue::first).unwrap_or("")
    }

    /// Sub-element `index` (1-based) of the element at `position`.
    ///
    /// A simple element answers index 1 with its own value.
    #[must_use]
    pub fn component(&self, position: usize, index: usize) -> Option<&str> {
        match self.element(position)? {
            FieldValue::Simple(value) if index == 1 => Some(value),
            FieldValue::Simple(_) => None,
            FieldValue::Composite(parts) => parts
                .get(index.checked_sub(1)?)
                .and_then(|pieces| pieces.first())
                .map(String::as_str),
        }
    }

    /// Highest element position present.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.fields.iter().map(|f| f.position).max().unwrap_or(0)
    }

    /// Moves all spans by `by` characters.
    pub(crate) fn shifted(mut self, by: usize) -> Self {
        self.span = Span::new(self.span.start + by, self.span.end + by);
        for field in &mut self.fields {
            field.span = Span::new(field.span.start + by, field.span.end + by);
        }
        self
    }
}

/// Unconsumed characters plus the source they came from.
///
/// Produced when a reader finishes an interchange; feeds the next one.
#[derive(Debug)]
pub struct Remainder<S> {
    pub leftover: String,
    /// Stream offset of the first leftover character.
    pub offset: usize,
    pub source: S,
}

impl<S> Remainder<S> {
    /// A fresh stream with nothing read yet.
    pub fn new(source: S) -> Self {
        Remainder {
            leftover: String::new(),
            offset: 0,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastRead {
    Nothing,
    Char,
    Eof,
}

/// Character-level tokenizer over a [`CharSource`].
pub struct Tokenizer<S> {
    source: S,
    buf: Vec<char>,
    pos: usize,
    /// Stream offset of `buf[0]`.
    base: usize,
    capacity: usize,
    exhausted: bool,
    delimiters: Delimiters,
    last: LastRead,
    ungot: bool,
    eof_reads: usize,
    pending_end: Option<Span>,
    next_repeat: bool,
    trim: bool,
    max_element_length: usize,
    segment_count: usize,
    segment_text: String,
    transcript: Option<Vec<char>>,
    transcript_base: usize,
}

impl<S: CharSource> Tokenizer<S> {
    pub fn new(source: S, delimiters: Delimiters, options: &ReaderOptions) -> Self {
        Self::from_remainder(Remainder::new(source), delimiters, options)
    }

    /// Builds a tokenizer that continues where a previous one stopped.
    pub fn from_remainder(
        remainder: Remainder<S>,
        delimiters: Delimiters,
        options: &ReaderOptions,
    ) -> Self {
        let buf: Vec<char> = remainder.leftover.chars().collect();
        let capacity = options.buffer_capacity.max(buf.len()).max(16);
        Tokenizer {
            source: remainder.source,
            buf,
            pos: 0,
            base: remainder.offset,
            capacity,
            exhausted: false,
            delimiters,
            last: LastRead::Nothing,
            ungot: false,
            eof_reads: 0,
            pending_end: None,
            next_repeat: false,
            trim: options.trim_values,
            max_element_length: options.max_element_length,
            segment_count: 0,
            segment_text: String::new(),
            transcript: options.retain_text.then(Vec::new),
            transcript_base: remainder.offset,
        }
    }

    /// The active delimiter set.
    #[must_use]
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub(crate) fn set_delimiters(&mut self, delimiters: Delimiters) {
        self.delimiters = delimiters;
    }

    /// Stream offset of the next character to be read.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Number of characters consumed so far across the stream.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.offset()
    }

    /// Number of complete segments read by this tokenizer.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Raw text of the most recent segment, terminator included.
    #[must_use]
    pub fn last_segment_text(&self) -> &str {
        &self.segment_text
    }

    /// Original text between two stream offsets.
    ///
    /// Only available when the tokenizer was built with
    /// [`ReaderOptions::with_retain_text`]; `None` otherwise or when the span
    /// lies outside what this tokenizer consumed.
    #[must_use]
    pub fn raw_text(&self, span: Span) -> Option<String> {
        let transcript = self.transcript.as_ref()?;
        let start = span.start.checked_sub(self.transcript_base)?;
        let end = span.end.checked_sub(self.transcript_base)?;
        if start > end || end > transcript.len() {
            return None;
        }
        Some(transcript[start..end].iter().collect())
    }

    fn fill(&mut self, need: usize) -> Result<()> {
        while self.buf.len() - self.pos < need && !self.exhausted {
            if self.pos > 1 {
                let drop = self.pos - 1;
                self.buf.drain(..drop);
                self.pos -= drop;
                self.base += drop;
            }
            let available = self.buf.len() - self.pos;
            let want = self
                .capacity
                .saturating_sub(self.buf.len())
                .max(need - available);
            if self.source.read_chars(&mut self.buf, want)? == 0 {
                self.exhausted = true;
            }
        }
        Ok(())
    }

    /// Advances one character and classifies it.
    ///
    /// Reading end of input twice in a row (without an intervening
    /// [`unget_char`](Self::unget_char)) is an internal error.
    pub fn get_char(&mut self) -> Result<Scanned> {
        self.fill(1)?;
        self.ungot = false;
        if self.pos >= self.buf.len() {
            self.eof_reads += 1;
            if self.eof_reads > 1 {
                return Err(Error::internal("end of input read twice"));
            }
            self.last = LastRead::Eof;
            return Ok(Scanned {
                ch: '\0',
                class: CharClass::Eof,
            });
        }
        let ch = self.buf[self.pos];
        self.pos += 1;
        self.last = LastRead::Char;
        self.segment_text.push(ch);
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.push(ch);
        }
        Ok(Scanned {
            ch,
            class: self.delimiters.classify(ch),
        })
    }

    /// Pushes back the character returned by the last [`get_char`](Self::get_char).
    ///
    /// Only one character of pushback exists; a second call without an
    /// intervening read is an internal error.
    pub fn unget_char(&mut self) -> Result<()> {
        if self.ungot {
            return Err(Error::internal("unget_char called twice"));
        }
        match self.last {
            LastRead::Nothing => return Err(Error::internal("unget_char before any read")),
            LastRead::Char => {
                self.pos -= 1;
                self.segment_text.pop();
                if let Some(transcript) = self.transcript.as_mut() {
                    transcript.pop();
                }
            }
            LastRead::Eof => self.eof_reads = 0,
        }
        self.ungot = true;
        self.last = LastRead::Nothing;
        Ok(())
    }

    /// The next `n` characters, without consuming them.
    ///
    /// Padded with `'?'` if the input ends first.
    pub fn lookahead(&mut self, n: usize) -> Result<String> {
        let mut text = self.preview(n)?;
        let missing = n - text.chars().count();
        text.extend(std::iter::repeat(PAD).take(missing));
        Ok(text)
    }

    /// Like [`lookahead`](Self::lookahead) but without padding.
    pub(crate) fn preview(&mut self, n: usize) -> Result<String> {
        self.fill(n)?;
        let end = (self.pos + n).min(self.buf.len());
        Ok(self.buf[self.pos..end].iter().collect())
    }

    /// Characters buffered but not yet consumed, including an ungot one.
    #[must_use]
    pub fn get_buffered(&self) -> String {
        self.buf[self.pos..].iter().collect()
    }

    /// Ends this tokenizer, handing back unconsumed text and the source.
    pub fn into_remainder(self) -> Remainder<S> {
        Remainder {
            leftover: self.buf[self.pos..].iter().collect(),
            offset: self.base + self.pos,
            source: self.source,
        }
    }

    /// Consumes `n` characters verbatim, as one segment.
    pub(crate) fn consume_segment(&mut self, n: usize) -> Result<()> {
        self.segment_text.clear();
        for _ in 0..n {
            if self.get_char()?.class == CharClass::Eof {
                return Err(Error::unexpected_eof(self.offset(), "end of header segment"));
            }
        }
        self.segment_count += 1;
        Ok(())
    }

    /// Skips whitespace (and a byte-order mark) between segments.
    ///
    /// Returns `false` when only whitespace remained before end of input.
    pub fn skip_whitespace(&mut self) -> Result<bool> {
        loop {
            let scanned = self.get_char()?;
            if scanned.class == CharClass::Eof {
                self.unget_char()?;
                return Ok(false);
            }
            if !(scanned.ch.is_whitespace() || scanned.ch == BOM) {
                self.unget_char()?;
                return Ok(true);
            }
        }
    }

    fn check_length(&self, length: usize) -> Result<()> {
        if length > self.max_element_length {
            return Err(Error::ElementTooLong {
                limit: self.max_element_length,
                offset: self.offset(),
            });
        }
        Ok(())
    }

    fn finish(&self, value: String) -> String {
        if self.trim {
            let trimmed = value.trim_matches(|c: char| c == ' ' || c == '\t');
            if trimmed.len() != value.len() {
                return trimmed.to_string();
            }
        }
        value
    }

    /// Reads the next element occurrence or segment boundary.
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(span) = self.pending_end.take() {
            return Ok(Token {
                kind: TokenKind::SegmentEnd,
                span,
                repeat: false,
            });
        }
        let start = self.offset();
        let repeat = std::mem::take(&mut self.next_repeat);
        let mut current = String::new();
        let mut pieces: Vec<String> = Vec::new();
        let mut parts: Vec<Vec<String>> = Vec::new();
        let mut composite = false;
        let mut length = 0;
        let mut saw_anything = false;
        let mut end = start;

        loop {
            let scanned = self.get_char()?;
            match scanned.class {
                CharClass::Data => {
                    current.push(scanned.ch);
                    length += 1;
                }
                CharClass::Release => {
                    let escaped = self.get_char()?;
                    if escaped.class == CharClass::Eof {
                        return Err(Error::unexpected_eof(
                            self.offset(),
                            "character after release",
                        ));
                    }
                    current.push(escaped.ch);
                    length += 1;
                }
                CharClass::SubDelimiter => {
                    pieces.push(self.finish(std::mem::take(&mut current)));
                    parts.push(std::mem::take(&mut pieces));
                    composite = true;
                }
                CharClass::SubSubDelimiter => {
                    pieces.push(self.finish(std::mem::take(&mut current)));
                    composite = true;
                }
                CharClass::Delimiter => {
                    end = self.offset() - 1;
                    break;
                }
                CharClass::Repetition => {
                    self.next_repeat = true;
                    end = self.offset() - 1;
                    break;
                }
                CharClass::Terminator => {
                    end = self.offset() - 1;
                    self.pending_end = Some(Span::new(end, self.offset()));
                    break;
                }
                CharClass::Eof => {
                    self.unget_char()?;
                    if !saw_anything && !repeat {
                        return Ok(Token {
                            kind: TokenKind::EndOfData,
                            span: Span::new(start, start),
                            repeat: false,
                        });
                    }
                    end = self.offset();
                    break;
                }
            }
            saw_anything = true;
            self.check_length(length)?;
        }

        let span = Span::new(start, end);
        let kind = if composite {
            pieces.push(self.finish(current));
            parts.push(pieces);
            TokenKind::Composite(parts)
        } else {
            TokenKind::Simple(self.finish(current))
        };
        Ok(Token { kind, span, repeat })
    }

    /// Next simple element value; `None` at the end of the segment.
    ///
    /// A composite here is a lexical error.
    pub fn next_simple_value(&mut self) -> Result<Option<String>> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Simple(value) => Ok(Some(value)),
            TokenKind::Composite(_) => Err(Error::malformed(
                token.span.start,
                "composite element where a simple value was expected",
            )),
            TokenKind::SegmentEnd | TokenKind::EndOfData => Ok(None),
        }
    }

    /// Next element as sub-elements; a simple value becomes one sub-element.
    pub fn next_composite_element(&mut self) -> Result<Option<Vec<Vec<String>>>> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Simple(value) => Ok(Some(vec![vec![value]])),
            TokenKind::Composite(parts) => Ok(Some(parts)),
            TokenKind::SegmentEnd | TokenKind::EndOfData => Ok(None),
        }
    }

    /// Returns `true` if the tag was followed by elements.
    fn read_tag(&mut self, tag: &mut String) -> Result<bool> {
        loop {
            let scanned = self.get_char()?;
            match scanned.class {
                CharClass::Delimiter => break Ok(true),
                CharClass::Data if Some(scanned.ch) == self.delimiters.tag => break Ok(true),
                CharClass::Terminator => {
                    self.pending_end = None;
                    break Ok(false);
                }
                CharClass::Eof => {
                    return Err(Error::unexpected_eof(self.offset(), "segment terminator"));
                }
                CharClass::Data if scanned.ch.is_ascii_alphanumeric() => {
                    tag.push(scanned.ch);
                    if tag.len() > MAX_TAG_LENGTH {
                        return Err(Error::malformed(
                            self.offset(),
                            "segment tag too long; the delimiters are probably wrong",
                        ));
                    }
                }
                _ => {
                    return Err(Error::malformed(
                        self.offset() - 1,
                        &format!("unexpected {:?} in segment tag", scanned.ch),
                    ));
                }
            }
        }
    }

    /// Reads one whole segment; `None` when the input is exhausted.
    pub fn next_segment(&mut self) -> Result<Option<Segment>> {
        if !self.skip_whitespace()? {
            return Ok(None);
        }
        self.segment_text.clear();
        self.next_repeat = false;
        self.pending_end = None;
        let start = self.offset();
        let mut id = String::new();
        let has_fields = self.read_tag(&mut id)?;
        if id.is_empty() {
            return Err(Error::malformed(start, "empty segment tag"));
        }

        let mut fields = Vec::new();
        if has_fields {
            let mut position = 0;
            loop {
                let token = self.next_token()?;
                let value = match token.kind {
                    TokenKind::Simple(value) => FieldValue::Simple(value),
                    TokenKind::Composite(parts) => FieldValue::Composite(parts),
                    TokenKind::SegmentEnd => break,
                    TokenKind::EndOfData => {
                        return Err(Error::unexpected_eof(self.offset(), "segment terminator"));
                    }
                };
                if !token.repeat {
                    position += 1;
                }
                fields.push(Field {
                    position,
                    repeat: token.repeat,
                    value,
                    span: token.span,
                });
            }
        }
        self.segment_count += 1;
        Ok(Some(Segment {
            id,
            fields,
            span: Span::new(start, self.offset()),
        }))
    }
}
