//! Dialect detection and reader construction.
//!
//! Every supported dialect starts its interchange with a fixed three-letter
//! tag: `ISA` for X12, `UNA` or `UNB` for EDIFACT and `STX` for TRADACOMS.
//! [`detect`] looks only at those characters; [`open`] and [`resume`] skip
//! leading whitespace and a byte-order mark, peek at the stream without
//! consuming it, and build a [`Reader`] configured for the dialect found.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{detect, Standard};
//!
//! assert_eq!(detect("ISA*00*").unwrap(), Some(Standard::X12));
//! assert_eq!(detect("UNA:+.? '").unwrap(), Some(Standard::Edifact));
//! assert_eq!(detect("").unwrap(), None);
//! assert!(detect("<?xml").is_err());
//! ```

use crate::delimiters::Delimiters;
use crate::envelope::Reader;
use crate::error::{Error, Result};
use crate::options::ReaderOptions;
use crate::source::CharSource;
use crate::tokenizer::{Remainder, Tokenizer};
use serde::Serialize;
use std::fmt;

/// Characters [`detect`] needs to see.
pub const SNIFF_LENGTH: usize = 3;

/// Characters quoted back when the dialect is not recognized.
const QUOTED_LENGTH: usize = 16;

/// The EDI standards this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Standard {
    X12,
    Edifact,
    Tradacoms,
}

impl Standard {
    /// Display name, as used in the `Standard` interchange attribute.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Standard::X12 => "ANSI X.12",
            Standard::Edifact => "EDIFACT",
            Standard::Tradacoms => "TRADACOMS",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies the dialect from the first characters of an interchange.
///
/// Returns `Ok(None)` for empty input and [`Error::UnsupportedDialect`] for
/// anything that is not a known interchange header.
pub fn detect(preview: &str) -> Result<Option<Standard>> {
    if preview.is_empty() {
        return Ok(None);
    }
    let tag: String = preview.chars().take(SNIFF_LENGTH).collect();
    match tag.as_str() {
        "ISA" => Ok(Some(Standard::X12)),
        "UNA" | "UNB" => Ok(Some(Standard::Edifact)),
        "STX" => Ok(Some(Standard::Tradacoms)),
        _ => Err(Error::UnsupportedDialect {
            found: preview.chars().take(QUOTED_LENGTH).collect(),
        }),
    }
}

/// Opens a reader on a fresh stream.
///
/// Returns `Ok(None)` when the stream holds nothing but whitespace.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{open, ReaderOptions, Standard, StrSource};
///
/// let reader = open(StrSource::new("  \n"), &ReaderOptions::default()).unwrap();
/// assert!(reader.is_none());
///
/// let reader = open(StrSource::new("UNB+UNOA:1+X+Y+991231:2359+1'"), &ReaderOptions::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(reader.standard(), Standard::Edifact);
/// ```
pub fn open<S: CharSource>(source: S, options: &ReaderOptions) -> Result<Option<Reader<S>>> {
    resume(Remainder::new(source), options)
}

/// Opens a reader on whatever follows a previous interchange.
pub fn resume<S: CharSource>(
    remainder: Remainder<S>,
    options: &ReaderOptions,
) -> Result<Option<Reader<S>>> {
    // Placeholder set; the dialect installs the real one from the header.
    let mut tokenizer = Tokenizer::from_remainder(remainder, Delimiters::new('*', '~'), options);
    if !tokenizer.skip_whitespace()? {
        tracing::debug!(offset = tokenizer.offset(), "no further interchange");
        return Ok(None);
    }
    let preview = tokenizer.preview(QUOTED_LENGTH)?;
    match detect(&preview)? {
        Some(standard) => {
            tracing::debug!(%standard, offset = tokenizer.offset(), "detected interchange");
            Ok(Some(Reader::new(standard, tokenizer, options)))
        }
        None => Ok(None),
    }
}
