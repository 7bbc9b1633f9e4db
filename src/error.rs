//! Error types for EDI parsing.
//!
//! Parsing problems fall into two groups:
//!
//! - **Fatal errors** ([`Error`]): anything that leaves the tokenizer position
//!   ambiguous or the envelope grammar broken. They abort the current
//!   interchange immediately; events that were already emitted stay emitted.
//! - **Recoverable errors** ([`RecoverableError`]): trailer count and control
//!   number mismatches, malformed composites in envelope fields and envelope
//!   field length violations. Each one is offered exactly once to the caller's
//!   [`RecoveryPolicy`](crate::RecoveryPolicy). If the policy declines, the
//!   error comes back as the fatal [`Error::Aborted`].
//!
//! ## Error Categories
//!
//! - **Lexical**: malformed segment, element too long, unexpected end of input
//! - **Envelope**: missing header, segment out of place, unsupported dialect
//! - **Validation**: a recoverable error the policy refused to continue past
//! - **I/O**: the character source failed
//! - **Internal**: an invariant of the reader itself was violated
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{parse_str, Error, ErrorCategory};
//!
//! let err = parse_str("HELLO WORLD").unwrap_err();
//! assert!(matches!(err, Error::UnsupportedDialect { .. }));
//! assert_eq!(err.category(), ErrorCategory::Envelope);
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Envelope level a validation problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Interchange,
    Group,
    Document,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Interchange => "interchange",
            Level::Group => "group",
            Level::Document => "document",
        })
    }
}

/// What went wrong in a [`RecoverableError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecoverableKind {
    /// A trailer's declared count differs from the number observed.
    CountMismatch,
    /// A trailer's control number differs from its header's.
    ControlNumberMismatch,
    /// A composite value appeared where a simple value is required.
    MalformedComposite,
    /// An envelope field has the wrong length.
    FieldLength,
}

impl fmt::Display for RecoverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecoverableKind::CountMismatch => "count mismatch",
            RecoverableKind::ControlNumberMismatch => "control number mismatch",
            RecoverableKind::MalformedComposite => "malformed composite",
            RecoverableKind::FieldLength => "field length",
        })
    }
}

/// A validation problem isolated to one structural unit.
///
/// Carries both the value the grammar expected and the value actually found,
/// so a policy (or a human reading a log line) can tell which side is wrong.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{Level, RecoverableError, RecoverableKind};
///
/// let err = RecoverableError::new(
///     RecoverableKind::ControlNumberMismatch,
///     Level::Interchange,
///     "IEA",
///     "000038449",
///     "000038450",
///     512,
/// );
/// assert!(err.to_string().contains("expected 000038449"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} in {segment} ({level}): expected {expected}, found {actual} at offset {offset}")]
pub struct RecoverableError {
    pub kind: RecoverableKind,
    pub level: Level,
    pub segment: String,
    pub expected: String,
    pub actual: String,
    pub offset: usize,
}

impl RecoverableError {
    pub fn new(
        kind: RecoverableKind,
        level: Level,
        segment: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
        offset: usize,
    ) -> Self {
        RecoverableError {
            kind,
            level,
            segment: segment.to_string(),
            expected: expected.into(),
            actual: actual.into(),
            offset,
        }
    }
}

/// Coarse classification of a fatal [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Lexical,
    Envelope,
    Validation,
    Io,
    Internal,
}

/// Represents every way parsing an interchange can fail.
///
/// Offsets are character offsets from the start of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The character source failed
    #[error("IO error: {0}")]
    Io(String),

    /// Input ended in the middle of a structure
    #[error("Unexpected end of input at offset {offset}: expected {expected}")]
    UnexpectedEof { offset: usize, expected: String },

    /// An element grew past the configured limit
    #[error("Element longer than {limit} characters at offset {offset}; check the delimiters")]
    ElementTooLong { limit: usize, offset: usize },

    /// A segment could not be tokenized
    #[error("Malformed segment at offset {offset}: {msg}")]
    MalformedSegment { offset: usize, msg: String },

    /// The input does not start with a known envelope signature
    #[error("No supported EDI dialect recognized; input begins with {found:?}")]
    UnsupportedDialect { found: String },

    /// A segment is not legal in the current envelope state
    #[error("Segment {segment} is not valid {state} at offset {offset}")]
    UnexpectedSegment {
        segment: String,
        state: String,
        offset: usize,
    },

    /// A mandatory header segment is absent
    #[error("Expected {expected} header, found {found}")]
    MissingHeader { expected: String, found: String },

    /// The reader was driven in a way it does not support
    #[error("Internal error: {0}")]
    Internal(String),

    /// A recoverable error the recovery policy chose not to continue past
    #[error("Parse aborted: {0}")]
    Aborted(RecoverableError),
}

impl Error {
    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(offset: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            offset,
            expected: expected.to_string(),
        }
    }

    /// Creates a malformed segment error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edi_stream::Error;
    ///
    /// let err = Error::malformed(17, "empty segment tag");
    /// assert!(err.to_string().contains("offset 17"));
    /// ```
    pub fn malformed(offset: usize, msg: &str) -> Self {
        Error::MalformedSegment {
            offset,
            msg: msg.to_string(),
        }
    }

    pub fn unexpected_segment(segment: &str, state: &str, offset: usize) -> Self {
        Error::UnexpectedSegment {
            segment: segment.to_string(),
            state: state.to_string(),
            offset,
        }
    }

    pub fn missing_header(expected: &str, found: &str) -> Self {
        Error::MissingHeader {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn internal<T: fmt::Display>(msg: T) -> Self {
        Error::Internal(msg.to_string())
    }

    /// Returns the taxonomy bucket this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) => ErrorCategory::Io,
            Error::UnexpectedEof { .. }
            | Error::ElementTooLong { .. }
            | Error::MalformedSegment { .. } => ErrorCategory::Lexical,
            Error::UnsupportedDialect { .. }
            | Error::UnexpectedSegment { .. }
            | Error::MissingHeader { .. } => ErrorCategory::Envelope,
            Error::Aborted(_) => ErrorCategory::Validation,
            Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// The refused recoverable error, if this is [`Error::Aborted`].
    #[must_use]
    pub fn recoverable(&self) -> Option<&RecoverableError> {
        match self {
            Error::Aborted(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
