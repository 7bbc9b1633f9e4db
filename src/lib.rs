//! # edi_stream
//!
//! A streaming reader for EDI interchanges in the ANSI X12, UN/EDIFACT and
//! TRADACOMS dialects.
//!
//! ## What does it do?
//!
//! EDI interchanges are flat sequences of delimited segments wrapped in
//! envelopes: an interchange holds optional groups, which hold documents
//! (transaction sets or messages), which hold data segments. The reader
//! recognizes the dialect from the first characters, learns the delimiters
//! from the interchange header and emits SAX-style structural events as it
//! goes, so inputs of any size are processed in bounded memory.
//!
//! ## Key Features
//!
//! - **Dialect detection**: `ISA`, `UNA`/`UNB` and `STX` headers select X12,
//!   EDIFACT and TRADACOMS; delimiters come from the header itself
//! - **Streaming**: characters are pulled on demand through a compacting
//!   buffer; nothing is accumulated beyond the current segment
//! - **Envelope validation**: trailer counts and control numbers are checked
//!   and mismatches handed to a caller-supplied [`RecoveryPolicy`]
//! - **Loop nesting**: per-document-type [`LoopTable`]s turn flat segment
//!   runs into nested `loop` events
//! - **Multiple interchanges**: a stream may hold several interchanges of
//!   mixed dialects; each reader hands its unread text to the next
//!
//! ## Quick Start
//!
//! ```rust
//! use edi_stream::parse_str;
//!
//! let x12 = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *991231*2359*U*00401*000000001*0*P*:~\
//!            GS*PO*SENDER*RECEIVER*19991231*2359*1*X*004010~\
//!            ST*850*0001~BEG*00*SA*PO123**19991231~SE*3*0001~\
//!            GE*1*1~\
//!            IEA*1*000000001~";
//!
//! let events = parse_str(x12).unwrap();
//! assert_eq!(events.count("transaction"), 1);
//! assert_eq!(events.closings.len(), 2);
//! let interchange = events.starts("interchange").next().unwrap();
//! assert_eq!(interchange.get("Standard"), Some("ANSI X.12"));
//! assert_eq!(interchange.get("Control"), Some("000000001"));
//! ```
//!
//! ### Driving a reader directly
//!
//! ```rust
//! use edi_stream::{open, EventCollector, Lenient, ReaderOptions, StrSource};
//!
//! let text = "STX=ANA:1+SUPPLIER+BUYER+240131:0930+REF1'\
//!             MHD=1+ORDHDR:9'TYP=0430+NEW-ORDERS'MTR=3'\
//!             END=1'";
//! let mut reader = open(StrSource::new(text), &ReaderOptions::default())
//!     .unwrap()
//!     .unwrap();
//! let mut sink = EventCollector::new();
//! let details = reader.parse(&mut sink, &mut Lenient).unwrap();
//! assert_eq!(details.sender, "SUPPLIER");
//! assert!(reader.into_remainder().leftover.is_empty());
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: interchange, group and document
//! boundaries at `debug`, loop transitions at `trace`. Install any
//! subscriber to see them.

pub mod attributes;
pub mod delimiters;
pub mod details;
pub mod detect;
pub mod envelope;
pub mod error;
pub mod event;
pub mod macros;
pub mod options;
pub mod plugin;
pub mod recovery;
pub mod source;
pub mod tokenizer;

pub use attributes::Attributes;
pub use delimiters::{CharClass, Delimiters};
pub use details::{parse_timestamp, ClosingDetails};
pub use detect::{detect, open, resume, Standard};
pub use envelope::{same_control, Reader, State};
pub use error::{Error, ErrorCategory, Level, RecoverableError, RecoverableKind, Result};
pub use event::{names, Event, EventCollector, EventSink};
pub use options::ReaderOptions;
pub use plugin::{
    LoopController, LoopDescriptor, LoopTable, PluginRegistry, ANONYMOUS_LOOP, ANY_CONTEXT,
};
pub use recovery::{Lenient, Recovery, RecoveryPolicy, Strict};
pub use source::{CharSource, ReadSource, StrSource};
pub use tokenizer::{
    Field, FieldValue, Remainder, Scanned, Segment, Span, Token, TokenKind, Tokenizer,
};

use std::io;

/// Reads every interchange in a stream, in order.
///
/// Events are bracketed by `start_document`/`end_document` and a single
/// `ediroot` element. Interchanges may use different dialects; each one
/// continues exactly where the previous one stopped. Returns the closing
/// details of every interchange.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{parse_stream, EventCollector, ReaderOptions, StrSource, Strict};
///
/// let text = "UNB+UNOA:1+A+B+240101:1200+1'UNZ+0+1'\n\
///             STX=ANA:1+A+B+240101:1200+7'END=0'";
/// let mut sink = EventCollector::new();
/// let closed = parse_stream(StrSource::new(text), &ReaderOptions::default(), &mut sink, &mut Strict)
///     .unwrap();
/// assert_eq!(closed.len(), 2);
/// assert_eq!(sink.count("interchange"), 2);
/// ```
///
/// # Errors
///
/// Returns the first fatal error; events emitted before it stay emitted.
/// Input that no dialect recognizes fails before any event is emitted.
pub fn parse_stream<S, K, P>(
    source: S,
    options: &ReaderOptions,
    sink: &mut K,
    policy: &mut P,
) -> Result<Vec<ClosingDetails>>
where
    S: CharSource,
    K: EventSink + ?Sized,
    P: RecoveryPolicy,
{
    let mut next = resume(Remainder::new(source), options)?;
    sink.start_document();
    sink.start_element(names::ROOT, &Attributes::new());
    let mut closed = Vec::new();
    while let Some(mut reader) = next {
        closed.push(reader.parse(sink, policy)?);
        next = resume(reader.into_remainder(), options)?;
    }
    sink.end_element(names::ROOT);
    sink.end_document();
    tracing::debug!(interchanges = closed.len(), "stream finished");
    Ok(closed)
}

/// Reads every interchange from an [`io::Read`], decoding UTF-8.
///
/// # Errors
///
/// Same as [`parse_stream`], plus [`Error::Io`] when reading fails.
pub fn parse_reader<R, K, P>(
    reader: R,
    options: &ReaderOptions,
    sink: &mut K,
    policy: &mut P,
) -> Result<Vec<ClosingDetails>>
where
    R: io::Read,
    K: EventSink + ?Sized,
    P: RecoveryPolicy,
{
    parse_stream(ReadSource::new(reader), options, sink, policy)
}

/// Parses text with default options, aborting on any recoverable error.
///
/// # Errors
///
/// Returns an error if the text is not well-formed EDI or fails envelope
/// validation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str(text: &str) -> Result<EventCollector> {
    parse_str_with(text, &ReaderOptions::default(), &mut Strict)
}

/// Parses text with the given options and recovery policy.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{parse_str_with, Lenient, ReaderOptions};
///
/// // The trailer claims two messages but there is only one.
/// let text = "UNB+UNOA:1+A+B+240101:1200+1'UNH+1+INVOIC:D:96A:UN'UNT+2+1'UNZ+2+1'";
/// let events = parse_str_with(text, &ReaderOptions::default(), &mut Lenient).unwrap();
/// assert_eq!(events.count("transaction"), 1);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not well-formed EDI, or if the policy
/// aborts on a recoverable error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str_with<P: RecoveryPolicy>(
    text: &str,
    options: &ReaderOptions,
    policy: &mut P,
) -> Result<EventCollector> {
    let mut sink = EventCollector::new();
    parse_stream(StrSource::new(text), options, &mut sink, policy)?;
    Ok(sink)
}
