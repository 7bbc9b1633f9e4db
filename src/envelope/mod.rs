//! The envelope state machine.
//!
//! A [`Reader`] reads exactly one interchange. It consumes the interchange
//! header, then pulls segments from the tokenizer one at a time and routes
//! them by their envelope role:
//!
//! ```text
//! BeforeInterchange ─▶ InInterchangeHeader ─┬─▶ InGroupHeader ─▶ InDocumentHeader ─▶ InSegment*
//!                                           │                                          │
//!                                           └──────────── InDocumentTrailer ◀──────────┘
//!                                                 InGroupTrailer ─▶ InInterchangeTrailer ─▶ Done
//! ```
//!
//! Header and trailer segments are never emitted as `segment` events; their
//! content becomes attributes on the `interchange`, `group` and
//! `transaction` elements. Trailer counts and control numbers are checked
//! against what was actually read and any disagreement goes to the
//! recovery policy.
//!
//! What differs between X12, EDIFACT and TRADACOMS (how the header fixes
//! the delimiters, which tags play which role, which fields carry what) sits
//! behind the crate-private `Dialect` trait; the state machine itself is
//! shared.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{open, EventCollector, Lenient, ReaderOptions, StrSource};
//!
//! let text = "UNB+UNOA:1+SENDER+RECEIVER+991231:2359+42'\
//!             UNH+1+ORDERS:D:96A:UN'BGM+220+PO1'UNT+3+1'\
//!             UNZ+1+42'";
//! let mut reader = open(StrSource::new(text), &ReaderOptions::default())
//!     .unwrap()
//!     .unwrap();
//! let mut sink = EventCollector::new();
//! let details = reader.parse(&mut sink, &mut Lenient).unwrap();
//! assert_eq!(details.interchange_control, "42");
//! assert_eq!(sink.count("transaction"), 1);
//! assert!(reader.recovered().is_empty());
//! ```

mod edifact;
mod tradacoms;
mod x12;

use crate::attributes::Attributes;
use crate::delimiters::Delimiters;
use crate::detect::Standard;
use crate::details::ClosingDetails;
use crate::error::{Error, Level, RecoverableError, RecoverableKind, Result};
use crate::event::{names, EventSink};
use crate::options::ReaderOptions;
use crate::plugin::{LoopController, PluginRegistry};
use crate::recovery::{ErrorClassifier, RecoveryPolicy};
use crate::source::CharSource;
use crate::tokenizer::{FieldValue, Remainder, Segment, Span, Tokenizer};
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Where a [`Reader`] is in the envelope grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    BeforeInterchange,
    InInterchangeHeader,
    InGroupHeader,
    InDocumentHeader,
    InSegment,
    InDocumentTrailer,
    InGroupTrailer,
    /// Validating the interchange trailer; a reader left here was stopped
    /// by its recovery policy.
    InInterchangeTrailer,
    Done,
}

/// Envelope role of a segment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    InterchangeHeader,
    InterchangeTrailer,
    GroupHeader,
    GroupTrailer,
    DocumentHeader,
    DocumentTrailer,
    /// Legal directly inside the interchange, such as an X12 `TA1`.
    InterchangeData,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupPolicy {
    Required,
    Optional,
}

/// Result of inspecting the start of an interchange.
#[derive(Debug)]
pub(crate) struct HeaderScan {
    pub delimiters: Delimiters,
    /// Characters to consume as one segment before normal tokenizing.
    pub consumed: usize,
    /// The header itself when the scan already decoded it.
    pub segment: Option<Segment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Party {
    pub id: String,
    pub qualifier: String,
}

/// What a header segment says about its envelope.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvelopeHeader {
    pub control: String,
    pub attributes: Attributes,
    pub sender: Option<Party>,
    pub receiver: Option<Party>,
    pub document_type: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

/// Element positions of a trailer's count and control number.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TrailerLayout {
    pub count: Option<usize>,
    pub control: Option<usize>,
}

impl TrailerLayout {
    pub(crate) const fn new(count: Option<usize>, control: Option<usize>) -> Self {
        TrailerLayout { count, control }
    }
}

/// Dialect-specific envelope knowledge.
pub(crate) trait Dialect {
    fn standard(&self) -> Standard;

    /// Tag of the interchange header segment.
    fn header_tag(&self) -> &'static str;

    /// Characters [`scan_header`](Self::scan_header) wants to see.
    fn preview_length(&self) -> usize;

    /// Fixes the delimiters from the start of the interchange.
    fn scan_header(&mut self, preview: &str) -> Result<HeaderScan>;

    /// Adjusts the delimiters once the header segment has been read.
    fn refine_delimiters(&self, _header: &Segment, _delimiters: &mut Delimiters) {}

    fn role(&self, tag: &str) -> Role;

    fn group_policy(&self) -> GroupPolicy;

    fn interchange_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader;

    fn group_header(&self, header: &Segment, problems: &mut Vec<RecoverableError>)
        -> EnvelopeHeader;

    fn document_header(
        &self,
        header: &Segment,
        group: Option<&EnvelopeHeader>,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader;

    fn trailer_layout(&self, role: Role) -> TrailerLayout;

    /// Whether the interchange trailer counts groups rather than documents.
    fn interchange_counts_groups(&self, groups: usize) -> bool {
        groups > 0
    }
}

pub(crate) fn dialect_for(standard: Standard, options: &ReaderOptions) -> Box<dyn Dialect> {
    match standard {
        Standard::X12 => Box::new(x12::X12::new(options.trim_values)),
        Standard::Edifact => Box::new(edifact::Edifact::new()),
        Standard::Tradacoms => Box::new(tradacoms::Tradacoms),
    }
}

/// Text of a single-valued envelope field.
///
/// A composite is reported as [`RecoverableKind::MalformedComposite`] and
/// its first component used instead.
pub(crate) fn simple_field(
    segment: &Segment,
    position: usize,
    level: Level,
    problems: &mut Vec<RecoverableError>,
) -> String {
    match segment.element(position) {
        None => String::new(),
        Some(FieldValue::Simple(value)) => value.clone(),
        Some(value @ FieldValue::Composite(parts)) => {
            let found = parts
                .iter()
                .map(|pieces| pieces.join("&"))
                .collect::<Vec<_>>()
                .join(":");
            problems.push(RecoverableError::new(
                RecoverableKind::MalformedComposite,
                level,
                &segment.id,
                format!("simple value in element {position}"),
                found,
                segment.span.start,
            ));
            value.first().to_string()
        }
    }
}

/// Sub-element `index` of the element at `position`, or `""`.
pub(crate) fn component(segment: &Segment, position: usize, index: usize) -> String {
    segment
        .component(position, index)
        .unwrap_or("")
        .to_string()
}

/// Control numbers match when their text or their numeric value agrees.
///
/// # Examples
///
/// ```rust
/// # use edi_stream::same_control;
/// assert!(same_control("000000001", "1"));
/// assert!(same_control("ABC", " ABC"));
/// assert!(!same_control("1", "2"));
/// ```
#[must_use]
pub fn same_control(expected: &str, actual: &str) -> bool {
    let (expected, actual) = (expected.trim(), actual.trim());
    if expected == actual {
        return true;
    }
    match (expected.parse::<u64>(), actual.parse::<u64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn check_trailer(
    segment: &Segment,
    layout: TrailerLayout,
    level: Level,
    counted: usize,
    control: &str,
    problems: &mut Vec<RecoverableError>,
) {
    if let Some(position) = layout.count {
        let declared = simple_field(segment, position, level, problems);
        if declared.trim().parse::<usize>().ok() != Some(counted) {
            problems.push(RecoverableError::new(
                RecoverableKind::CountMismatch,
                level,
                &segment.id,
                counted.to_string(),
                declared,
                segment.span.start,
            ));
        }
    }
    if let Some(position) = layout.control {
        let declared = simple_field(segment, position, level, problems);
        if !same_control(control, &declared) {
            problems.push(RecoverableError::new(
                RecoverableKind::ControlNumberMismatch,
                level,
                &segment.id,
                control,
                declared,
                segment.span.start,
            ));
        }
    }
}

fn out_of_place(segment: &Segment, context: &str) -> Error {
    Error::unexpected_segment(&segment.id, context, segment.span.start)
}

fn emit_party<K: EventSink + ?Sized>(sink: &mut K, name: &str, party: Option<&Party>) {
    let Some(party) = party else {
        return;
    };
    let mut address = Attributes::with_capacity(2);
    address.insert("Id", party.id.as_str());
    address.insert_nonempty("Qual", &party.qualifier);
    sink.start_element(name, &Attributes::new());
    sink.start_element(names::ADDRESS, &address);
    sink.end_element(names::ADDRESS);
    sink.end_element(name);
}

fn emit_text<K: EventSink + ?Sized>(sink: &mut K, name: &str, attributes: &Attributes, text: &str) {
    sink.start_element(name, attributes);
    sink.characters(text);
    sink.end_element(name);
}

/// Emits a data segment with its non-empty elements.
fn emit_segment<K: EventSink + ?Sized>(sink: &mut K, segment: &Segment) {
    let mut attributes = Attributes::with_capacity(1);
    attributes.insert("Id", segment.id.as_str());
    sink.start_element(names::SEGMENT, &attributes);
    for field in segment.fields.iter().filter(|field| !field.value.is_empty()) {
        let mut attributes = Attributes::with_capacity(2);
        attributes.insert("Id", format!("{}{:02}", segment.id, field.position));
        match &field.value {
            FieldValue::Simple(value) => emit_text(sink, names::ELEMENT, &attributes, value),
            FieldValue::Composite(parts) => {
                attributes.insert("Composite", "yes");
                sink.start_element(names::ELEMENT, &attributes);
                for (index, pieces) in parts.iter().enumerate() {
                    if pieces.iter().all(String::is_empty) {
                        continue;
                    }
                    let mut sequence = Attributes::with_capacity(1);
                    sequence.insert("Sequence", (index + 1).to_string());
                    match pieces.as_slice() {
                        [single] => emit_text(sink, names::SUB_ELEMENT, &sequence, single),
                        _ => {
                            sink.start_element(names::SUB_ELEMENT, &sequence);
                            for (inner, piece) in pieces.iter().enumerate() {
                                if piece.is_empty() {
                                    continue;
                                }
                                let mut sequence = Attributes::with_capacity(1);
                                sequence.insert("Sequence", (inner + 1).to_string());
                                emit_text(sink, names::SUB_SUB_ELEMENT, &sequence, piece);
                            }
                            sink.end_element(names::SUB_ELEMENT);
                        }
                    }
                }
                sink.end_element(names::ELEMENT);
            }
        }
    }
    sink.end_element(names::SEGMENT);
}

#[derive(Debug)]
struct OpenGroup {
    envelope: EnvelopeHeader,
    documents: usize,
}

#[derive(Debug)]
struct OpenDocument {
    envelope: EnvelopeHeader,
    segments: usize,
}

/// Reads one interchange, emitting events into a sink.
pub struct Reader<S> {
    tokenizer: Tokenizer<S>,
    dialect: Box<dyn Dialect>,
    plugins: Arc<PluginRegistry>,
    state: State,
    interchange: Option<EnvelopeHeader>,
    group: Option<OpenGroup>,
    document: Option<OpenDocument>,
    groups: usize,
    documents: usize,
    /// `Some(true)` once a document was seen inside a group, `Some(false)`
    /// once one was seen outside.
    grouping: Option<bool>,
    loops: LoopController,
    recovered: Vec<RecoverableError>,
    details: ClosingDetails,
}

impl<S: CharSource> Reader<S> {
    pub(crate) fn new(standard: Standard, tokenizer: Tokenizer<S>, options: &ReaderOptions) -> Self {
        Reader {
            tokenizer,
            dialect: dialect_for(standard, options),
            plugins: Arc::clone(&options.plugins),
            state: State::BeforeInterchange,
            interchange: None,
            group: None,
            document: None,
            groups: 0,
            documents: 0,
            grouping: None,
            loops: LoopController::new(None),
            recovered: Vec::new(),
            details: ClosingDetails::new(standard),
        }
    }

    #[must_use]
    pub fn standard(&self) -> Standard {
        self.dialect.standard()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// The delimiters in effect; placeholders until the header is read.
    #[must_use]
    pub fn delimiters(&self) -> &Delimiters {
        self.tokenizer.delimiters()
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.tokenizer.char_count()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.tokenizer.segment_count()
    }

    #[must_use]
    pub fn last_segment_text(&self) -> &str {
        self.tokenizer.last_segment_text()
    }

    /// See [`Tokenizer::raw_text`].
    #[must_use]
    pub fn raw_text(&self, span: Span) -> Option<String> {
        self.tokenizer.raw_text(span)
    }

    /// Recoverable errors the policy chose to continue past.
    #[must_use]
    pub fn recovered(&self) -> &[RecoverableError] {
        &self.recovered
    }

    /// Path of the loops open in the current document.
    #[must_use]
    pub fn loop_path(&self) -> &str {
        self.loops.path()
    }

    /// Buffered characters not yet consumed.
    #[must_use]
    pub fn get_buffered(&self) -> String {
        self.tokenizer.get_buffered()
    }

    /// Ends this reader; the remainder feeds [`resume`](crate::resume).
    pub fn into_remainder(self) -> Remainder<S> {
        self.tokenizer.into_remainder()
    }

    /// Parses the interchange through its trailer.
    ///
    /// Returns the interchange's [`ClosingDetails`]. A reader parses once;
    /// calling this again is an internal error.
    pub fn parse<K, P>(&mut self, sink: &mut K, policy: &mut P) -> Result<ClosingDetails>
    where
        K: EventSink + ?Sized,
        P: RecoveryPolicy,
    {
        if self.state != State::BeforeInterchange {
            return Err(Error::internal("interchange already parsed"));
        }
        let mut recovered = std::mem::take(&mut self.recovered);
        let result = {
            let mut classifier = ErrorClassifier::new(policy, &mut recovered);
            self.run(sink, &mut classifier)
        };
        self.recovered = recovered;
        if let Err(err) = &result {
            tracing::debug!(%err, offset = self.tokenizer.offset(), state = ?self.state, "interchange failed");
        }
        result
    }

    fn run<K: EventSink + ?Sized>(
        &mut self,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<ClosingDetails> {
        self.read_interchange_header(sink, classifier)?;
        while self.state != State::Done {
            let Some(segment) = self.tokenizer.next_segment()? else {
                return Err(Error::unexpected_eof(
                    self.tokenizer.offset(),
                    self.missing_trailer(),
                ));
            };
            self.dispatch(segment, sink, classifier)?;
        }
        Ok(self.details.clone())
    }

    fn missing_trailer(&self) -> &'static str {
        if self.document.is_some() {
            "document trailer"
        } else if self.group.is_some() {
            "group trailer"
        } else {
            "interchange trailer"
        }
    }

    fn read_interchange_header<K: EventSink + ?Sized>(
        &mut self,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        let start = self.tokenizer.offset();
        let preview = self.tokenizer.preview(self.dialect.preview_length())?;
        let scan = self.dialect.scan_header(&preview)?;
        let mut delimiters = scan.delimiters;
        self.tokenizer.set_delimiters(delimiters.clone());
        let header = match scan.segment {
            Some(segment) => {
                self.tokenizer.consume_segment(scan.consumed)?;
                segment.shifted(start)
            }
            None => {
                if scan.consumed > 0 {
                    self.tokenizer.consume_segment(scan.consumed)?;
                }
                self.tokenizer.next_segment()?.ok_or_else(|| {
                    Error::unexpected_eof(self.tokenizer.offset(), self.dialect.header_tag())
                })?
            }
        };
        if self.dialect.role(&header.id) != Role::InterchangeHeader {
            return Err(Error::missing_header(self.dialect.header_tag(), &header.id));
        }
        self.dialect.refine_delimiters(&header, &mut delimiters);
        tracing::debug!(standard = %self.dialect.standard(), ?delimiters, offset = start, "interchange start");
        self.tokenizer.set_delimiters(delimiters);

        let mut problems = Vec::new();
        let envelope = self.dialect.interchange_header(&header, &mut problems);
        let mut attributes = Attributes::with_capacity(envelope.attributes.len() + 1);
        attributes.insert("Standard", self.dialect.standard().name());
        attributes.extend(envelope.attributes.clone());
        sink.start_element(names::INTERCHANGE, &attributes);
        emit_party(sink, names::SENDER, envelope.sender.as_ref());
        emit_party(sink, names::RECEIVER, envelope.receiver.as_ref());

        let details = &mut self.details;
        if let Some(sender) = &envelope.sender {
            details.sender = sender.id.clone();
            details.sender_qualifier = sender.qualifier.clone();
        }
        if let Some(receiver) = &envelope.receiver {
            details.receiver = receiver.id.clone();
            details.receiver_qualifier = receiver.qualifier.clone();
        }
        details.interchange_control = envelope.control.clone();
        details.version = envelope.version.clone();
        details.timestamp = envelope.timestamp;

        self.interchange = Some(envelope);
        self.state = State::InInterchangeHeader;
        offer_all(problems, classifier)
    }

    fn dispatch<K: EventSink + ?Sized>(
        &mut self,
        segment: Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        match self.dialect.role(&segment.id) {
            Role::InterchangeHeader => Err(out_of_place(&segment, "inside an interchange")),
            Role::InterchangeTrailer => self.close_interchange(&segment, sink, classifier),
            Role::GroupHeader => self.open_group(&segment, sink, classifier),
            Role::GroupTrailer => self.close_group(&segment, sink, classifier),
            Role::DocumentHeader => self.open_document(&segment, sink, classifier),
            Role::DocumentTrailer => self.close_document(&segment, sink, classifier),
            Role::InterchangeData if self.document.is_none() => {
                if self.group.is_some() {
                    return Err(out_of_place(&segment, "inside a group"));
                }
                emit_segment(sink, &segment);
                Ok(())
            }
            Role::InterchangeData | Role::Data => self.data_segment(&segment, sink),
        }
    }

    fn data_segment<K: EventSink + ?Sized>(&mut self, segment: &Segment, sink: &mut K) -> Result<()> {
        let Some(document) = self.document.as_mut() else {
            return Err(out_of_place(segment, "outside a document"));
        };
        document.segments += 1;
        self.loops.transition(&segment.id, sink);
        emit_segment(sink, segment);
        self.state = State::InSegment;
        Ok(())
    }

    fn open_group<K: EventSink + ?Sized>(
        &mut self,
        segment: &Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        if self.document.is_some() {
            return Err(out_of_place(segment, "inside a document"));
        }
        if self.group.is_some() {
            return Err(out_of_place(segment, "inside a group"));
        }
        if self.grouping == Some(false) {
            return Err(out_of_place(segment, "after ungrouped documents"));
        }
        let mut problems = Vec::new();
        let envelope = self.dialect.group_header(segment, &mut problems);
        tracing::debug!(control = %envelope.control, "group start");
        sink.start_element(names::GROUP, &envelope.attributes);
        self.details.group_control = Some(envelope.control.clone());
        self.groups += 1;
        self.group = Some(OpenGroup {
            envelope,
            documents: 0,
        });
        self.state = State::InGroupHeader;
        offer_all(problems, classifier)
    }

    fn close_group<K: EventSink + ?Sized>(
        &mut self,
        segment: &Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        if self.document.is_some() {
            return Err(out_of_place(segment, "inside a document"));
        }
        let Some(group) = self.group.take() else {
            return Err(out_of_place(segment, "outside a group"));
        };
        let mut problems = Vec::new();
        check_trailer(
            segment,
            self.dialect.trailer_layout(Role::GroupTrailer),
            Level::Group,
            group.documents,
            &group.envelope.control,
            &mut problems,
        );
        offer_all(problems, classifier)?;
        sink.end_element(names::GROUP);
        tracing::debug!(control = %group.envelope.control, documents = group.documents, "group end");
        self.details.group_control = None;
        self.state = State::InGroupTrailer;
        Ok(())
    }

    fn open_document<K: EventSink + ?Sized>(
        &mut self,
        segment: &Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        if self.document.is_some() {
            return Err(out_of_place(segment, "inside a document"));
        }
        match (self.group.as_mut(), self.dialect.group_policy()) {
            (Some(group), _) => {
                group.documents += 1;
                self.grouping = Some(true);
            }
            (None, GroupPolicy::Required) => {
                return Err(out_of_place(segment, "outside a group"));
            }
            (None, GroupPolicy::Optional) => {
                if self.grouping == Some(true) {
                    return Err(out_of_place(segment, "outside a group after grouped documents"));
                }
                self.grouping = Some(false);
            }
        }
        let mut problems = Vec::new();
        let envelope = self.dialect.document_header(
            segment,
            self.group.as_ref().map(|group| &group.envelope),
            &mut problems,
        );
        sink.start_element(names::TRANSACTION, &envelope.attributes);
        self.documents += 1;
        let table = envelope
            .document_type
            .as_deref()
            .and_then(|doc_type| self.plugins.table(self.dialect.standard(), doc_type.trim()));
        tracing::trace!(
            control = %envelope.control,
            doc_type = ?envelope.document_type,
            loops = table.is_some(),
            "document start"
        );
        self.loops = LoopController::new(table);
        self.document = Some(OpenDocument {
            envelope,
            segments: 1,
        });
        self.state = State::InDocumentHeader;
        offer_all(problems, classifier)
    }

    fn close_document<K: EventSink + ?Sized>(
        &mut self,
        segment: &Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        let Some(mut document) = self.document.take() else {
            return Err(out_of_place(segment, "outside a document"));
        };
        document.segments += 1;
        let mut problems = Vec::new();
        check_trailer(
            segment,
            self.dialect.trailer_layout(Role::DocumentTrailer),
            Level::Document,
            document.segments,
            &document.envelope.control,
            &mut problems,
        );
        offer_all(problems, classifier)?;
        self.loops.close_all(sink);
        sink.end_element(names::TRANSACTION);
        self.state = State::InDocumentTrailer;

        let mut details = self.details.clone();
        details.document_control = Some(document.envelope.control);
        details.document_type = document.envelope.document_type;
        if document.envelope.version.is_some() {
            details.version = document.envelope.version;
        }
        sink.closed(&details);
        Ok(())
    }

    fn close_interchange<K: EventSink + ?Sized>(
        &mut self,
        segment: &Segment,
        sink: &mut K,
        classifier: &mut ErrorClassifier<'_>,
    ) -> Result<()> {
        if self.document.is_some() {
            return Err(out_of_place(segment, "inside a document"));
        }
        if self.group.is_some() {
            return Err(out_of_place(segment, "inside a group"));
        }
        let Some(interchange) = self.interchange.take() else {
            return Err(Error::internal("interchange trailer before header"));
        };
        self.state = State::InInterchangeTrailer;
        let counted = if self.dialect.interchange_counts_groups(self.groups) {
            self.groups
        } else {
            self.documents
        };
        let mut problems = Vec::new();
        check_trailer(
            segment,
            self.dialect.trailer_layout(Role::InterchangeTrailer),
            Level::Interchange,
            counted,
            &interchange.control,
            &mut problems,
        );
        offer_all(problems, classifier)?;
        sink.end_element(names::INTERCHANGE);
        self.state = State::Done;
        tracing::debug!(
            control = %interchange.control,
            segments = self.tokenizer.segment_count(),
            chars = self.tokenizer.char_count(),
            "interchange end"
        );
        sink.closed(&self.details);
        Ok(())
    }
}

fn offer_all(problems: Vec<RecoverableError>, classifier: &mut ErrorClassifier<'_>) -> Result<()> {
    problems
        .into_iter()
        .try_for_each(|problem| classifier.offer(problem))
}
