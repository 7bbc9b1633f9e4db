//! TRADACOMS: `STX`/`END` transmissions, optional `BAT`/`EOB` batches and
//! `MHD`/`MTR` messages. Delimiters are fixed and the tag is separated
//! from the first element by `=`.

use super::{
    component, simple_field, Dialect, EnvelopeHeader, GroupPolicy, HeaderScan, Party, Role,
    TrailerLayout,
};
use crate::attributes::Attributes;
use crate::delimiters::Delimiters;
use crate::detect::Standard;
use crate::details::parse_timestamp;
use crate::error::{Error, Level, RecoverableError, Result};
use crate::tokenizer::Segment;

#[derive(Debug, Default)]
pub(crate) struct Tradacoms;

impl Dialect for Tradacoms {
    fn standard(&self) -> Standard {
        Standard::Tradacoms
    }

    fn header_tag(&self) -> &'static str {
        "STX"
    }

    fn preview_length(&self) -> usize {
        3
    }

    fn scan_header(&mut self, preview: &str) -> Result<HeaderScan> {
        if !preview.starts_with("STX") {
            return Err(Error::missing_header("STX", preview));
        }
        Ok(HeaderScan {
            delimiters: Delimiters::tradacoms(),
            consumed: 0,
            segment: None,
        })
    }

    fn role(&self, tag: &str) -> Role {
        match tag {
            "STX" => Role::InterchangeHeader,
            "END" => Role::InterchangeTrailer,
            "BAT" => Role::GroupHeader,
            "EOB" => Role::GroupTrailer,
            "MHD" => Role::DocumentHeader,
            "MTR" => Role::DocumentTrailer,
            _ => Role::Data,
        }
    }

    fn group_policy(&self) -> GroupPolicy {
        GroupPolicy::Optional
    }

    fn interchange_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 5, Level::Interchange, problems);
        let syntax_version = component(header, 1, 2);
        let (date, time) = (component(header, 4, 1), component(header, 4, 2));
        let mut attributes = Attributes::with_capacity(11);
        attributes.insert_nonempty("SyntaxId", &component(header, 1, 1));
        attributes.insert_nonempty("SyntaxVersion", &syntax_version);
        attributes.insert_nonempty("SenderName", &component(header, 2, 2));
        attributes.insert_nonempty("ReceiverName", &component(header, 3, 2));
        attributes.insert_nonempty("Date", &date);
        attributes.insert_nonempty("Time", &time);
        attributes.insert("Control", control.as_str());
        attributes.insert_nonempty("RecipientRef", &component(header, 6, 1));
        attributes.insert_nonempty("ApplRef", &component(header, 7, 1));
        attributes.insert_nonempty("Priority", &component(header, 8, 1));

        EnvelopeHeader {
            control,
            attributes,
            sender: Some(Party {
                id: component(header, 2, 1),
                qualifier: String::new(),
            }),
            receiver: Some(Party {
                id: component(header, 3, 1),
                qualifier: String::new(),
            }),
            document_type: None,
            version: Some(syntax_version).filter(|v| !v.is_empty()),
            timestamp: parse_timestamp(&date, &time),
        }
    }

    fn group_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 1, Level::Group, problems);
        let mut attributes = Attributes::with_capacity(1);
        attributes.insert("Control", control.as_str());
        EnvelopeHeader {
            control,
            attributes,
            ..EnvelopeHeader::default()
        }
    }

    fn document_header(
        &self,
        header: &Segment,
        _group: Option<&EnvelopeHeader>,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 1, Level::Document, problems);
        let doc_type = component(header, 2, 1);
        let version = component(header, 2, 2);
        let mut attributes = Attributes::with_capacity(3);
        attributes.insert("Control", control.as_str());
        attributes.insert("DocType", doc_type.as_str());
        attributes.insert_nonempty("Version", &version);
        EnvelopeHeader {
            control,
            attributes,
            document_type: Some(doc_type),
            version: Some(version).filter(|v| !v.is_empty()),
            ..EnvelopeHeader::default()
        }
    }

    /// Trailers carry counts only.
    fn trailer_layout(&self, _role: Role) -> TrailerLayout {
        TrailerLayout::new(Some(1), None)
    }

    fn interchange_counts_groups(&self, _groups: usize) -> bool {
        false
    }
}
