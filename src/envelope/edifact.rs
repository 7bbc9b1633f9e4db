//! UN/EDIFACT: an optional `UNA` service string advice, `UNB`/`UNZ`
//! interchanges, optional `UNG`/`UNE` groups and `UNH`/`UNT` messages.

use super::{
    component, simple_field, Dialect, EnvelopeHeader, GroupPolicy, HeaderScan, Party, Role,
    TrailerLayout,
};
use crate::attributes::Attributes;
use crate::delimiters::Delimiters;
use crate::detect::Standard;
use crate::details::parse_timestamp;
use crate::error::{Error, Level, RecoverableError, RecoverableKind, Result};
use crate::tokenizer::Segment;

/// `UNA` plus six service characters.
const UNA_LENGTH: usize = 9;
const MAX_CONTROL_LENGTH: usize = 14;
/// Repetition separator of syntax version 4 when no `UNA` declares one.
const V4_REPETITION: char = '*';

#[derive(Debug, Default)]
pub(crate) struct Edifact {
    una: bool,
}

impl Edifact {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

fn nonempty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

impl Dialect for Edifact {
    fn standard(&self) -> Standard {
        Standard::Edifact
    }

    fn header_tag(&self) -> &'static str {
        "UNB"
    }

    fn preview_length(&self) -> usize {
        UNA_LENGTH
    }

    fn scan_header(&mut self, preview: &str) -> Result<HeaderScan> {
        if preview.starts_with("UNB") {
            return Ok(HeaderScan {
                delimiters: Delimiters::edifact(),
                consumed: 0,
                segment: None,
            });
        }
        if !preview.starts_with("UNA") {
            return Err(Error::missing_header(
                "UNB",
                &preview.chars().take(3).collect::<String>(),
            ));
        }
        let chars: Vec<char> = preview.chars().collect();
        let [sub, field, decimal, release, repetition, terminator] = match chars.get(3..UNA_LENGTH) {
            Some(&[a, b, c, d, e, f]) => [a, b, c, d, e, f],
            _ => return Err(Error::unexpected_eof(chars.len(), "UNA service characters")),
        };
        let mut delimiters = Delimiters::new(field, terminator)
            .with_sub_element(sub)
            .with_decimal_mark(decimal);
        if release != ' ' {
            delimiters = delimiters.with_release(release);
        }
        if repetition != ' ' {
            delimiters = delimiters.with_repetition(repetition);
        }
        self.una = true;
        Ok(HeaderScan {
            delimiters,
            consumed: UNA_LENGTH,
            segment: None,
        })
    }

    fn refine_delimiters(&self, header: &Segment, delimiters: &mut Delimiters) {
        if !self.una && component(header, 1, 2) == "4" {
            delimiters.repetition = Some(V4_REPETITION);
        }
    }

    fn role(&self, tag: &str) -> Role {
        match tag {
            "UNA" | "UNB" => Role::InterchangeHeader,
            "UNZ" => Role::InterchangeTrailer,
            "UNG" => Role::GroupHeader,
            "UNE" => Role::GroupTrailer,
            "UNH" => Role::DocumentHeader,
            "UNT" => Role::DocumentTrailer,
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
        if control.chars().count() > MAX_CONTROL_LENGTH {
            problems.push(RecoverableError::new(
                RecoverableKind::FieldLength,
                Level::Interchange,
                "UNB",
                format!("at most {MAX_CONTROL_LENGTH} characters in UNB05"),
                control.clone(),
                header.span.start,
            ));
        }
        let syntax_version = component(header, 1, 2);
        let (date, time) = (component(header, 4, 1), component(header, 4, 2));
        let mut attributes = Attributes::with_capacity(11);
        attributes.insert_nonempty("SyntaxId", &component(header, 1, 1));
        attributes.insert_nonempty("SyntaxVersion", &syntax_version);
        attributes.insert_nonempty("Date", &date);
        attributes.insert_nonempty("Time", &time);
        attributes.insert("Control", control.as_str());
        for (name, position) in [
            ("RecipientRef", 6),
            ("ApplRef", 7),
            ("Priority", 8),
            ("AckRequest", 9),
            ("Agreement", 10),
            ("TestIndicator", 11),
        ] {
            attributes.insert_nonempty(name, &component(header, position, 1));
        }

        EnvelopeHeader {
            control,
            attributes,
            sender: Some(Party {
                id: component(header, 2, 1),
                qualifier: component(header, 2, 2),
            }),
            receiver: Some(Party {
                id: component(header, 3, 1),
                qualifier: component(header, 3, 2),
            }),
            document_type: None,
            version: nonempty(syntax_version),
            timestamp: parse_timestamp(&date, &time),
        }
    }

    fn group_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 5, Level::Group, problems);
        let (date, time) = (component(header, 4, 1), component(header, 4, 2));
        let (version, release) = (component(header, 7, 1), component(header, 7, 2));
        let mut attributes = Attributes::with_capacity(11);
        attributes.insert_nonempty("GroupType", &component(header, 1, 1));
        attributes.insert_nonempty("ApplSender", &component(header, 2, 1));
        attributes.insert_nonempty("ApplSenderQual", &component(header, 2, 2));
        attributes.insert_nonempty("ApplReceiver", &component(header, 3, 1));
        attributes.insert_nonempty("ApplReceiverQual", &component(header, 3, 2));
        attributes.insert_nonempty("Date", &date);
        attributes.insert_nonempty("Time", &time);
        attributes.insert("Control", control.as_str());
        attributes.insert_nonempty("Agency", &component(header, 6, 1));
        attributes.insert_nonempty("StandardVersion", &version);
        attributes.insert_nonempty("StandardRelease", &release);

        EnvelopeHeader {
            control,
            attributes,
            version: nonempty(format!("{version}{release}")),
            timestamp: parse_timestamp(&date, &time),
            ..EnvelopeHeader::default()
        }
    }

    fn document_header(
        &self,
        header: &Segment,
        group: Option<&EnvelopeHeader>,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 1, Level::Document, problems);
        let doc_type = component(header, 2, 1);
        let (version, release) = (component(header, 2, 2), component(header, 2, 3));
        let mut attributes = Attributes::with_capacity(6);
        attributes.insert("Control", control.as_str());
        attributes.insert("DocType", doc_type.as_str());
        attributes.insert_nonempty("Version", &version);
        attributes.insert_nonempty("Release", &release);
        attributes.insert_nonempty("Agency", &component(header, 2, 4));
        attributes.insert_nonempty("Association", &component(header, 2, 5));

        EnvelopeHeader {
            control,
            attributes,
            document_type: Some(doc_type),
            version: nonempty(format!("{version}{release}"))
                .or_else(|| group.and_then(|group| group.version.clone())),
            ..EnvelopeHeader::default()
        }
    }

    fn trailer_layout(&self, _role: Role) -> TrailerLayout {
        TrailerLayout::new(Some(1), Some(2))
    }
}
