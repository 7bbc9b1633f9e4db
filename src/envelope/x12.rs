//! ANSI X12: `ISA`/`IEA` interchanges, `GS`/`GE` functional groups and
//! `ST`/`SE` transaction sets.
//!
//! The `ISA` segment is fixed-format and declares the delimiters by using
//! them: the character after `ISA` is the field delimiter, `ISA16` is the
//! sub-element delimiter and the character after it terminates the segment.
//! From version `00402` on, `ISA11` holds the repetition separator.

use super::{
    component, simple_field, Dialect, EnvelopeHeader, GroupPolicy, HeaderScan, Party, Role,
    TrailerLayout,
};
use crate::attributes::Attributes;
use crate::delimiters::Delimiters;
use crate::detect::Standard;
use crate::details::parse_timestamp;
use crate::error::{Error, Level, RecoverableError, RecoverableKind, Result};
use crate::tokenizer::{Field, FieldValue, Segment, Span};

const ISA_FIELDS: usize = 16;
const ISA_PREVIEW: usize = 256;
const CONTROL_LENGTH: usize = 9;
const REPETITION_VERSION: &str = "00402";

/// `trim` mirrors the tokenizer's value trimming for the fixed-width `ISA`.
#[derive(Debug)]
pub(crate) struct X12 {
    trim: bool,
}

impl X12 {
    pub(crate) fn new(trim: bool) -> Self {
        X12 { trim }
    }
}

fn missing_isa(preview: &str) -> Error {
    Error::missing_header("ISA", &preview.chars().take(3).collect::<String>())
}

impl Dialect for X12 {
    fn standard(&self) -> Standard {
        Standard::X12
    }

    fn header_tag(&self) -> &'static str {
        "ISA"
    }

    fn preview_length(&self) -> usize {
        ISA_PREVIEW
    }

    fn scan_header(&mut self, preview: &str) -> Result<HeaderScan> {
        if !preview.starts_with("ISA") {
            return Err(missing_isa(preview));
        }
        let chars: Vec<char> = preview.chars().collect();
        let Some(&field) = chars.get(3) else {
            return Err(Error::unexpected_eof(chars.len(), "ISA field delimiter"));
        };
        if field.is_alphanumeric() || field.is_whitespace() {
            return Err(Error::malformed(3, "ISA field delimiter is a letter, digit or blank"));
        }

        let mut starts = Vec::with_capacity(ISA_FIELDS);
        for (index, &c) in chars.iter().enumerate().skip(3) {
            if c == field {
                starts.push(index + 1);
                if starts.len() == ISA_FIELDS {
                    break;
                }
            }
        }
        if starts.len() < ISA_FIELDS {
            return Err(if chars.len() < ISA_PREVIEW {
                Error::unexpected_eof(chars.len(), "end of ISA segment")
            } else {
                Error::malformed(0, "ISA segment has fewer than 16 elements")
            });
        }

        let sub_at = starts[ISA_FIELDS - 1];
        let term_at = sub_at + 1;
        let (Some(&sub), Some(&terminator)) = (chars.get(sub_at), chars.get(term_at)) else {
            return Err(Error::unexpected_eof(chars.len(), "ISA segment terminator"));
        };
        if terminator == field || terminator == sub || sub == field {
            return Err(Error::malformed(term_at, "ISA delimiters are not distinct"));
        }
        let suffix: String = chars[term_at + 1..]
            .iter()
            .take_while(|c| **c == '\r' || **c == '\n')
            .collect();

        let fields: Vec<Field> = (0..ISA_FIELDS)
            .map(|k| {
                let begin = starts[k];
                let end = starts.get(k + 1).map_or(term_at, |next| next - 1);
                let text: String = chars[begin..end].iter().collect();
                let text = if self.trim {
                    text.trim_matches(|c: char| c == ' ' || c == '\t').to_string()
                } else {
                    text
                };
                Field {
                    position: k + 1,
                    repeat: false,
                    value: FieldValue::Simple(text),
                    span: Span::new(begin, end),
                }
            })
            .collect();

        let mut delimiters = Delimiters::new(field, terminator)
            .with_sub_element(sub)
            .with_terminator_suffix(&suffix);
        let isa11 = &chars[starts[10]..starts[11] - 1];
        let version = fields[11].value.first();
        if let [repetition] = isa11 {
            if version >= REPETITION_VERSION
                && !repetition.is_alphanumeric()
                && !delimiters.is_delimiter(*repetition)
            {
                delimiters = delimiters.with_repetition(*repetition);
            }
        }

        Ok(HeaderScan {
            delimiters,
            consumed: term_at + 1,
            segment: Some(Segment {
                id: "ISA".to_string(),
                fields,
                span: Span::new(0, term_at + 1),
            }),
        })
    }

    fn role(&self, tag: &str) -> Role {
        match tag {
            "ISA" => Role::InterchangeHeader,
            "IEA" => Role::InterchangeTrailer,
            "GS" => Role::GroupHeader,
            "GE" => Role::GroupTrailer,
            "ST" => Role::DocumentHeader,
            "SE" => Role::DocumentTrailer,
            "TA1" => Role::InterchangeData,
            _ => Role::Data,
        }
    }

    fn group_policy(&self) -> GroupPolicy {
        GroupPolicy::Required
    }

    fn interchange_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 13, Level::Interchange, problems);
        if control.chars().count() != CONTROL_LENGTH {
            problems.push(RecoverableError::new(
                RecoverableKind::FieldLength,
                Level::Interchange,
                "ISA",
                format!("{CONTROL_LENGTH} characters in ISA13"),
                control.clone(),
                header.span.start,
            ));
        }
        let mut attributes = Attributes::with_capacity(11);
        for (name, position) in [
            ("AuthorizationQual", 1),
            ("Authorization", 2),
            ("SecurityQual", 3),
            ("Security", 4),
            ("Date", 9),
            ("Time", 10),
            ("StandardsId", 11),
            ("Version", 12),
        ] {
            attributes.insert_nonempty(name, header.text(position));
        }
        attributes.insert("Control", control.as_str());
        attributes.insert_nonempty("AckRequest", header.text(14));
        attributes.insert_nonempty("TestIndicator", header.text(15));

        EnvelopeHeader {
            control,
            attributes,
            sender: Some(Party {
                id: component(header, 6, 1),
                qualifier: component(header, 5, 1),
            }),
            receiver: Some(Party {
                id: component(header, 8, 1),
                qualifier: component(header, 7, 1),
            }),
            document_type: None,
            version: Some(header.text(12).to_string()).filter(|v| !v.is_empty()),
            timestamp: parse_timestamp(header.text(9), header.text(10)),
        }
    }

    fn group_header(
        &self,
        header: &Segment,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let control = simple_field(header, 6, Level::Group, problems);
        let mut attributes = Attributes::with_capacity(8);
        for (name, position) in [
            ("GroupType", 1),
            ("ApplSender", 2),
            ("ApplReceiver", 3),
            ("Date", 4),
            ("Time", 5),
        ] {
            attributes.insert_nonempty(name, &component(header, position, 1));
        }
        attributes.insert("Control", control.as_str());
        attributes.insert_nonempty("StandardCode", &component(header, 7, 1));
        let version = component(header, 8, 1);
        attributes.insert_nonempty("StandardVersion", &version);

        EnvelopeHeader {
            control,
            attributes,
            version: Some(version).filter(|v| !v.is_empty()),
            timestamp: parse_timestamp(&component(header, 4, 1), &component(header, 5, 1)),
            ..EnvelopeHeader::default()
        }
    }

    fn document_header(
        &self,
        header: &Segment,
        group: Option<&EnvelopeHeader>,
        problems: &mut Vec<RecoverableError>,
    ) -> EnvelopeHeader {
        let doc_type = simple_field(header, 1, Level::Document, problems);
        let control = simple_field(header, 2, Level::Document, problems);
        let convention = component(header, 3, 1);
        let mut attributes = Attributes::with_capacity(3);
        attributes.insert("DocType", doc_type.as_str());
        attributes.insert("Control", control.as_str());
        attributes.insert_nonempty("Version", &convention);

        let version = if convention.is_empty() {
            group.and_then(|group| group.version.clone())
        } else {
            Some(convention)
        };
        EnvelopeHeader {
            control,
            attributes,
            document_type: Some(doc_type),
            version,
            ..EnvelopeHeader::default()
        }
    }

    fn trailer_layout(&self, _role: Role) -> TrailerLayout {
        TrailerLayout::new(Some(1), Some(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *991231*2359*^*00501*000000001*0*P*:~\r\nGS*PO";

    #[test]
    fn test_scan_isa() {
        let scan = X12::new(true).scan_header(ISA).unwrap();
        let delimiters = scan.delimiters;
        assert_eq!(delimiters.field, '*');
        assert_eq!(delimiters.terminator, '~');
        assert_eq!(delimiters.sub_element, Some(':'));
        assert_eq!(delimiters.repetition, Some('^'));
        assert_eq!(delimiters.terminator_suffix.as_deref(), Some("\r\n"));
        assert_eq!(scan.consumed, 106);

        let segment = scan.segment.unwrap();
        assert_eq!(segment.text(6), "SENDER");
        assert_eq!(segment.text(13), "000000001");
        assert_eq!(segment.text(16), ":");
    }

    #[test]
    fn test_no_repetition_before_00402() {
        let old = ISA.replace("*^*00501*", "*U*00401*");
        let scan = X12::new(true).scan_header(&old).unwrap();
        assert_eq!(scan.delimiters.repetition, None);
    }

    #[test]
    fn test_truncated_isa() {
        let err = X12::new(true).scan_header(&ISA[..60]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_short_control_number() {
        let short = ISA.replace("000000001", "1");
        let segment = X12::new(true).scan_header(&short).unwrap().segment.unwrap();
        let mut problems = Vec::new();
        let envelope = X12::new(true).interchange_header(&segment, &mut problems);
        assert_eq!(envelope.control, "1");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, RecoverableKind::FieldLength);
    }

    #[test]
    fn test_interchange_attributes() {
        let segment = X12::new(true).scan_header(ISA).unwrap().segment.unwrap();
        let mut problems = Vec::new();
        let envelope = X12::new(true).interchange_header(&segment, &mut problems);
        assert!(problems.is_empty());
        let keys: Vec<_> = envelope.attributes.keys().collect();
        assert_eq!(
            keys,
            vec![
                "AuthorizationQual",
                "SecurityQual",
                "Date",
                "Time",
                "StandardsId",
                "Version",
                "Control",
                "AckRequest",
                "TestIndicator"
            ]
        );
        assert_eq!(envelope.sender.unwrap().qualifier, "ZZ");
        assert_eq!(
            envelope.timestamp.map(|ts| ts.to_string()).as_deref(),
            Some("1999-12-31 23:59:00")
        );
    }
}
