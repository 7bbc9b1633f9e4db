//! Envelope snapshots taken when documents and interchanges close.
//!
//! A [`ClosingDetails`] value is handed to [`EventSink::closed`](crate::EventSink::closed)
//! after every document end and interchange end. Splitters use it to name
//! and route the pieces they cut out of an interchange without re-reading
//! the envelope events.

use crate::detect::Standard;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Sender, receiver and control numbers in effect at a close.
///
/// The group and document fields are `None` at interchange close and when
/// the dialect or interchange has no such level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingDetails {
    pub standard: Standard,
    pub sender: String,
    pub sender_qualifier: String,
    pub receiver: String,
    pub receiver_qualifier: String,
    pub interchange_control: String,
    pub group_control: Option<String>,
    pub document_control: Option<String>,
    pub document_type: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl ClosingDetails {
    pub(crate) fn new(standard: Standard) -> Self {
        ClosingDetails {
            standard,
            sender: String::new(),
            sender_qualifier: String::new(),
            receiver: String::new(),
            receiver_qualifier: String::new(),
            interchange_control: String::new(),
            group_control: None,
            document_control: None,
            document_type: None,
            version: None,
            timestamp: None,
        }
    }

    /// Returns `true` for a snapshot taken at document close.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.document_control.is_some()
    }
}

/// Interprets envelope date and time fields.
///
/// Dates are `YYMMDD` or `CCYYMMDD`; times are `HHMM` optionally followed by
/// seconds and fractions, which are ignored past the seconds.
///
/// # Examples
///
/// ```rust
/// use edi_stream::parse_timestamp;
///
/// let ts = parse_timestamp("991231", "2359").unwrap();
/// assert_eq!(ts.to_string(), "1999-12-31 23:59:00");
/// assert!(parse_timestamp("20240230", "1200").is_none());
/// ```
#[must_use]
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = match date.len() {
        6 => NaiveDate::parse_from_str(date, "%y%m%d").ok()?,
        8 => NaiveDate::parse_from_str(date, "%Y%m%d").ok()?,
        _ => return None,
    };
    let digits = time.get(..time.len().min(6))?;
    let time = match digits.len() {
        4 => NaiveTime::parse_from_str(digits, "%H%M").ok()?,
        6 => NaiveTime::parse_from_str(digits, "%H%M%S").ok()?,
        0 => NaiveTime::from_hms_opt(0, 0, 0)?,
        _ => return None,
    };
    Some(date.and_time(time))
}
