use edi_stream::{
    names, open, parse_str, parse_str_with, Attributes, Error, ErrorCategory, Event,
    EventCollector, Lenient, Level, ReaderOptions, RecoverableError, RecoverableKind, Standard,
    StrSource, Strict,
};

/// Builds a fixed-width ISA segment with the given delimiters.
fn isa(field: char, repetition: char, version: &str, control: &str, sub: char, term: char) -> String {
    let repetition = repetition.to_string();
    let parts = [
        "ISA",
        "00",
        "          ",
        "00",
        "          ",
        "ZZ",
        "SENDER         ",
        "ZZ",
        "RECEIVER       ",
        "991231",
        "2359",
        repetition.as_str(),
        version,
        control,
        "0",
        "P",
    ];
    format!("{}{}{}{}", parts.join(&field.to_string()), field, sub, term)
}

fn purchase_order(field: char, term: char, trailer_control: &str) -> String {
    let f = field;
    let t = term;
    format!(
        "{isa}GS{f}PO{f}SENDER{f}RECEIVER{f}19991231{f}2359{f}1{f}X{f}004010{t}\
         ST{f}850{f}0001{t}\
         BEG{f}00{f}SA{f}PO1{f}{f}19991231{t}\
         N1{f}ST{f}ACME{t}\
         SE{f}4{f}0001{t}\
         GE{f}1{f}1{t}\
         IEA{f}1{f}{trailer_control}{t}",
        isa = isa(f, 'U', "00401", "000038449", ':', t),
    )
}

/// Runs `text` strictly, then with a policy that always continues.
///
/// Returns the problem the strict run refused and how many times the
/// continuing policy was consulted.
fn refused_then_continued(text: &str) -> (RecoverableError, usize) {
    let problem = parse_str(text).unwrap_err().recoverable().cloned().unwrap();
    let mut calls = 0;
    let mut policy = |_: &RecoverableError| {
        calls += 1;
        true
    };
    let events = parse_str_with(text, &ReaderOptions::default(), &mut policy).unwrap();
    assert_eq!(events.events.last(), Some(&Event::EndDocument));
    (problem, calls)
}

fn field<'a>(attributes: &'a Attributes, name: &str) -> &'a str {
    attributes.get(name).unwrap_or("")
}

#[test]
fn test_tilde_field_delimiter_and_dollar_terminator() {
    let text = purchase_order('~', '$', "000038449");
    let mut reader = open(StrSource::new(text), &ReaderOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(reader.standard(), Standard::X12);
    let mut sink = EventCollector::new();
    let details = reader.parse(&mut sink, &mut Strict).unwrap();

    assert_eq!(reader.delimiters().field, '~');
    assert_eq!(reader.delimiters().terminator, '$');
    assert_eq!(details.interchange_control, "000038449");
    let segments: Vec<_> = sink
        .starts(names::SEGMENT)
        .filter_map(|a| a.get("Id"))
        .collect();
    assert_eq!(segments, vec!["BEG", "N1"]);
    assert_eq!(reader.segment_count(), 8);
}

#[test]
fn test_control_mismatch_stops_with_strict_policy() {
    let text = purchase_order('*', '~', "000038448");
    let err = parse_str(&text).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    let problem = err.recoverable().unwrap();
    assert_eq!(problem.kind, RecoverableKind::ControlNumberMismatch);
    assert_eq!(problem.segment, "IEA");
    assert_eq!(problem.expected, "000038449");
    assert_eq!(problem.actual, "000038448");
}

#[test]
fn test_control_mismatch_continues_when_policy_allows() {
    let text = purchase_order('*', '~', "000038448");
    let mut seen: Vec<RecoverableError> = Vec::new();
    let mut policy = |err: &RecoverableError| {
        seen.push(err.clone());
        true
    };
    let events = parse_str_with(&text, &ReaderOptions::default(), &mut policy).unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, RecoverableKind::ControlNumberMismatch);
    assert_eq!(events.events.last(), Some(&Event::EndDocument));
    assert_eq!(events.count(names::INTERCHANGE), 1);
}

#[test]
fn test_numeric_control_numbers_compare_by_value() {
    let text = purchase_order('*', '~', "38449");
    assert!(parse_str(&text).is_ok());
}

#[test]
fn test_interchange_attributes_reflect_header() {
    let text = purchase_order('*', '~', "000038449");
    let events = parse_str(&text).unwrap();
    let interchange = events.starts(names::INTERCHANGE).next().unwrap();
    let pairs: Vec<_> = interchange.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("Standard", "ANSI X.12"),
            ("AuthorizationQual", "00"),
            ("SecurityQual", "00"),
            ("Date", "991231"),
            ("Time", "2359"),
            ("StandardsId", "U"),
            ("Version", "00401"),
            ("Control", "000038449"),
            ("AckRequest", "0"),
            ("TestIndicator", "P"),
        ]
    );
    let addresses: Vec<_> = events
        .starts(names::ADDRESS)
        .map(|a| (a.get("Id"), a.get("Qual")))
        .collect();
    assert_eq!(
        addresses,
        vec![(Some("SENDER"), Some("ZZ")), (Some("RECEIVER"), Some("ZZ"))]
    );
    let group = events.starts(names::GROUP).next().unwrap();
    assert_eq!(group.get("GroupType"), Some("PO"));
    assert_eq!(group.get("StandardVersion"), Some("004010"));
    let transaction = events.starts(names::TRANSACTION).next().unwrap();
    assert_eq!(transaction.get("DocType"), Some("850"));
    assert_eq!(transaction.get("Control"), Some("0001"));
}

#[test]
fn test_envelope_fields_round_trip_without_trimming() {
    let text = purchase_order('*', '~', "000038449");
    let options = ReaderOptions::new().with_trim_values(false);
    let events = parse_str_with(&text, &options, &mut Strict).unwrap();

    let interchange = events.starts(names::INTERCHANGE).next().unwrap();
    let addresses: Vec<_> = events.starts(names::ADDRESS).collect();
    let (sender, receiver) = (addresses[0], addresses[1]);
    assert_eq!(sender.get("Id"), Some("SENDER         "));
    let isa = [
        "ISA",
        field(interchange, "AuthorizationQual"),
        field(interchange, "Authorization"),
        field(interchange, "SecurityQual"),
        field(interchange, "Security"),
        field(sender, "Qual"),
        field(sender, "Id"),
        field(receiver, "Qual"),
        field(receiver, "Id"),
        field(interchange, "Date"),
        field(interchange, "Time"),
        field(interchange, "StandardsId"),
        field(interchange, "Version"),
        field(interchange, "Control"),
        field(interchange, "AckRequest"),
        field(interchange, "TestIndicator"),
    ]
    .join("*");
    assert!(text.starts_with(&format!("{isa}*:~")));

    let group = events.starts(names::GROUP).next().unwrap();
    let gs = [
        "GS",
        field(group, "GroupType"),
        field(group, "ApplSender"),
        field(group, "ApplReceiver"),
        field(group, "Date"),
        field(group, "Time"),
        field(group, "Control"),
        field(group, "StandardCode"),
        field(group, "StandardVersion"),
    ]
    .join("*");
    assert!(text.contains(&format!("~{gs}~")));

    let transaction = events.starts(names::TRANSACTION).next().unwrap();
    let st = format!(
        "ST*{}*{}~",
        field(transaction, "DocType"),
        field(transaction, "Control")
    );
    assert!(text.contains(&st));
}

#[test]
fn test_group_control_mismatch() {
    let text = purchase_order('*', '~', "000038449").replace("GE*1*1~", "GE*1*2~");
    let (problem, calls) = refused_then_continued(&text);
    assert_eq!(problem.kind, RecoverableKind::ControlNumberMismatch);
    assert_eq!(problem.level, Level::Group);
    assert_eq!(problem.segment, "GE");
    assert_eq!((problem.expected.as_str(), problem.actual.as_str()), ("1", "2"));
    assert_eq!(calls, 1);
}

#[test]
fn test_group_count_mismatch() {
    let text = purchase_order('*', '~', "000038449").replace("GE*1*1~", "GE*3*1~");
    let (problem, calls) = refused_then_continued(&text);
    assert_eq!(problem.kind, RecoverableKind::CountMismatch);
    assert_eq!(problem.level, Level::Group);
    assert_eq!((problem.expected.as_str(), problem.actual.as_str()), ("1", "3"));
    assert_eq!(calls, 1);
}

#[test]
fn test_transaction_control_mismatch() {
    let text = purchase_order('*', '~', "000038449").replace("SE*4*0001~", "SE*4*0002~");
    let (problem, calls) = refused_then_continued(&text);
    assert_eq!(problem.kind, RecoverableKind::ControlNumberMismatch);
    assert_eq!(problem.level, Level::Document);
    assert_eq!(problem.segment, "SE");
    assert_eq!(
        (problem.expected.as_str(), problem.actual.as_str()),
        ("0001", "0002")
    );
    assert_eq!(calls, 1);
}

#[test]
fn test_closing_details() {
    let text = purchase_order('*', '~', "000038449");
    let events = parse_str(&text).unwrap();
    assert_eq!(events.closings.len(), 2);
    let document = &events.closings[0];
    assert!(document.is_document());
    assert_eq!(document.sender, "SENDER");
    assert_eq!(document.receiver_qualifier, "ZZ");
    assert_eq!(document.group_control.as_deref(), Some("1"));
    assert_eq!(document.document_control.as_deref(), Some("0001"));
    assert_eq!(document.document_type.as_deref(), Some("850"));
    assert_eq!(document.version.as_deref(), Some("004010"));
    let interchange = &events.closings[1];
    assert!(!interchange.is_document());
    assert_eq!(interchange.group_control, None);
    assert_eq!(interchange.version.as_deref(), Some("00401"));
}

#[test]
fn test_segment_count_mismatch() {
    let text = purchase_order('*', '~', "000038449").replace("SE*4*0001", "SE*5*0001");
    let err = parse_str(&text).unwrap_err();
    let problem = err.recoverable().unwrap();
    assert_eq!(problem.kind, RecoverableKind::CountMismatch);
    assert_eq!((problem.expected.as_str(), problem.actual.as_str()), ("4", "5"));
}

#[test]
fn test_line_breaks_after_terminators() {
    let text = purchase_order('*', '~', "000038449").replace('~', "~\r\n");
    let mut reader = open(StrSource::new(text), &ReaderOptions::default())
        .unwrap()
        .unwrap();
    reader.parse(&mut EventCollector::new(), &mut Strict).unwrap();
    assert_eq!(reader.delimiters().terminator_suffix.as_deref(), Some("\r\n"));
}

#[test]
fn test_repetition_separator_from_00501() {
    let text = format!(
        "{}GS*HC*S*R*20240101*1200*7*X*005010~ST*837*0001~REF*EA*A1^A2~SE*3*0001~GE*1*7~IEA*1*000000007~",
        isa('*', '^', "00501", "000000007", ':', '~')
    );
    let events = parse_str(&text).unwrap();
    let ids: Vec<_> = events
        .starts(names::ELEMENT)
        .filter_map(|a| a.get("Id"))
        .collect();
    assert_eq!(ids, vec!["REF01", "REF02", "REF02"]);
    let texts: Vec<_> = events
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["EA", "A1", "A2"]);
}

#[test]
fn test_composite_element_events() {
    let text = format!(
        "{}GS*HC*S*R*20240101*1200*7*X*005010~ST*837*0001~SV1*HC:99213*40~SE*3*0001~GE*1*7~IEA*1*000000007~",
        isa('*', '^', "00501", "000000007", ':', '~')
    );
    let events = parse_str(&text).unwrap();
    let composite = events
        .starts(names::ELEMENT)
        .find(|a| a.get("Id") == Some("SV101"))
        .unwrap();
    assert_eq!(composite.get("Composite"), Some("yes"));
    let sequences: Vec<_> = events
        .starts(names::SUB_ELEMENT)
        .filter_map(|a| a.get("Sequence"))
        .collect();
    assert_eq!(sequences, vec!["1", "2"]);
}

#[test]
fn test_ta1_directly_inside_interchange() {
    let text = format!(
        "{}TA1*000000009*240101*1200*A*000~IEA*0*000000009~",
        isa('*', 'U', "00401", "000000009", ':', '~')
    );
    let events = parse_str(&text).unwrap();
    assert_eq!(events.outline(), "ediroot\n  interchange\n    segment:TA1\n");
}

#[test]
fn test_transaction_outside_group_is_fatal() {
    let text = format!(
        "{}ST*850*0001~SE*2*0001~IEA*0*000000009~",
        isa('*', 'U', "00401", "000000009", ':', '~')
    );
    let err = parse_str(&text).unwrap_err();
    assert!(matches!(err, Error::UnexpectedSegment { ref segment, .. } if segment == "ST"));
}

#[test]
fn test_missing_interchange_trailer() {
    let text = purchase_order('*', '~', "000038449");
    let truncated = &text[..text.find("IEA").unwrap()];
    let err = parse_str(truncated).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }));
    assert_eq!(err.category(), ErrorCategory::Lexical);
}

#[test]
fn test_short_isa13_is_recoverable() {
    let text = format!(
        "{}GS*PO*S*R*19991231*2359*1*X*004010~ST*850*0001~SE*2*0001~GE*1*1~IEA*1*12345~",
        isa('*', 'U', "00401", "12345", ':', '~')
    );
    let err = parse_str(&text).unwrap_err();
    assert_eq!(err.recoverable().map(|e| e.kind), Some(RecoverableKind::FieldLength));
    assert!(parse_str_with(&text, &ReaderOptions::default(), &mut Lenient).is_ok());
}

#[test]
fn test_element_too_long_is_fatal() {
    let long = "X".repeat(40);
    let text = format!(
        "{}GS*PO*S*R*19991231*2359*1*X*004010~ST*850*0001~MSG*{long}~SE*3*0001~GE*1*1~IEA*1*000000001~",
        isa('*', 'U', "00401", "000000001", ':', '~')
    );
    let options = ReaderOptions::new().with_max_element_length(32);
    let err = parse_str_with(&text, &options, &mut Lenient).unwrap_err();
    assert!(matches!(err, Error::ElementTooLong { limit: 32, .. }));
}
