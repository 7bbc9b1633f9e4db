//! Property-based tests for the tokenizer, the interchange handoff and
//! loop nesting.

use edi_stream::{
    loop_table, names, parse_str, parse_stream, Attributes, Delimiters, EventCollector,
    EventSink, LoopController, LoopTable, ReadSource, ReaderOptions, RecoverableKind, StrSource,
    Strict, Tokenizer,
};
use proptest::prelude::*;
use std::sync::Arc;

fn edifact_interchange(control: u32, data: &[String]) -> String {
    let body: String = data.iter().map(|value| format!("FTX+AAA+++{value}'")).collect();
    format!(
        "UNB+UNOA:2+S+R+991231:2359+{control}'UNH+1+INVOIC:D:96A:UN'{body}UNT+{}+1'UNZ+1+{control}'",
        data.len() + 2
    )
}

fn tradacoms_interchange(control: u32, data: &[String]) -> String {
    let body: String = data.iter().map(|value| format!("TXT={value}'")).collect();
    format!(
        "STX=ANA:1+A+B+240131:0930+T{control}'MHD=1+ORDHDR:9'{body}MTR={}'END=1'",
        data.len() + 2
    )
}

fn value() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,12}"
}

fn po_table() -> Arc<LoopTable> {
    Arc::new(loop_table![
        ("N1", "N1", 1, "*"),
        ("PO1", "PO1", 1, "*"),
        ("PID", "PID", 2, "/PO1"),
        (".", "LX", 1, "*"),
        (None, "CTT", 0, "*"),
    ])
}

proptest! {
    #[test]
    fn prop_lookahead_matches_reads(text in "[A-Z*~:^ ]{0,64}", n in 1usize..24, capacity in 1usize..32) {
        let options = ReaderOptions::new().with_buffer_capacity(capacity);
        let mut tokenizer = Tokenizer::new(StrSource::new(text.as_str()), Delimiters::new('*', '~'), &options);
        let peeked = tokenizer.lookahead(n).unwrap();
        prop_assert_eq!(peeked.chars().count(), n);
        let mut read = String::new();
        for _ in 0..n.min(text.len()) {
            read.push(tokenizer.get_char().unwrap().ch);
        }
        let expected: String = text.chars().chain(std::iter::repeat('?')).take(n).collect();
        prop_assert_eq!(&peeked, &expected);
        prop_assert_eq!(&read, &text[..n.min(text.len())]);
    }

    #[test]
    fn prop_handoff_conserves_stream(
        interchanges in prop::collection::vec((any::<bool>(), prop::collection::vec(value(), 0..6)), 1..5),
        separator in "[ \r\n]{0,3}",
        capacity in 16usize..64,
        chunk in 1usize..9,
    ) {
        let text: String = interchanges
            .iter()
            .enumerate()
            .map(|(i, (edifact, data))| {
                let control = i as u32 + 1;
                let body = if *edifact {
                    edifact_interchange(control, data)
                } else {
                    tradacoms_interchange(control, data)
                };
                format!("{body}{separator}")
            })
            .collect();
        let expected = parse_str(&text).unwrap();

        let mut sink = EventCollector::new();
        let closed = parse_stream(
            ReadSource::with_chunk_size(text.as_bytes(), chunk),
            &ReaderOptions::new().with_buffer_capacity(capacity),
            &mut sink,
            &mut Strict,
        )
        .unwrap();
        prop_assert_eq!(closed.len(), interchanges.len());
        prop_assert_eq!(sink.events, expected.events);
    }

    #[test]
    fn prop_segment_count_validation(data in prop::collection::vec(value(), 0..8), declared in 0usize..12) {
        let text = edifact_interchange(1, &data).replace(
            &format!("UNT+{}+1'", data.len() + 2),
            &format!("UNT+{declared}+1'"),
        );
        match parse_str(&text) {
            Ok(_) => prop_assert_eq!(declared, data.len() + 2),
            Err(err) => {
                let problem = err.recoverable().unwrap();
                prop_assert_eq!(problem.kind, RecoverableKind::CountMismatch);
                prop_assert_eq!(&problem.expected, &(data.len() + 2).to_string());
            }
        }
    }

    #[test]
    fn prop_loops_are_balanced_and_deterministic(
        ids in prop::collection::vec(prop::sample::select(vec!["BEG", "N1", "N3", "PO1", "PID", "LX", "CTT"]), 0..40),
    ) {
        let run = || {
            let mut sink = EventCollector::new();
            let mut loops = LoopController::new(Some(po_table()));
            for id in &ids {
                loops.transition(id, &mut sink);
                let mut attributes = Attributes::new();
                attributes.insert("Id", *id);
                sink.start_element(names::SEGMENT, &attributes);
                sink.end_element(names::SEGMENT);
            }
            loops.close_all(&mut sink);
            sink
        };
        let first = run();
        let second = run();
        prop_assert_eq!(&first.events, &second.events);
        let starts = first.count(names::LOOP);
        let ends = first.events.iter().filter(|e| e.is_end_of(names::LOOP)).count();
        prop_assert_eq!(starts, ends);
        prop_assert!(starts <= ids.len());
    }
}
