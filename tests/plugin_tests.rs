use edi_stream::{
    loop_table, names, parse_str_with, EventCollector, LoopTable, PluginRegistry, ReaderOptions,
    Standard, Strict,
};

const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *991231*2359*U*00401*000000001*0*P*:~";

fn x12_850(body: &[&str]) -> String {
    let segments = body.len() + 2;
    format!(
        "{ISA}GS*PO*S*R*19991231*2359*1*X*004010~ST*850*0001~{}SE*{segments}*0001~GE*1*1~IEA*1*000000001~",
        body.iter().map(|s| format!("{s}~")).collect::<String>()
    )
}

fn po_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(
        Standard::X12,
        "850",
        loop_table![
            ("N1", "N1", 1, "*"),
            ("PO1", "PO1", 1, "*"),
            ("PID", "PID", 2, "/PO1"),
            (None, "CTT", 0, "*"),
        ],
    );
    registry
}

fn parse_with(registry: PluginRegistry, text: &str) -> EventCollector {
    let options = ReaderOptions::new().with_plugins(registry);
    parse_str_with(text, &options, &mut Strict).unwrap()
}

#[test]
fn test_purchase_order_loops() {
    let text = x12_850(&[
        "BEG*00*SA*PO1**19991231",
        "N1*ST*ACME",
        "N3*1 MAIN ST",
        "PO1*1*10*EA",
        "PID*F****WIDGET",
        "PO1*2*5*EA",
        "CTT*2",
    ]);
    let events = parse_with(po_registry(), &text);
    let expected = "\
ediroot
  interchange
    group
      transaction
        segment:BEG
        loop:N1
          segment:N1
          segment:N3
        loop:PO1
          segment:PO1
          loop:PID
            segment:PID
        loop:PO1
          segment:PO1
        segment:CTT
";
    assert_eq!(events.outline(), expected);
}

#[test]
fn test_loops_close_at_document_end() {
    let text = x12_850(&["BEG*00*SA*PO1**19991231", "PO1*1*10*EA", "PID*F****WIDGET"]);
    let events = parse_with(po_registry(), &text);
    let starts = events.count(names::LOOP);
    let ends = events
        .events
        .iter()
        .filter(|e| e.is_end_of(names::LOOP))
        .count();
    assert_eq!((starts, ends), (2, 2));
    let last_loop_end = events
        .events
        .iter()
        .rposition(|e| e.is_end_of(names::LOOP))
        .unwrap();
    let transaction_end = events
        .events
        .iter()
        .position(|e| e.is_end_of(names::TRANSACTION))
        .unwrap();
    assert!(last_loop_end < transaction_end);
}

#[test]
fn test_unregistered_document_type_is_flat() {
    let mut registry = PluginRegistry::new();
    registry.register(Standard::X12, "810", loop_table![("IT1", "IT1", 1, "*")]);
    let text = x12_850(&["BEG*00*SA*PO1**19991231", "N1*ST*ACME"]);
    let events = parse_with(registry, &text);
    assert_eq!(events.count(names::LOOP), 0);
}

#[test]
fn test_table_loaded_from_json() {
    let json = r#"[
        {"loop_name": "LIN", "segment": "LIN", "level": 1},
        {"loop_name": "QTY", "segment": "QTY", "level": 2, "context": "/LIN"},
        {"loop_name": null, "segment": "UNS", "level": 0}
    ]"#;
    let table: LoopTable = serde_json::from_str(json).unwrap();
    let mut registry = PluginRegistry::new();
    registry.register(Standard::Edifact, "ORDERS", table);

    let text = "UNB+UNOA:2+S+R+991231:2359+9'\
UNH+1+ORDERS:D:96A:UN'BGM+220+PO1'\
LIN+1'QTY+21:10'LIN+2'QTY+21:5'UNS+S'\
UNT+8+1'UNZ+1+9'";
    let events = parse_with(registry, text);
    let expected = "\
ediroot
  interchange
    transaction
      segment:BGM
      loop:LIN
        segment:LIN
        loop:QTY
          segment:QTY
      loop:LIN
        segment:LIN
        loop:QTY
          segment:QTY
      segment:UNS
";
    assert_eq!(events.outline(), expected);
}

#[test]
fn test_registry_shared_between_documents() {
    let text = format!(
        "{ISA}GS*PO*S*R*19991231*2359*1*X*004010~\
         ST*850*0001~N1*ST*A~SE*3*0001~\
         ST*850*0002~N1*BT*B~SE*3*0002~\
         GE*2*1~IEA*1*000000001~"
    );
    let events = parse_with(po_registry(), &text);
    assert_eq!(events.count(names::LOOP), 2);
    assert_eq!(events.closings.len(), 3);
}
