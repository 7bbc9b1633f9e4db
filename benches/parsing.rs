use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use edi_stream::{
    loop_table, parse_str, parse_str_with, parse_stream, Attributes, Delimiters, EventCollector,
    EventSink, PluginRegistry, ReadSource, ReaderOptions, Standard, StrSource, Strict, Tokenizer,
};

const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *991231*2359*U*00401*000000001*0*P*:~";

/// Counts events without storing them.
#[derive(Default)]
struct Counter(usize);

impl EventSink for Counter {
    fn start_element(&mut self, _name: &str, _attributes: &Attributes) {
        self.0 += 1;
    }

    fn end_element(&mut self, _name: &str) {}

    fn characters(&mut self, _text: &str) {}
}

fn purchase_order(lines: usize) -> String {
    let mut body = String::from("BEG*00*SA*PO1**19991231~N1*ST*ACME~N3*1 MAIN ST~");
    for i in 0..lines {
        body.push_str(&format!("PO1*{i}*10*EA*9.95**VP*SKU{i}~PID*F****WIDGET {i}~"));
    }
    body.push_str(&format!("CTT*{lines}~"));
    let segments = 2 + 4 + 2 * lines;
    format!(
        "{ISA}GS*PO*S*R*19991231*2359*1*X*004010~ST*850*0001~{body}SE*{segments}*0001~GE*1*1~IEA*1*000000001~"
    )
}

fn benchmark_tokenize(c: &mut Criterion) {
    let text = purchase_order(200);
    c.bench_function("tokenize_segments", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(
                StrSource::new(black_box(text.as_str())),
                Delimiters::new('*', '~').with_sub_element(':'),
                &ReaderOptions::default(),
            );
            let mut count = 0;
            while let Ok(Some(_)) = tokenizer.next_segment() {
                count += 1;
            }
            count
        })
    });
}

fn benchmark_parse_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_x12_850");

    for lines in [10, 100, 1000].iter() {
        let text = purchase_order(*lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| {
                let mut sink = Counter::default();
                parse_stream(
                    StrSource::new(black_box(text.as_str())),
                    &ReaderOptions::default(),
                    &mut sink,
                    &mut Strict,
                )
                .map(|_| sink.0)
            })
        });
    }
    group.finish();
}

fn benchmark_collect_events(c: &mut Criterion) {
    let text = purchase_order(100);
    c.bench_function("collect_events", |b| b.iter(|| parse_str(black_box(&text))));
}

fn benchmark_loop_tables(c: &mut Criterion) {
    let text = purchase_order(100);
    let mut plugins = PluginRegistry::new();
    plugins.register(
        Standard::X12,
        "850",
        loop_table![
            ("N1", "N1", 1, "*"),
            ("PO1", "PO1", 1, "*"),
            ("PID", "PID", 2, "/PO1"),
            (None, "CTT", 0, "*"),
        ],
    );
    let options = ReaderOptions::new().with_plugins(plugins);

    c.bench_function("parse_with_loops", |b| {
        b.iter(|| parse_str_with(black_box(&text), &options, &mut Strict))
    });
}

fn benchmark_reader_source(c: &mut Criterion) {
    let text = purchase_order(100);
    let mut group = c.benchmark_group("read_source_chunk");

    for chunk in [64, 1024, 8192].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), chunk, |b, chunk| {
            b.iter(|| {
                let mut sink = EventCollector::new();
                parse_stream(
                    ReadSource::with_chunk_size(black_box(text.as_bytes()), *chunk),
                    &ReaderOptions::default(),
                    &mut sink,
                    &mut Strict,
                )
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_parse_sizes,
    benchmark_collect_events,
    benchmark_loop_tables,
    benchmark_reader_source
);
criterion_main!(benches);
