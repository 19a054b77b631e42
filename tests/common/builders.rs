//! Test builders: scripted readers, recording transforms, and sinks.
//!
//! These exist so harnesses can drive the fan-in engine without touching any
//! real transport. They panic on misuse rather than returning `Result`; they
//! are not production code.

use seine_core::{Format, Reader, Record, Transform, Writer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Emits a scripted list of text records, then exhausts. An optional
/// per-record delay staggers sources so cross-source interleaving happens.
pub struct VecReader {
    records: VecDeque<Record>,
    format: Format,
    delay: Option<Duration>,
}

impl VecReader {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            records: lines.iter().map(|l| Record::from(*l)).collect(),
            format: Format::Text,
            delay: None,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Reader for VecReader {
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.records.pop_front())
    }

    fn output_format(&self) -> Format {
        self.format
    }

    fn name(&self) -> &str {
        "vec"
    }
}

/// Yields a few records, then fails with an I/O-style error.
pub struct FailingReader {
    good: VecDeque<Record>,
}

impl FailingReader {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            good: lines.iter().map(|l| Record::from(*l)).collect(),
        }
    }
}

impl Reader for FailingReader {
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        match self.good.pop_front() {
            Some(record) => Ok(Some(record)),
            None => anyhow::bail!("simulated transport failure"),
        }
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Records every line it sees, then passes it through unchanged.
pub struct SeenTransform {
    seen: Arc<Mutex<Vec<String>>>,
}

impl SeenTransform {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Self { seen: seen.clone() }, seen)
    }
}

impl Transform for SeenTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        if let Some(line) = record.as_text() {
            self.seen.lock().unwrap().push(line.to_string());
        }
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "seen"
    }
}

/// Drops records whose text contains a marker substring.
pub struct DropTransform {
    marker: String,
}

impl DropTransform {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl Transform for DropTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        match record.as_text() {
            Some(line) if line.contains(&self.marker) => Ok(None),
            _ => Ok(Some(record)),
        }
    }

    fn name(&self) -> &str {
        "drop"
    }
}

/// Panics on records containing a marker substring; passes the rest.
pub struct PanicTransform {
    marker: String,
}

impl PanicTransform {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl Transform for PanicTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        if let Some(line) = record.as_text() {
            assert!(!line.contains(&self.marker), "poisoned record: {line}");
        }
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "panic"
    }
}

/// Counts records through a shared mutable total; shared across sources to
/// exercise the lock policy.
pub struct CountingTransform {
    count: Arc<Mutex<u64>>,
}

impl CountingTransform {
    pub fn new() -> (Self, Arc<Mutex<u64>>) {
        let count = Arc::new(Mutex::new(0));
        (
            Self {
                count: count.clone(),
            },
            count,
        )
    }
}

impl Transform for CountingTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        *self.count.lock().unwrap() += 1;
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Pass-through transform with fixed declared formats, for chain
/// verification tests.
pub struct TaggedTransform {
    input: Format,
    output: Format,
}

impl TaggedTransform {
    pub fn new(input: Format, output: Format) -> Self {
        Self { input, output }
    }
}

impl Transform for TaggedTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        Ok(Some(record))
    }

    fn input_format(&self) -> Format {
        self.input
    }

    fn output_format(&self) -> Format {
        self.output
    }

    fn name(&self) -> &str {
        "tagged"
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Collects written records for assertions.
pub struct CollectWriter {
    records: Arc<Mutex<Vec<Record>>>,
}

impl CollectWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<Record>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                records: records.clone(),
            },
            records,
        )
    }
}

impl Writer for CollectWriter {
    fn write(&mut self, record: Record) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "collect"
    }
}

// ---------------------------------------------------------------------------
// Draining helpers
// ---------------------------------------------------------------------------

/// Pull records from a reader until it reports exhaustion.
pub fn drain(reader: &mut impl Reader) -> Vec<Record> {
    let mut out = Vec::new();
    while let Some(record) = reader.read().expect("drain never errors") {
        out.push(record);
    }
    out
}

/// The text lines of a record list, panicking on structured records.
pub fn lines(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.as_text().expect("expected text record").to_string())
        .collect()
}
