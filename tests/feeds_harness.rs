//! Feed adapter integration harness.
//!
//! # What this covers
//!
//! - **File source**: line-at-a-time reads, exhaustion at EOF, CRLF input.
//! - **File sink**: newline-delimited append; field records as JSON objects.
//! - **Tail mode**: a tailing source inside the fan-in engine keeps the
//!   stream alive until its stop handle is set, then drains and terminates
//!   without needing further input.
//! - **End to end**: file of NMEA sentences → fan-in engine → parse
//!   transform → collected field records.

mod common;
use common::*;

use seine_core::transforms::ParseTransform;
use seine_core::{ComposedReader, LockPolicy, Reader, Record, Transform, Writer};
use seine_feeds::{TextFileReader, TextFileWriter};
use std::io::Write as IoWrite;
use std::sync::Arc;

#[test]
fn file_source_reads_lines_and_exhausts() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    writeln!(tmp, "$HEHDT,235.9,T").unwrap();
    writeln!(tmp, "$HEHDT,236.1,T").unwrap();
    tmp.flush().unwrap();

    let mut reader = TextFileReader::new(tmp.path(), false).unwrap();
    let all = lines(&drain(&mut reader));
    assert_eq!(all, ["$HEHDT,235.9,T", "$HEHDT,236.1,T"]);
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn file_sink_writes_text_and_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sink.log");

    let mut writer = TextFileWriter::new(&path).unwrap();
    writer.write(Record::from("raw line")).unwrap();
    let mut fields = std::collections::HashMap::new();
    fields.insert("Course".to_string(), serde_json::Value::from(226.86));
    writer.write(Record::Fields(fields)).unwrap();
    drop(writer);

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut written = contents.lines();
    assert_eq!(written.next(), Some("raw line"));
    assert_eq!(written.next(), Some(r#"{"Course":226.86}"#));
}

#[test]
fn tailing_source_stops_via_its_handle() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    writeln!(tmp, "first").unwrap();
    tmp.flush().unwrap();

    let tail = TextFileReader::new(tmp.path(), true).unwrap();
    let stop = tail.stop_handle();
    let mut reader = ComposedReader::new(
        vec![Box::new(tail) as Box<dyn Reader>],
        vec![],
        LockPolicy::Unguarded,
        false,
    )
    .unwrap();

    assert_eq!(reader.read().unwrap(), Some(Record::from("first")));

    // No further data arrives; the handle alone must end the tail loop so
    // the source exhausts and the join returns.
    stop.store(true, std::sync::atomic::Ordering::SeqCst);
    reader.stop();
    while reader.read().unwrap().is_some() {}
    reader.join();
}

#[test]
fn nmea_file_fans_in_as_field_records() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    writeln!(tmp, "$GPGLL,2203.672,S").unwrap();
    writeln!(tmp, "$GPGLL,2203.801,S").unwrap();
    tmp.flush().unwrap();

    let chain: Vec<Arc<dyn Transform>> = vec![Arc::new(
        ParseTransform::new(vec!["$GPGLL,{Latitude:nlat},{NorS:w}".to_string()])
            .expect("template compiles"),
    )];
    let source = TextFileReader::new(tmp.path(), false).unwrap();
    let mut reader = ComposedReader::new(
        vec![Box::new(source) as Box<dyn Reader>],
        chain,
        LockPolicy::Unguarded,
        false,
    )
    .unwrap();

    let all = drain(&mut reader);
    assert_eq!(all.len(), 2);
    for record in &all {
        let fields = record.as_fields().expect("parsed record");
        assert_eq!(fields["NorS"], serde_json::Value::from("S"));
        assert!(fields["Latitude"].as_f64().unwrap() > 22.0);
    }
}
