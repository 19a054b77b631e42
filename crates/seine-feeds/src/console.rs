//! Process console source and sink.

use seine_core::{Format, Reader, Record, Writer};
use std::io::{self, BufRead, Write as IoWrite};

/// Reads lines from standard input; EOF is exhaustion.
pub struct StdinReader {
    buf: String,
}

impl StdinReader {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }
}

impl Default for StdinReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for StdinReader {
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        self.buf.clear();
        let n = io::stdin().lock().read_line(&mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        let line = self.buf.trim_end_matches(['\n', '\r']);
        Ok(Some(Record::Text(line.to_string())))
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "stdin"
    }
}

/// Writes one line per record to standard output.
pub struct StdoutWriter;

impl Writer for StdoutWriter {
    fn write(&mut self, record: Record) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", record.to_line())?;
        out.flush()?;
        Ok(())
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "stdout"
    }
}
