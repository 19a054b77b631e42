//! Text file source and sink.

use anyhow::Context;
use seine_core::{Format, Reader, Record, Writer};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// How often tail mode re-checks the file for appended data.
const TAIL_POLL: Duration = Duration::from_millis(100);

/// Reads a file one line per record. In tail mode, end-of-file means "wait
/// for more" instead of exhaustion, so the reader follows a growing logfile.
pub struct TextFileReader {
    path: PathBuf,
    reader: BufReader<File>,
    buf: String,
    tail: bool,
    stop: Arc<AtomicBool>,
}

impl TextFileReader {
    pub fn new(path: impl AsRef<Path>, tail: bool) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            buf: String::new(),
            tail,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that ends tail mode: once set, the next end-of-file reports
    /// exhaustion instead of waiting for appended data. Grab it before
    /// handing the reader to a fan-in engine, which cannot interrupt a
    /// source blocked inside its own `read`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}

impl Reader for TextFileReader {
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        loop {
            self.buf.clear();
            let n = self
                .reader
                .read_line(&mut self.buf)
                .with_context(|| format!("reading {}", self.path.display()))?;
            if n == 0 {
                if self.tail && !self.stop.load(Ordering::SeqCst) {
                    thread::sleep(TAIL_POLL);
                    continue;
                }
                debug!(path = %self.path.display(), "file exhausted");
                return Ok(None);
            }
            let line = self.buf.trim_end_matches(['\n', '\r']);
            return Ok(Some(Record::Text(line.to_string())));
        }
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Appends records to a file, one line each; field records are written as
/// JSON objects.
pub struct TextFileWriter {
    path: PathBuf,
    file: File,
}

impl TextFileWriter {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {} for append", path.display()))?;
        Ok(Self { path, file })
    }
}

impl Writer for TextFileWriter {
    fn write(&mut self, record: Record) -> anyhow::Result<()> {
        writeln!(self.file, "{}", record.to_line())
            .with_context(|| format!("writing {}", self.path.display()))?;
        self.file.flush()?;
        Ok(())
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "file"
    }
}
