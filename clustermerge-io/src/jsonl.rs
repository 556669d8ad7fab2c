//! JSON-lines event files.
//!
//! Each non-blank line holds one [`EventRecord`] with the columnar field
//! names (`event_id`, `cluster_index`, `cell_E`, ...).

use crate::{Error, EventStore, Result};
use clustermerge_core::{Event, EventRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

/// Streaming reader yielding one event per line.
pub struct JsonLinesReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl JsonLinesReader<BufReader<File>> {
    /// Opens a JSON-lines file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn decode(&self, text: &str) -> Result<Event> {
        let record: EventRecord =
            serde_json::from_str(text).map_err(|source| Error::Json {
                line: self.line,
                source,
            })?;
        Ok(Event::try_from(record)?)
    }
}

impl<R: BufRead> Iterator for JsonLinesReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line += 1;
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(err) => return Some(Err(err.into())),
            };
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.decode(&text));
        }
    }
}

/// Writes events as JSON lines.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Creates (or truncates) a JSON-lines file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Writes one event.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &EventRecord::from(event))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of events written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// File-backed store: reads one JSON-lines file, writes another.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    input: PathBuf,
    output: PathBuf,
}

impl JsonLinesStore {
    /// Creates a store reading `input` and writing `output`.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Input file path.
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output file path.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl EventStore for JsonLinesStore {
    fn load(&mut self) -> Result<Vec<Event>> {
        JsonLinesReader::open(&self.input)?.collect()
    }

    fn persist(&mut self, events: &[Event]) -> Result<()> {
        let mut writer = JsonLinesWriter::create(&self.output)?;
        for event in events {
            writer.write_event(event)?;
        }
        writer.finish()?;
        Ok(())
    }
}
