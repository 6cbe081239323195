//! Record sinks

use super::message::Message;
use crate::error::{Error, Result};
use crate::schema::CatalogEntry;
use crate::state::State;
use crate::types::Record;
use std::io::Write;

/// Destination for extracted records
pub trait RecordSink: Send {
    /// Write one record of `stream`
    fn emit(&mut self, stream: &str, record: &Record) -> Result<()>;

    /// Write the schema of a stream
    fn emit_schema(&mut self, _entry: &CatalogEntry) -> Result<()> {
        Ok(())
    }

    /// Write the current bookmarks
    fn emit_state(&mut self, _state: &State) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// Writes every message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink over `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0,
        }
    }

    /// Number of RECORD messages written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Write a message as a single line
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        let line = message.to_json_line()?;
        writeln!(self.writer, "{line}")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;
        if message.is_record() {
            self.records_written += 1;
        }
        Ok(())
    }
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.write_message(&Message::record(stream, record.clone()))
    }

    fn emit_schema(&mut self, entry: &CatalogEntry) -> Result<()> {
        self.write_message(&Message::schema(entry))
    }

    fn emit_state(&mut self, state: &State) -> Result<()> {
        self.write_message(&Message::state(state)?)?;
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records of `stream` in emission order
    pub fn records(&self, stream: &str) -> Vec<&Record> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                Message::Record {
                    stream: name,
                    record,
                } if name == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Stream names of all records in emission order
    pub fn record_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|message| message.is_record())
            .filter_map(Message::stream)
            .collect()
    }

    /// Number of records written
    pub fn record_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_record()).count()
    }

    /// Check if no record was written
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.messages.push(Message::record(stream, record.clone()));
        Ok(())
    }

    fn emit_schema(&mut self, entry: &CatalogEntry) -> Result<()> {
        self.messages.push(Message::schema(entry));
        Ok(())
    }

    fn emit_state(&mut self, state: &State) -> Result<()> {
        self.messages.push(Message::state(state)?);
        Ok(())
    }
}
