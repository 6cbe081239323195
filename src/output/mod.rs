//! Output module
//!
//! Serializes extracted data as singer messages.
//!
//! # Overview
//!
//! This module provides:
//! - [`Message`] - `SCHEMA`, `RECORD` and `STATE` messages
//! - [`RecordSink`] - Destination for formatted records
//! - [`JsonLinesSink`] - One JSON message per line on any writer (stdout in the CLI)
//! - [`MemorySink`] - Collects messages in memory

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
