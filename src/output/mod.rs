//! Output module
//!
//! Protocol messages and the sinks they are written to.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE messages
//! - `MessageSink` - where the engine writes messages
//! - `JsonLinesWriter` - one JSON document per line over any `io::Write`

mod message;
mod writer;

pub use message::Message;
pub use writer::{JsonLinesWriter, MessageSink};
