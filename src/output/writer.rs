//! Message sinks

use super::message::Message;
use crate::error::{Error, Result};
use std::io::Write;

/// Destination for protocol messages
pub trait MessageSink {
    /// Write one message
    fn write(&mut self, message: Message) -> Result<()>;
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn write(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> MessageSink for JsonLinesWriter<W> {
    fn write(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        self.writer.write_all(b"\n")?;
        // downstream targets read line by line
        self.writer.flush()?;
        Ok(())
    }
}
