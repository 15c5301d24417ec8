//! In-memory sink that stands in for a device session.
//!
//! Records every line it is sent and can be told to answer specific
//! commands with an IOS error, the way a real device would. Like the SSH
//! session, it abandons the rest of a block at the first rejected line.

use super::response::rejection;
use super::{BlockOutcome, CommandSink, SessionError};
use crate::commands::CommandBlock;

#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Vec<String>,
    /// (command, device output) pairs answered with an error
    scripted: Vec<(String, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the exact command with the given device output
    pub fn reject_matching(mut self, command: &str, output: &str) -> Self {
        self.scripted.push((command.to_string(), output.to_string()));
        self
    }

    /// Every line sent so far, in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn respond(&self, command: &str) -> String {
        self.scripted
            .iter()
            .find(|(scripted, _)| scripted == command)
            .map(|(_, output)| format!("{}\r\n{}\r\nDevice(config)#", command, output))
            .unwrap_or_else(|| format!("{}\r\nDevice(config)#", command))
    }
}

impl CommandSink for RecordingSink {
    fn send_block(&mut self, block: &CommandBlock) -> Result<BlockOutcome, SessionError> {
        for line in &block.lines {
            self.lines.push(line.clone());
            let output = self.respond(line);
            if let Some(message) = rejection(&output) {
                return Ok(BlockOutcome::Rejected {
                    command: line.clone(),
                    message,
                });
            }
        }
        Ok(BlockOutcome::Accepted)
    }
}
