//! Command sinks.
//!
//! A [`CommandPlan`] is generated once and consumed by a sink. Text sinks
//! write it to a file or stdout with `!` delimiter lines, the SSH sink sends
//! it to a live device, and the recording sink keeps it in memory. All of
//! them receive the same blocks through [`apply_plan`].

pub mod memory;
pub mod response;
pub mod ssh;
pub mod text;

pub use memory::RecordingSink;
pub use ssh::{DeviceTarget, SshSession};
pub use text::TextSink;

use crate::commands::{CommandBlock, CommandPlan};
use log::{debug, info, warn};

/// Errors that end a sink run
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot resolve device address {addr}")]
    Resolve { addr: String },

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH handshake failed: {0}")]
    Handshake(#[source] ssh2::Error),

    #[error("SSH authentication failed for user '{user}'")]
    Auth { user: String },

    #[error("SSH channel error: {0}")]
    Channel(#[source] ssh2::Error),

    #[error("device did not return to a prompt after '{command}'")]
    NoPrompt { command: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of sending one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Accepted,
    /// The device refused a line of the block
    Rejected { command: String, message: String },
}

/// Something that consumes a command plan block by block
pub trait CommandSink {
    /// Called once before the first block
    fn begin(&mut self, _plan: &CommandPlan) -> Result<(), SessionError> {
        Ok(())
    }

    fn send_block(&mut self, block: &CommandBlock) -> Result<BlockOutcome, SessionError>;

    /// Called once after the last block
    fn finish(&mut self, _plan: &CommandPlan) -> Result<(), SessionError> {
        Ok(())
    }
}

/// A block the device refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub block: String,
    pub command: String,
    pub message: String,
}

/// Summary of a plan run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub blocks_sent: usize,
    pub commands_sent: usize,
    pub rejections: Vec<Rejection>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// Feed every block of the plan to the sink, in order.
///
/// A sink stops a block at its first rejected line. Rejected blocks are
/// logged and recorded, and the run continues with the next block.
/// Transport errors abort the run.
pub fn apply_plan<S: CommandSink + ?Sized>(sink: &mut S, plan: &CommandPlan) -> Result<RunReport, SessionError> {
    let mut report = RunReport::default();

    sink.begin(plan)?;
    for block in &plan.blocks {
        debug!("Sending block '{}' ({} lines)", block.label, block.lines.len());
        let sent = match sink.send_block(block)? {
            BlockOutcome::Accepted => block.lines.len(),
            BlockOutcome::Rejected { command, message } => {
                warn!("Block '{}' rejected at '{}': {}", block.label, command, message);
                // Lines after the rejected one are not sent
                let sent = block
                    .lines
                    .iter()
                    .position(|line| *line == command)
                    .map_or(block.lines.len(), |index| index + 1);
                report.rejections.push(Rejection {
                    block: block.label.clone(),
                    command,
                    message,
                });
                sent
            }
        };
        report.blocks_sent += 1;
        report.commands_sent += sent;
    }
    sink.finish(plan)?;

    info!(
        "Sent {} commands in {} blocks ({} rejected)",
        report.commands_sent,
        report.blocks_sent,
        report.rejections.len()
    );
    Ok(report)
}
