//! Command plan generation.
//!
//! Every job turns its CSV rows into one [`CommandPlan`]: an ordered list of
//! [`CommandBlock`]s holding IOS configuration-mode lines. The plan is built
//! once and then handed to a sink (text file, stdout, live SSH session), so
//! every output mode sends exactly the same commands in the same order.
//!
//! ## Builders
//!
//! - `layer2`: access ports or a routed VLAN interface per row
//! - `layer3`: routed VLAN interface plus access ports, trunks, or access ports
//! - `router`: interface blocks plus an accumulated routing block
//! - `switch`: session bootstrap (VTP) and plan assembly for both switch kinds

pub mod layer2;
pub mod layer3;
pub mod router;
pub mod switch;

pub use router::{build_router_plan, RouterPlanner};
pub use switch::{build_switch_plan, SwitchKind, SwitchOptions, VtpSettings};

use std::fmt;

/// Enter global configuration mode
pub const CONFIGURE: &str = "conf t";
/// Leave configuration mode
pub const END: &str = "end";
/// Persist the running configuration
pub const SAVE: &str = "wr mem";

/// A group of command lines that belong together (one row, one phase)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBlock {
    /// Short human readable label, used in logs and file comments
    pub label: String,
    pub lines: Vec<String>,
}

impl CommandBlock {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lines: Vec::new(),
        }
    }

    /// Append a line, builder style
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The complete ordered command sequence for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPlan {
    /// Comment lines written before the commands by text sinks
    pub header: Vec<String>,
    pub blocks: Vec<CommandBlock>,
    /// Comment lines written after the commands by text sinks
    pub footer: Vec<String>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, lines: &[&str]) -> Self {
        self.header = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_footer(mut self, lines: &[&str]) -> Self {
        self.footer = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Add a block, skipping empty ones
    pub fn push(&mut self, block: CommandBlock) {
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = CommandBlock>) {
        for block in blocks {
            self.push(block);
        }
    }

    /// All command lines in send order, without comments
    pub fn commands(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter().map(String::as_str))
            .collect()
    }

    pub fn command_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }
}

impl fmt::Display for CommandPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.commands() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Closing block shared by every device plan
pub fn finish_block(save: bool) -> CommandBlock {
    let mut block = CommandBlock::new("finish").line(END);
    if save {
        block.push(SAVE);
    }
    block
}
