//! Text artifact sink.
//!
//! Writes the plan as a configuration file: header comments, each block
//! followed by a `!` delimiter line, then footer comments. Stripping the
//! comment and delimiter lines yields exactly the commands a device session
//! receives.

use super::{BlockOutcome, CommandSink, SessionError};
use crate::commands::{CommandBlock, CommandPlan};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Delimiter written after every block
pub const DELIMITER: &str = "!";

pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextSink<BufWriter<File>> {
    /// Create (or truncate) a configuration file
    pub fn create(path: &Path) -> Result<Self, SessionError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl TextSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> CommandSink for TextSink<W> {
    fn begin(&mut self, plan: &CommandPlan) -> Result<(), SessionError> {
        for line in &plan.header {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn send_block(&mut self, block: &CommandBlock) -> Result<BlockOutcome, SessionError> {
        for line in &block.lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out, "{}", DELIMITER)?;
        Ok(BlockOutcome::Accepted)
    }

    fn finish(&mut self, plan: &CommandPlan) -> Result<(), SessionError> {
        for line in &plan.footer {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// True for lines a text sink adds around the commands
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::apply_plan;
    use tempfile::tempdir;

    fn plan() -> CommandPlan {
        let mut plan = CommandPlan::new()
            .with_header(&["! Generated"])
            .with_footer(&["! Done"]);
        plan.push(CommandBlock::new("a").line("conf t").line("vlan 10"));
        plan.push(CommandBlock::new("b").line("end"));
        plan
    }

    #[test]
    fn test_text_layout() {
        let mut sink = TextSink::new(Vec::new());
        apply_plan(&mut sink, &plan()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "! Generated\nconf t\nvlan 10\n!\nend\n!\n! Done\n");
    }

    #[test]
    fn test_comment_lines_strip_back_to_commands() {
        let mut sink = TextSink::new(Vec::new());
        apply_plan(&mut sink, &plan()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let commands: Vec<&str> = text.lines().filter(|l| !is_comment(l)).collect();
        assert_eq!(commands, plan().commands());
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("switch_config.txt");
        let mut sink = TextSink::create(&path).unwrap();
        apply_plan(&mut sink, &plan()).unwrap();
        drop(sink);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("! Generated\nconf t\n"));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let result = TextSink::create(Path::new("/nonexistent/dir/out.txt"));
        assert!(matches!(result, Err(SessionError::Io(_))));
    }
}
