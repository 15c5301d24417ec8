//! IOS output patterns.
//!
//! The device session reads command output until the CLI prompt comes back,
//! then checks it for the error markers IOS prints for rejected input.

use regex::Regex;
use std::sync::LazyLock;

/// Compiled patterns for IOS command-line output
pub struct IosPatterns {
    /// Match: "Switch#", "Router(config-if)#", "Switch>" at the end of output
    pub prompt: Regex,
    /// Match: "Password:" when entering enable mode
    pub password: Regex,
    /// Match: "% Invalid input detected at '^' marker." and friends
    pub rejection: Regex,
}

impl IosPatterns {
    pub fn new() -> Self {
        Self {
            prompt: Regex::new(
                r"[\w.\-/]+(\([\w.\-/]+\))?[>#]\s*$"
            ).expect("Invalid prompt regex"),
            password: Regex::new(
                r"(?i)password:\s*$"
            ).expect("Invalid password regex"),
            rejection: Regex::new(
                r"(?m)^\s*% ?(Invalid input|Incomplete command|Ambiguous command|Unknown command|Unrecognized command|Bad mask|Invalid ).*$"
            ).expect("Invalid rejection regex"),
        }
    }
}

impl Default for IosPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<IosPatterns> = LazyLock::new(IosPatterns::new);

/// True when the output ends at a CLI prompt
pub fn at_prompt(output: &str) -> bool {
    PATTERNS.prompt.is_match(output)
}

/// True when the output ends at a privileged (`#`) prompt
pub fn at_privileged_prompt(output: &str) -> bool {
    at_prompt(output) && output.trim_end().ends_with('#')
}

/// The first IOS error line in the output, if any
pub fn rejection(output: &str) -> Option<String> {
    PATTERNS
        .rejection
        .find(output)
        .map(|m| m.as_str().trim().to_string())
}
