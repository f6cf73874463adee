//! ANSI styling for trace output.
//!
//! Styles are chosen by what a fragment means, not by its color, so callers
//! never touch escape codes directly.

use std::fmt::Display;

/// What a styled fragment of output stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Definition ids and field names (blue).
    Definition,
    /// Node content and candidate text (green).
    Content,
    /// Rejection markers (red).
    Rejected,
    /// Byte offsets and ranges (dim).
    Offset,
}

/// Palette switch: either every role gets its ANSI code, or none does.
///
/// Uses only standard 16-color ANSI codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Colors {
    enabled: bool,
}

const RESET: &str = "\x1b[0m";

impl Colors {
    pub const ON: Self = Self { enabled: true };
    pub const OFF: Self = Self { enabled: false };

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Escape code that opens `role`, or `""` when disabled.
    pub fn code(&self, role: Role) -> &'static str {
        if !self.enabled {
            return "";
        }
        match role {
            Role::Definition => "\x1b[34m",
            Role::Content => "\x1b[32m",
            Role::Rejected => "\x1b[31m",
            Role::Offset => "\x1b[2m",
        }
    }

    /// `text` wrapped in the codes for `role`.
    pub fn paint(&self, role: Role, text: impl Display) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{}{text}{RESET}", self.code(role))
    }
}
