//! Parse failure reports.
//!
//! A `ParseError` describes the deepest point the boundary search reached
//! before giving up: the definition it was trying, that definition's regex,
//! the full content and the offending byte range. `Display` gives a compact
//! one-line form; `render` draws the content with the range underlined.

use std::fmt;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use serde::Serialize;
use strata_core::{escape_control, line_col, truncate};

use crate::grammar::DefId;

const EXCERPT_LEN: usize = 32;
const REGEX_LEN: usize = 48;

/// Why a candidate split was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The definition does not match the text at this range.
    Mismatch,
    /// No Choice alternative accepts the text.
    NoAlternative,
    /// Text is left over after the structure is complete.
    TrailingContent,
    /// Content ran out before the minimum repetition count.
    TooFewItems,
    /// Content remains after the maximum repetition count.
    TooManyItems,
}

/// 1-based line and column of a byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub definition: DefId,
    /// Field name of the definition, when it has one.
    pub name: Option<String>,
    /// Regex that was being matched; `None` when no alternative applied.
    pub regex: Option<String>,
    pub content: String,
    pub range: Range<usize>,
    pub reason: Reason,
}

impl ParseError {
    pub fn location(&self) -> Location {
        self.location_of(self.range.start)
    }

    pub fn end_location(&self) -> Location {
        self.location_of(self.range.end)
    }

    fn location_of(&self, offset: usize) -> Location {
        let (line, column) = line_col(&self.content, offset);
        Location { line, column }
    }

    fn subject(&self) -> String {
        match &self.name {
            Some(name) => format!("`{name}`"),
            None => self.definition.to_string(),
        }
    }

    /// Headline without location.
    pub fn message(&self) -> String {
        let subject = self.subject();
        match self.reason {
            Reason::Mismatch => format!("content does not match {subject}"),
            Reason::NoAlternative => format!("no alternative of {subject} accepts the content"),
            Reason::TrailingContent => format!("unexpected content after {subject}"),
            Reason::TooFewItems => format!("too few items for {subject}"),
            Reason::TooManyItems => format!("too many items for {subject}"),
        }
    }

    /// Text the report points at: the range itself, or what follows an empty one.
    fn excerpt(&self) -> String {
        let Range { start, end } = self.range;
        let text = if start < end {
            self.content.get(start..end)
        } else {
            self.content.get(start..)
        };
        escape_control(&truncate(text.unwrap_or_default(), EXCERPT_LEN))
    }

    /// Render with the offending range underlined.
    pub fn render(&self, colored: bool) -> String {
        let renderer = if colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let message = self.message();
        let label = match &self.regex {
            Some(regex) => format!("expected /{}/", truncate(regex, REGEX_LEN)),
            None => "nothing applies here".to_string(),
        };
        let snippet = Snippet::source(self.content.as_str())
            .line_start(1)
            .annotation(
                AnnotationKind::Primary
                    .span(adjust_range(&self.range, self.content.len()))
                    .label(&label),
            );
        let report = vec![Level::ERROR.primary_title(&message).element(snippet)];
        renderer.render(&report).to_string()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message(), self.location())?;
        if let Some(regex) = &self.regex {
            write!(f, ", expected /{}/", escape_control(&truncate(regex, REGEX_LEN)))?;
        }
        write!(f, ": \"{}\"", self.excerpt())
    }
}

impl std::error::Error for ParseError {}

fn adjust_range(range: &Range<usize>, limit: usize) -> Range<usize> {
    let start = range.start.min(limit);
    let end = range.end.min(limit);
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}
