//! Tracing hooks for the boundary search and content propagation.
//!
//! `NoopTracer` compiles away entirely: every method is an empty
//! `#[inline(always)]` function, so `Tree::set_content` pays nothing for the
//! hooks. `PrintTracer` collects an indented log of candidates tried, accepted
//! and rejected, for debugging grammars.

use std::ops::Range;

use strata_core::{Colors, Role, escape_control, truncate};

use crate::grammar::{DefId, Grammar};
use crate::tree::NodeId;

const TEXT_LEN: usize = 24;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Accepted and rejected candidates only.
    #[default]
    Default,
    /// Also candidate entry and backtracking.
    Verbose,
    /// Also the text of every candidate.
    VeryVerbose,
}

/// Instrumentation points of the boundary search.
///
/// Methods receive raw ids and offsets; name resolution and formatting are up
/// to the implementation.
pub trait Tracer {
    /// A definition is tried against `range`.
    fn trace_enter(&mut self, def: DefId, range: Range<usize>, text: &str);

    /// The definition accepted the range.
    fn trace_accept(&mut self, def: DefId, range: Range<usize>);

    /// The definition rejected the range.
    fn trace_reject(&mut self, def: DefId, range: Range<usize>);

    /// A repetition or sequence gives up a candidate ending at `offset`.
    fn trace_backtrack(&mut self, def: DefId, offset: usize);

    /// A node's listeners are about to be notified.
    fn trace_notify(&mut self, node: NodeId, content: &str);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_enter(&mut self, _def: DefId, _range: Range<usize>, _text: &str) {}

    #[inline(always)]
    fn trace_accept(&mut self, _def: DefId, _range: Range<usize>) {}

    #[inline(always)]
    fn trace_reject(&mut self, _def: DefId, _range: Range<usize>) {}

    #[inline(always)]
    fn trace_backtrack(&mut self, _def: DefId, _offset: usize) {}

    #[inline(always)]
    fn trace_notify(&mut self, _node: NodeId, _content: &str) {}
}

/// Tracer that collects a readable log.
pub struct PrintTracer {
    /// Display label per definition: its field name, or `#id`.
    labels: Vec<String>,
    verbosity: Verbosity,
    lines: Vec<String>,
    depth: usize,
    colors: Colors,
}

impl PrintTracer {
    pub fn new(grammar: &Grammar, verbosity: Verbosity, colors: Colors) -> Self {
        let labels = grammar
            .iter()
            .map(|(def, _)| match grammar.name(def) {
                Some(name) => format!("{def} {name}"),
                None => def.to_string(),
            })
            .collect();
        Self {
            labels,
            verbosity,
            lines: Vec::new(),
            depth: 0,
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn label(&self, def: DefId) -> String {
        let label = self.labels.get(def.index()).map_or("?", |s| s.as_str());
        self.colors.paint(Role::Definition, label)
    }

    fn range(&self, range: &Range<usize>) -> String {
        self.colors.paint(Role::Offset, format_args!("{range:?}"))
    }

    fn text(&self, text: &str) -> String {
        let text = escape_control(&truncate(text, TEXT_LEN));
        self.colors.paint(Role::Content, format_args!("{text:?}"))
    }

    fn push(&mut self, symbol: &str, content: String) {
        let indent = "  ".repeat(self.depth);
        self.lines.push(format!("{indent}{symbol} {content}"));
    }
}

impl Tracer for PrintTracer {
    fn trace_enter(&mut self, def: DefId, range: Range<usize>, text: &str) {
        if self.verbosity >= Verbosity::Verbose {
            let mut content = format!("{} {}", self.label(def), self.range(&range));
            if self.verbosity == Verbosity::VeryVerbose {
                content.push(' ');
                content.push_str(&self.text(text));
            }
            self.push("▶", content);
        }
        self.depth += 1;
    }

    fn trace_accept(&mut self, def: DefId, range: Range<usize>) {
        self.depth = self.depth.saturating_sub(1);
        let content = format!("{} {}", self.label(def), self.range(&range));
        self.push("✓", content);
    }

    fn trace_reject(&mut self, def: DefId, range: Range<usize>) {
        self.depth = self.depth.saturating_sub(1);
        let content = format!("{} {}", self.label(def), self.range(&range));
        let marker = self.colors.paint(Role::Rejected, '✗');
        self.push(&marker, content);
    }

    fn trace_backtrack(&mut self, def: DefId, offset: usize) {
        if self.verbosity >= Verbosity::Verbose {
            let content = format!("{} @{offset}", self.label(def));
            self.push("↩", content);
        }
    }

    fn trace_notify(&mut self, node: NodeId, content: &str) {
        let line = format!("notify {node} {}", self.text(content));
        self.lines.push(line);
    }
}
