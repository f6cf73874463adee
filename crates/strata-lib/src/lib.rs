//! Strata: lossless, editable structural parsing.
//!
//! Grammars are assembled from combinators, then live trees of nodes are
//! parsed from text. Every node keeps the exact text it was last validated
//! against, any node can be edited, and edits propagate to its ancestors and
//! their listeners.
//!
//! # Example
//!
//! ```
//! use strata_lib::{GrammarBuilder, Tree};
//!
//! let mut g = GrammarBuilder::new();
//! let open = g.literal("<a>");
//! let digits = g.pattern("[0-9]+");
//! let number = g.named("number", digits);
//! let close = g.literal("</a>");
//! let element = g.sequence([open, number, close]);
//! let grammar = g.build().expect("valid grammar");
//!
//! let mut tree = Tree::new(grammar);
//! let root = tree.create(element).unwrap();
//! tree.set_content(root, "<a>123</a>").unwrap();
//!
//! let number = tree.field(root, "number").unwrap();
//! assert_eq!(tree.content(number).unwrap(), "123");
//!
//! tree.set_content(number, "4567").unwrap();
//! assert_eq!(tree.content(root).unwrap(), "<a>4567</a>");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod diagnostics;
pub mod grammar;
pub mod limits;
pub mod trace;
pub mod tree;

mod search;

#[cfg(test)]
mod diagnostics_tests;
#[cfg(test)]
mod trace_tests;

pub use diagnostics::{Location, ParseError, Reason};
pub use grammar::{DefId, Grammar, GrammarBuilder, GrammarError, Quantifier, Repetition, Rule};
pub use limits::Limits;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use tree::{ContentChange, ListenerId, NodeId, NodeShape, Tree};

/// Errors of tree operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Content rejected by the grammar.
    #[error(transparent)]
    Incompatible(Box<ParseError>),

    /// An insert or remove would leave the item count outside the bounds.
    #[error("{node} would hold {count} items, outside {}", fmt_bounds(.min, .max))]
    CountOutOfBounds {
        node: NodeId,
        count: usize,
        min: usize,
        max: Option<usize>,
    },

    /// Search nesting exceeded `Limits::recursion_limit`.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("{0} has no content")]
    NoContent(NodeId),

    #[error("{node} is a {found} node, not a {expected} node")]
    ShapeMismatch {
        node: NodeId,
        expected: NodeShape,
        found: NodeShape,
    },

    #[error("index {index} out of bounds for {node} of length {len}")]
    IndexOutOfBounds {
        node: NodeId,
        index: usize,
        len: usize,
    },

    #[error("{node} has no field `{name}`")]
    UnknownField { node: NodeId, name: String },

    #[error("{def} is not a child definition of {node}")]
    NotAChild { node: NodeId, def: DefId },

    #[error("{0} does not belong to this grammar")]
    UnknownDefinition(DefId),

    #[error("{0} has no default separator")]
    MissingSeparator(NodeId),

    #[error("{0} does not belong to this tree")]
    UnknownNode(NodeId),
}

fn fmt_bounds(min: &usize, max: &Option<usize>) -> String {
    match max {
        Some(max) => format!("{min}..={max}"),
        None => format!("{min}.."),
    }
}

/// Broad classes of `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The text does not fit the grammar.
    IncompatibleContent,
    /// The call itself is wrong: bad handle, index, name or shape.
    InvalidArgument,
    /// A resource limit stopped the operation.
    Exhausted,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Incompatible(_) | Self::CountOutOfBounds { .. } => ErrorKind::IncompatibleContent,
            Self::RecursionLimitExceeded => ErrorKind::Exhausted,
            Self::NoContent(_)
            | Self::ShapeMismatch { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::UnknownField { .. }
            | Self::NotAChild { .. }
            | Self::UnknownDefinition(_)
            | Self::MissingSeparator(_)
            | Self::UnknownNode(_) => ErrorKind::InvalidArgument,
        }
    }

    /// The parse failure, for `Incompatible` errors.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Incompatible(err) => Some(&**err),
            _ => None,
        }
    }
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
