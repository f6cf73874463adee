#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared building blocks for the Strata parsing engine.
//!
//! - `Interner`: deduplicated rule and field names behind cheap `Symbol` handles
//! - `Colors`: ANSI palette for dumps and traces
//! - `text`: line/column resolution and snippet shortening for diagnostics

pub mod colors;
pub mod interner;
pub mod text;

#[cfg(test)]
mod interner_tests;
#[cfg(test)]
mod text_tests;

pub use colors::{Colors, Role};
pub use interner::{Interner, Symbol};
pub use text::{escape_control, line_col, truncate};
