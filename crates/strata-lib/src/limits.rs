//! Tunable limits for regex rendering and boundary search.

/// Limits applied to a grammar.
///
/// `regex_depth` bounds how many times a definition may re-enter itself while
/// its feasibility regex is rendered; past it the definition renders as a
/// wildcard. `recursion_limit` optionally bounds the boundary search itself,
/// which is otherwise limited only by the nesting of the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Regex rendering depth per definition (default: 10).
    pub(crate) regex_depth: u32,
    /// Maximum nesting of the boundary search (default: unbounded).
    pub(crate) recursion_limit: Option<u32>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            regex_depth: 10,
            recursion_limit: None,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the regex rendering depth. A depth of 0 renders every definition
    /// as a wildcard.
    pub fn regex_depth(mut self, depth: u32) -> Self {
        self.regex_depth = depth;
        self
    }

    /// Bound the boundary search nesting.
    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    pub fn get_regex_depth(&self) -> u32 {
        self.regex_depth
    }

    pub fn get_recursion_limit(&self) -> Option<u32> {
        self.recursion_limit
    }
}
