//! Grammar definitions.
//!
//! A grammar is an immutable table of rules addressed by `DefId`. Rules are
//! built through `GrammarBuilder`, which also provides forward references for
//! recursive grammars: a reference is declared first, used by other rules, and
//! bound once the shape of the cycle is known. `build` refuses grammars with
//! unbound references, so a `Grammar` can never hand out an unbound one.
//!
//! Every definition renders a non-capturing feasibility regex (see `regex`).
//! The regex is a necessary condition for content to parse, never the source
//! of node boundaries; those come from the boundary search in `crate::search`.

mod builder;
mod dump;
mod matcher;
mod regex;

#[cfg(test)]
mod regex_tests;

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use regex_automata::meta;
use serde::Serialize;
use strata_core::{Interner, Symbol};

use crate::Limits;

pub use builder::{GrammarBuilder, GrammarError};
pub(crate) use matcher::Matcher;

/// Handle to a definition inside a `Grammar`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct DefId(u32);

impl DefId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Repetition policy.
///
/// Decorates the feasibility regex and breaks ties in the boundary search:
/// `Greedy` tries the longest candidate first, `Lazy` the shortest, and
/// `Possessive` takes the single maximal match and never backtracks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    #[default]
    Greedy,
    Lazy,
    Possessive,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Lazy => write!(f, "lazy"),
            Self::Possessive => write!(f, "possessive"),
        }
    }
}

/// Inclusive item-count bounds plus the quantifier of a repetition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Repetition {
    pub min: usize,
    pub max: Option<usize>,
    pub quantifier: Quantifier,
}

impl Default for Repetition {
    fn default() -> Self {
        Self::any()
    }
}

impl Repetition {
    /// Zero or more.
    pub fn any() -> Self {
        Self {
            min: 0,
            max: None,
            quantifier: Quantifier::Greedy,
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            min,
            ..Self::any()
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
            ..Self::any()
        }
    }

    pub fn exactly(count: usize) -> Self {
        Self::between(count, count)
    }

    pub fn quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    pub fn lazy(self) -> Self {
        self.quantifier(Quantifier::Lazy)
    }

    pub fn possessive(self) -> Self {
        self.quantifier(Quantifier::Possessive)
    }

    /// Whether `count` items satisfy the bounds.
    pub fn admits(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..={max}", self.min),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// Grammar rule variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Exact text.
    Literal(String),
    /// Arbitrary regex leaf (no anchors).
    Pattern(String),
    /// Matches only the empty string.
    Empty,
    /// Fixed, ordered list of items.
    Sequence(Vec<DefId>),
    /// Exactly one alternative; first match in declaration order wins.
    Choice(Vec<DefId>),
    /// Zero or one occurrence.
    Optional { item: DefId, quantifier: Quantifier },
    /// Homogeneous repetition.
    Loop { item: DefId, repetition: Repetition },
    /// Items interleaved with separators.
    Separated {
        item: DefId,
        separator: DefId,
        default_separator: Option<String>,
        repetition: Repetition,
    },
    /// Another handle to an existing definition, optionally naming it.
    Alias { target: DefId, name: Option<Symbol> },
    /// Bound forward reference.
    Forward(DefId),
    /// Definition whose fresh nodes start with the given content.
    WithDefault { content: String, target: DefId },
}

impl Rule {
    /// Whether the rule only forwards to another definition.
    pub fn is_indirect(&self) -> bool {
        matches!(
            self,
            Self::Alias { .. } | Self::Forward(_) | Self::WithDefault { .. }
        )
    }
}

/// Key for the cached matchers of "what may follow" a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TailKey {
    /// Items `k..` of a sequence.
    Sequence(DefId, usize),
    /// Any number of further loop items.
    Loop(DefId),
    /// What may follow an item of a separated loop: `(sep item)*`.
    AfterItem(DefId),
    /// What must follow a separator: `item (sep item)*`.
    AfterSeparator(DefId),
}

/// Immutable, validated grammar.
pub struct Grammar {
    rules: Vec<Rule>,
    /// Structural definition behind each alias/forward/default chain.
    resolved: Vec<DefId>,
    /// Exact matcher per pattern leaf, `None` for every other rule.
    leaves: Vec<Option<meta::Regex>>,
    names: Interner,
    limits: Limits,
    regexes: Vec<OnceCell<String>>,
    matchers: Vec<OnceCell<Matcher>>,
    tails: RefCell<HashMap<TailKey, Rc<Matcher>>>,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.rules)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Grammar {
    pub(crate) fn new(
        rules: Vec<Rule>,
        resolved: Vec<DefId>,
        leaves: Vec<Option<meta::Regex>>,
        names: Interner,
        limits: Limits,
    ) -> Self {
        let len = rules.len();
        Self {
            rules,
            resolved,
            leaves,
            names,
            limits,
            regexes: (0..len).map(|_| OnceCell::new()).collect(),
            matchers: (0..len).map(|_| OnceCell::new()).collect(),
            tails: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `def` is in range for this grammar. `DefId`s carry no
    /// grammar identity, so an in-range id from another grammar passes too.
    pub fn contains(&self, def: DefId) -> bool {
        def.index() < self.rules.len()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The rule exactly as declared.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn rule(&self, def: DefId) -> &Rule {
        &self.rules[def.index()]
    }

    /// Follow alias, forward and default-content indirections.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn resolve(&self, def: DefId) -> DefId {
        self.resolved[def.index()]
    }

    /// The structural rule a definition behaves as.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn shape(&self, def: DefId) -> &Rule {
        self.rule(self.resolve(def))
    }

    /// Field name of a definition, if any alias on its chain carries one.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn name(&self, def: DefId) -> Option<&str> {
        let mut current = def;
        loop {
            match self.rule(current) {
                Rule::Alias {
                    name: Some(name), ..
                } => return self.names.resolve(*name),
                Rule::Alias { target, .. }
                | Rule::Forward(target)
                | Rule::WithDefault { target, .. } => current = *target,
                _ => return None,
            }
        }
    }

    /// Content a fresh node of this definition starts with.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn default_content(&self, def: DefId) -> Option<&str> {
        let mut current = def;
        loop {
            match self.rule(current) {
                Rule::WithDefault { content, .. } => return Some(content),
                Rule::Alias { target, .. } | Rule::Forward(target) => current = *target,
                _ => return None,
            }
        }
    }

    /// Quantifier of an Option, Loop or SeparatedLoop definition.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn quantifier(&self, def: DefId) -> Option<Quantifier> {
        match self.shape(def) {
            Rule::Optional { quantifier, .. } => Some(*quantifier),
            Rule::Loop { repetition, .. } | Rule::Separated { repetition, .. } => {
                Some(repetition.quantifier)
            }
            _ => None,
        }
    }

    /// Non-capturing feasibility regex of a definition, without anchors.
    ///
    /// Rendered lazily and cached. Self-referential definitions are cut off
    /// with a wildcard once they re-enter themselves `Limits::regex_depth`
    /// times.
    ///
    /// # Panics
    /// Panics if `def` does not belong to this grammar.
    pub fn regex(&self, def: DefId) -> &str {
        self.regexes[def.index()].get_or_init(|| {
            regex::RegexRenderer::new(&self.rules, self.limits.regex_depth).render(def)
        })
    }

    pub(crate) fn matcher(&self, def: DefId) -> &Matcher {
        self.matchers[def.index()].get_or_init(|| Matcher::new(self.regex(def).to_string()))
    }

    /// Whether `text` is exactly a match of the pattern leaf behind `def`.
    /// Unlike the feasibility regex this is never widened.
    pub(crate) fn leaf_matches(&self, def: DefId, text: &str) -> bool {
        self.leaves[self.resolve(def).index()]
            .as_ref()
            .is_some_and(|regex| regex.is_match(text))
    }

    /// Whether `text` fully matches the feasibility regex of `def`.
    pub(crate) fn feasible(&self, def: DefId, text: &str) -> bool {
        self.matcher(def).is_match(text)
    }

    pub(crate) fn tail(&self, key: TailKey) -> Rc<Matcher> {
        if let Some(matcher) = self.tails.borrow().get(&key) {
            return Rc::clone(matcher);
        }
        let matcher = Rc::new(Matcher::new(self.tail_pattern(key)));
        self.tails.borrow_mut().insert(key, Rc::clone(&matcher));
        matcher
    }

    fn tail_pattern(&self, key: TailKey) -> String {
        match key {
            TailKey::Sequence(def, from) => match self.shape(def) {
                Rule::Sequence(items) => items
                    .iter()
                    .skip(from)
                    .map(|item| format!("(?:{})", self.regex(*item)))
                    .collect(),
                _ => String::new(),
            },
            TailKey::Loop(def) => match self.shape(def) {
                Rule::Loop { item, .. } => format!("(?:{})*", self.regex(*item)),
                _ => String::new(),
            },
            TailKey::AfterItem(def) => match self.shape(def) {
                Rule::Separated {
                    item, separator, ..
                } => format!(
                    "(?:(?:{})(?:{}))*",
                    self.regex(*separator),
                    self.regex(*item)
                ),
                _ => String::new(),
            },
            TailKey::AfterSeparator(def) => match self.shape(def) {
                Rule::Separated {
                    item, separator, ..
                } => {
                    let item = self.regex(*item);
                    format!(
                        "(?:{item})(?:(?:{})(?:{item}))*",
                        self.regex(*separator)
                    )
                }
                _ => String::new(),
            },
        }
    }

    pub(crate) fn names(&self) -> &Interner {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (DefId::from_index(i), rule))
    }
}
