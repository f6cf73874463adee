//! Two-phase grammar construction.
//!
//! Factory methods hand out `DefId`s immediately and never fail; everything
//! that can be wrong with a rule is reported by `build`. The exception is
//! `bind`, whose misuse is reported at the call site.

use std::fmt;

use indexmap::IndexSet;
use regex_automata::meta;
use strata_core::Interner;

use crate::Limits;
use crate::search;
use crate::trace::NoopTracer;

use super::{DefId, Grammar, Quantifier, Repetition, Rule};

/// Errors reported while assembling a grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("forward reference {def} was never bound")]
    UnboundReference { def: DefId },

    #[error("forward reference {def} is already bound")]
    AlreadyBound { def: DefId },

    #[error("{def} is not a forward reference")]
    NotAForwardReference { def: DefId },

    #[error("{def} does not belong to this grammar")]
    UnknownDefinition { def: DefId },

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid repetition bounds {min}..{}", fmt_max(.max))]
    InvalidBounds { min: usize, max: Option<usize> },

    /// A cycle of eagerly created definitions: no finite text satisfies it.
    #[error("infinite recursion through {}", fmt_cycle(.cycle))]
    InfiniteRecursion { cycle: Vec<DefId> },

    /// An alias or forward chain that loops back onto itself.
    #[error("{def} refers to itself without ever reaching a rule")]
    UnresolvableReference { def: DefId },

    #[error("default content {text:?} of {def} is rejected: {message}")]
    InvalidDefault {
        def: DefId,
        text: String,
        message: String,
    },
}

fn fmt_max(max: &Option<usize>) -> String {
    match max {
        Some(max) => format!("={max}"),
        None => String::new(),
    }
}

fn fmt_cycle(cycle: &[DefId]) -> String {
    let mut out = String::new();
    for def in cycle {
        out.push_str(&format!("{def} -> "));
    }
    if let Some(first) = cycle.first() {
        out.push_str(&first.to_string());
    }
    out
}

enum Slot {
    Bound(Rule),
    Unbound,
}

/// Collects rules and produces a validated `Grammar`.
#[derive(Default)]
pub struct GrammarBuilder {
    slots: Vec<Slot>,
    names: Interner,
    limits: Limits,
}

impl fmt::Debug for GrammarBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarBuilder")
            .field("definitions", &self.slots.len())
            .field("limits", &self.limits)
            .finish()
    }
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    fn push(&mut self, rule: Rule) -> DefId {
        let id = DefId::from_index(self.slots.len());
        self.slots.push(Slot::Bound(rule));
        id
    }

    pub fn literal(&mut self, text: impl Into<String>) -> DefId {
        self.push(Rule::Literal(text.into()))
    }

    /// Regex leaf. The pattern must not contain anchors.
    pub fn pattern(&mut self, pattern: impl Into<String>) -> DefId {
        self.push(Rule::Pattern(pattern.into()))
    }

    pub fn empty(&mut self) -> DefId {
        self.push(Rule::Empty)
    }

    pub fn sequence(&mut self, items: impl IntoIterator<Item = DefId>) -> DefId {
        self.push(Rule::Sequence(items.into_iter().collect()))
    }

    pub fn choice(&mut self, alternatives: impl IntoIterator<Item = DefId>) -> DefId {
        self.push(Rule::Choice(alternatives.into_iter().collect()))
    }

    pub fn optional(&mut self, item: DefId, quantifier: Quantifier) -> DefId {
        self.push(Rule::Optional { item, quantifier })
    }

    pub fn repeat(&mut self, item: DefId, repetition: Repetition) -> DefId {
        self.push(Rule::Loop { item, repetition })
    }

    /// Items interleaved with separators. `default_separator` is the text
    /// used when an item is spliced into the loop.
    pub fn separated(
        &mut self,
        item: DefId,
        separator: DefId,
        default_separator: Option<&str>,
        repetition: Repetition,
    ) -> DefId {
        self.push(Rule::Separated {
            item,
            separator,
            default_separator: default_separator.map(str::to_string),
            repetition,
        })
    }

    pub fn alias(&mut self, target: DefId) -> DefId {
        self.push(Rule::Alias { target, name: None })
    }

    /// Alias carrying a field name, for `Tree::field` lookups.
    pub fn named(&mut self, name: &str, target: DefId) -> DefId {
        let name = self.names.intern(name);
        self.push(Rule::Alias {
            target,
            name: Some(name),
        })
    }

    pub fn with_default(&mut self, content: impl Into<String>, target: DefId) -> DefId {
        self.push(Rule::WithDefault {
            content: content.into(),
            target,
        })
    }

    /// Placeholder to be bound exactly once with `bind`.
    pub fn forward(&mut self) -> DefId {
        let id = DefId::from_index(self.slots.len());
        self.slots.push(Slot::Unbound);
        id
    }

    pub fn bind(&mut self, reference: DefId, target: DefId) -> Result<(), GrammarError> {
        if target.index() >= self.slots.len() {
            return Err(GrammarError::UnknownDefinition { def: target });
        }
        let slot = self
            .slots
            .get_mut(reference.index())
            .ok_or(GrammarError::UnknownDefinition { def: reference })?;
        match slot {
            Slot::Unbound => {
                *slot = Slot::Bound(Rule::Forward(target));
                Ok(())
            }
            Slot::Bound(Rule::Forward(_)) => Err(GrammarError::AlreadyBound { def: reference }),
            Slot::Bound(_) => Err(GrammarError::NotAForwardReference { def: reference }),
        }
    }

    /// Validate every rule and freeze the grammar.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut rules = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Slot::Bound(rule) => rules.push(rule),
                Slot::Unbound => {
                    return Err(GrammarError::UnboundReference {
                        def: DefId::from_index(index),
                    });
                }
            }
        }

        for rule in &rules {
            check_rule(rule, rules.len())?;
        }
        let leaves = compile_leaves(&rules)?;
        let resolved = resolve_chains(&rules)?;
        check_eager_cycles(&rules)?;

        let grammar = Grammar::new(rules, resolved, leaves, self.names, self.limits);
        check_defaults(&grammar)?;
        Ok(grammar)
    }
}

fn referenced(rule: &Rule) -> Vec<DefId> {
    match rule {
        Rule::Literal(_) | Rule::Pattern(_) | Rule::Empty => Vec::new(),
        Rule::Sequence(items) | Rule::Choice(items) => items.clone(),
        Rule::Optional { item, .. } | Rule::Loop { item, .. } => vec![*item],
        Rule::Separated {
            item, separator, ..
        } => vec![*item, *separator],
        Rule::Alias { target, .. } | Rule::Forward(target) | Rule::WithDefault { target, .. } => {
            vec![*target]
        }
    }
}

fn check_rule(rule: &Rule, len: usize) -> Result<(), GrammarError> {
    if let Some(def) = referenced(rule).into_iter().find(|def| def.index() >= len) {
        return Err(GrammarError::UnknownDefinition { def });
    }

    match rule {
        Rule::Pattern(pattern) => {
            regex_syntax::Parser::new()
                .parse(pattern)
                .map_err(|err| GrammarError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })?;
        }
        Rule::Loop { repetition, .. } | Rule::Separated { repetition, .. } => {
            let Repetition { min, max, .. } = *repetition;
            if max.is_some_and(|max| max == 0 || min > max) {
                return Err(GrammarError::InvalidBounds { min, max });
            }
        }
        _ => {}
    }
    Ok(())
}

/// Exact, anchored matchers for pattern leaves. A pattern that parses but
/// that the regex engine refuses to compile (past its size limits, say) is
/// rejected here rather than left to match everything.
fn compile_leaves(rules: &[Rule]) -> Result<Vec<Option<meta::Regex>>, GrammarError> {
    rules
        .iter()
        .map(|rule| match rule {
            Rule::Pattern(pattern) => meta::Regex::new(&format!(r"\A(?:{pattern})\z"))
                .map(Some)
                .map_err(|err| GrammarError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                }),
            _ => Ok(None),
        })
        .collect()
}

/// Structural definition behind every alias/forward/default chain.
fn resolve_chains(rules: &[Rule]) -> Result<Vec<DefId>, GrammarError> {
    let mut resolved = Vec::with_capacity(rules.len());
    for index in 0..rules.len() {
        let start = DefId::from_index(index);
        let mut current = start;
        let mut seen = IndexSet::new();
        while let Rule::Alias { target, .. } | Rule::Forward(target) | Rule::WithDefault { target, .. } =
            &rules[current.index()]
        {
            if !seen.insert(current) {
                return Err(GrammarError::UnresolvableReference { def: start });
            }
            current = *target;
        }
        resolved.push(current);
    }
    Ok(resolved)
}

/// Sequences create their items together with themselves, as do indirections.
/// A cycle over those edges can never be instantiated.
fn check_eager_cycles(rules: &[Rule]) -> Result<(), GrammarError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        OnPath,
        Done,
    }

    fn eager(rule: &Rule) -> Vec<DefId> {
        match rule {
            Rule::Sequence(items) => items.clone(),
            Rule::Alias { target, .. } | Rule::Forward(target) | Rule::WithDefault { target, .. } => {
                vec![*target]
            }
            _ => Vec::new(),
        }
    }

    let mut marks = vec![Mark::New; rules.len()];
    for root in 0..rules.len() {
        if marks[root] != Mark::New {
            continue;
        }

        // (def, next edge to visit)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnPath;
        while let Some(top) = stack.last_mut() {
            let (def, next) = *top;
            let Some(target) = eager(&rules[def]).get(next).map(|t| t.index()) else {
                marks[def] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;
            match marks[target] {
                Mark::New => {
                    marks[target] = Mark::OnPath;
                    stack.push((target, 0));
                }
                Mark::OnPath => {
                    let from = stack
                        .iter()
                        .position(|&(d, _)| d == target)
                        .unwrap_or_default();
                    let cycle = stack[from..]
                        .iter()
                        .map(|&(d, _)| DefId::from_index(d))
                        .collect();
                    return Err(GrammarError::InfiniteRecursion { cycle });
                }
                Mark::Done => {}
            }
        }
    }
    Ok(())
}

/// Default contents must parse as the definition they decorate.
fn check_defaults(grammar: &Grammar) -> Result<(), GrammarError> {
    for (def, rule) in grammar.iter() {
        let (target, text) = match rule {
            Rule::WithDefault { content, target } => (*target, content),
            Rule::Separated {
                separator,
                default_separator: Some(text),
                ..
            } => (*separator, text),
            _ => continue,
        };
        if let Err(err) = search::resolve(grammar, target, text, &mut NoopTracer) {
            return Err(GrammarError::InvalidDefault {
                def,
                text: text.clone(),
                message: err.to_string(),
            });
        }
    }
    Ok(())
}
