//! Boundary resolution.
//!
//! Composite regexes never capture, so they cannot say which child consumed
//! which part of the content. The search here decides it instead, by trying
//! candidate splits depth-first and backtracking over rejected ones. It works
//! on definitions, not nodes: the outcome is a `Split` describing the whole
//! structure, and the tree is only touched once a split exists.
//!
//! Candidates for an item at a cursor are the ends of the prefixes its regex
//! matches, ordered by the item's own quantifier (greedy longest-first, lazy
//! shortest-first, possessive the longest only). In pruning mode, candidates
//! whose remainder cannot match the regex of what must follow are skipped.
//! When the pruned search fails, it runs again unpruned so the reported
//! failure is the deepest real one rather than the first regex miss.

mod repeat;


use std::collections::HashSet;

use crate::diagnostics::{ParseError, Reason};
use crate::grammar::{DefId, Grammar, Quantifier, Rule, TailKey};
use crate::trace::Tracer;
use crate::{Error, Result};

/// Outcome of resolving a definition over `start..end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Split {
    pub start: usize,
    pub end: usize,
    pub shape: SplitShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SplitShape {
    Leaf,
    Sequence(Vec<Split>),
    Choice { index: usize, inner: Box<Split> },
    Optional(Option<Box<Split>>),
    Loop(Vec<Split>),
    Separated {
        items: Vec<Split>,
        separators: Vec<Split>,
    },
}

/// Why a search path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    /// The candidate does not parse; try the next one.
    Rejected,
    /// Nesting exceeded `Limits::recursion_limit`; the whole search stops.
    RecursionLimit,
}

type Attempt<T> = std::result::Result<T, Abort>;

#[derive(Debug, Clone, Copy)]
struct Failure {
    def: DefId,
    start: usize,
    end: usize,
    reason: Reason,
}

/// Split `text` as a whole according to `def`.
pub(crate) fn resolve<T: Tracer>(
    grammar: &Grammar,
    def: DefId,
    text: &str,
    tracer: &mut T,
) -> Result<Split> {
    let pruned = if grammar.feasible(def, text) {
        Searcher::new(grammar, text, &mut *tracer, true).parse(def, 0, text.len())
    } else {
        Err(Abort::Rejected)
    };
    match pruned {
        Ok(split) => return Ok(split),
        Err(Abort::RecursionLimit) => return Err(Error::RecursionLimitExceeded),
        Err(Abort::Rejected) => {}
    }

    let mut searcher = Searcher::new(grammar, text, tracer, false);
    match searcher.parse(def, 0, text.len()) {
        Ok(split) => Ok(split),
        Err(Abort::RecursionLimit) => Err(Error::RecursionLimitExceeded),
        Err(Abort::Rejected) => Err(searcher.report(def)),
    }
}

struct Searcher<'a, T: Tracer> {
    grammar: &'a Grammar,
    text: &'a str,
    tracer: &'a mut T,
    prune: bool,
    /// `(definition, start, end)` triples on the current path.
    active: HashSet<(DefId, usize, usize)>,
    /// Triples known to fail regardless of the path.
    failed: HashSet<(DefId, usize, usize)>,
    /// Rejections caused by `active`; such failures depend on the path.
    guard_hits: usize,
    depth: u32,
    furthest: Option<Failure>,
}

/// Per-invocation state of a sequence search.
struct SequenceState {
    base: usize,
    end: usize,
    tails: Vec<Option<Vec<bool>>>,
    dead: HashSet<(usize, usize)>,
    children: Vec<Split>,
}

impl<'a, T: Tracer> Searcher<'a, T> {
    fn new(grammar: &'a Grammar, text: &'a str, tracer: &'a mut T, prune: bool) -> Self {
        Self {
            grammar,
            text,
            tracer,
            prune,
            active: HashSet::new(),
            failed: HashSet::new(),
            guard_hits: 0,
            depth: 0,
            furthest: None,
        }
    }

    fn parse(&mut self, def: DefId, start: usize, end: usize) -> Attempt<Split> {
        let key = (self.grammar.resolve(def), start, end);
        if self.failed.contains(&key) {
            return Err(Abort::Rejected);
        }
        if self.active.contains(&key) {
            self.guard_hits += 1;
            return Err(Abort::Rejected);
        }
        let limit = self.grammar.limits().recursion_limit;
        if limit.is_some_and(|limit| self.depth >= limit) {
            return Err(Abort::RecursionLimit);
        }

        self.tracer
            .trace_enter(def, start..end, &self.text[start..end]);
        self.active.insert(key);
        self.depth += 1;
        let hits = self.guard_hits;

        let result = self.parse_shape(def, start, end);

        self.depth -= 1;
        self.active.remove(&key);
        match result {
            Ok(_) => self.tracer.trace_accept(def, start..end),
            Err(abort) => {
                self.tracer.trace_reject(def, start..end);
                if abort == Abort::Rejected && self.guard_hits == hits {
                    self.failed.insert(key);
                }
            }
        }
        result
    }

    fn parse_shape(&mut self, def: DefId, start: usize, end: usize) -> Attempt<Split> {
        let grammar = self.grammar;
        let text = self.text;
        let slice = &text[start..end];
        let shape = match grammar.shape(def) {
            Rule::Literal(literal) => {
                if slice != literal.as_str() {
                    return Err(self.fail(def, start, end, Reason::Mismatch));
                }
                SplitShape::Leaf
            }
            Rule::Pattern(_) => {
                if !grammar.leaf_matches(def, slice) {
                    return Err(self.fail(def, start, end, Reason::Mismatch));
                }
                SplitShape::Leaf
            }
            Rule::Empty => {
                if start != end {
                    return Err(self.fail(def, start, end, Reason::Mismatch));
                }
                SplitShape::Leaf
            }
            Rule::Sequence(items) => return self.sequence(def, items, start, end),
            Rule::Choice(alternatives) => return self.choice(def, alternatives, start, end),
            Rule::Optional { item, .. } => {
                if start == end {
                    SplitShape::Optional(None)
                } else {
                    let inner = self.parse(*item, start, end)?;
                    SplitShape::Optional(Some(Box::new(inner)))
                }
            }
            Rule::Loop { item, repetition } => {
                return self.repeat(def, *item, None, *repetition, start, end);
            }
            Rule::Separated {
                item,
                separator,
                repetition,
                ..
            } => {
                return self.repeat(def, *item, Some(*separator), *repetition, start, end);
            }
            Rule::Alias { .. } | Rule::Forward(_) | Rule::WithDefault { .. } => {
                unreachable!("shape() resolves indirections")
            }
        };
        Ok(Split { start, end, shape })
    }

    fn sequence(&mut self, def: DefId, items: &'a [DefId], start: usize, end: usize) -> Attempt<Split> {
        let mut state = SequenceState {
            base: start,
            end,
            tails: vec![None; items.len()],
            dead: HashSet::new(),
            children: Vec::with_capacity(items.len()),
        };
        self.sequence_from(def, items, 0, start, &mut state)?;
        Ok(Split {
            start,
            end,
            shape: SplitShape::Sequence(state.children),
        })
    }

    /// Distribute `cursor..end` over `items[k..]`.
    fn sequence_from(
        &mut self,
        def: DefId,
        items: &'a [DefId],
        k: usize,
        cursor: usize,
        state: &mut SequenceState,
    ) -> Attempt<()> {
        let end = state.end;
        let Some(&item) = items.get(k) else {
            if cursor == end {
                return Ok(());
            }
            return Err(self.fail(def, cursor, end, Reason::TrailingContent));
        };
        if state.dead.contains(&(k, cursor)) {
            return Err(Abort::Rejected);
        }

        let mut ends = self.item_ends(item, cursor, end, None);
        if self.prune {
            let base = state.base;
            let starts = state.tails[k].get_or_insert_with(|| {
                let key = TailKey::Sequence(self.grammar.resolve(def), k + 1);
                self.grammar
                    .tail(key)
                    .suffix_starts(&self.text[base..end])
            });
            ends.retain(|&e| starts[e - base]);
        }
        if ends.is_empty() {
            return Err(self.fail(item, cursor, end, Reason::Mismatch));
        }

        for e in ends {
            match self.parse(item, cursor, e) {
                Ok(split) => {
                    state.children.push(split);
                    match self.sequence_from(def, items, k + 1, e, state) {
                        Ok(()) => return Ok(()),
                        Err(Abort::Rejected) => {
                            state.children.pop();
                        }
                        Err(abort) => return Err(abort),
                    }
                }
                Err(Abort::Rejected) => {}
                Err(abort) => return Err(abort),
            }
            self.tracer.trace_backtrack(def, e);
        }
        state.dead.insert((k, cursor));
        Err(Abort::Rejected)
    }

    fn choice(
        &mut self,
        def: DefId,
        alternatives: &'a [DefId],
        start: usize,
        end: usize,
    ) -> Attempt<Split> {
        let text = self.text;
        let slice = &text[start..end];
        for (index, &alternative) in alternatives.iter().enumerate() {
            if self.prune && !self.grammar.feasible(alternative, slice) {
                continue;
            }
            match self.parse(alternative, start, end) {
                Ok(inner) => {
                    return Ok(Split {
                        start,
                        end,
                        shape: SplitShape::Choice {
                            index,
                            inner: Box::new(inner),
                        },
                    });
                }
                Err(Abort::Rejected) => {}
                Err(abort) => return Err(abort),
            }
        }
        Err(self.fail(def, start, end, Reason::NoAlternative))
    }

    /// Candidate ends for `item` at `cursor`, in the order to try them:
    /// `order` when given, else the item's own quantifier.
    fn item_ends(
        &self,
        item: DefId,
        cursor: usize,
        end: usize,
        order: Option<Quantifier>,
    ) -> Vec<usize> {
        let mut ends: Vec<usize> = self
            .grammar
            .matcher(item)
            .prefix_ends(&self.text[cursor..end])
            .into_iter()
            .map(|e| cursor + e)
            .collect();
        let quantifier = order
            .or_else(|| self.grammar.quantifier(item))
            .unwrap_or_default();
        match quantifier {
            Quantifier::Greedy => {
                ends.reverse();
                ends
            }
            Quantifier::Lazy => ends,
            Quantifier::Possessive => ends.pop().into_iter().collect(),
        }
    }

    /// Record a failure and return the rejection to propagate.
    ///
    /// The failure starting furthest into the content is kept; at equal
    /// starts the latest one wins, which is the enclosing definition.
    fn fail(&mut self, def: DefId, start: usize, end: usize, reason: Reason) -> Abort {
        if self.furthest.is_none_or(|furthest| start >= furthest.start) {
            self.furthest = Some(Failure {
                def,
                start,
                end,
                reason,
            });
        }
        Abort::Rejected
    }

    fn report(&mut self, def: DefId) -> Error {
        let failure = self.furthest.take().unwrap_or(Failure {
            def,
            start: 0,
            end: self.text.len(),
            reason: Reason::Mismatch,
        });
        let regex = match failure.reason {
            Reason::NoAlternative => None,
            _ => Some(self.grammar.regex(failure.def).to_string()),
        };
        Error::Incompatible(Box::new(ParseError {
            definition: failure.def,
            name: self.grammar.name(failure.def).map(str::to_string),
            regex,
            content: self.text.to_string(),
            range: failure.start..failure.end,
            reason: failure.reason,
        }))
    }
}
