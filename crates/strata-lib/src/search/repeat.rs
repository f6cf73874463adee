//! Loop and separated-loop search.
//!
//! Repetitions can be long, so they are searched with an explicit stack of
//! frames instead of recursion. The elements found so far form a trail:
//! every element is an item for a loop, and items alternate with separators
//! for a separated loop (`item sep item sep item`). Each frame holds the
//! candidate ends still to be tried for the next element.
//!
//! The search stops with success only at the end of the range, after an item
//! (or with no element at all), and with an admissible item count. States
//! that were fully explored without success are remembered per invocation.
//!
//! The loop's quantifier orders each item's candidate ends: a greedy loop
//! wants as many items as possible and tries the shortest item first (with a
//! zero-width item last), a lazy loop tries the longest first, and a
//! possessive loop only ever takes the longest. Separators keep their own
//! order.

use std::collections::HashSet;

use crate::diagnostics::Reason;
use crate::grammar::{DefId, Quantifier, Repetition, TailKey};
use crate::trace::Tracer;

use super::{Abort, Attempt, Searcher, Split, SplitShape};

struct Frame {
    element: DefId,
    cursor: usize,
    ends: Vec<usize>,
    next: usize,
    key: StateKey,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct StateKey {
    cursor: usize,
    started: bool,
    expects_separator: bool,
    after_empty_separator: bool,
    count: usize,
}

/// Remainder filters used while pruning.
struct Tails {
    after_item: Vec<bool>,
    after_separator: Vec<bool>,
}

impl<T: Tracer> Searcher<'_, T> {
    pub(super) fn repeat(
        &mut self,
        def: DefId,
        item: DefId,
        separator: Option<DefId>,
        repetition: Repetition,
        start: usize,
        end: usize,
    ) -> Attempt<Split> {
        let item_order = match repetition.quantifier {
            Quantifier::Greedy => Quantifier::Lazy,
            Quantifier::Lazy => Quantifier::Greedy,
            Quantifier::Possessive => Quantifier::Possessive,
        };
        let tails = self.prune.then(|| self.repeat_tails(def, separator.is_some(), start, end));

        let mut trail: Vec<Split> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut dead: HashSet<StateKey> = HashSet::new();
        let mut cursor = start;

        'advance: loop {
            let expects_separator = separator.is_some() && trail.len() % 2 == 1;
            let after_separator = separator.is_some() && !trail.is_empty() && !expects_separator;
            let count = match separator {
                Some(_) => trail.len().div_ceil(2),
                None => trail.len(),
            };
            // Whether the next element adds an item (a separator commits to one).
            let grows = !after_separator;

            if cursor == end && !after_separator && repetition.admits(count) {
                return Ok(Split {
                    start,
                    end,
                    shape: into_shape(trail, separator.is_some()),
                });
            }

            let after_empty_separator =
                after_separator && trail.last().is_some_and(|s| s.start == s.end);
            let key = StateKey {
                cursor,
                started: !trail.is_empty(),
                expects_separator,
                after_empty_separator,
                count: match repetition.max {
                    Some(_) => count,
                    None => count.min(repetition.min),
                },
            };

            let element = match separator {
                Some(separator) if expects_separator => separator,
                _ => item,
            };
            let mut ends = Vec::new();
            if dead.contains(&key) {
                // Explored before, from another path.
            } else if grows && repetition.max.is_some_and(|max| count >= max) {
                if cursor < end {
                    self.fail(def, cursor, end, Reason::TooManyItems);
                }
            } else {
                let order = (!expects_separator).then_some(item_order);
                ends = self.item_ends(element, cursor, end, order);
                if order == Some(Quantifier::Lazy) && ends.len() > 1 && ends[0] == cursor {
                    ends.rotate_left(1);
                }
                let below_min = count < repetition.min;
                match separator {
                    None => ends.retain(|&e| e > cursor || below_min),
                    Some(_) if after_empty_separator => ends.retain(|&e| e > cursor || below_min),
                    Some(_) => {}
                }
                if let Some(tails) = &tails {
                    let filter = if expects_separator {
                        &tails.after_separator
                    } else {
                        &tails.after_item
                    };
                    ends.retain(|&e| filter[e - start]);
                }
                if ends.is_empty() {
                    if cursor == end && grows && below_min {
                        self.fail(def, cursor, end, Reason::TooFewItems);
                    } else {
                        self.fail(element, cursor, end, Reason::Mismatch);
                    }
                }
            }
            frames.push(Frame {
                element,
                cursor,
                ends,
                next: 0,
                key,
            });

            loop {
                let Some(frame) = frames.last_mut() else {
                    return Err(Abort::Rejected);
                };
                if let Some(&e) = frame.ends.get(frame.next) {
                    frame.next += 1;
                    let (element, at) = (frame.element, frame.cursor);
                    match self.parse(element, at, e) {
                        Ok(split) => {
                            trail.push(split);
                            cursor = e;
                            continue 'advance;
                        }
                        Err(Abort::Rejected) => self.tracer.trace_backtrack(def, e),
                        Err(abort) => return Err(abort),
                    }
                } else {
                    dead.insert(frame.key);
                    frames.pop();
                    if frames.is_empty() {
                        return Err(Abort::Rejected);
                    }
                    if let Some(undone) = trail.pop() {
                        self.tracer.trace_backtrack(def, undone.end);
                    }
                }
            }
        }
    }

    fn repeat_tails(&self, def: DefId, separated: bool, start: usize, end: usize) -> Tails {
        let def = self.grammar.resolve(def);
        let rest = &self.text[start..end];
        if !separated {
            let after_item = self.grammar.tail(TailKey::Loop(def)).suffix_starts(rest);
            return Tails {
                after_item,
                after_separator: Vec::new(),
            };
        }
        Tails {
            after_item: self.grammar.tail(TailKey::AfterItem(def)).suffix_starts(rest),
            after_separator: self
                .grammar
                .tail(TailKey::AfterSeparator(def))
                .suffix_starts(rest),
        }
    }
}

fn into_shape(trail: Vec<Split>, separated: bool) -> SplitShape {
    if !separated {
        return SplitShape::Loop(trail);
    }
    let mut items = Vec::with_capacity(trail.len().div_ceil(2));
    let mut separators = Vec::with_capacity(trail.len() / 2);
    for (i, split) in trail.into_iter().enumerate() {
        if i % 2 == 0 {
            items.push(split);
        } else {
            separators.push(split);
        }
    }
    SplitShape::Separated { items, separators }
}
