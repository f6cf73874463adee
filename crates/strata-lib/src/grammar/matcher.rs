//! Anchored matchers over feasibility regexes.
//!
//! A `Matcher` answers three questions about a haystack: does the whole of it
//! match, which prefixes match, and which suffixes match. The first uses the
//! `meta` regex engine; the other two walk anchored dense DFAs (the reverse
//! one for suffixes) in `MatchKind::All` mode so every match end is seen, not
//! only the leftmost-first one.
//!
//! Everything is compiled on first use. A pattern the DFA builder refuses (too
//! large, or using Unicode word boundaries) falls back to probing each char
//! boundary with the exact regex. A composite regex nothing can compile
//! matches everything, which keeps the matcher a necessary condition. Pattern
//! leaves never get there: the builder already refused any it could not
//! compile.

use std::cell::OnceCell;

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::nfa::thompson;
use regex_automata::{Anchored, Input, MatchKind, meta};

const DFA_SIZE_LIMIT: usize = 1 << 22;

type Dfa = dense::DFA<Vec<u32>>;

pub(crate) struct Matcher {
    pattern: String,
    exact: OnceCell<Option<meta::Regex>>,
    forward: OnceCell<Option<Dfa>>,
    reverse: OnceCell<Option<Dfa>>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl Matcher {
    pub(crate) fn new(pattern: String) -> Self {
        Self {
            pattern,
            exact: OnceCell::new(),
            forward: OnceCell::new(),
            reverse: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the whole haystack matches.
    pub(crate) fn is_match(&self, haystack: &str) -> bool {
        match self.exact() {
            Some(regex) => regex.is_match(haystack),
            None => true,
        }
    }

    /// Byte offsets `e` (ascending) such that `haystack[..e]` matches.
    pub(crate) fn prefix_ends(&self, haystack: &str) -> Vec<usize> {
        let mut ends = match self.forward() {
            Some(dfa) => match scan_forward(dfa, haystack) {
                Some(ends) => ends,
                None => self.probe(haystack, |e| &haystack[..e]),
            },
            None => self.probe(haystack, |e| &haystack[..e]),
        };
        ends.retain(|&e| haystack.is_char_boundary(e));
        ends
    }

    /// `starts[s]` is true when `haystack[s..]` matches.
    pub(crate) fn suffix_starts(&self, haystack: &str) -> Vec<bool> {
        let positions = match self.reverse() {
            Some(dfa) => match scan_reverse(dfa, haystack) {
                Some(starts) => starts,
                None => self.probe(haystack, |s| &haystack[s..]),
            },
            None => self.probe(haystack, |s| &haystack[s..]),
        };
        let mut starts = vec![false; haystack.len() + 1];
        for s in positions {
            if haystack.is_char_boundary(s) {
                starts[s] = true;
            }
        }
        starts
    }

    fn probe<'h>(&self, haystack: &'h str, slice: impl Fn(usize) -> &'h str) -> Vec<usize> {
        (0..=haystack.len())
            .filter(|&at| haystack.is_char_boundary(at) && self.is_match(slice(at)))
            .collect()
    }

    fn exact(&self) -> Option<&meta::Regex> {
        self.exact
            .get_or_init(|| meta::Regex::new(&format!(r"\A(?:{})\z", self.pattern)).ok())
            .as_ref()
    }

    fn forward(&self) -> Option<&Dfa> {
        self.forward
            .get_or_init(|| build_dfa(&self.pattern, false))
            .as_ref()
    }

    fn reverse(&self) -> Option<&Dfa> {
        self.reverse
            .get_or_init(|| build_dfa(&self.pattern, true))
            .as_ref()
    }
}

fn build_dfa(pattern: &str, reverse: bool) -> Option<Dfa> {
    dense::Builder::new()
        .configure(
            dense::DFA::config()
                .start_kind(StartKind::Anchored)
                .match_kind(MatchKind::All)
                .dfa_size_limit(Some(DFA_SIZE_LIMIT))
                .determinize_size_limit(Some(DFA_SIZE_LIMIT)),
        )
        .thompson(thompson::Config::new().reverse(reverse))
        .build(pattern)
        .ok()
}

/// Every prefix end, or `None` when the DFA gave up (quit state).
fn scan_forward(dfa: &Dfa, haystack: &str) -> Option<Vec<usize>> {
    let input = Input::new(haystack).anchored(Anchored::Yes);
    let mut state = dfa.start_state_forward(&input).ok()?;
    let mut ends = Vec::new();

    // Matches are reported one byte late.
    for (at, &byte) in haystack.as_bytes().iter().enumerate() {
        state = dfa.next_state(state, byte);
        if !dfa.is_special_state(state) {
            continue;
        }
        if dfa.is_match_state(state) {
            ends.push(at);
        } else if dfa.is_dead_state(state) {
            return Some(ends);
        } else if dfa.is_quit_state(state) {
            return None;
        }
    }

    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        ends.push(haystack.len());
    }
    Some(ends)
}

/// Every suffix start (descending), or `None` when the DFA gave up.
fn scan_reverse(dfa: &Dfa, haystack: &str) -> Option<Vec<usize>> {
    let input = Input::new(haystack).anchored(Anchored::Yes);
    let mut state = dfa.start_state_reverse(&input).ok()?;
    let mut starts = Vec::new();

    for (at, &byte) in haystack.as_bytes().iter().enumerate().rev() {
        state = dfa.next_state(state, byte);
        if !dfa.is_special_state(state) {
            continue;
        }
        if dfa.is_match_state(state) {
            starts.push(at + 1);
        } else if dfa.is_dead_state(state) {
            return Some(starts);
        } else if dfa.is_quit_state(state) {
            return None;
        }
    }

    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        starts.push(0);
    }
    Some(starts)
}
