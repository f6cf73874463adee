//! Feasibility regex rendering.
//!
//! Every rule composes its items' patterns inside non-capturing groups. The
//! renderer keeps one depth counter per definition: entering a definition
//! increments its counter, leaving decrements it, and a definition whose
//! counter already reached the limit renders as [`WILDCARD`] instead of
//! expanding. Recursive grammars therefore yield regexes whose size is bounded
//! by the limit, while the structural parse stays unbounded. Leaves cannot
//! recurse and always render exactly, whatever the limit.

use super::{DefId, Quantifier, Repetition, Rule};

/// Any text, newlines included.
pub const WILDCARD: &str = "(?s:.)*";

/// Matches nothing at all, not even the empty string.
pub const NOTHING: &str = r"[^\s\S]";

pub(crate) struct RegexRenderer<'g> {
    rules: &'g [Rule],
    depth: Vec<u32>,
    limit: u32,
}

impl<'g> RegexRenderer<'g> {
    pub(crate) fn new(rules: &'g [Rule], limit: u32) -> Self {
        Self {
            rules,
            depth: vec![0; rules.len()],
            limit,
        }
    }

    pub(crate) fn render(&mut self, def: DefId) -> String {
        let slot = def.index();
        let leaf = matches!(
            self.rules[slot],
            Rule::Literal(_) | Rule::Pattern(_) | Rule::Empty
        );
        if !leaf && self.depth[slot] >= self.limit {
            return WILDCARD.to_string();
        }

        self.depth[slot] += 1;
        let rules = self.rules;
        let out = match &rules[slot] {
            Rule::Literal(text) => regex_syntax::escape(text),
            Rule::Pattern(pattern) => pattern.clone(),
            Rule::Empty => String::new(),
            Rule::Sequence(items) => items
                .iter()
                .map(|item| group(&self.render(*item)))
                .collect(),
            Rule::Choice(alternatives) if alternatives.is_empty() => NOTHING.to_string(),
            Rule::Choice(alternatives) => alternatives
                .iter()
                .map(|alt| group(&self.render(*alt)))
                .collect::<Vec<_>>()
                .join("|"),
            Rule::Optional { item, quantifier } => {
                let mut out = group(&self.render(*item));
                out.push('?');
                if *quantifier == Quantifier::Lazy {
                    out.push('?');
                }
                out
            }
            Rule::Loop { item, repetition } => {
                let inner = self.render(*item);
                repeated(&inner, repetition.min, repetition.max, repetition.quantifier)
            }
            Rule::Separated {
                item,
                separator,
                repetition,
                ..
            } => {
                let item = group(&self.render(*item));
                let separator = group(&self.render(*separator));
                separated(&item, &separator, repetition)
            }
            Rule::Alias { target, .. }
            | Rule::Forward(target)
            | Rule::WithDefault { target, .. } => self.render(*target),
        };
        self.depth[slot] -= 1;
        out
    }
}

fn group(inner: &str) -> String {
    format!("(?:{inner})")
}

/// `(?:inner)` followed by the counted repetition operator.
fn repeated(inner: &str, min: usize, max: Option<usize>, quantifier: Quantifier) -> String {
    let mut out = group(inner);
    match (min, max) {
        (0, None) => out.push('*'),
        (1, None) => out.push('+'),
        (0, Some(1)) => out.push('?'),
        (min, None) => out.push_str(&format!("{{{min},}}")),
        (min, Some(max)) if min == max => out.push_str(&format!("{{{min}}}")),
        (min, Some(max)) => out.push_str(&format!("{{{min},{max}}}")),
    }
    // No possessive operators in the regex syntax; the greedy form is wider.
    if quantifier == Quantifier::Lazy {
        out.push('?');
    }
    out
}

/// `item (sep item){min-1,max-1}`, optional as a whole when `min == 0`.
fn separated(item: &str, separator: &str, repetition: &Repetition) -> String {
    let rest = repeated(
        &format!("{separator}{item}"),
        repetition.min.saturating_sub(1),
        repetition.max.map(|max| max.saturating_sub(1)),
        repetition.quantifier,
    );
    let body = format!("{item}{rest}");
    if repetition.min > 0 {
        return body;
    }
    let mut out = group(&body);
    out.push('?');
    if repetition.quantifier == Quantifier::Lazy {
        out.push('?');
    }
    out
}
