//! Human-readable grammar listing, one definition per line.

use super::{Grammar, Quantifier, Repetition, Rule};

impl Grammar {
    /// ```text
    /// #0 = lit "<a>"
    /// #1 = pat /[0-9]+/
    /// #2 = seq(#0 #1)
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (def, rule) in self.iter() {
            out.push_str(&format!("{def} = {}\n", self.describe(rule)));
        }
        out
    }

    fn describe(&self, rule: &Rule) -> String {
        match rule {
            Rule::Literal(text) => format!("lit {text:?}"),
            Rule::Pattern(pattern) => format!("pat /{pattern}/"),
            Rule::Empty => "empty".to_string(),
            Rule::Sequence(items) => format!("seq({})", join(items, " ")),
            Rule::Choice(alternatives) => format!("choice({})", join(alternatives, " | ")),
            Rule::Optional { item, quantifier } => {
                format!("opt({item}){}", quantifier_suffix(*quantifier))
            }
            Rule::Loop { item, repetition } => {
                format!("loop({item}) {}", bounds(repetition))
            }
            Rule::Separated {
                item,
                separator,
                default_separator,
                repetition,
            } => {
                let mut out = format!("sep({item} by {separator}) {}", bounds(repetition));
                if let Some(text) = default_separator {
                    out.push_str(&format!(" default {text:?}"));
                }
                out
            }
            Rule::Alias { target, name: None } => format!("alias({target})"),
            Rule::Alias {
                target,
                name: Some(name),
            } => match self.names().resolve(*name) {
                Some(name) => format!("field {name}: {target}"),
                None => format!("field {name}: {target}"),
            },
            Rule::Forward(target) => format!("forward({target})"),
            Rule::WithDefault { content, target } => format!("default({content:?}, {target})"),
        }
    }
}

fn join(defs: &[super::DefId], sep: &str) -> String {
    defs.iter()
        .map(|def| def.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn bounds(repetition: &Repetition) -> String {
    format!("{repetition}{}", quantifier_suffix(repetition.quantifier))
}

fn quantifier_suffix(quantifier: Quantifier) -> &'static str {
    match quantifier {
        Quantifier::Greedy => "",
        Quantifier::Lazy => " lazy",
        Quantifier::Possessive => " possessive",
    }
}
