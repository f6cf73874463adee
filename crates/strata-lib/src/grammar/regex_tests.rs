use super::regex::{NOTHING, WILDCARD};
use super::{GrammarBuilder, Quantifier, Repetition};
use crate::Limits;

#[test]
fn literal_is_escaped() {
    let mut g = GrammarBuilder::new();
    let dot = g.literal("a.b(c)");
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(dot), r"a\.b\(c\)");
}

#[test]
fn pattern_is_verbatim() {
    let mut g = GrammarBuilder::new();
    let digits = g.pattern("[0-9]+");
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(digits), "[0-9]+");
}

#[test]
fn empty_renders_nothing() {
    let mut g = GrammarBuilder::new();
    let empty = g.empty();
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(empty), "");
}

#[test]
fn sequence_groups_each_item() {
    let mut g = GrammarBuilder::new();
    let open = g.literal("<a>");
    let digits = g.pattern("[0-9]+");
    let close = g.literal("</a>");
    let element = g.sequence([open, digits, close]);
    let grammar = g.build().unwrap();

    insta::assert_snapshot!(grammar.regex(element), @"(?:<a>)(?:[0-9]+)(?:</a>)");
}

#[test]
fn choice_alternates_groups() {
    let mut g = GrammarBuilder::new();
    let yes = g.literal("true");
    let no = g.literal("false");
    let boolean = g.choice([yes, no]);
    let grammar = g.build().unwrap();

    insta::assert_snapshot!(grammar.regex(boolean), @"(?:true)|(?:false)");
}

#[test]
fn choice_without_alternatives_matches_nothing() {
    let mut g = GrammarBuilder::new();
    let never = g.choice([]);
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(never), NOTHING);
    assert!(!grammar.feasible(never, ""));
}

#[test]
fn nested_choice_is_grouped() {
    let mut g = GrammarBuilder::new();
    let a = g.literal("a");
    let b = g.literal("b");
    let either = g.choice([a, b]);
    let end = g.literal(";");
    let statement = g.sequence([either, end]);
    let grammar = g.build().unwrap();

    insta::assert_snapshot!(grammar.regex(statement), @"(?:(?:a)|(?:b))(?:;)");
}

#[test]
fn optional_quantifiers() {
    let mut g = GrammarBuilder::new();
    let x = g.literal("x");
    let greedy = g.optional(x, Quantifier::Greedy);
    let lazy = g.optional(x, Quantifier::Lazy);
    let possessive = g.optional(x, Quantifier::Possessive);
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(greedy), "(?:x)?");
    assert_eq!(grammar.regex(lazy), "(?:x)??");
    assert_eq!(grammar.regex(possessive), "(?:x)?");
}

#[test]
fn loop_bounds() {
    let mut g = GrammarBuilder::new();
    let x = g.literal("x");
    let any = g.repeat(x, Repetition::any());
    let some = g.repeat(x, Repetition::at_least(1));
    let maybe = g.repeat(x, Repetition::between(0, 1));
    let many = g.repeat(x, Repetition::at_least(2).lazy());
    let range = g.repeat(x, Repetition::between(2, 4));
    let exact = g.repeat(x, Repetition::exactly(3).possessive());
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(any), "(?:x)*");
    assert_eq!(grammar.regex(some), "(?:x)+");
    assert_eq!(grammar.regex(maybe), "(?:x)?");
    assert_eq!(grammar.regex(many), "(?:x){2,}?");
    assert_eq!(grammar.regex(range), "(?:x){2,4}");
    assert_eq!(grammar.regex(exact), "(?:x){3}");
}

#[test]
fn separated_loop_at_least_one() {
    let mut g = GrammarBuilder::new();
    let digits = g.pattern("[0-9]+");
    let comma = g.literal(",");
    let list = g.separated(digits, comma, Some(","), Repetition::at_least(1));
    let grammar = g.build().unwrap();

    insta::assert_snapshot!(grammar.regex(list), @"(?:[0-9]+)(?:(?:,)(?:[0-9]+))*");
}

#[test]
fn separated_loop_may_be_empty() {
    let mut g = GrammarBuilder::new();
    let a = g.literal("a");
    let comma = g.literal(",");
    let list = g.separated(a, comma, None, Repetition::between(0, 3));
    let grammar = g.build().unwrap();

    insta::assert_snapshot!(grammar.regex(list), @"(?:(?:a)(?:(?:,)(?:a)){0,2})?");
    assert!(grammar.feasible(list, ""));
    assert!(grammar.feasible(list, "a,a,a"));
    assert!(!grammar.feasible(list, "a,a,a,a"));
}

#[test]
fn indirections_render_their_target() {
    let mut g = GrammarBuilder::new();
    let digits = g.pattern("[0-9]+");
    let alias = g.alias(digits);
    let named = g.named("number", digits);
    let fallback = g.with_default("0", named);
    let grammar = g.build().unwrap();

    assert_eq!(grammar.regex(alias), "[0-9]+");
    assert_eq!(grammar.regex(named), "[0-9]+");
    assert_eq!(grammar.regex(fallback), "[0-9]+");
}

fn parens(limits: Limits) -> (crate::Grammar, crate::DefId) {
    let mut g = GrammarBuilder::new().limits(limits);
    let inner = g.forward();
    let open = g.literal("(");
    let close = g.literal(")");
    let nested = g.optional(inner, Quantifier::Greedy);
    let group = g.sequence([open, nested, close]);
    g.bind(inner, group).unwrap();
    (g.build().unwrap(), group)
}

#[test]
fn recursion_is_cut_with_wildcard() {
    let (grammar, group) = parens(Limits::new().regex_depth(1));

    insta::assert_snapshot!(grammar.regex(group), @r"(?:\()(?:(?:(?s:.)*)?)(?:\))");
    assert!(grammar.feasible(group, "()"));
    assert!(grammar.feasible(group, "(anything)"));
    assert!(!grammar.feasible(group, "("));
}

#[test]
fn depth_zero_is_all_wildcard() {
    let (grammar, group) = parens(Limits::new().regex_depth(0));

    assert_eq!(grammar.regex(group), WILDCARD);
}

#[test]
fn recursive_regex_is_bounded() {
    let lengths: Vec<usize> = [1, 2, 3, 10]
        .into_iter()
        .map(|depth| {
            let (grammar, group) = parens(Limits::new().regex_depth(depth));
            grammar.regex(group).len()
        })
        .collect();

    assert!(lengths.windows(2).all(|w| w[0] < w[1]));
    // One level per unit of depth, each adding the same wrapper.
    let step = lengths[1] - lengths[0];
    assert_eq!(lengths[2] - lengths[1], step);
    assert_eq!(lengths[3], lengths[0] + 9 * step);
}

#[test]
fn deeper_nesting_stays_feasible() {
    let (grammar, group) = parens(Limits::default());

    assert!(grammar.feasible(group, "((((((((((((((()))))))))))))))"));
    assert!(!grammar.feasible(group, "(()"));
}
