//! End-to-end behaviour of the six node shapes.

use strata_lib::{Error, GrammarBuilder, NodeShape, Quantifier, Reason, Repetition, Tree};

#[test]
fn sequence_exposes_children() {
    let mut g = GrammarBuilder::new();
    let open = g.literal("<a>");
    let digits = g.pattern("[0-9]+");
    let close = g.literal("</a>");
    let element = g.sequence([open, digits, close]);
    let mut tree = Tree::new(g.build().unwrap());
    let root = tree.create(element).unwrap();

    tree.set_content(root, "<a>123</a>").unwrap();

    assert_eq!(tree.content(root).unwrap(), "<a>123</a>");
    let middle = tree.child(root, 1).unwrap();
    assert_eq!(tree.content(middle).unwrap(), "123");
    assert_eq!(tree.child_by_def(root, digits).unwrap(), middle);
}

#[test]
fn greedy_loop_takes_every_item() {
    let mut g = GrammarBuilder::new();
    let digit = g.pattern("[0-9]");
    let digits = g.repeat(digit, Repetition::any());
    let mut tree = Tree::new(g.build().unwrap());
    let node = tree.create(digits).unwrap();

    tree.set_content(node, "123").unwrap();

    let items: Vec<&str> = tree
        .items(node)
        .unwrap()
        .iter()
        .map(|item| tree.content(*item).unwrap())
        .collect();
    assert_eq!(items, ["1", "2", "3"]);
}

#[test]
fn separated_loop_items() {
    let mut g = GrammarBuilder::new();
    let digits = g.pattern("[0-9]+");
    let comma = g.literal(",");
    let list = g.separated(digits, comma, Some(","), Repetition::at_least(1));
    let mut tree = Tree::new(g.build().unwrap());
    let node = tree.create(list).unwrap();

    tree.set_content(node, "12,34,5").unwrap();
    let items: Vec<&str> = tree
        .items(node)
        .unwrap()
        .iter()
        .map(|item| tree.content(*item).unwrap())
        .collect();
    assert_eq!(items, ["12", "34", "5"]);

    let err = tree.set_content(node, "12,,5").unwrap_err();
    let failure = err.parse_error().unwrap();
    assert_eq!(failure.definition, digits);
    assert_eq!(failure.reason, Reason::Mismatch);
    assert_eq!(tree.content(node).unwrap(), "12,34,5");
}

#[test]
fn choice_selects_matching_alternative() {
    let mut g = GrammarBuilder::new();
    let yes = g.literal("true");
    let no = g.literal("false");
    let boolean = g.choice([yes, no]);
    let mut tree = Tree::new(g.build().unwrap());
    let node = tree.create(boolean).unwrap();

    tree.set_content(node, "false").unwrap();

    assert_eq!(tree.current_index(node).unwrap(), Some(1));
    let first = tree.alternative(node, 0).unwrap();
    assert!(matches!(tree.content(first), Err(Error::NoContent(_))));
}

#[test]
fn option_presence() {
    let mut g = GrammarBuilder::new();
    let digits = g.pattern("[0-9]+");
    let maybe = g.optional(digits, Quantifier::Greedy);
    let mut tree = Tree::new(g.build().unwrap());
    let node = tree.create(maybe).unwrap();

    tree.set_content(node, "").unwrap();
    assert!(!tree.is_present(node).unwrap());
    assert_eq!(tree.content(node).unwrap(), "");

    tree.set_content(node, "42").unwrap();
    assert!(tree.is_present(node).unwrap());
    assert_eq!(tree.content(node).unwrap(), "42");
    let child = tree.optional_child(node).unwrap();
    assert_eq!(tree.content(child).unwrap(), "42");
}

#[test]
fn self_referential_regex_is_bounded() {
    let mut g = GrammarBuilder::new();
    let node = g.forward();
    let open = g.literal("(");
    let close = g.literal(")");
    let children = g.repeat(node, Repetition::any());
    let group = g.sequence([open, children, close]);
    g.bind(node, group).unwrap();
    let grammar = g.build().unwrap();

    let regex = grammar.regex(node);
    assert!(regex.contains("(?s:.)*"));
    assert!(regex.len() < 4096);
}

#[test]
fn round_trip_for_every_shape() {
    let mut g = GrammarBuilder::new();
    let word = g.pattern("[a-z]+");
    let digits = g.pattern("[0-9]+");
    let atom = g.choice([word, digits]);
    let sign = g.literal("-");
    let signed = g.optional(sign, Quantifier::Greedy);
    let value = g.sequence([signed, atom]);
    let comma = g.literal(",");
    let values = g.separated(value, comma, Some(","), Repetition::any());
    let space = g.literal(" ");
    let padding = g.repeat(space, Repetition::any());
    let line = g.sequence([padding, values]);
    let mut tree = Tree::new(g.build().unwrap());

    for text in ["", "a", "  -1,b,-cd", " 12,x", "-0"] {
        let root = tree.create(line).unwrap();
        tree.set_content(root, text).unwrap();
        assert_eq!(tree.content(root).unwrap(), text);
        assert_eq!(tree.shape(root).unwrap(), NodeShape::Sequence);
        for child in tree.children(root).unwrap() {
            assert!(tree.is_set(child).unwrap());
        }
    }
}
