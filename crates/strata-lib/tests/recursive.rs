//! A small markup grammar that nests through a forward reference.

use std::cell::RefCell;
use std::rc::Rc;

use indoc::indoc;
use strata_lib::{DefId, GrammarBuilder, NodeId, Repetition, Tree};

struct Markup {
    tree: Tree,
    element: DefId,
}

fn markup() -> Markup {
    let mut g = GrammarBuilder::new();
    let element = g.forward();
    let name = g.pattern("[a-z]+");
    let tag = g.named("tag", name);
    let text = g.pattern("[^<]+");
    let item = g.choice([element, text]);
    // Lazy, so a text run stays one item instead of one per character.
    let content = g.repeat(item, Repetition::any().lazy());
    let body = g.named("body", content);
    let lt = g.literal("<");
    let gt = g.literal(">");
    let lt_slash = g.literal("</");
    let open = g.sequence([lt, tag, gt]);
    let close = g.sequence([lt_slash, tag, gt]);
    let open = g.named("open", open);
    let close = g.named("close", close);
    let node = g.sequence([open, body, close]);
    g.bind(element, node).unwrap();

    Markup {
        tree: Tree::new(g.build().unwrap()),
        element,
    }
}

fn body_items(tree: &Tree, element: NodeId) -> Vec<NodeId> {
    let body = tree.field(element, "body").unwrap();
    tree.items(body).unwrap().to_vec()
}

#[test]
fn nested_elements_are_split() {
    let Markup { mut tree, element } = markup();
    let root = tree.create(element).unwrap();

    tree.set_content(root, "<a>hi<b>there</b>!</a>").unwrap();

    let items = body_items(&tree, root);
    let contents: Vec<&str> = items.iter().map(|i| tree.content(*i).unwrap()).collect();
    assert_eq!(contents, ["hi", "<b>there</b>", "!"]);
    assert_eq!(tree.current_index(items[1]).unwrap(), Some(0));

    let inner = tree.current(items[1]).unwrap().unwrap();
    let open = tree.field(inner, "open").unwrap();
    assert_eq!(tree.content(open).unwrap(), "<b>");
    let tag = tree.field(open, "tag").unwrap();
    assert_eq!(tree.content(tag).unwrap(), "b");
}

#[test]
fn deep_edit_reaches_the_root() {
    let Markup { mut tree, element } = markup();
    let root = tree.create(element).unwrap();
    tree.set_content(root, "<a><b><c>x</c></b></a>").unwrap();

    let b = tree.current(body_items(&tree, root)[0]).unwrap().unwrap();
    let c = tree.current(body_items(&tree, b)[0]).unwrap().unwrap();
    let text = tree.current(body_items(&tree, c)[0]).unwrap().unwrap();

    let seen: Rc<RefCell<Vec<NodeId>>> = Rc::default();
    for node in [root, b, c, text] {
        let seen = Rc::clone(&seen);
        tree.add_listener(node, move |change| seen.borrow_mut().push(change.node))
            .unwrap();
    }

    tree.set_content(text, "hello").unwrap();

    assert_eq!(tree.content(root).unwrap(), "<a><b><c>hello</c></b></a>");
    assert_eq!(*seen.borrow(), vec![text, c, b, root]);
}

#[test]
fn structural_edit_in_nested_body() {
    let Markup { mut tree, element } = markup();
    let root = tree.create(element).unwrap();
    tree.set_content(root, "<ul><li>one</li></ul>").unwrap();
    let body = tree.field(root, "body").unwrap();

    tree.push(body, "<li>two</li>").unwrap();
    tree.insert(body, 0, "<li>zero</li>").unwrap();

    assert_eq!(
        tree.content(root).unwrap(),
        "<ul><li>zero</li><li>one</li><li>two</li></ul>"
    );
    assert_eq!(tree.len(body).unwrap(), 3);
}

#[test]
fn replacing_an_item_kind() {
    let Markup { mut tree, element } = markup();
    let root = tree.create(element).unwrap();
    tree.set_content(root, "<p>plain</p>").unwrap();
    let item = body_items(&tree, root)[0];
    assert_eq!(tree.current_index(item).unwrap(), Some(1));

    tree.set_content(item, "<em>loud</em>").unwrap();

    assert_eq!(tree.current_index(item).unwrap(), Some(0));
    assert_eq!(tree.content(root).unwrap(), "<p><em>loud</em></p>");
}

#[test]
fn multiline_failure_location() {
    let Markup { mut tree, element } = markup();
    let root = tree.create(element).unwrap();
    let text = indoc! {"
        <doc>
        <p>one</p>
        <p>two
        </doc>
    "};

    let err = tree.set_content(root, text.trim_end()).unwrap_err();

    let failure = err.parse_error().unwrap();
    assert!(failure.location().line >= 3);
    assert!(!tree.is_set(root).unwrap());
}
