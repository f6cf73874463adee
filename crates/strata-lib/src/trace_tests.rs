use strata_core::Colors;

use crate::{GrammarBuilder, PrintTracer, Tree, Verbosity};

fn traced(verbosity: Verbosity, text: &str) -> Vec<String> {
    let mut g = GrammarBuilder::new();
    let key = g.pattern("[a-z]+");
    let eq = g.literal("=");
    let digits = g.pattern("[0-9]+");
    let value = g.named("value", digits);
    let pair = g.sequence([key, eq, value]);
    let mut tree = Tree::new(g.build().unwrap());
    let root = tree.create(pair).unwrap();

    let mut tracer = PrintTracer::new(tree.grammar(), verbosity, Colors::OFF);
    let _ = tree.set_content_traced(root, text, &mut tracer);
    tracer.lines().to_vec()
}

#[test]
fn default_verbosity_shows_outcomes() {
    let lines = traced(Verbosity::Default, "a=1");

    insta::assert_snapshot!(lines.join("\n"), @r#"
      ✓ #0 0..1
      ✓ #1 1..2
      ✓ #3 value 2..3
    ✓ #4 0..3
    notify @1 "a"
    notify @2 "="
    notify @3 "1"
    notify @0 "a=1"
    "#);
}

#[test]
fn verbose_shows_entries() {
    let lines = traced(Verbosity::Verbose, "a=1");

    assert_eq!(lines[0], "▶ #4 0..3");
    assert_eq!(lines[1], "  ▶ #0 0..1");
    assert_eq!(lines[2], "  ✓ #0 0..1");
}

#[test]
fn very_verbose_shows_text() {
    let lines = traced(Verbosity::VeryVerbose, "ab=12");

    assert_eq!(lines[0], r#"▶ #4 0..5 "ab=12""#);
}

#[test]
fn rejections_are_traced() {
    let lines = traced(Verbosity::Verbose, "a=x");

    assert!(lines.iter().any(|line| line.trim_start() == "↩ #4 @2"));
    assert!(lines.iter().any(|line| line.trim_start() == "✗ #4 0..3"));
    assert!(!lines.iter().any(|line| line.starts_with("notify")));
}

#[test]
fn colors_wrap_labels() {
    let mut g = GrammarBuilder::new();
    let a = g.literal("a");
    let mut tree = Tree::new(g.build().unwrap());
    let node = tree.create(a).unwrap();
    let mut tracer = PrintTracer::new(tree.grammar(), Verbosity::Default, Colors::ON);

    tree.set_content_traced(node, "a", &mut tracer).unwrap();

    assert_eq!(tracer.lines()[0], "✓ \x1b[34m#0\x1b[0m \x1b[2m0..1\x1b[0m");
    assert_eq!(tracer.lines()[1], "notify @0 \x1b[32m\"a\"\x1b[0m");
}
