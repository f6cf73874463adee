use crate::diagnostics::{Location, ParseError, Reason};
use crate::grammar::DefId;
use crate::{GrammarBuilder, Tree};

fn failure(content: &str, range: std::ops::Range<usize>, reason: Reason) -> ParseError {
    ParseError {
        definition: DefId::from_index(3),
        name: None,
        regex: Some("[0-9]+".to_string()),
        content: content.to_string(),
        range,
        reason,
    }
}

fn element_error(text: &str) -> ParseError {
    let mut g = GrammarBuilder::new();
    let open = g.literal("<a>");
    let digits = g.pattern("[0-9]+");
    let number = g.named("number", digits);
    let close = g.literal("</a>");
    let element = g.sequence([open, number, close]);
    let mut tree = Tree::new(g.build().unwrap());
    let root = tree.create(element).unwrap();

    let err = tree.set_content(root, text).unwrap_err();
    err.parse_error().cloned().unwrap()
}

#[test]
fn deepest_failure_is_reported() {
    let err = element_error("<a>12x</a>");

    assert_eq!(err.definition, DefId::from_index(3));
    assert_eq!(err.reason, Reason::Mismatch);
    assert_eq!(err.range, 5..10);
    assert_eq!(err.regex.as_deref(), Some("</a>"));
    assert_eq!(err.content, "<a>12x</a>");
    insta::assert_snapshot!(err, @r#"content does not match #3 at 1:6, expected /</a>/: "x</a>""#);
}

#[test]
fn named_definition_in_message() {
    let err = element_error("<a></a>");

    assert_eq!(err.name.as_deref(), Some("number"));
    assert_eq!(err.message(), "content does not match `number`");
    assert_eq!(err.range, 3..7);
}

#[test]
fn messages_per_reason() {
    let messages: Vec<String> = [
        Reason::Mismatch,
        Reason::NoAlternative,
        Reason::TrailingContent,
        Reason::TooFewItems,
        Reason::TooManyItems,
    ]
    .into_iter()
    .map(|reason| failure("1", 0..1, reason).message())
    .collect();

    insta::assert_snapshot!(messages.join("\n"), @r"
    content does not match #3
    no alternative of #3 accepts the content
    unexpected content after #3
    too few items for #3
    too many items for #3
    ");
}

#[test]
fn locations_count_line_breaks_once() {
    let err = failure("ab\r\ncd\nef", 7..9, Reason::Mismatch);

    assert_eq!(err.location(), Location { line: 3, column: 1 });
    assert_eq!(err.end_location(), Location { line: 3, column: 3 });
    assert_eq!(err.location().to_string(), "3:1");
}

#[test]
fn excerpt_is_escaped_and_truncated() {
    let err = failure("x\ny", 0..3, Reason::Mismatch);
    assert!(err.to_string().ends_with(r#": "x\ny""#));

    let long = "9".repeat(50);
    let err = failure(&long, 0..50, Reason::TooManyItems);
    let expected = format!(": \"{}…\"", "9".repeat(31));
    assert!(err.to_string().ends_with(&expected));
}

#[test]
fn empty_range_shows_what_follows() {
    let mut err = failure("12,", 3..3, Reason::Mismatch);
    assert_eq!(
        err.to_string(),
        r#"content does not match #3 at 1:4, expected /[0-9]+/: """#
    );

    err.range = 1..1;
    assert!(err.to_string().ends_with(r#": "2,""#));
}

#[test]
fn missing_regex_is_omitted() {
    let mut err = failure("maybe", 0..5, Reason::NoAlternative);
    err.regex = None;

    assert_eq!(
        err.to_string(),
        r#"no alternative of #3 accepts the content at 1:1: "maybe""#
    );
}

#[test]
fn render_underlines_range() {
    let err = element_error("<a>12x</a>");

    insta::assert_snapshot!(err.render(false), @r"
    error: content does not match #3
      |
    1 | <a>12x</a>
      |      ^^^^^ expected /</a>/
    ");
}

#[test]
fn render_without_regex() {
    let mut err = failure("maybe", 0..5, Reason::NoAlternative);
    err.regex = None;

    let rendered = err.render(false);
    assert!(rendered.starts_with("error: no alternative of #3 accepts the content"));
    assert!(rendered.contains("^^^^^ nothing applies here"));
}

#[test]
fn render_empty_range_at_end() {
    let err = failure("12,", 3..3, Reason::Mismatch);

    let rendered = err.render(false);
    assert!(rendered.contains("1 | 12,"));
    assert!(rendered.contains("expected /[0-9]+/"));
}

#[test]
fn serializes_to_json() {
    let err = failure("1,x", 2..3, Reason::Mismatch);

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "definition": 3,
            "name": null,
            "regex": "[0-9]+",
            "content": "1,x",
            "range": {"start": 2, "end": 3},
            "reason": "mismatch",
        })
    );
}
