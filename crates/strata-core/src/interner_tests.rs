use crate::Interner;

#[test]
fn repeated_names_share_a_symbol() {
    let mut names = Interner::new();

    let tag = names.intern("tag");
    let body = names.intern("body");

    assert_eq!(names.intern("tag"), tag);
    assert_ne!(tag, body);
    assert_eq!(names.len(), 2);
}

#[test]
fn symbols_count_up_in_first_seen_order() {
    let mut names = Interner::new();

    let close = names.intern("close");
    let open = names.intern("open");

    assert_eq!(close.index(), 0);
    assert_eq!(open.index(), 1);
    assert!(close < open);
    assert_eq!(open.to_string(), "$1");
}

#[test]
fn resolve_and_find() {
    let mut names = Interner::new();
    let value = names.intern("value");

    assert_eq!(names.resolve(value), Some("value"));
    assert_eq!(names.find("value"), Some(value));
    assert_eq!(names.find("key"), None);
    assert_eq!(names.len(), 1);
}

#[test]
fn foreign_symbol_does_not_resolve() {
    let mut big = Interner::new();
    big.intern("a");
    let second = big.intern("b");

    let mut small = Interner::new();
    small.intern("a");

    assert_eq!(small.resolve(second), None);
    assert!(Interner::new().is_empty());
}
