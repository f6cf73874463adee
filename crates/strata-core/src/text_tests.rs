use crate::text::{escape_control, line_col, truncate};

#[test]
fn line_col_first_line() {
    assert_eq!(line_col("abc", 0), (1, 1));
    assert_eq!(line_col("abc", 2), (1, 3));
    assert_eq!(line_col("abc", 3), (1, 4));
}

#[test]
fn line_col_counts_each_break_style_once() {
    assert_eq!(line_col("a\nb", 2), (2, 1));
    assert_eq!(line_col("a\rb", 2), (2, 1));
    assert_eq!(line_col("a\r\nb", 3), (2, 1));
    assert_eq!(line_col("a\n\rb", 3), (2, 1));
    assert_eq!(line_col("a\n\nb", 3), (3, 1));
    assert_eq!(line_col("a\r\n\r\nbc", 6), (3, 2));
}

#[test]
fn line_col_clamps_offsets() {
    assert_eq!(line_col("ab", 99), (1, 3));
    // 'é' is two bytes; offset 2 lands inside it
    assert_eq!(line_col("aé", 2), (1, 2));
}

#[test]
fn truncate_keeps_short_text() {
    assert_eq!(truncate("hello", 5), "hello");
    assert_eq!(truncate("", 3), "");
}

#[test]
fn truncate_marks_cut() {
    assert_eq!(truncate("hello world", 6), "hello…");
}

#[test]
fn escape_control_line_breaks() {
    assert_eq!(escape_control("a\r\nb"), "a\\r\\nb");
    assert_eq!(escape_control("plain"), "plain");
}
