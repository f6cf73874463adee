//! Text helpers for diagnostics: offsets to line/column pairs, and
//! shortening snippets so a failure message stays on one line.

/// Resolve a byte offset into a 1-based `(line, column)` pair.
///
/// `\n`, `\r`, `\r\n` and `\n\r` each count as a single line break.
/// Columns count characters, not bytes. Offsets past the end, or inside a
/// multi-byte character, are clamped back to the nearest character boundary.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut line = 1;
    let mut column = 1;
    let mut chars = text[..end].chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' | '\r' => {
                let pair = if c == '\n' { '\r' } else { '\n' };
                if chars.peek() == Some(&pair) {
                    chars.next();
                }
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
    }
    (line, column)
}

/// Shorten `s` to at most `max_len` characters, marking the cut with `…`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

/// Escape raw line breaks so a snippet renders on a single line.
pub fn escape_control(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
