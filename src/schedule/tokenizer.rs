// File: ./src/schedule/tokenizer.rs
// Puts every tag boundary of the page markup on its own line.

/// Inserts a line break before every `<` and after every `>`.
pub fn break_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len() + markup.len() / 4);
    for ch in markup.chars() {
        match ch {
            '<' => {
                out.push('\n');
                out.push('<');
            }
            '>' => {
                out.push('>');
                out.push('\n');
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Splits text produced by [`break_tags`] into trimmed fragments.
///
/// Empty fragments are kept: the state machine treats an empty calendar
/// cell as day 0, so they carry meaning.
pub fn fragments(broken: &str) -> impl Iterator<Item = &str> {
    broken.split('\n').map(str::trim)
}
