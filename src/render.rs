// File: ./src/render.rs
//! Text and JSON output for a parsed roster.
use crate::model::{DutyPerson, find_current};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

const PADDING: usize = 2;
const MIN_WIDTH: usize = 1;

/// Serializes the roster, or only the person on duty when `current_only`
/// is set (`null` if nobody is).
pub fn to_json(roster: &[DutyPerson], current_only: bool) -> serde_json::Result<String> {
    if current_only {
        serde_json::to_string(&find_current(roster))
    } else {
        serde_json::to_string(roster)
    }
}

/// Writes one line per person followed by an indented line per duty day,
/// with tab-separated cells aligned into columns.
pub fn write_table<W: Write>(out: &mut W, roster: &[DutyPerson]) -> io::Result<()> {
    let mut table = TabTable::default();
    for person in roster {
        let marker = if person.current { "*" } else { "" };
        table.push(format!(
            "{:<2}{}\t{}\t{}",
            marker,
            person.name,
            person.email_or_blank(),
            person.slack_short_or_blank()
        ));
        for duty in &person.duty {
            table.push(format!("    {:<2} {}\t\t", duty.day, duty.month));
        }
    }
    table.write_to(out)
}

/// [`write_table`] into a string.
pub fn render_table(roster: &[DutyPerson]) -> io::Result<String> {
    let mut buf = Vec::new();
    write_table(&mut buf, roster)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Column aligner for tab-separated lines.
///
/// Every cell followed by a tab belongs to a column; the text after the
/// last tab is written as-is. Column widths are computed over the whole
/// table using display width, so wide glyphs line up in a terminal.
#[derive(Debug, Default)]
struct TabTable {
    lines: Vec<String>,
}

impl TabTable {
    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = Vec::new();
        for line in &self.lines {
            let cells: Vec<&str> = line.split('\t').collect();
            let columns = cells.len().saturating_sub(1);
            for (i, cell) in cells.iter().take(columns).enumerate() {
                let w = (cell.width() + PADDING).max(MIN_WIDTH);
                match widths.get_mut(i) {
                    Some(existing) => *existing = (*existing).max(w),
                    None => widths.push(w),
                }
            }
        }
        widths
    }

    fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.widths();
        for line in &self.lines {
            let cells: Vec<&str> = line.split('\t').collect();
            let last = cells.len() - 1;
            let mut rendered = String::with_capacity(line.len() + 16);
            for (i, cell) in cells.iter().enumerate() {
                rendered.push_str(cell);
                if i < last {
                    let pad = widths[i].saturating_sub(cell.width());
                    rendered.extend(std::iter::repeat_n(' ', pad));
                }
            }
            writeln!(out, "{}", rendered.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DutyDate;

    fn person(name: &str, email: Option<&str>, short: Option<&str>) -> DutyPerson {
        DutyPerson {
            name: name.to_string(),
            email: email.map(str::to_string),
            slack_short: short.map(str::to_string),
            colour: format!("highlight-{}", name.to_lowercase()),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_alignment() {
        let mut alice = person("Alice", Some("alice@x.com"), Some("alice"));
        alice.duty.push(DutyDate {
            month: "January".to_string(),
            day: 5,
            date: "2024-01-05".to_string(),
        });
        let mut bob = person("Bob", None, Some("bobby"));
        bob.current = true;
        let out = render_table(&[alice, bob]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("  Alice{}alice@x.com  alice", " ".repeat(9)));
        assert_eq!(lines[1], "    5  January");
        assert_eq!(lines[2], format!("* Bob{}bobby", " ".repeat(24)));
    }

    #[test]
    fn test_wide_names_align_by_display_width() {
        let out = render_table(&[
            person("Иван", Some("ivan@x.ru"), None),
            person("Al", Some("al@x.ru"), None),
        ])
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].find("ivan"), Some("  Иван  ".len()));
        assert_eq!(lines[1], "  Al    al@x.ru");
    }

    #[test]
    fn test_empty_roster_renders_nothing() {
        assert_eq!(render_table(&[]).unwrap(), "");
    }

    #[test]
    fn test_render_table_matches_writer_output() {
        let roster = [person("Alice", Some("alice@x.com"), None)];
        let mut buf = Vec::new();
        write_table(&mut buf, &roster).unwrap();
        assert_eq!(render_table(&roster).unwrap().as_bytes(), buf.as_slice());
    }

    #[test]
    fn test_json_current_only() {
        let mut bob = person("Bob", None, None);
        bob.current = true;
        let roster = vec![person("Alice", None, None), bob];

        let all: serde_json::Value = serde_json::from_str(&to_json(&roster, false).unwrap()).unwrap();
        assert_eq!(all.as_array().map(Vec::len), Some(2));

        let current: serde_json::Value =
            serde_json::from_str(&to_json(&roster, true).unwrap()).unwrap();
        assert_eq!(current["Name"], "Bob");

        assert_eq!(to_json(&roster[..1], true).unwrap(), "null");
    }
}
