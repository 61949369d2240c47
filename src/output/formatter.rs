use std::io::IsTerminal;

use owo_colors::OwoColorize;
use terminal_size::{terminal_size, Width};

use crate::roster::EntityId;
use crate::scores::ScoreError;

/// A roster entry with its looked-up score, ready for display.
pub struct ScoredEntry<'a> {
    pub id: EntityId,
    /// None for entries without lookup metadata.
    pub search_key: Option<&'a str>,
    pub score: u64,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a search key to fit the available width
fn truncate_key(key: &str, max_width: usize) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= max_width {
        key.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format entries as a score table with columns: Id, Score, Search key.
/// Id column: 5 chars, right-aligned. Score column: 8 chars, right-aligned
/// (fits ten-million-point scores). Unranked entries show "-" as key.
pub fn format_score_table(entries: &[ScoredEntry], use_colors: bool) -> String {
    if entries.is_empty() {
        return "Roster is empty.".to_string();
    }

    let term_width = get_terminal_width();
    // Id (5) + space + score (8) + two spaces before the key
    let key_width = term_width.map(|w| w.saturating_sub(5 + 1 + 8 + 2).max(8));

    entries
        .iter()
        .map(|entry| {
            let key = entry.search_key.unwrap_or("-");
            let key = match key_width {
                Some(width) => truncate_key(key, width),
                None => key.to_string(),
            };

            if use_colors {
                format!(
                    "{:>5} {:>8}  {}",
                    entry.id.dimmed(),
                    entry.score.bold(),
                    key.cyan()
                )
            } else {
                format!("{:>5} {:>8}  {}", entry.id, entry.score, key)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per failed lookup, for the fail-soft listing.
pub fn format_failures(failures: &[(EntityId, ScoreError)], use_colors: bool) -> String {
    failures
        .iter()
        .map(|(id, err)| {
            if use_colors {
                format!("{:>5} {}", id.dimmed(), err.red())
            } else {
                format!("{:>5} {}", id, err)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_table_lines_up_columns() {
        let entries = vec![
            ScoredEntry {
                id: 1,
                search_key: Some("jasmin-roeper"),
                score: 1234,
            },
            ScoredEntry {
                id: 42,
                search_key: None,
                score: 0,
            },
        ];
        let table = format_score_table(&entries, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "    1     1234  jasmin-roeper");
        assert_eq!(lines[1], "   42        0  -");
    }

    #[test]
    fn empty_roster_message() {
        assert_eq!(format_score_table(&[], false), "Roster is empty.");
    }

    #[test]
    fn truncation_keeps_an_ellipsis() {
        assert_eq!(truncate_key("jasmin-roeper", 20), "jasmin-roeper");
        assert_eq!(truncate_key("jasmin-roeper", 9), "jasmin...");
        assert_eq!(truncate_key("jasmin-roeper", 3), "jas");
    }

    #[test]
    fn failures_render_one_line_each() {
        let failures = vec![(
            7,
            ScoreError::KeyNotFound {
                key: "nobody".to_string(),
            },
        )];
        let out = format_failures(&failures, false);
        assert!(out.starts_with("    7 "));
        assert!(out.contains("nobody"));
    }
}
