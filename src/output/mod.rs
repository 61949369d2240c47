mod formatter;

pub use formatter::{format_failures, format_score_table, should_use_colors, ScoredEntry};
