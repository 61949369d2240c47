use crate::scores::ScoreError;

/// How far past the search key the score markup may appear. The ranking
/// page renders the score anchor within this distance of the entity's
/// handle.
const LOOKAHEAD_CHARS: usize = 200;

/// Delimiters around the score text in the ranking page's markup:
/// `...search-key...">1234</a>...`
const SCORE_OPEN: &str = "\">";
const SCORE_CLOSE: &str = "</a>";

/// Extract an entity's score from raw ranking-page text.
///
/// Finds the first occurrence of `search_key`, then looks for the score
/// anchor within the next [`LOOKAHEAD_CHARS`] characters. The text between
/// `">` and `</a>` is reduced to its digits (see [`concat_digits`]).
///
/// # Errors
///
/// - [`ScoreError::KeyNotFound`] when `search_key` does not occur in `page`
/// - [`ScoreError::ScoreMarkersNotFound`] when either anchor delimiter is
///   missing from the look-ahead window
pub fn extract_score(page: &str, search_key: &str) -> Result<u64, ScoreError> {
    let start = page
        .find(search_key)
        .ok_or_else(|| ScoreError::KeyNotFound {
            key: search_key.to_string(),
        })?;

    // Look-ahead window, clamped to the end of the page and counted in
    // chars so a multi-byte character at the edge cannot split.
    let tail = &page[start..];
    let window = match tail.char_indices().nth(LOOKAHEAD_CHARS) {
        Some((end, _)) => &tail[..end],
        None => tail,
    };

    let (Some(open), Some(close)) = (window.find(SCORE_OPEN), window.find(SCORE_CLOSE)) else {
        return Err(ScoreError::ScoreMarkersNotFound {
            key: search_key.to_string(),
        });
    };

    let text_start = open + SCORE_OPEN.len();
    let raw = if close > text_start {
        &window[text_start..close]
    } else {
        // Delimiters overlap or are reversed; lenient fallback to 0.
        ""
    };

    Ok(concat_digits(raw))
}

/// Concatenate every run of ASCII digits in `s` and parse the result.
/// Returns 0 when no digits remain or the concatenation does not fit —
/// malformed-but-present markup must not abort a batch.
fn concat_digits(s: &str) -> u64 {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
