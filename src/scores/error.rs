use thiserror::Error;

/// Failure taxonomy for a score lookup. Per-entity errors are carried to
/// the aggregator's join point, never swallowed inside a task.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Network/connection failure reaching the ranking site.
    #[error("GET {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Site reachable but the response body was empty.
    #[error("empty response body from {url}")]
    EmptyContent { url: String },

    /// The entity's search key is not present anywhere in the page.
    #[error("search key {key:?} not found in page")]
    KeyNotFound { key: String },

    /// Key found but the expected surrounding markup is missing.
    #[error("score markers missing around {key:?}")]
    ScoreMarkersNotFound { key: String },

    /// The roster collaborator failed to produce the entity list.
    #[error("roster listing failed: {0}")]
    Roster(String),
}
