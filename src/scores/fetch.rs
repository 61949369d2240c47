use crate::scores::ScoreError;
use crate::transport::Transport;

/// Retrieve a page body as text through the supplied transport.
///
/// One GET, no retries. The connection is released on every exit path by
/// dropping the response. An empty body is reported as
/// [`ScoreError::EmptyContent`] rather than success — a reachable site
/// that returns nothing has nothing to extract from.
pub async fn fetch_body(transport: &dyn Transport, url: &str) -> Result<String, ScoreError> {
    let response = transport.get(url).await?;

    let body = response.text().await.map_err(|e| ScoreError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if body.is_empty() {
        return Err(ScoreError::EmptyContent {
            url: url.to_string(),
        });
    }

    Ok(body)
}
