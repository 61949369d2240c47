use serde::{Deserialize, Serialize};

fn default_site() -> String {
    "https://www.8a.nu".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the ranking site.
    #[serde(default = "default_site")]
    pub site: String,
    /// Per-request timeout, e.g. "10s" or "1500ms".
    pub timeout: Option<String>,
    /// Cap on concurrently in-flight fetches.
    pub max_in_flight: Option<usize>,
    /// Egress proxy URL; direct connection when unset.
    pub proxy: Option<String>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RosterEntry {
    pub id: i64,
    /// The ranking site's handle for this entry. Entries without one are
    /// listed with score 0.
    pub search_key: Option<String>,
    pub region: Option<String>,
    pub locale: Option<String>,
}
