use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::scores::ScoreError;

/// Default per-request timeout when the config does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capability handle for outbound HTTP. The aggregator only ever issues
/// GETs through this trait, so the concrete client (direct vs proxied)
/// is picked once at wiring time and never leaks into the core.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<reqwest::Response, ScoreError>;
}

/// Plain connection to the ranking site.
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn get(&self, url: &str) -> Result<reqwest::Response, ScoreError> {
        send_get(&self.client, url).await
    }
}

/// Connection through an egress proxy, for deployments where direct
/// outbound traffic is not available.
pub struct ProxiedTransport {
    client: reqwest::Client,
}

impl ProxiedTransport {
    pub fn new(proxy_url: &str, timeout: Duration) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy URL: {}", proxy_url))?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .context("Failed to build proxied HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ProxiedTransport {
    async fn get(&self, url: &str) -> Result<reqwest::Response, ScoreError> {
        send_get(&self.client, url).await
    }
}

async fn send_get(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, ScoreError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| ScoreError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Pick the transport for this deployment: proxied when a proxy URL is
/// configured, direct otherwise.
pub fn select_transport(proxy: Option<&str>, timeout: Duration) -> Result<Arc<dyn Transport>> {
    match proxy {
        Some(url) => Ok(Arc::new(ProxiedTransport::new(url, timeout)?)),
        None => Ok(Arc::new(DirectTransport::new(timeout)?)),
    }
}
