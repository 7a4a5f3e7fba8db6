use crate::catalog::CatalogStore;
use crate::config::Settings;
use crate::domain::contract::validate_and_normalize_candidate;
use crate::domain::supplement::SupplementCandidate;
use anyhow::Context;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Body of a catalog endpoint: `{ "candidates": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub candidates: Vec<SupplementCandidate>,
}

#[derive(Debug, Clone)]
pub struct CatalogHttpOptions {
    pub path: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt up to `max_backoff`.
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for CatalogHttpOptions {
    fn default() -> Self {
        Self {
            path: "/v1/supplements".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl CatalogHttpOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Some(path) = std::env::var("CATALOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            out.path = path;
        }

        if let Some(secs) = env_parse::<u64>("CATALOG_TIMEOUT_SECS") {
            out.timeout = Duration::from_secs(secs);
        }

        if let Some(n) = env_parse::<u32>("CATALOG_RETRIES") {
            out.max_attempts = n.max(1);
        }

        if let Some(ms) = env_parse::<u64>("CATALOG_RETRY_BASE_MS") {
            out.base_backoff = Duration::from_millis(ms);
        }

        out
    }

    fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let factor = 1u32 << failed_attempts.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// One failed fetch attempt. Only `Transient` failures are retried.
#[derive(Debug)]
enum FetchFailure {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

impl FetchFailure {
    fn into_error(self) -> anyhow::Error {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }
}

/// Catalog served as JSON by an external product service.
#[derive(Debug, Clone)]
pub struct HttpJsonCatalog {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    opts: CatalogHttpOptions,
}

impl HttpJsonCatalog {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        opts: CatalogHttpOptions,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(opts.timeout)
            .build()
            .context("failed to build catalog http client")?;

        Ok(Self {
            http,
            url: catalog_url(base_url, &opts.path),
            api_key,
            opts,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            settings.require_catalog_base_url()?,
            settings.catalog_api_key.clone(),
            CatalogHttpOptions::from_env(),
        )
    }

    async fn attempt(&self) -> Result<Vec<SupplementCandidate>, FetchFailure> {
        let mut req = self.http.get(&self.url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let res = req.send().await.map_err(|e| {
            let transient = e.is_timeout() || e.is_connect() || e.is_request();
            let err = anyhow::Error::new(e).context(format!("catalog request to {} failed", self.url));
            if transient {
                FetchFailure::Transient(err)
            } else {
                FetchFailure::Permanent(err)
            }
        })?;

        let status = res.status();
        let body = res.bytes().await.map_err(|e| {
            FetchFailure::Transient(anyhow::Error::new(e).context("reading catalog body failed"))
        })?;

        let parsed = decode_body(status, &body)?;
        normalize_catalog(parsed.candidates).map_err(FetchFailure::Permanent)
    }
}

#[async_trait::async_trait]
impl CatalogStore for HttpJsonCatalog {
    fn store_name(&self) -> &'static str {
        "http_json"
    }

    async fn list_candidates(&self) -> anyhow::Result<Vec<SupplementCandidate>> {
        let mut failed: u32 = 0;
        loop {
            match self.attempt().await {
                Ok(candidates) => {
                    tracing::debug!(url = %self.url, count = candidates.len(), "catalog fetched");
                    return Ok(candidates);
                }
                Err(FetchFailure::Transient(err)) if failed + 1 < self.opts.max_attempts => {
                    failed += 1;
                    let backoff = self.opts.backoff_for(failed);
                    tracing::warn!(attempt = failed, ?backoff, error = %format!("{err:#}"), "catalog fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(failure) => return Err(failure.into_error()),
            }
        }
    }
}

fn catalog_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

const BODY_SNIPPET_LEN: usize = 200;

/// Maps a response to candidates or a classified failure. 5xx and 429 are
/// transient; other non-success statuses and undecodable bodies are not.
fn decode_body(status: StatusCode, body: &[u8]) -> Result<CatalogResponse, FetchFailure> {
    if !status.is_success() {
        let snippet: String = String::from_utf8_lossy(body)
            .chars()
            .take(BODY_SNIPPET_LEN)
            .collect();
        let err = anyhow::anyhow!("catalog HTTP {status}: {}", snippet.trim());
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchFailure::Transient(err));
        }
        return Err(FetchFailure::Permanent(err));
    }

    serde_json::from_slice::<CatalogResponse>(body)
        .context("catalog body does not match {\"candidates\": [...]}")
        .map_err(FetchFailure::Permanent)
}

/// Validates and normalizes every record; names must be unique ignoring case.
pub fn normalize_catalog(
    candidates: Vec<SupplementCandidate>,
) -> anyhow::Result<Vec<SupplementCandidate>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let name = candidate.name.clone();
        let candidate = validate_and_normalize_candidate(candidate)
            .with_context(|| format!("invalid catalog record: {name}"))?;
        anyhow::ensure!(
            seen.insert(candidate.name.to_ascii_lowercase()),
            "duplicate supplement in catalog: {}",
            candidate.name
        );
        out.push(candidate);
    }
    Ok(out)
}
