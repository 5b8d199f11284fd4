use super::config;
use super::models::CboeChainResponse;
use crate::gex::ChainSnapshot;
use anyhow::{Context, Result};
use futures::future::join_all;
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Throttled or server-side failure; the only statuses worth another attempt.
#[derive(Debug, thiserror::Error)]
#[error("Retryable error: {0}")]
struct RetryableStatus(StatusCode);

/// Retry throttling, 5xx, timeouts and refused connections. Client errors and
/// non-JSON bodies fail on the first attempt.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.is::<RetryableStatus>()
        || err
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_timeout() || e.is_connect())
}

// -----------------------------------------------
// CLIENT WRAPPER
// -----------------------------------------------
pub struct CboeClient {
    client: Client,
}

impl CboeClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// GET with exponential backoff; see `is_retryable` for what gets another attempt
    async fn fetch_json(&self, url: &str) -> Result<String> {
        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        let attempt = || async {
            let res = self
                .client
                .get(url)
                .send()
                .await
                .context("Request send failed")?;

            let status = res.status();
            debug!(url, status = status.as_u16(), "cboe response");

            if status.is_success() {
                let text = res.text().await.context("Failed to read body")?;

                let trimmed = text.trim_start();
                if !trimmed.starts_with('{') {
                    let preview: String = text.chars().take(200).collect();
                    anyhow::bail!("Non-JSON response: {}", preview);
                }

                Ok(text)
            } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                warn!(url, status = status.as_u16(), "retryable cboe error");
                Err(anyhow::Error::new(RetryableStatus(status)))
            } else {
                let body = res.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                anyhow::bail!("Client error {}: {}", status, preview)
            }
        };

        RetryIf::spawn(backoff, attempt, is_retryable).await
    }

    // -----------------------------------------------
    // FETCH OPTION CHAIN
    // -----------------------------------------------
    pub async fn fetch_option_chain(&self, symbol: &str) -> Result<CboeChainResponse> {
        let url = config::cboe_option_chain_url(symbol);
        let text = self.fetch_json(&url).await?;
        let chain: CboeChainResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse option chain for {}", symbol))?;

        debug!(symbol, options = chain.data.options.len(), "parsed cboe chain");
        Ok(chain)
    }

    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<ChainSnapshot> {
        Ok(self.fetch_option_chain(symbol).await?.into_snapshot(symbol))
    }

    // -----------------------------------------------
    // BATCH FETCH WITH BOUNDED CONCURRENCY
    // -----------------------------------------------
    pub async fn fetch_all_snapshots(
        self: Arc<Self>,
        symbols: Vec<String>,
        max_concurrent: usize,
    ) -> Vec<Result<(String, ChainSnapshot)>> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let handles = symbols.into_iter().map(|symbol| {
            let client = Arc::clone(&self);
            let sem = Arc::clone(&semaphore);

            tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| anyhow::anyhow!("Semaphore error: {}", e))?;

                let snapshot = client.fetch_snapshot(&symbol).await?;
                Ok((symbol, snapshot))
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(res) => res,
                Err(e) => Err(anyhow::anyhow!("Task error: {}", e)),
            })
            .collect()
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_str(lang)?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(config::USER_AGENT)
        .timeout(config::get_http_timeout())
        .gzip(true)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_throttling_and_server_errors_retry() {
        assert!(is_retryable(&RetryableStatus(StatusCode::TOO_MANY_REQUESTS).into()));
        assert!(is_retryable(
            &anyhow::Error::from(RetryableStatus(StatusCode::BAD_GATEWAY)).context("fetch SPX")
        ));

        assert!(!is_retryable(&anyhow::anyhow!("Client error 404 Not Found: missing")));
        assert!(!is_retryable(&anyhow::anyhow!("Non-JSON response: <html>")));
    }
}
