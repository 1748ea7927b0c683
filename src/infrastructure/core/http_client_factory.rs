use anyhow::{Context, Result};
use reqwest::{Client, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Client with transient-failure retries (exponential backoff, 3 retries)
    pub fn create_client() -> ClientWithMiddleware {
        Self::create_client_with(3, Duration::from_secs(10))
    }

    pub fn create_client_with(max_retries: u32, timeout: Duration) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Appends url-encoded query parameters to `base_url`.
///
/// `ClientWithMiddleware` has no `.query()`, so requests carry the full URL.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        let url = Url::parse(base_url)
            .with_context(|| format!("Invalid request URL: {}", base_url))?;
        return Ok(url.to_string());
    }

    let url = Url::parse_with_params(
        base_url,
        params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
    )
    .with_context(|| format!("Invalid request URL: {}", base_url))?;
    Ok(url.to_string())
}
