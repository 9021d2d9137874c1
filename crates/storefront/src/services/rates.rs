//! Daily conversion rate client.
//!
//! One GET against the rate API per cache window. Callers treat a failed or
//! unusable rate as "no secondary currency": the fetch degrades, it never
//! takes a page down.

use std::time::Duration;

use burger_smoke_core::rate::ConversionRate;
use moka::future::Cache;
use tracing::instrument;

use super::ServiceError;

const CACHE_KEY: &str = "dollar";
const CACHE_TTL: Duration = Duration::from_secs(600);

/// Client for the daily USD/Bs conversion rate API.
#[derive(Clone)]
pub struct RateClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<&'static str, ConversionRate>,
}

impl RateClient {
    /// Create a new rate client for the given API base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// The current daily rate snapshot, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` on transport or decode failure. Call sites
    /// degrade with `.ok()` and omit secondary-currency figures.
    #[instrument(skip(self))]
    pub async fn current(&self) -> Result<ConversionRate, ServiceError> {
        if let Some(rate) = self.cache.get(CACHE_KEY).await {
            return Ok(rate);
        }

        let url = format!(
            "{}/dollar?format_date=default&rounded_price=true",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rate: ConversionRate = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        self.cache.insert(CACHE_KEY, rate.clone()).await;
        Ok(rate)
    }
}
