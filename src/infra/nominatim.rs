use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::{GeocodedPlace, GeocoderPort};
use crate::config::GeocoderConfig;
use crate::error::Result;
use crate::infra::rate_limiter::RequestRateLimiter;

#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    country_code: Option<String>,
}

impl From<SearchHit> for GeocodedPlace {
    fn from(hit: SearchHit) -> Self {
        GeocodedPlace {
            display_name: hit.display_name,
            country_code: hit.address.and_then(|a| a.country_code),
        }
    }
}

/// OpenStreetMap Nominatim search, throttled to the configured request rate.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    limiter: RequestRateLimiter,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: RequestRateLimiter::per_minute(config.requests_per_min),
        })
    }
}

#[async_trait]
impl GeocoderPort for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> std::result::Result<Option<GeocodedPlace>, String> {
        self.limiter.acquire().await;

        let url = format!("{}/search", self.base_url);
        debug!("GET {} q={}", url, query);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("addressdetails", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("nominatim returned {}", status.as_u16()));
        }
        let hits: Vec<SearchHit> = response.json().await.map_err(|e| e.to_string())?;
        Ok(hits.into_iter().next().map(GeocodedPlace::from))
    }
}
