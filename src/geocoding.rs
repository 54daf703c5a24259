//! Address suggestions from a Nominatim-compatible geocoding API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Queries shorter than this return no suggestions without calling upstream.
pub const MIN_QUERY_CHARS: usize = 3;
const MAX_SUGGESTIONS: &str = "5";

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding service answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSuggestion {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

/// One `search` result as returned by Nominatim. Coordinates come as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
    country: Option<String>,
}

impl GeocodingClient {
    pub fn new(
        base_url: impl Into<String>,
        country: Option<String>,
        user_agent: &str,
    ) -> Result<Self, GeocodingError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country,
        })
    }

    pub async fn suggest(&self, query: &str) -> Result<Vec<AddressSuggestion>, GeocodingError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(vec![]);
        }

        let mut params = vec![
            ("q", query),
            ("format", "json"),
            ("addressdetails", "0"),
            ("limit", MAX_SUGGESTIONS),
        ];
        if let Some(country) = self.country.as_deref() {
            params.push(("countrycodes", country));
        }

        let resp = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GeocodingError::Status(resp.status()));
        }
        let hits: Vec<SearchHit> = resp.json().await?;
        Ok(to_suggestions(hits))
    }
}

/// Drops hits whose coordinates do not parse.
fn to_suggestions(hits: Vec<SearchHit>) -> Vec<AddressSuggestion> {
    hits.into_iter()
        .filter_map(|h| {
            Some(AddressSuggestion {
                lat: h.lat.parse().ok()?,
                lon: h.lon.parse().ok()?,
                label: h.display_name,
            })
        })
        .collect()
}
