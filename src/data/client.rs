//! PokeAPI client
//!
//! Fetches location areas and pokemon from PokeAPI. Raw response bodies are
//! kept in the in-memory [`Cache`] keyed by request URL, so repeating a command
//! within the cache interval does not touch the network.

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::Cache;

/// Base URL for the PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Errors that can occur when talking to PokeAPI
#[derive(Debug, Error)]
pub enum PokeApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Call to {url} returned status code {status}")]
    Status { url: String, status: StatusCode },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for PokeAPI with a shared response cache
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Response bodies keyed by URL
    cache: Cache,
    /// Base URL for the API (allows override for testing)
    base_url: Url,
}

impl PokeApiClient {
    /// Creates a client against the given base URL
    ///
    /// The URL must be hierarchical (http or https); a trailing slash is ignored.
    pub fn with_base_url(base_url: Url, cache: Cache) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url,
        }
    }

    /// Returns the response cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Appends path segments to the base URL, encoding each one whole
    fn endpoint_url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments.iter().copied());
        }
        url.to_string()
    }

    /// URL of the first location-area page
    pub fn first_page_url(&self) -> String {
        self.endpoint_url(&["location-area"])
    }

    /// URL of a single location area
    pub fn location_area_url(&self, name: &str) -> String {
        self.endpoint_url(&["location-area", name])
    }

    /// URL of a single pokemon
    pub fn pokemon_url(&self, name: &str) -> String {
        self.endpoint_url(&["pokemon", name])
    }

    /// Fetches one page of location areas
    ///
    /// # Arguments
    /// * `url` - Page URL as returned in `next`/`previous`; `None` for the first page
    pub async fn location_areas(&self, url: Option<&str>) -> Result<LocationAreaPage, PokeApiError> {
        let url = match url {
            Some(url) => url.to_string(),
            None => self.first_page_url(),
        };
        self.fetch_json(&url).await
    }

    /// Fetches a location area with its pokemon encounters
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, PokeApiError> {
        self.fetch_json(&self.location_area_url(name)).await
    }

    /// Fetches a pokemon by name
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, PokeApiError> {
        self.fetch_json(&self.pokemon_url(name)).await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PokeApiError> {
        let body = self.fetch_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns the raw body for `url`, from cache when possible
    ///
    /// # Behavior
    /// - Returns the cached body if one is present
    /// - Otherwise performs a GET and reads the full body
    /// - Bodies with a status above 299 are rejected and never cached
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, PokeApiError> {
        if let Some(body) = self.cache.get(url) {
            tracing::debug!(url, "Cache hit");
            return Ok(body);
        }

        tracing::debug!(url, "Cache miss, requesting");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if status.as_u16() > 299 {
            tracing::warn!(url, %status, "Request failed");
            return Err(PokeApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        self.cache.add(url, body.clone());
        Ok(body)
    }
}
