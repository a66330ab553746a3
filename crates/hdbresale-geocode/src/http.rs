//! HTTP geocoder against a Nominatim search endpoint.

use async_trait::async_trait;
use hdbresale_core::Coordinates;
use serde::Deserialize;
use tracing::debug;

use crate::{GeocodeError, Geocoder};

/// Nominatim client. One request per query, first match only.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimClient {
    /// Create a client for `base_url` (e.g. `https://nominatim.openstreetmap.org`).
    ///
    /// Nominatim's usage policy requires an identifying `user_agent`.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The search URL for `query`.
    ///
    /// Search addresses are already `+`-joined, so the query goes in as is.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}/search?q={}&format=json&limit=1", self.base_url, query)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self.search_url(query);
        debug!(url = %url, "geocoding");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        first_match(&body)
    }
}

/// Coordinates of the first place in a Nominatim JSON response.
fn first_match(body: &str) -> Result<Option<Coordinates>, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    Ok(Some(Coordinates {
        latitude: parse_degrees(&place.lat)?,
        longitude: parse_degrees(&place.lon)?,
    }))
}

fn parse_degrees(value: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::InvalidCoordinate(value.to_string()))
}
