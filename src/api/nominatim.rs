use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Geocoder, fetch_text};
use crate::config::GeocodingConfig;
use crate::domain::Location;
use crate::error::{DashError, Result};

const SERVICE: &str = "Nominatim";

/// Nominatim usage policy: at most one request per second
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Geocode place names with the Nominatim search API.
///
/// Only the first candidate is used; ranking is left to Nominatim.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    timeout: Duration,
    last_request: Cell<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(client: Client, config: &GeocodingConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            last_request: Cell::new(None),
        }
    }

    fn wait_for_rate_limit(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                thread::sleep(MIN_REQUEST_INTERVAL - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }

    fn request(&self, query: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&self, place: &str) -> Result<Location> {
        let query = place.trim();
        if query.is_empty() {
            return Err(DashError::NotFound(place.to_string()));
        }

        self.wait_for_rate_limit();

        debug!("Geocoding '{}' with Nominatim", query);
        let request = self.request(query);
        let body = fetch_text(SERVICE, request, self.timeout)?;

        let location = parse_search_response(&body, query)?;
        info!(
            "Geocoded {} -> ({:.4}, {:.4})",
            location.name, location.latitude, location.longitude
        );
        Ok(location)
    }
}

/// Take the first candidate of a Nominatim search response.
///
/// Nominatim sends coordinates as strings.
fn parse_search_response(body: &str, place: &str) -> Result<Location> {
    let results: Vec<NominatimResult> = serde_json::from_str(body)
        .map_err(|e| DashError::upstream(SERVICE, format!("unexpected response: {e}")))?;

    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| DashError::NotFound(place.to_string()))?;

    debug!("Nominatim matched '{}'", result.display_name);

    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| DashError::upstream(SERVICE, format!("invalid latitude: {}", result.lat)))?;
    let lon: f64 = result
        .lon
        .parse()
        .map_err(|_| DashError::upstream(SERVICE, format!("invalid longitude: {}", result.lon)))?;

    Ok(Location::new(place, lat, lon))
}
