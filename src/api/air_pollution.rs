use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use super::{AirQualitySource, fetch_text};
use crate::config::AirQualityConfig;
use crate::domain::observation::sort_for_display;
use crate::domain::{Location, PollutantReading};
use crate::error::{DashError, Result};

const SERVICE: &str = "OpenWeatherMap air pollution";

/// `{list: [{components: {<pollutant>: <number>, ...}}]}`
#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    #[serde(default)]
    components: BTreeMap<String, f64>,
}

/// Current air pollution for a point, from OpenWeatherMap
pub struct AirPollutionClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl AirPollutionClient {
    pub fn new(client: Client, config: &AirQualityConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn request(&self, location: &Location) -> RequestBuilder {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        self.client
            .get(format!("{}/data/2.5/air_pollution", self.base_url))
            .query(&[
                ("lat", latitude.as_str()),
                ("lon", longitude.as_str()),
                ("appid", self.api_key.as_str()),
            ])
    }
}

impl AirQualitySource for AirPollutionClient {
    fn fetch(&self, location: &Location) -> Result<Vec<PollutantReading>> {
        info!(
            "Fetching air pollution for ({:.4}, {:.4})",
            location.latitude, location.longitude
        );

        let request = self.request(location);
        let body = fetch_text(SERVICE, request, self.timeout)?;

        let readings = parse_air_pollution_response(&body)?;
        debug!("{} pollutant readings", readings.len());
        Ok(readings)
    }
}

/// Readings from the first entry, highest concentration first.
///
/// No entries, or an entry without components, means no data rather than
/// a failure.
fn parse_air_pollution_response(body: &str) -> Result<Vec<PollutantReading>> {
    let response: AirPollutionResponse = serde_json::from_str(body)
        .map_err(|e| DashError::upstream(SERVICE, format!("unexpected response: {e}")))?;

    let mut readings: Vec<PollutantReading> = response
        .list
        .into_iter()
        .next()
        .map(|entry| {
            entry
                .components
                .into_iter()
                .map(|(name, value)| PollutantReading::new(name, value))
                .collect()
        })
        .unwrap_or_default();

    sort_for_display(&mut readings);
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_air_pollution_response() {
        let json = r#"{
            "coord": {"lon": -13.7122, "lat": 9.5092},
            "list": [{
                "main": {"aqi": 2},
                "components": {
                    "co": 230.31, "no": 0.0, "no2": 3.47, "o3": 61.51,
                    "so2": 1.9, "pm2_5": 12.43, "pm10": 24.8, "nh3": 0.98
                },
                "dt": 1704067200
            }]
        }"#;

        let readings = parse_air_pollution_response(json).unwrap();
        assert_eq!(readings.len(), 8);
        assert_eq!(readings[0], PollutantReading::new("co", 230.31));
        assert_eq!(readings[1].pollutant_name, "o3");
        assert_eq!(readings[7], PollutantReading::new("no", 0.0));
        assert!(
            readings
                .windows(2)
                .all(|w| w[0].concentration >= w[1].concentration)
        );
    }

    #[test]
    fn test_no_components_is_empty_not_error() {
        assert!(parse_air_pollution_response(r#"{"list": []}"#).unwrap().is_empty());
        assert!(
            parse_air_pollution_response(r#"{"list": [{"main": {"aqi": 1}}]}"#)
                .unwrap()
                .is_empty()
        );
        assert!(
            parse_air_pollution_response(r#"{"list": [{"components": {}}]}"#)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_malformed_response_is_upstream() {
        let err = parse_air_pollution_response(r#"{"cod": 401, "message": "Invalid API key"}"#)
            .unwrap_err();
        assert!(matches!(err, DashError::Upstream { .. }));

        let err =
            parse_air_pollution_response(r#"{"list": [{"components": {"co": "high"}}]}"#).unwrap_err();
        assert!(err.to_string().contains("unexpected response"));
    }

    #[test]
    fn test_request_query() {
        let config = AirQualityConfig {
            base_url: "https://api.openweathermap.org/".to_string(),
            api_key: None,
            timeout_secs: 30,
        };
        let client = AirPollutionClient::new(Client::new(), &config, "abc123");
        let request = client
            .request(&Location::new("Kindia", 10.0569, -12.8658))
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.openweathermap.org/data/2.5/air_pollution?lat=10.0569&lon=-12.8658&appid=abc123"
        );
    }
}
