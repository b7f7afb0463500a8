use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{WeatherSource, fetch_text};
use crate::config::WeatherConfig;
use crate::domain::{Location, ObservationSet, date_key};
use crate::error::{DashError, Result};

const SERVICE: &str = "NASA POWER";

/// `{properties: {parameter: {<code>: {<YYYYMMDD>: <number>}}}}`
#[derive(Debug, Deserialize)]
struct DailyPointResponse {
    properties: DailyPointProperties,
}

#[derive(Debug, Deserialize)]
struct DailyPointProperties {
    parameter: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Client for the NASA POWER daily point endpoint
pub struct PowerClient {
    client: Client,
    base_url: String,
    community: String,
    timeout: Duration,
}

impl PowerClient {
    pub fn new(client: Client, config: &WeatherConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            community: config.community.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// One daily request covering every code, `start` and `end` both on `date`
    fn request(&self, location: &Location, date: NaiveDate, codes: &[&str]) -> RequestBuilder {
        let day = date_key(date);
        let parameters = codes.join(",");
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        self.client
            .get(format!("{}/api/temporal/daily/point", self.base_url))
            .query(&[
                ("parameters", parameters.as_str()),
                ("community", self.community.as_str()),
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("start", day.as_str()),
                ("end", day.as_str()),
                ("format", "JSON"),
            ])
    }
}

impl WeatherSource for PowerClient {
    fn fetch(
        &self,
        location: &Location,
        date: NaiveDate,
        codes: &[&str],
    ) -> Result<ObservationSet> {
        let codes = dedup_codes(codes);
        if codes.is_empty() {
            debug!("No metrics requested, skipping {}", SERVICE);
            return Ok(ObservationSet::empty(date));
        }

        info!(
            "Fetching {} for ({:.4}, {:.4}) on {}",
            codes.join(","),
            location.latitude,
            location.longitude,
            date_key(date)
        );
        let start = Instant::now();

        let request = self.request(location, date, &codes);
        let body = fetch_text(SERVICE, request, self.timeout)?;
        let observations = parse_daily_response(&body, date)?;

        debug!(
            "{} returned {} series in {:.2}s",
            SERVICE,
            observations.codes().count(),
            start.elapsed().as_secs_f64()
        );
        Ok(observations)
    }
}

/// Drop repeated codes, keeping first-seen order
fn dedup_codes<'a>(codes: &[&'a str]) -> Vec<&'a str> {
    let mut unique: Vec<&'a str> = Vec::with_capacity(codes.len());
    for code in codes {
        if !unique.contains(code) {
            unique.push(*code);
        }
    }
    unique
}

fn parse_daily_response(body: &str, date: NaiveDate) -> Result<ObservationSet> {
    let response: DailyPointResponse = serde_json::from_str(body)
        .map_err(|e| DashError::upstream(SERVICE, format!("unexpected response: {e}")))?;
    Ok(ObservationSet::new(date, response.properties.parameter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_parse_daily_response() {
        let json = r#"{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-13.7122, 9.5092, 54.3]},
            "properties": {
                "parameter": {
                    "T2M": {"20240101": 27.3},
                    "PRECTOTCORR": {"20240101": 0.0},
                    "PS": {"20240101": -9999}
                }
            },
            "header": {"fill_value": -999.0}
        }"#;

        let obs = parse_daily_response(json, day()).unwrap();
        assert_eq!(obs.value("T2M"), Some(27.3));
        assert_eq!(obs.value("PRECTOTCORR"), Some(0.0));
        assert_eq!(obs.value("PS"), Some(-9999.0));
        assert_eq!(obs.value("RH2M"), None);
    }

    #[test]
    fn test_wrong_shape_is_upstream() {
        let err = parse_daily_response(r#"{"messages": ["bad request"]}"#, day()).unwrap_err();
        assert!(matches!(err, DashError::Upstream { service: "NASA POWER", .. }));

        let err =
            parse_daily_response(r#"{"properties": {"parameter": {"T2M": 3}}}"#, day()).unwrap_err();
        assert!(matches!(err, DashError::Upstream { .. }));

        assert!(parse_daily_response("<html>", day()).is_err());
    }

    #[test]
    fn test_dedup_codes_keeps_order() {
        assert_eq!(
            dedup_codes(&["T2M", "PS", "T2M", "RH2M", "PS"]),
            vec!["T2M", "PS", "RH2M"]
        );
    }

    fn client(base_url: &str) -> PowerClient {
        let config = WeatherConfig {
            base_url: base_url.to_string(),
            community: "AG".to_string(),
            timeout_secs: 1,
        };
        PowerClient::new(Client::new(), &config)
    }

    #[test]
    fn test_request_carries_all_codes_in_one_query() {
        let location = Location::new("Conakry", 9.5092, -13.7122);
        let request = client("https://power.larc.nasa.gov/")
            .request(&location, day(), &["T2M", "PRECTOTCORR", "RH2M"])
            .build()
            .unwrap();

        let url = request.url();
        assert_eq!(url.path(), "/api/temporal/daily/point");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let expected = [
            ("parameters", "T2M,PRECTOTCORR,RH2M"),
            ("community", "AG"),
            ("latitude", "9.5092"),
            ("longitude", "-13.7122"),
            ("start", "20240101"),
            ("end", "20240101"),
            ("format", "JSON"),
        ];
        assert_eq!(
            pairs,
            expected
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_codes_skip_request() {
        let client = client("http://127.0.0.1:9");
        let location = Location::new("Conakry", 9.5092, -13.7122);
        let obs = client.fetch(&location, day(), &[]).unwrap();
        assert!(obs.is_empty());
        assert_eq!(obs.date(), day());
    }
}
