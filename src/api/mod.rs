pub mod air_pollution;
pub mod nominatim;
pub mod power;

pub use air_pollution::AirPollutionClient;
pub use nominatim::NominatimGeocoder;
pub use power::PowerClient;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use crate::domain::{Location, ObservationSet, PollutantReading};
use crate::error::{DashError, Result};

const USER_AGENT: &str = concat!("wxdash/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body quoted back to the user
const ERROR_BODY_LIMIT: usize = 200;

/// Turns a free-text place name into coordinates
pub trait Geocoder {
    fn resolve(&self, place: &str) -> Result<Location>;
}

/// Daily weather values for one date, all codes in a single request
pub trait WeatherSource {
    fn fetch(&self, location: &Location, date: NaiveDate, codes: &[&str])
    -> Result<ObservationSet>;
}

/// Current pollutant concentrations
pub trait AirQualitySource {
    fn fetch(&self, location: &Location) -> Result<Vec<PollutantReading>>;
}

/// Tries each geocoder in turn.
///
/// `NotFound` falls through to the next source; any other error stops the
/// chain.
pub struct ChainedGeocoder {
    sources: Vec<Box<dyn Geocoder>>,
}

impl ChainedGeocoder {
    pub fn new(sources: Vec<Box<dyn Geocoder>>) -> Self {
        Self { sources }
    }
}

impl Geocoder for ChainedGeocoder {
    fn resolve(&self, place: &str) -> Result<Location> {
        for source in &self.sources {
            match source.resolve(place) {
                Err(DashError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(DashError::NotFound(place.to_string()))
    }
}

/// Build the HTTP client shared by every service client
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DashError::upstream("HTTP client", e.to_string()))
}

/// Send a request and return the body of a successful response.
///
/// URLs are stripped from transport errors so query-string keys never reach
/// the screen.
pub(crate) fn fetch_text(
    service: &'static str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<String> {
    let response = request
        .timeout(timeout)
        .send()
        .map_err(|e| DashError::upstream(service, e.without_url().to_string()))?;

    let status = response.status();
    debug!("{} responded with {}", service, status);

    let body = response
        .text()
        .map_err(|e| DashError::upstream(service, e.without_url().to_string()))?;

    if !status.is_success() {
        return Err(DashError::upstream(
            service,
            format!("status {}: {}", status, truncate(&body, ERROR_BODY_LIMIT)),
        ));
    }

    Ok(body)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    struct Fixed(Option<Location>);

    impl Geocoder for Fixed {
        fn resolve(&self, place: &str) -> Result<Location> {
            self.0
                .clone()
                .ok_or_else(|| DashError::NotFound(place.to_string()))
        }
    }

    struct Broken;

    impl Geocoder for Broken {
        fn resolve(&self, _place: &str) -> Result<Location> {
            Err(DashError::upstream("Nominatim", "status 503"))
        }
    }

    #[test]
    fn test_chain_falls_through_not_found() {
        let chain = ChainedGeocoder::new(vec![
            Box::new(Fixed(None)),
            Box::new(Fixed(Some(Location::new("Labé", 11.3182, -12.2833)))),
        ]);
        let location = chain.resolve("Labé").unwrap();
        assert_eq!(location.latitude, 11.3182);
    }

    #[test]
    fn test_chain_stops_on_first_match() {
        let first = Fixed(Some(Location::new("A", 1.0, 2.0)));
        let chain = ChainedGeocoder::new(vec![Box::new(first), Box::new(Broken)]);
        assert_eq!(chain.resolve("A").unwrap().longitude, 2.0);
    }

    #[test]
    fn test_chain_stops_on_upstream_error() {
        let chain = ChainedGeocoder::new(vec![
            Box::new(Broken),
            Box::new(Fixed(Some(Location::new("A", 1.0, 2.0)))),
        ]);
        assert!(matches!(
            chain.resolve("A"),
            Err(DashError::Upstream { .. })
        ));
    }

    #[test]
    fn test_chain_all_not_found() {
        let chain = ChainedGeocoder::new(vec![Box::new(Fixed(None))]);
        assert!(matches!(chain.resolve("Nowhere"), Err(DashError::NotFound(_))));

        let empty = ChainedGeocoder::new(Vec::new());
        assert!(matches!(empty.resolve("Nowhere"), Err(DashError::NotFound(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 200), "short");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("éééé", 2), "éé");
    }

    /// Answer one request on a local port with a fixed status and body
    fn serve_once(status: &str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_fetch_text_returns_success_body() {
        let base = serve_once("200 OK", "[]");
        let client = http_client().unwrap();
        let body = fetch_text("Test", client.get(&base), Duration::from_secs(5)).unwrap();
        assert_eq!(body, "[]");
    }

    #[test]
    fn test_fetch_text_non_success_status_is_upstream() {
        let base = serve_once("503 Service Unavailable", "try later");
        let client = http_client().unwrap();
        let err = fetch_text("NASA POWER", client.get(&base), Duration::from_secs(5)).unwrap_err();

        assert!(matches!(err, DashError::Upstream { service: "NASA POWER", .. }));
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("try later"));
    }

    #[test]
    fn test_transport_error_hides_query_string() {
        // bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = http_client().unwrap();
        let request = client
            .get(format!("http://127.0.0.1:{port}/data/2.5/air_pollution"))
            .query(&[("appid", "secret-key")]);

        let err = fetch_text("OpenWeatherMap air pollution", request, Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, DashError::Upstream { .. }));
        assert!(!err.to_string().contains("secret-key"));
    }
}
