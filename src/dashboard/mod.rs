//! Query orchestration: metric selection → geocoding → weather and air quality.

pub mod session;

pub use session::{Session, parse_selection};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::api::{AirQualitySource, Geocoder, WeatherSource};
use crate::domain::MetricCatalog;
use crate::error::{DashError, Result};
use crate::present::Report;

/// Earliest date the date prompt accepts
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse `YYYY-MM-DD` or `DD/MM/YYYY` and check it lies in [1990-01-01, `today`]
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .map_err(|_| {
            DashError::InvalidDate(format!("'{input}' (expected YYYY-MM-DD or DD/MM/YYYY)"))
        })?;

    let earliest = earliest_date();
    if date < earliest || date > today {
        return Err(DashError::InvalidDate(format!(
            "{date} is outside {earliest} to {today}"
        )));
    }
    Ok(date)
}

/// One user request
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub place: String,
    pub date: NaiveDate,
    /// Catalog labels
    pub metrics: Vec<String>,
}

/// Wires the geocoder and both fetchers together.
///
/// Holds no state between queries.
pub struct Dashboard<'a> {
    catalog: &'a MetricCatalog,
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
    air_quality: Option<Box<dyn AirQualitySource>>,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        catalog: &'a MetricCatalog,
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherSource>,
        air_quality: Option<Box<dyn AirQualitySource>>,
    ) -> Self {
        Self {
            catalog,
            geocoder,
            weather,
            air_quality,
        }
    }

    pub fn catalog(&self) -> &'a MetricCatalog {
        self.catalog
    }

    /// Run the whole pipeline once.
    ///
    /// Unknown metrics and unresolvable places fail the query before any
    /// weather request. After that, each fetch result is kept in the report
    /// whether it succeeded or not.
    pub fn run(&self, query: &Query) -> Result<Report<'a>> {
        let catalog: &'a MetricCatalog = self.catalog;
        let selection = catalog.resolve(query.metrics.as_slice())?;
        let location = self.geocoder.resolve(&query.place)?;

        let codes: Vec<&str> = selection.iter().map(|m| m.code).collect();
        let weather = self.weather.fetch(&location, query.date, &codes);
        if let Err(e) = &weather {
            debug!("Weather fetch failed for {}: {}", location.name, e);
        }

        let air_quality = self.air_quality.as_ref().map(|source| {
            let readings = source.fetch(&location);
            if let Err(e) = &readings {
                debug!("Air quality fetch failed for {}: {}", location.name, e);
            }
            readings
        });

        info!("Query complete for {} on {}", location.name, query.date);

        Ok(Report {
            location,
            date: query.date,
            selection,
            weather,
            air_quality,
        })
    }
}
