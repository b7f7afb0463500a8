use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Values the weather service uses for "not published yet".
///
/// They are ordinary data: kept as-is and explained to the user, never
/// turned into a missing value.
pub const FILL_VALUES: [f64; 2] = [-9999.0, -999.0];

pub fn is_fill_value(value: f64) -> bool {
    FILL_VALUES.contains(&value)
}

/// Format a date the way the weather service keys its series (YYYYMMDD)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Daily values for one (location, date) query: `code -> (YYYYMMDD -> value)`
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    date: NaiveDate,
    parameters: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ObservationSet {
    pub fn new(date: NaiveDate, parameters: BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        Self { date, parameters }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, BTreeMap::new())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_key(&self) -> String {
        date_key(self.date)
    }

    /// Value of `code` on the requested date, `None` when the service sent none
    pub fn value(&self, code: &str) -> Option<f64> {
        self.parameters
            .get(code)
            .and_then(|series| series.get(&self.date_key()))
            .copied()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// A single pollutant concentration (μg/m³)
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantReading {
    pub pollutant_name: String,
    pub concentration: f64,
}

impl PollutantReading {
    pub fn new(pollutant_name: impl Into<String>, concentration: f64) -> Self {
        Self {
            pollutant_name: pollutant_name.into(),
            concentration,
        }
    }
}

/// Order readings by concentration, highest first; ties by name
pub fn sort_for_display(readings: &mut [PollutantReading]) {
    readings.sort_by(|a, b| {
        b.concentration
            .partial_cmp(&a.concentration)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pollutant_name.cmp(&b.pollutant_name))
    });
}
