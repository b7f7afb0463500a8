use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{MetricDefinition, ObservationSet, PollutantReading, date_key};
use crate::error::Result;

/// Which of the two per-query exports a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Weather,
    AirQuality,
}

impl ExportKind {
    fn suffix(self) -> &'static str {
        match self {
            ExportKind::Weather => "weather",
            ExportKind::AirQuality => "air_quality",
        }
    }
}

/// `{place}_{YYYYMMDD}_{kind}.csv`, with path-hostile characters in the place replaced
pub fn export_file_name(place: &str, date: NaiveDate, kind: ExportKind) -> String {
    let place: String = place
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}_{}_{}.csv", place, date_key(date), kind.suffix())
}

/// A single-row table: column names and their values, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    columns: Vec<(String, Option<f64>)>,
}

impl ExportRow {
    /// Columns are the selected codes; a code without a value is an empty cell
    pub fn weather(selection: &[&MetricDefinition], observations: &ObservationSet) -> Self {
        Self {
            columns: selection
                .iter()
                .map(|m| (m.code.to_string(), observations.value(m.code)))
                .collect(),
        }
    }

    pub fn air_quality(readings: &[PollutantReading]) -> Self {
        Self {
            columns: readings
                .iter()
                .map(|r| (r.pollutant_name.clone(), Some(r.concentration)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header row plus one data row
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns.iter().map(|(name, _)| name.as_str()))?;
        writer.write_record(
            self.columns
                .iter()
                .map(|(_, value)| value.map(|v| v.to_string()).unwrap_or_default()),
        )?;
        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }
}

/// Parse an export back into `column -> value`; empty cells become `None`
pub fn read_export<R: Read>(reader: R) -> Result<BTreeMap<String, Option<f64>>> {
    let mut reader = csv::Reader::from_reader(reader);
    match reader.deserialize().next() {
        Some(row) => Ok(row?),
        None => Ok(BTreeMap::new()),
    }
}

/// Write an export into `dir`, creating the directory if needed
pub fn write_export(dir: &Path, file_name: &str, row: &ExportRow) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, row.to_csv()?)?;
    info!("Wrote {}", path.display());
    Ok(path)
}
