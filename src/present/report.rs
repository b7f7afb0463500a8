use chrono::NaiveDate;
use std::io::{self, Write};

use super::chart::{BarChart, DEFAULT_BAR_WIDTH};
use super::export::{ExportKind, ExportRow, export_file_name};
use super::tiles::build_tiles;
use crate::domain::{Location, MetricDefinition, ObservationSet, PollutantReading};
use crate::error::Result;

pub const FILL_VALUE_NOTE: &str =
    "Note: -9999 (or -999) means the value is not yet available for the selected date.";

pub const AIR_QUALITY_DISABLED: &str =
    "Air quality not configured (set OPENWEATHER_API_KEY or [air_quality].api_key)";

/// Everything one query produced.
///
/// The two fetches succeed or fail independently; `air_quality` is `None`
/// when no air-quality service is configured.
#[derive(Debug)]
pub struct Report<'a> {
    pub location: Location,
    pub date: NaiveDate,
    pub selection: Vec<&'a MetricDefinition>,
    pub weather: Result<ObservationSet>,
    pub air_quality: Option<Result<Vec<PollutantReading>>>,
}

impl Report<'_> {
    /// Exports for whatever succeeded and has columns, as `(file name, row)`
    pub fn exports(&self) -> Vec<(String, ExportRow)> {
        let mut exports = Vec::new();

        if let Ok(observations) = &self.weather {
            let row = ExportRow::weather(&self.selection, observations);
            if !row.is_empty() {
                exports.push((
                    export_file_name(&self.location.name, self.date, ExportKind::Weather),
                    row,
                ));
            }
        }

        if let Some(Ok(readings)) = &self.air_quality {
            let row = ExportRow::air_quality(readings);
            if !row.is_empty() {
                exports.push((
                    export_file_name(&self.location.name, self.date, ExportKind::AirQuality),
                    row,
                ));
            }
        }

        exports
    }

    pub fn has_failures(&self) -> bool {
        self.weather.is_err() || matches!(self.air_quality, Some(Err(_)))
    }
}

/// Write the full dashboard view for one query
pub fn render_report<W: Write>(report: &Report<'_>, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{} — {}  ({:.4}, {:.4})",
        report.location.name,
        report.date.format("%d/%m/%Y"),
        report.location.latitude,
        report.location.longitude
    )?;
    writeln!(out)?;

    writeln!(out, "Weather (NASA POWER)")?;
    match &report.weather {
        Ok(_) if report.selection.is_empty() => writeln!(out, "  No metrics selected")?,
        Ok(observations) => {
            let tiles = build_tiles(&report.selection, observations);
            for tile in &tiles {
                writeln!(out, "  {tile}")?;
            }
            if tiles.iter().any(|t| t.is_fill_value()) {
                writeln!(out, "  {FILL_VALUE_NOTE}")?;
            }
        }
        Err(e) => writeln!(out, "  Error: {e}")?,
    }
    writeln!(out)?;

    writeln!(out, "Air quality (μg/m³)")?;
    match &report.air_quality {
        None => writeln!(out, "  {AIR_QUALITY_DISABLED}")?,
        Some(Ok(readings)) => BarChart::from_readings(readings, DEFAULT_BAR_WIDTH).render(out)?,
        Some(Err(e)) => writeln!(out, "  Error: {e}")?,
    }

    Ok(())
}
