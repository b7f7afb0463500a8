use std::io::{self, Write};

use crate::domain::PollutantReading;
use crate::domain::observation::sort_for_display;

/// Width of the longest bar, in characters
pub const DEFAULT_BAR_WIDTH: usize = 40;

pub const NO_DATA_MESSAGE: &str = "No air quality data available";

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Length in characters, relative to the largest value
    pub length: usize,
}

/// Horizontal bar chart of pollutant readings, largest first
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    bars: Vec<Bar>,
}

impl BarChart {
    pub fn from_readings(readings: &[PollutantReading], width: usize) -> Self {
        let mut sorted: Vec<PollutantReading> = readings
            .iter()
            .filter(|r| r.concentration.is_finite())
            .cloned()
            .collect();
        sort_for_display(&mut sorted);

        let max = sorted.first().map_or(0.0, |r| r.concentration);

        let bars = sorted
            .into_iter()
            .map(|r| {
                let length = if max > 0.0 && r.concentration > 0.0 {
                    ((r.concentration / max) * width as f64).round() as usize
                } else {
                    0
                };
                Bar {
                    label: r.pollutant_name,
                    value: r.concentration,
                    length,
                }
            })
            .collect();

        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Draw one line per bar with its exact value after it
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.bars.is_empty() {
            return writeln!(out, "  {NO_DATA_MESSAGE}");
        }

        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0);

        for bar in &self.bars {
            writeln!(
                out,
                "  {:>label_width$} │{} {}",
                bar.label,
                "█".repeat(bar.length),
                bar.value
            )?;
        }
        Ok(())
    }
}
