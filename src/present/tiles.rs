use std::fmt;

use crate::domain::{MetricDefinition, ObservationSet, is_fill_value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileValue {
    /// Raw upstream number, fill values included
    Value(f64),
    /// The service sent nothing for this code
    NotAvailable,
}

impl fmt::Display for TileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileValue::Value(v) => write!(f, "{v}"),
            TileValue::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// One labeled metric value
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub label: &'static str,
    pub emoji: &'static str,
    pub value: TileValue,
}

impl Tile {
    pub fn is_fill_value(&self) -> bool {
        matches!(self.value, TileValue::Value(v) if is_fill_value(v))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.emoji.is_empty() {
            write!(f, "{}: {}", self.label, self.value)
        } else {
            write!(f, "{} {}: {}", self.emoji, self.label, self.value)
        }
    }
}

/// One tile per selected metric, in selection order
pub fn build_tiles(selection: &[&MetricDefinition], observations: &ObservationSet) -> Vec<Tile> {
    selection
        .iter()
        .map(|metric| Tile {
            label: metric.label,
            emoji: metric.emoji,
            value: observations
                .value(metric.code)
                .map_or(TileValue::NotAvailable, TileValue::Value),
        })
        .collect()
}
