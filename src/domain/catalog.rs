use crate::error::{DashError, Result};

/// A selectable metric: display label, NASA POWER parameter code, display glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub label: &'static str,
    pub code: &'static str,
    /// Empty when the metric has no glyph
    pub emoji: &'static str,
}

impl MetricDefinition {
    const fn new(label: &'static str, code: &'static str, emoji: &'static str) -> Self {
        Self { label, code, emoji }
    }
}

/// Display order of the built-in metrics
const BUILTIN_METRICS: [MetricDefinition; 12] = [
    MetricDefinition::new("Temperature range (°C)", "T2M_RANGE", "↕️"),
    MetricDefinition::new("Surface temperature (°C)", "TS", "🌍"),
    MetricDefinition::new("Dew point temperature (°C)", "T2MDEW", "💧"),
    MetricDefinition::new("Wet bulb temperature (°C)", "T2MWET", ""),
    MetricDefinition::new("Maximum temperature (°C)", "T2M_MAX", "🔥"),
    MetricDefinition::new("Minimum temperature (°C)", "T2M_MIN", "❄️"),
    MetricDefinition::new("Mean temperature (°C)", "T2M", "🌡️"),
    MetricDefinition::new("Specific humidity (g/kg)", "QV2M", ""),
    MetricDefinition::new("Relative humidity (%)", "RH2M", "💦"),
    MetricDefinition::new("Precipitation (mm)", "PRECTOTCORR", "🌧️"),
    MetricDefinition::new("Surface pressure (kPa)", "PS", "⏲️"),
    MetricDefinition::new("Mean wind 10m (m/s)", "WS10M", "💨"),
];

/// Codes shown when the user has not chosen any metric
const DEFAULT_CODES: [&str; 5] = ["T2M", "PRECTOTCORR", "RH2M", "PS", "WS10M"];

/// Read-only table of the metrics the dashboard can offer.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: Vec<MetricDefinition>,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MetricCatalog {
    pub fn builtin() -> Self {
        Self {
            metrics: BUILTIN_METRICS.to_vec(),
        }
    }

    /// Labels in display order, for populating a selection list
    pub fn labels(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.label).collect()
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn get(&self, label: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.label == label)
    }

    pub fn code_for(&self, label: &str) -> Result<&'static str> {
        self.get(label)
            .map(|m| m.code)
            .ok_or_else(|| DashError::UnknownMetric(label.to_string()))
    }

    pub fn emoji_for(&self, label: &str) -> Option<&'static str> {
        self.get(label).map(|m| m.emoji).filter(|e| !e.is_empty())
    }

    pub fn default_selection(&self) -> Vec<&'static str> {
        DEFAULT_CODES
            .iter()
            .filter_map(|code| self.metrics.iter().find(|m| m.code == *code))
            .map(|m| m.label)
            .collect()
    }

    /// Find a metric from user input.
    ///
    /// Accepts, in order: an exact label, a parameter code (case-insensitive),
    /// or a 1-based position in [`labels`](Self::labels).
    pub fn lookup(&self, token: &str) -> Result<&MetricDefinition> {
        let token = token.trim();

        if let Some(metric) = self.get(token) {
            return Ok(metric);
        }

        if let Some(metric) = self
            .metrics
            .iter()
            .find(|m| m.code.eq_ignore_ascii_case(token))
        {
            return Ok(metric);
        }

        token
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.metrics.get(i))
            .ok_or_else(|| DashError::UnknownMetric(token.to_string()))
    }

    /// Map a label selection onto catalog entries, dropping repeated labels.
    ///
    /// Fails on the first label the catalog does not know, so nothing unknown
    /// ever reaches a fetcher.
    pub fn resolve<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<&MetricDefinition>> {
        let mut selected: Vec<&MetricDefinition> = Vec::with_capacity(labels.len());
        for label in labels {
            let metric = self
                .get(label.as_ref())
                .ok_or_else(|| DashError::UnknownMetric(label.as_ref().to_string()))?;
            if !selected.iter().any(|m| m.code == metric.code) {
                selected.push(metric);
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_for_known_label() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(catalog.code_for("Mean temperature (°C)").unwrap(), "T2M");
        assert_eq!(catalog.code_for("Precipitation (mm)").unwrap(), "PRECTOTCORR");
    }

    #[test]
    fn test_code_for_unknown_label() {
        let catalog = MetricCatalog::builtin();
        let err = catalog.code_for("Cloud cover (%)").unwrap_err();
        assert!(matches!(err, DashError::UnknownMetric(ref l) if l == "Cloud cover (%)"));
    }

    #[test]
    fn test_emoji_for() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(catalog.emoji_for("Mean wind 10m (m/s)"), Some("💨"));
        assert_eq!(catalog.emoji_for("Specific humidity (g/kg)"), None);
        assert_eq!(catalog.emoji_for("nope"), None);
    }

    #[test]
    fn test_default_selection() {
        let catalog = MetricCatalog::builtin();
        let codes: Vec<&str> = catalog
            .default_selection()
            .iter()
            .map(|l| catalog.code_for(l).unwrap())
            .collect();
        assert_eq!(codes, vec!["T2M", "PRECTOTCORR", "RH2M", "PS", "WS10M"]);
    }

    #[test]
    fn test_labels_keep_display_order() {
        let catalog = MetricCatalog::builtin();
        let labels = catalog.labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Temperature range (°C)");
        assert_eq!(labels[11], "Mean wind 10m (m/s)");
    }

    #[test]
    fn test_lookup_accepts_label_code_and_index() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(catalog.lookup("Relative humidity (%)").unwrap().code, "RH2M");
        assert_eq!(catalog.lookup("ws10m").unwrap().code, "WS10M");
        assert_eq!(catalog.lookup(" 7 ").unwrap().code, "T2M");
        assert!(catalog.lookup("0").is_err());
        assert!(catalog.lookup("13").is_err());
        assert!(catalog.lookup("humidity").is_err());
    }

    #[test]
    fn test_resolve_dedupes_and_rejects_unknown() {
        let catalog = MetricCatalog::builtin();
        let selected = catalog
            .resolve(&["Precipitation (mm)", "Mean temperature (°C)", "Precipitation (mm)"])
            .unwrap();
        let codes: Vec<&str> = selected.iter().map(|m| m.code).collect();
        assert_eq!(codes, vec!["PRECTOTCORR", "T2M"]);

        assert!(matches!(
            catalog.resolve(&["Mean temperature (°C)", "Ozone"]),
            Err(DashError::UnknownMetric(_))
        ));
    }
}
