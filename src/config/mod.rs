use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::{Location, LocationTable};

/// How place names are turned into coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderMode {
    /// Location table first, then Nominatim
    #[default]
    Auto,
    /// Location table only
    Table,
    /// Nominatim only
    Nominatim,
}

fn default_place() -> String {
    "Conakry".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileConfig {
    #[serde(default = "default_place")]
    pub place: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub geocoder: GeocoderMode,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub air_quality: AirQualityConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            place: default_place(),
            output_dir: default_output_dir(),
            geocoder: GeocoderMode::default(),
            verbose: default_verbose(),
            locations: Vec::new(),
            weather: WeatherConfig::default(),
            geocoding: GeocodingConfig::default(),
            air_quality: AirQualityConfig::default(),
        }
    }
}

/// One `[[locations]]` entry
#[derive(Debug, Deserialize, Clone)]
pub struct LocationEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

fn default_weather_url() -> String {
    "https://power.larc.nasa.gov".to_string()
}
fn default_community() -> String {
    "AG".to_string()
}
fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}
fn default_air_quality_url() -> String {
    "https://api.openweathermap.org".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// NASA POWER daily point API
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            community: default_community(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// OpenWeatherMap air pollution API; disabled without a key
#[derive(Debug, Deserialize, Clone)]
pub struct AirQualityConfig {
    #[serde(default = "default_air_quality_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            base_url: default_air_quality_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FileConfig {
    /// Load the first config file found in the search paths.
    ///
    /// Nothing is logged here; call [`LoadedConfig::log`] once logging is up.
    pub fn load() -> LoadedConfig {
        Self::load_from(&get_config_paths())
    }

    /// Load the first of `paths` that parses, remembering the ones that did not
    pub fn load_from(paths: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();
        for path in paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => {
                        return LoadedConfig {
                            config: Some(config),
                            source: Some(path.clone()),
                            skipped,
                        };
                    }
                    Err(e) => skipped.push((path.clone(), e.to_string())),
                }
            }
        }
        LoadedConfig {
            config: None,
            source: None,
            skipped,
        }
    }

    /// Load an explicitly requested config file; missing or invalid is an error
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.locations {
            if !seen.insert(entry.name.as_str()) {
                bail!("Duplicate location name in config: {}", entry.name);
            }
            if !(-90.0..=90.0).contains(&entry.lat) {
                bail!(
                    "Latitude for {} must be between -90 and 90, got {}",
                    entry.name,
                    entry.lat
                );
            }
            if !(-180.0..=180.0).contains(&entry.lon) {
                bail!(
                    "Longitude for {} must be between -180 and 180, got {}",
                    entry.name,
                    entry.lon
                );
            }
        }

        for (service, url, timeout) in [
            ("weather", &self.weather.base_url, self.weather.timeout_secs),
            ("geocoding", &self.geocoding.base_url, self.geocoding.timeout_secs),
            (
                "air_quality",
                &self.air_quality.base_url,
                self.air_quality.timeout_secs,
            ),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("[{}] base_url must be an HTTP or HTTPS URL: {}", service, url);
            }
            if timeout == 0 {
                bail!("[{}] timeout_secs must be greater than zero", service);
            }
        }

        Ok(())
    }

    pub fn location_table(&self) -> LocationTable {
        LocationTable::new(
            self.locations
                .iter()
                .map(|e| Location::new(e.name.clone(), e.lat, e.lon))
                .collect(),
        )
    }
}

/// Outcome of searching for a config file
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: Option<FileConfig>,
    /// File the config came from
    pub source: Option<PathBuf>,
    /// Files that exist but failed to parse, with the parse error
    pub skipped: Vec<(PathBuf, String)>,
}

impl LoadedConfig {
    pub fn explicit(config: FileConfig, path: &Path) -> Self {
        Self {
            config: Some(config),
            source: Some(path.to_path_buf()),
            skipped: Vec::new(),
        }
    }

    pub fn verbose(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.verbose)
    }

    pub fn log(&self) {
        for (path, error) in &self.skipped {
            warn!("Failed to parse config file {}: {}", path.display(), error);
        }
        match self.source {
            Some(ref path) => debug!("Loaded config from {}", path.display()),
            None => debug!("No config file found, using defaults"),
        }
    }

    pub fn into_config(self) -> FileConfig {
        self.config.unwrap_or_default()
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("wxdash.toml"));
    paths.push(PathBuf::from(".wxdash.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wxdash").join("config.toml"));
        paths.push(config_dir.join("wxdash.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".wxdash.toml"));
        paths.push(home.join(".config").join("wxdash").join("config.toml"));
    }

    paths
}
