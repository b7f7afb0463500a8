use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wxdash::api::{
    AirPollutionClient, AirQualitySource, ChainedGeocoder, Geocoder, NominatimGeocoder,
    PowerClient, http_client,
};
use wxdash::config::{FileConfig, GeocoderMode, LoadedConfig};
use wxdash::dashboard::{parse_date, parse_selection, today};
use wxdash::domain::MetricCatalog;
use wxdash::{Dashboard, Query, Session};

/// Daily NASA POWER weather and OpenWeatherMap air quality for a place
///
/// Examples:
///   # Interactive dashboard, starting from the configured place
///   wxdash
///
///   # One report for Kindia on a given day, then exit
///   wxdash -p Kindia -d 2024-01-01 --once
///
///   # Pick metrics by label, code or list position and save CSV files
///   wxdash -p Labé -m T2M -m 10,9 --once --export -o ./out
///
///   # Use a config file
///   wxdash --config my-places.toml
#[derive(Parser, Debug)]
#[command(name = "wxdash")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches wxdash.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Place name (table entry or free text for Nominatim)
    #[arg(short = 'p', long)]
    place: Option<String>,

    /// Date as YYYY-MM-DD or DD/MM/YYYY (defaults to today)
    #[arg(short = 'd', long)]
    date: Option<String>,

    /// Metric label, code or list position; repeat or comma-separate, "none" for no weather
    #[arg(short = 'm', long = "metric")]
    metrics: Vec<String>,

    /// Directory for CSV exports
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// How place names are resolved
    #[arg(long)]
    geocoder: Option<GeocoderMode>,

    /// OpenWeatherMap API key; air quality is skipped without one
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    air_quality_key: Option<String>,

    /// Print one report and exit instead of prompting
    #[arg(long)]
    once: bool,

    /// With --once, write the CSV exports as well
    #[arg(long, requires = "once")]
    export: bool,

    /// List the metric catalog and exit
    #[arg(long)]
    list_metrics: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let loaded = match args.config {
        Some(ref path) => LoadedConfig::explicit(FileConfig::from_path(path)?, path),
        None => FileConfig::load(),
    };

    init_logging(args.verbose || loaded.verbose());
    loaded.log();
    let mut config = loaded.into_config();

    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(mode) = args.geocoder {
        config.geocoder = mode;
    }
    if let Some(ref key) = args.air_quality_key {
        config.air_quality.api_key = Some(key.clone());
    }
    config.validate().context("Invalid configuration")?;

    let catalog = MetricCatalog::builtin();

    if args.list_metrics {
        for (i, metric) in catalog.definitions().iter().enumerate() {
            println!("{:>2}. {} [{}]", i + 1, metric.label, metric.code);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let query = initial_query(&args, &config, &catalog)?;
    debug!("Initial query: {:?}", query);

    let client = http_client().context("Failed to build HTTP client")?;
    let places = config.location_table();

    let geocoder: Box<dyn Geocoder> = match config.geocoder {
        GeocoderMode::Table => Box::new(places.clone()),
        GeocoderMode::Nominatim => {
            Box::new(NominatimGeocoder::new(client.clone(), &config.geocoding))
        }
        GeocoderMode::Auto => Box::new(ChainedGeocoder::new(vec![
            Box::new(places.clone()),
            Box::new(NominatimGeocoder::new(client.clone(), &config.geocoding)),
        ])),
    };

    let weather = Box::new(PowerClient::new(client.clone(), &config.weather));

    let air_quality: Option<Box<dyn AirQualitySource>> = match config.air_quality.api_key {
        Some(ref key) if !key.trim().is_empty() => Some(Box::new(AirPollutionClient::new(
            client,
            &config.air_quality,
            key.trim(),
        ))),
        _ => {
            info!("No OpenWeatherMap API key configured, air quality disabled");
            None
        }
    };

    let dashboard = Dashboard::new(&catalog, geocoder, weather, air_quality);
    let mut session = Session::new(&dashboard, &places, config.output_dir.clone(), query);

    if args.once {
        let ok = session.run_once(args.export, io::stdout().lock())?;
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    session.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

/// Flags first, then config, then built-in defaults
fn initial_query(args: &Args, config: &FileConfig, catalog: &MetricCatalog) -> Result<Query> {
    let place = args.place.clone().unwrap_or_else(|| config.place.clone());

    let date = match args.date {
        Some(ref input) => parse_date(input, today())?,
        None => today(),
    };

    let metrics = if args.metrics.is_empty() {
        catalog
            .default_selection()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        let mut metrics = Vec::new();
        for input in &args.metrics {
            metrics.extend(parse_selection(catalog, input)?);
        }
        metrics
    };

    Ok(Query {
        place,
        date,
        metrics,
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "wxdash=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
