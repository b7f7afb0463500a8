use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Dashboard, Query, parse_date, today};
use crate::domain::{LocationTable, MetricCatalog};
use crate::error::Result;
use crate::present::{Report, render_report, write_export};

/// Parse a comma-separated metric selection into catalog labels.
///
/// Each item may be a label, a code, or a position in the catalog list.
/// `none` selects nothing.
pub fn parse_selection(catalog: &MetricCatalog, input: &str) -> Result<Vec<String>> {
    if input.trim().eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| catalog.lookup(token).map(|m| m.label.to_string()))
        .collect()
}

/// Interactive prompt loop over a [`Dashboard`].
///
/// Answers persist as the next prompt's defaults, the way form widgets
/// keep their values between runs.
pub struct Session<'d, 'a> {
    dashboard: &'d Dashboard<'a>,
    places: &'d LocationTable,
    output_dir: PathBuf,
    query: Query,
    show_progress: bool,
}

impl<'d, 'a> Session<'d, 'a> {
    pub fn new(
        dashboard: &'d Dashboard<'a>,
        places: &'d LocationTable,
        output_dir: impl Into<PathBuf>,
        initial: Query,
    ) -> Self {
        Self {
            dashboard,
            places,
            output_dir: output_dir.into(),
            query: initial,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Prompt, run, render, and offer exports until `quit` or end of input.
    ///
    /// Query errors are printed and the loop continues; only failures to
    /// read input or write output end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        self.print_intro(&mut out)?;

        loop {
            writeln!(out)?;
            let Some(place) = prompt(&mut input, &mut out, "Place", &self.query.place)? else {
                break;
            };
            if matches!(place.to_lowercase().as_str(), "q" | "quit" | "exit") {
                break;
            }

            let Some(date) = self.prompt_date(&mut input, &mut out)? else {
                break;
            };
            let Some(metrics) = self.prompt_metrics(&mut input, &mut out)? else {
                break;
            };

            self.query = Query {
                place,
                date,
                metrics,
            };

            let query = self.query.clone();
            match self.execute(&query) {
                Ok(report) => {
                    writeln!(out)?;
                    render_report(&report, &mut out)?;
                    if !self.offer_exports(&report, &mut input, &mut out)? {
                        break;
                    }
                }
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }

        writeln!(out, "Bye.")?;
        Ok(())
    }

    /// Run a single query without prompting.
    ///
    /// Returns `false` when the query or any fetch failed.
    pub fn run_once<W: Write>(&self, export: bool, mut out: W) -> io::Result<bool> {
        let report = match self.execute(&self.query) {
            Ok(report) => report,
            Err(e) => {
                writeln!(out, "Error: {e}")?;
                return Ok(false);
            }
        };

        render_report(&report, &mut out)?;

        let mut ok = !report.has_failures();
        if export && !self.write_exports(&report, &mut out)? {
            ok = false;
        }
        Ok(ok)
    }

    fn execute(&self, query: &Query) -> Result<Report<'a>> {
        let spinner = self
            .show_progress
            .then(|| create_spinner(&format!("Fetching data for {}...", query.place)));
        let result = self.dashboard.run(query);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }

    fn print_intro<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Weather dashboard. Enter 'q' at the place prompt to quit.")?;

        if !self.places.is_empty() {
            writeln!(out)?;
            writeln!(out, "Known places:")?;
            let names: Vec<&str> = self.places.names().collect();
            writeln!(out, "  {}", names.join(", "))?;
        }

        writeln!(out)?;
        writeln!(out, "Metrics:")?;
        for (i, metric) in self.dashboard.catalog().definitions().iter().enumerate() {
            writeln!(out, "  {:>2}. {} [{}]", i + 1, metric.label, metric.code)?;
        }
        Ok(())
    }

    fn prompt_date<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<Option<NaiveDate>> {
        let current = self.query.date.format("%Y-%m-%d").to_string();
        loop {
            let Some(answer) = prompt(input, out, "Date", &current)? else {
                return Ok(None);
            };
            match parse_date(&answer, today()) {
                Ok(date) => return Ok(Some(date)),
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
    }

    fn prompt_metrics<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<Option<Vec<String>>> {
        let catalog = self.dashboard.catalog();
        let current = current_selection(catalog, &self.query.metrics);
        loop {
            let Some(answer) = prompt(input, out, "Metrics", &current)? else {
                return Ok(None);
            };
            match parse_selection(catalog, &answer) {
                Ok(metrics) => return Ok(Some(metrics)),
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
    }

    /// Ask before writing CSV files. Returns `false` on end of input.
    fn offer_exports<R: BufRead, W: Write>(
        &self,
        report: &Report<'_>,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<bool> {
        if report.exports().is_empty() {
            return Ok(true);
        }

        writeln!(out)?;
        let question = format!("Export CSV files to {}? [y/N]", self.output_dir.display());
        let Some(answer) = prompt(input, out, &question, "")? else {
            return Ok(false);
        };
        if matches!(answer.to_lowercase().as_str(), "y" | "yes") {
            self.write_exports(report, out)?;
        }
        Ok(true)
    }

    /// Returns `false` if any file could not be written
    fn write_exports<W: Write>(&self, report: &Report<'_>, out: &mut W) -> io::Result<bool> {
        let mut ok = true;
        for (file_name, row) in report.exports() {
            match write_export(&self.output_dir, &file_name, &row) {
                Ok(path) => writeln!(out, "Saved {}", display_path(&path))?,
                Err(e) => {
                    writeln!(out, "Error: {e}")?;
                    ok = false;
                }
            }
        }
        Ok(ok)
    }
}

/// Print `label [default]: ` and read one line.
///
/// An empty answer yields `default`; end of input yields `None`.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: &str,
) -> io::Result<Option<String>> {
    if default.is_empty() {
        write!(out, "{label}: ")?;
    } else {
        write!(out, "{label} [{default}]: ")?;
    }
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let answer = line.trim();
    if answer.is_empty() {
        Ok(Some(default.to_string()))
    } else {
        Ok(Some(answer.to_string()))
    }
}

/// Current selection as catalog positions, e.g. `7,10,9`
fn current_selection(catalog: &MetricCatalog, labels: &[String]) -> String {
    if labels.is_empty() {
        return "none".to_string();
    }
    let definitions = catalog.definitions();
    labels
        .iter()
        .filter_map(|label| definitions.iter().position(|m| m.label == label.as_str()))
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
