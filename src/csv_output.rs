//! CSV output for run metrics
//!
//! metrics.csv carries one header row and one data row. Absent metrics are
//! written as `-1`, the placeholder external report generators expect, and
//! read back as absent. Values use Rust's shortest round-trip float
//! formatting so a written record re-reads to identical scalars.

use crate::aggregate::AggregateReport;
use crate::csv_input::CsvTable;
use crate::engine::MetricsRecord;
use crate::error::{AnalysisError, Result};
use crate::steady_state::{SteadyStateFragment, SteadyStateReport};
use std::path::Path;

/// Placeholder for an absent metric
pub const ABSENT: &str = "-1";

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => ABSENT.to_string(),
    }
}

/// Render a metrics record as CSV text
pub fn metrics_to_csv(metrics: &MetricsRecord) -> String {
    let mut output = String::new();

    output.push_str(&MetricsRecord::COLUMNS.join(","));
    output.push('\n');

    let fields: Vec<String> = metrics.values().iter().map(|v| format_value(*v)).collect();
    output.push_str(&fields.join(","));
    output.push('\n');

    output
}

fn metrics_from_table(table: &CsvTable) -> Result<MetricsRecord> {
    let row = table
        .rows()
        .first()
        .ok_or_else(|| AnalysisError::malformed(table.file(), 2, "no data row"))?;

    let mut values = [None; 6];
    for (slot, name) in values.iter_mut().zip(MetricsRecord::COLUMNS) {
        let col = table.column(name)?;
        let value: f64 = table.parse_field(row, col, name)?;
        // durations and ratios are never negative
        *slot = (value >= 0.0).then_some(value);
    }
    Ok(MetricsRecord::from_values(values))
}

/// Parse metrics CSV text; `file` is used only in error messages
pub fn parse_metrics(file: &str, text: &str) -> Result<MetricsRecord> {
    metrics_from_table(&CsvTable::parse(file, text)?)
}

/// Read a metrics.csv file
pub fn read_metrics(path: &Path) -> Result<MetricsRecord> {
    metrics_from_table(&CsvTable::read(path)?)
}

/// Write a metrics.csv file, replacing any previous one
pub fn write_metrics(path: &Path, metrics: &MetricsRecord) -> Result<()> {
    std::fs::write(path, metrics_to_csv(metrics))?;
    Ok(())
}

/// CSV formatter for per-interval steady-state fragments
#[derive(Debug, Default)]
pub struct SteadyStateCsv {
    fragments: Vec<SteadyStateFragment>,
}

impl SteadyStateCsv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fragment(&mut self, fragment: SteadyStateFragment) {
        self.fragments.push(fragment);
    }

    fn header() -> &'static str {
        "fault_start_sec,period_end_sec,recovery_time_factor,total_performance_factor,absorption_factor,recovery_factor,stationary"
    }

    fn format_fragment(fragment: &SteadyStateFragment) -> String {
        let factors = &fragment.factors;
        let stationary = match &fragment.adf {
            Some(adf) if adf.stationary => "1",
            Some(_) => "0",
            None => ABSENT,
        };
        [
            fragment.interval.start_secs.to_string(),
            fragment.interval.end_secs.to_string(),
            format_value(Some(factors.recovery_time_factor)),
            format_value(factors.total_performance_factor),
            format_value(factors.absorption_factor),
            format_value(factors.recovery_factor),
            stationary.to_string(),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(Self::header());
        output.push('\n');

        for fragment in &self.fragments {
            output.push_str(&Self::format_fragment(fragment));
            output.push('\n');
        }

        output
    }
}

impl From<Option<&SteadyStateReport>> for SteadyStateCsv {
    fn from(report: Option<&SteadyStateReport>) -> Self {
        let mut csv = Self::new();
        for fragment in report.map(|r| r.fragments.as_slice()).unwrap_or_default() {
            csv.add_fragment(fragment.clone());
        }
        csv
    }
}

/// Write steady_state.csv; a run without a fault gets a header-only file
pub fn write_steady_state(path: &Path, report: Option<&SteadyStateReport>) -> Result<()> {
    std::fs::write(path, SteadyStateCsv::from(report).to_csv())?;
    Ok(())
}

/// Render a multi-run summary as CSV text
pub fn aggregate_to_csv(report: &AggregateReport) -> String {
    let mut output = String::from("metric,samples,mean,trimmed_mean\n");
    for m in &report.metrics {
        output.push_str(&format!(
            "{},{},{},{}\n",
            m.metric,
            m.samples,
            format_value(m.mean),
            format_value(m.trimmed_mean)
        ));
    }
    output
}
