//! Multi-run aggregation of metrics.csv files
//!
//! Repeated runs of the same fault give noisy metrics. Each metric is
//! averaged over the runs that report it, and a trimmed mean drops the single
//! best and worst run once at least three runs are available.

use crate::csv_output;
use crate::engine::MetricsRecord;
use crate::error::{absent_on_degenerate, AnalysisError, Result};
use crate::stats;
use crate::trace::ResultDir;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One metric summarized across runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAggregate {
    pub metric: String,
    /// Runs that reported a value for this metric
    pub samples: usize,
    pub mean: Option<f64>,
    pub trimmed_mean: Option<f64>,
}

/// All metrics summarized across a set of runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Result directories that contributed a metrics record
    pub runs: Vec<PathBuf>,
    pub metrics: Vec<MetricAggregate>,
}

impl AggregateReport {
    pub fn metric(&self, name: &str) -> Option<&MetricAggregate> {
        self.metrics.iter().find(|m| m.metric == name)
    }
}

/// Summarize already-loaded metrics records, skipping absent values
pub fn aggregate(records: &[MetricsRecord]) -> Result<Vec<MetricAggregate>> {
    MetricsRecord::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &name)| -> Result<MetricAggregate> {
            let samples: Vec<f64> = records.iter().filter_map(|r| r.values()[i]).collect();
            let (mean, trimmed_mean) = if samples.is_empty() {
                (None, None)
            } else {
                (
                    absent_on_degenerate(stats::mean(&samples), name)?,
                    absent_on_degenerate(stats::trimmed_mean(&samples), name)?,
                )
            };
            Ok(MetricAggregate {
                metric: name.to_string(),
                samples: samples.len(),
                mean,
                trimmed_mean,
            })
        })
        .collect()
}

/// Read `data/metrics.csv` from every result directory and summarize.
///
/// Directories without a metrics file are skipped with a warning; any other
/// read error aborts.
pub fn aggregate_result_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<AggregateReport> {
    let mut runs = Vec::new();
    let mut records = Vec::new();

    for dir in dirs {
        let root = dir.as_ref();
        let path = ResultDir::new(root).path(ResultDir::METRICS);
        match csv_output::read_metrics(&path) {
            Ok(record) => {
                runs.push(root.to_path_buf());
                records.push(record);
            }
            Err(AnalysisError::MissingArtifact { path }) => {
                tracing::warn!("skipping {}: no metrics at {}", root.display(), path.display());
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!("aggregating metrics from {} runs", runs.len());
    Ok(AggregateReport {
        runs,
        metrics: aggregate(&records)?,
    })
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Runs: {}", self.runs.len())?;
        writeln!(
            f,
            "{:<26} {:>7} {:>14} {:>14}",
            "metric", "samples", "mean", "trimmed_mean"
        )?;
        for m in &self.metrics {
            let show = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v));
            writeln!(
                f,
                "{:<26} {:>7} {:>14} {:>14}",
                m.metric,
                m.samples,
                show(m.mean),
                show(m.trimmed_mean)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_rto(rto: Option<f64>) -> MetricsRecord {
        MetricsRecord {
            rto,
            rpo: Some(0.0),
            ..MetricsRecord::default()
        }
    }

    #[test]
    fn test_mean_and_trimmed_mean() {
        let records: Vec<MetricsRecord> = [1000.0, 2000.0, 3000.0, 10_000.0]
            .iter()
            .map(|&v| with_rto(Some(v)))
            .collect();
        let summary = aggregate(&records).unwrap();
        let rto = &summary[0];
        assert_eq!(rto.metric, "rto");
        assert_eq!(rto.samples, 4);
        assert!((rto.mean.unwrap() - 4000.0).abs() < 1e-3);
        assert!((rto.trimmed_mean.unwrap() - 2500.0).abs() < 1e-3);
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let records = vec![with_rto(Some(100.0)), with_rto(None), with_rto(Some(300.0))];
        let summary = aggregate(&records).unwrap();
        assert_eq!(summary[0].samples, 2);
        assert!((summary[0].mean.unwrap() - 200.0).abs() < 1e-3);
        // nothing reported the recovery factor
        assert_eq!(summary[5].samples, 0);
        assert_eq!(summary[5].mean, None);
    }

    #[test]
    fn test_aggregate_result_dirs_skips_missing() {
        let with_metrics = TempDir::new().unwrap();
        let without_metrics = TempDir::new().unwrap();
        let dir = ResultDir::new(with_metrics.path());
        std::fs::create_dir_all(dir.data_dir()).unwrap();
        csv_output::write_metrics(&dir.path(ResultDir::METRICS), &with_rto(Some(42.0))).unwrap();

        let report =
            aggregate_result_dirs(&[with_metrics.path(), without_metrics.path()]).unwrap();
        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.metric("rto").unwrap().mean, Some(42.0));
    }
}
