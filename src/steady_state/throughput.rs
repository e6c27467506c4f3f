// Per-second completion counts over the whole run

use crate::error::{AnalysisError, Result};
use crate::stats;
use crate::trace::{RunInfo, TransactionRecord};

/// Completions per second, indexed by seconds since run start
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputSeries {
    values: Vec<f64>,
}

impl ThroughputSeries {
    /// Seconds past the run end still counted as late completions
    pub const TAIL_SECS: usize = 600;

    /// Bucket every transaction (errors included) by `(end - startTS) / 1000`.
    ///
    /// The series covers the run's observed span plus up to
    /// [`Self::TAIL_SECS`] of late completions. Completions before `startTS`
    /// or past that tail are dropped.
    pub fn from_trace(records: &[TransactionRecord], run: &RunInfo) -> Self {
        let limit = run.total_secs() + Self::TAIL_SECS;
        let bucket = |r: &TransactionRecord| -> Option<usize> {
            let secs = r.end.checked_sub(run.start_ts)? / 1000;
            usize::try_from(secs).ok().filter(|&b| b < limit)
        };

        let last_bucket = records.iter().filter_map(bucket).max();
        let len = run.total_secs().max(last_bucket.map_or(0, |b| b + 1));

        let mut values = vec![0.0; len];
        let mut dropped = 0usize;
        for record in records {
            match bucket(record) {
                Some(b) => values[b] += 1.0,
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(
                "{} completions fall outside the run span and were not counted",
                dropped
            );
        }
        Self { values }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Throughput the system should sustain: mean over
    /// `[rampup_end, first_onset)`, or the single value at the ramp-up
    /// boundary when the fault lands before ramp-up completes
    pub fn desired_performance(&self, rampup_end_secs: usize, first_onset_secs: f64) -> Result<f64> {
        let onset = first_onset_secs.max(0.0).floor() as usize;
        let desired = if onset > rampup_end_secs {
            let end = onset.min(self.values.len());
            if rampup_end_secs >= end {
                return Err(AnalysisError::degenerate(
                    "baseline throughput window lies outside the series",
                ));
            }
            stats::mean(&self.values[rampup_end_secs..end])?
        } else {
            *self.values.get(rampup_end_secs).ok_or_else(|| {
                AnalysisError::degenerate("ramp-up boundary lies outside the series")
            })?
        };

        if desired <= 0.0 {
            return Err(AnalysisError::degenerate(
                "baseline throughput is zero",
            ));
        }
        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TxnId;

    fn done_at(end: u64, error: bool) -> TransactionRecord {
        TransactionRecord {
            txn_id: TxnId(0),
            start: end.saturating_sub(10),
            end,
            error,
            rollback: false,
        }
    }

    #[test]
    fn test_buckets_include_errors() {
        let run = RunInfo {
            start_ts: 10_000,
            rampup_mins: 0,
            run_mins: 1,
        };
        let records = vec![
            done_at(10_100, false),
            done_at(10_900, true),
            done_at(12_000, false),
            done_at(9_000, false),
        ];
        let series = ThroughputSeries::from_trace(&records, &run);
        assert_eq!(series.len(), 60);
        assert_eq!(&series.values()[..3], &[2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_series_extends_past_run_span() {
        let run = RunInfo {
            start_ts: 0,
            rampup_mins: 0,
            run_mins: 1,
        };
        let series = ThroughputSeries::from_trace(&[done_at(65_500, false)], &run);
        assert_eq!(series.len(), 66);
        assert_eq!(series.values()[65], 1.0);
    }

    #[test]
    fn test_far_future_completion_is_dropped() {
        let run = RunInfo {
            start_ts: 0,
            rampup_mins: 0,
            run_mins: 5,
        };
        let records = vec![done_at(1_500, false), done_at(1_700_000_000_000_000, false)];
        let series = ThroughputSeries::from_trace(&records, &run);
        assert_eq!(series.len(), 300);
        assert_eq!(series.values().iter().sum::<f64>(), 1.0);
        assert_eq!(series.values()[1], 1.0);
    }

    #[test]
    fn test_desired_performance_mean() {
        let series = ThroughputSeries::from_values(vec![1.0, 1.0, 10.0, 20.0, 0.0, 0.0]);
        assert!((series.desired_performance(2, 4.0).unwrap() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_desired_performance_fault_during_rampup() {
        let series = ThroughputSeries::from_values(vec![1.0, 2.0, 7.0, 20.0]);
        assert_eq!(series.desired_performance(2, 1.0).unwrap(), 7.0);
    }

    #[test]
    fn test_desired_performance_zero_is_degenerate() {
        let series = ThroughputSeries::from_values(vec![0.0; 10]);
        assert!(matches!(
            series.desired_performance(2, 5.0),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }
}
