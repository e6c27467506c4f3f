//! RPO estimation: wall-clock time covered by lost committed work
//!
//! A transaction is lost when the client saw it succeed but its id never
//! made it into the persisted log. Overlapping losses are counted once.

use crate::interval::{merge_intervals, total_duration_ms, Interval};
use crate::trace::{PersistedTxnSet, TransactionRecord};
use serde::Serialize;

/// Outcome of the RPO pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpoEstimate {
    /// Total merged lost duration, milliseconds
    pub rpo_ms: u64,
    /// Number of lost transactions
    pub lost_transactions: usize,
    /// Merged lost-data windows, sorted by start
    pub lost_windows: Vec<Interval>,
}

/// Lost-work intervals, unmerged
pub fn lost_intervals(records: &[TransactionRecord], persisted: &PersistedTxnSet) -> Vec<Interval> {
    records
        .iter()
        .filter(|r| persisted.is_lost(r))
        .map(|r| Interval::new(r.start, r.end))
        .collect()
}

/// Compute RPO over a trace and the persisted-transaction set
pub fn estimate_rpo(records: &[TransactionRecord], persisted: &PersistedTxnSet) -> RpoEstimate {
    let lost = lost_intervals(records, persisted);
    let lost_transactions = lost.len();
    let lost_windows = merge_intervals(lost);
    let rpo_ms = total_duration_ms(&lost_windows);

    tracing::info!(
        "RPO: {} ms across {} lost transactions ({} windows)",
        rpo_ms,
        lost_transactions,
        lost_windows.len()
    );

    RpoEstimate {
        rpo_ms,
        lost_transactions,
        lost_windows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TxnId;

    fn txn(id: u64, start: u64, end: u64) -> TransactionRecord {
        TransactionRecord {
            txn_id: TxnId(id),
            start,
            end,
            error: false,
            rollback: false,
        }
    }

    #[test]
    fn test_nothing_lost() {
        let records = vec![txn(1, 0, 10), txn(2, 5, 20)];
        let persisted: PersistedTxnSet = [TxnId(1), TxnId(2)].into_iter().collect();
        let estimate = estimate_rpo(&records, &persisted);
        assert_eq!(estimate.rpo_ms, 0);
        assert_eq!(estimate.lost_transactions, 0);
    }

    #[test]
    fn test_overlapping_losses_counted_once() {
        let records = vec![txn(1, 0, 100), txn(2, 50, 150), txn(3, 300, 350)];
        let persisted = PersistedTxnSet::new();
        let estimate = estimate_rpo(&records, &persisted);
        assert_eq!(estimate.rpo_ms, 150 + 50);
        assert_eq!(estimate.lost_transactions, 3);
        assert_eq!(estimate.lost_windows.len(), 2);
    }

    #[test]
    fn test_failed_transactions_are_not_lost() {
        let mut errored = txn(1, 0, 100);
        errored.error = true;
        let mut rolled_back = txn(2, 0, 100);
        rolled_back.rollback = true;
        let estimate = estimate_rpo(&[errored, rolled_back], &PersistedTxnSet::new());
        assert_eq!(estimate.rpo_ms, 0);
    }
}
