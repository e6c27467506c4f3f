//! Trace loader: typed tables for a completed benchmark run
//!
//! Every artifact is decoded once, here, into fixed record types. Nothing
//! downstream looks at column names.

use crate::csv_input::CsvTable;
use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Transaction identifier; the high 32 bits name the owning worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(pub u64);

/// Worker thread identifier decoded from a [`TxnId`]
pub type ThreadId = u32;

impl TxnId {
    /// Pack a thread id and a per-thread sequence number
    pub fn from_parts(thread: ThreadId, seq: u32) -> Self {
        Self((u64::from(thread) << 32) | u64::from(seq))
    }

    /// Owning worker thread (`txn_id >> 32`)
    pub fn thread_id(self) -> ThreadId {
        (self.0 >> 32) as ThreadId
    }
}

/// One attempted transaction from trace.csv
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRecord {
    pub txn_id: TxnId,
    /// Start time, epoch milliseconds
    pub start: u64,
    /// End time, epoch milliseconds
    pub end: u64,
    pub error: bool,
    pub rollback: bool,
}

impl TransactionRecord {
    /// Neither errored nor rolled back
    pub fn is_success(&self) -> bool {
        !self.error && !self.rollback
    }

    /// Latency in milliseconds (saturating for clock skew)
    pub fn latency_ms(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn thread_id(&self) -> ThreadId {
        self.txn_id.thread_id()
    }
}

/// Transactions the database durably committed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTxnSet {
    ids: HashSet<TxnId>,
}

impl PersistedTxnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TxnId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: TxnId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: TxnId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A successful record whose id never reached durable storage
    pub fn is_lost(&self, record: &TransactionRecord) -> bool {
        record.is_success() && !self.contains(record.txn_id)
    }
}

impl FromIterator<TxnId> for PersistedTxnSet {
    fn from_iter<I: IntoIterator<Item = TxnId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Run timing metadata from runInfo.csv
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunInfo {
    /// Run start, epoch milliseconds
    pub start_ts: u64,
    pub rampup_mins: u64,
    pub run_mins: u64,
}

impl RunInfo {
    /// End of ramp-up, epoch milliseconds
    pub fn rampup_end_ms(&self) -> u64 {
        self.start_ts + self.rampup_mins * 60_000
    }

    /// End of ramp-up, seconds since run start
    pub fn rampup_end_secs(&self) -> usize {
        (self.rampup_mins * 60) as usize
    }

    /// Observed span (ramp-up plus measurement), seconds
    pub fn total_secs(&self) -> usize {
        ((self.rampup_mins + self.run_mins) * 60) as usize
    }

    /// Convert an epoch instant to seconds since run start (clamped at 0)
    pub fn relative_secs(&self, epoch_ms: u64) -> f64 {
        epoch_ms.saturating_sub(self.start_ts) as f64 / 1000.0
    }
}

/// A single injected fault from faultInfo.csv
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultInfo {
    /// Fault start, epoch milliseconds
    pub start: u64,
    /// Fault duration, milliseconds
    pub duration: u64,
}

impl FaultInfo {
    pub fn end(&self) -> u64 {
        self.start + self.duration
    }
}

/// Well-known artifact locations inside a result directory
#[derive(Debug, Clone)]
pub struct ResultDir {
    data_dir: PathBuf,
}

impl ResultDir {
    pub const RUN_INFO: &'static str = "runInfo.csv";
    pub const FAULT_INFO: &'static str = "faultInfo.csv";
    pub const TRACE: &'static str = "trace.csv";
    pub const PERSISTED: &'static str = "persisted.csv";
    pub const WORKFLOW_JSON: &'static str = "fault.json";
    pub const WORKFLOW_TOML: &'static str = "fault.toml";
    pub const METRICS: &'static str = "metrics.csv";
    pub const STEADY_STATE: &'static str = "steady_state.csv";

    /// Result directory whose artifacts live under `<root>/data/`
    pub fn new(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Workflow document, if one was recorded for this run
    pub fn workflow_path(&self) -> Option<PathBuf> {
        [Self::WORKFLOW_JSON, Self::WORKFLOW_TOML]
            .iter()
            .map(|name| self.path(name))
            .find(|p| p.exists())
    }
}

/// Load trace.csv (`txn_id,start,end,error,rollback`)
pub fn load_trace(path: &Path) -> Result<Vec<TransactionRecord>> {
    let table = CsvTable::read(path)?;
    let id_col = table.column("txn_id")?;
    let start_col = table.column("start")?;
    let end_col = table.column("end")?;
    let error_col = table.column("error")?;
    let rollback_col = table.column("rollback")?;

    let records = table
        .rows()
        .iter()
        .map(|row| {
            Ok(TransactionRecord {
                txn_id: TxnId(table.parse_field(row, id_col, "txn_id")?),
                start: table.parse_field(row, start_col, "start")?,
                end: table.parse_field(row, end_col, "end")?,
                error: table.parse_flag(row, error_col, "error")?,
                rollback: table.parse_flag(row, rollback_col, "rollback")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("loaded {} trace records from {}", records.len(), path.display());
    Ok(records)
}

/// Load the persisted-transaction log (needs a `txn_id` column)
pub fn load_persisted(path: &Path) -> Result<PersistedTxnSet> {
    let table = CsvTable::read(path)?;
    let id_col = table.column("txn_id")?;
    let set = table
        .rows()
        .iter()
        .map(|row| table.parse_field(row, id_col, "txn_id").map(TxnId))
        .collect::<Result<PersistedTxnSet>>()?;

    tracing::debug!("loaded {} persisted txn ids from {}", set.len(), path.display());
    Ok(set)
}

/// Load runInfo.csv (first row)
pub fn load_run_info(path: &Path) -> Result<RunInfo> {
    let table = CsvTable::read(path)?;
    let start_col = table.column("startTS")?;
    let rampup_col = table.column("rampupMins")?;
    let run_col = table.column("runMins")?;

    let row = table.rows().first().ok_or_else(|| {
        crate::error::AnalysisError::malformed(ResultDir::RUN_INFO, 2, "no data row")
    })?;

    Ok(RunInfo {
        start_ts: table.parse_field(row, start_col, "startTS")?,
        rampup_mins: table.parse_field(row, rampup_col, "rampupMins")?,
        run_mins: table.parse_field(row, run_col, "runMins")?,
    })
}

/// Load faultInfo.csv; a missing or header-only file means no fault
pub fn load_fault_info(path: &Path) -> Result<Option<FaultInfo>> {
    if !path.exists() {
        tracing::info!("no fault info at {}", path.display());
        return Ok(None);
    }
    let table = CsvTable::read(path)?;
    let Some(row) = table.rows().first() else {
        tracing::info!("fault info is empty, run had no fault");
        return Ok(None);
    };

    let start_col = table.column("start")?;
    let start: u64 = table.parse_field(row, start_col, "start")?;
    let duration = match table.optional_column("duration") {
        Some(col) => table.parse_field(row, col, "duration")?,
        None => {
            let end_col = table.column("end")?;
            let end: u64 = table.parse_field(row, end_col, "end")?;
            end.saturating_sub(start)
        }
    };

    if table.rows().len() > 1 {
        tracing::warn!(
            "fault info has {} rows, only the first is used",
            table.rows().len()
        );
    }

    Ok(Some(FaultInfo { start, duration }))
}
