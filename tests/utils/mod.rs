// Integration test utilities
//
// Helpers that lay out synthetic result directories on disk

#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// One row of trace.csv
#[derive(Debug, Clone, Copy)]
pub struct Txn {
    pub thread: u32,
    pub seq: u32,
    pub start: u64,
    pub end: u64,
    pub error: bool,
    pub rollback: bool,
}

impl Txn {
    pub fn ok(thread: u32, seq: u32, start: u64, end: u64) -> Self {
        Self {
            thread,
            seq,
            start,
            end,
            error: false,
            rollback: false,
        }
    }

    pub fn id(&self) -> u64 {
        txn_id(self.thread, self.seq)
    }
}

/// Pack a thread id and per-thread sequence number into a txn id
pub fn txn_id(thread: u32, seq: u32) -> u64 {
    (u64::from(thread) << 32) | u64::from(seq)
}

/// Builder for a `<root>/data/` result directory
#[derive(Debug, Clone)]
pub struct ResultDirFixture {
    pub start_ts: u64,
    pub rampup_mins: u64,
    pub run_mins: u64,
    /// `(start, duration)` in epoch milliseconds
    pub fault: Option<(u64, u64)>,
    pub trace: Vec<Txn>,
    /// Persisted ids; `None` persists every successful transaction
    pub persisted: Option<Vec<u64>>,
    pub workflow_json: Option<String>,
}

impl ResultDirFixture {
    pub fn new(start_ts: u64, rampup_mins: u64, run_mins: u64) -> Self {
        Self {
            start_ts,
            rampup_mins,
            run_mins,
            fault: None,
            trace: Vec::new(),
            persisted: None,
            workflow_json: None,
        }
    }

    pub fn with_fault(mut self, start: u64, duration: u64) -> Self {
        self.fault = Some((start, duration));
        self
    }

    pub fn with_trace(mut self, trace: Vec<Txn>) -> Self {
        self.trace = trace;
        self
    }

    /// Persist every successful transaction except `lost`
    pub fn losing(mut self, lost: &[u64]) -> Self {
        self.persisted = Some(
            self.trace
                .iter()
                .filter(|t| !t.error && !t.rollback)
                .map(Txn::id)
                .filter(|id| !lost.contains(id))
                .collect(),
        );
        self
    }

    pub fn with_workflow(mut self, json: &str) -> Self {
        self.workflow_json = Some(json.to_string());
        self
    }

    pub fn write(&self, root: &Path) {
        let data = root.join("data");
        fs::create_dir_all(&data).unwrap();

        fs::write(
            data.join("runInfo.csv"),
            format!(
                "startTS,rampupMins,runMins\n{},{},{}\n",
                self.start_ts, self.rampup_mins, self.run_mins
            ),
        )
        .unwrap();

        let mut fault = String::from("start,duration\n");
        if let Some((start, duration)) = self.fault {
            fault.push_str(&format!("{},{}\n", start, duration));
        }
        fs::write(data.join("faultInfo.csv"), fault).unwrap();

        let mut trace = String::from("txn_id,start,end,error,rollback\n");
        for t in &self.trace {
            trace.push_str(&format!(
                "{},{},{},{},{}\n",
                t.id(),
                t.start,
                t.end,
                u8::from(t.error),
                u8::from(t.rollback)
            ));
        }
        fs::write(data.join("trace.csv"), trace).unwrap();

        let persisted_ids: Vec<u64> = match &self.persisted {
            Some(ids) => ids.clone(),
            None => self
                .trace
                .iter()
                .filter(|t| !t.error && !t.rollback)
                .map(Txn::id)
                .collect(),
        };
        let mut persisted = String::from("txn_id\n");
        for id in persisted_ids {
            persisted.push_str(&format!("{}\n", id));
        }
        fs::write(data.join("persisted.csv"), persisted).unwrap();

        if let Some(json) = &self.workflow_json {
            fs::write(data.join("fault.json"), json).unwrap();
        }
    }
}

/// Worker threads completing one 100 ms transaction back to back from
/// `start` to `end` (epoch ms), except that each thread stalls over
/// `stall` (epoch ms) and completes nothing inside it
pub fn steady_workers(threads: u32, start: u64, end: u64, stall: Option<(u64, u64)>) -> Vec<Txn> {
    let mut trace = Vec::new();
    for thread in 1..=threads {
        let mut seq = 0;
        let mut t = start;
        while t + 100 <= end {
            let done = t + 100;
            let stalled = stall.is_some_and(|(from, to)| done > from && done < to);
            if !stalled {
                trace.push(Txn::ok(thread, seq, t, done));
                seq += 1;
            }
            t += 100;
        }
    }
    trace
}

/// The 4-thread scenario: fault at t=1000 ms, every thread stalls 5000 ms
pub fn four_thread_outage() -> ResultDirFixture {
    ResultDirFixture::new(0, 0, 1)
        .with_fault(1_000, 5_000)
        .with_trace(steady_workers(4, 0, 60_000, Some((1_000, 6_000))))
}
