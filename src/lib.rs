//! Recuperar - recovery analytics for fault-injected database benchmarks
//!
//! This library turns the artifacts of a completed benchmark run (a
//! per-transaction trace, the persisted-transaction log, run timing and the
//! fault description) into recovery metrics: RTO by per-thread gap analysis,
//! RPO by lost-work interval merging, and steady-state recovery factors by
//! MSER equilibration of the smoothed throughput series.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_input;
pub mod csv_output;
pub mod engine;
pub mod error;
pub mod interval;
pub mod json_output;
pub mod numeric;
pub mod rpo;
pub mod rto;
pub mod stats;
pub mod steady_state;
pub mod trace;
pub mod workflow;

pub use config::AnalysisConfig;
pub use engine::{analyze, analyze_result_dir, MetricsRecord, RunArtifacts, RunReport};
pub use error::{AnalysisError, Result};
