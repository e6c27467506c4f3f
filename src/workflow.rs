//! Fault timeline resolution
//!
//! A fault is either a single chaos action or a workflow: a tree of named
//! templates composed serially or in parallel. Resolution lays the tree out
//! on a run-relative clock and returns the instant each leaf action starts.
//!
//! # Document shape
//!
//! The workflow document uses chaos-mesh field names and may be JSON or TOML:
//!
//! ```json
//! {
//!   "spec": {
//!     "entry": "main",
//!     "templates": [
//!       { "name": "main", "templateType": "Serial", "children": ["delay", "kill"] },
//!       { "name": "delay", "templateType": "NetworkChaos", "deadline": "30s" },
//!       { "name": "kill", "templateType": "PodChaos", "podChaos": { "action": "pod-kill" } }
//!     ]
//!   }
//! }
//! ```

use crate::error::{AnalysisError, Result};
use crate::trace::{FaultInfo, RunInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Chaos actions that complete instantly whatever their configured deadline
const INSTANTANEOUS_ACTIONS: [&str; 2] = ["pod-kill", "container-kill"];

/// Raw workflow document as written by the fault-injection tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub metadata: Option<WorkflowMetadata>,
    pub spec: WorkflowSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    /// Present when the document describes one plain chaos action
    pub action: Option<String>,
    /// Name of the entry template of a workflow
    pub entry: Option<String>,
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    pub name: String,
    pub template_type: String,
    pub deadline: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    pub pod_chaos: Option<PodChaosSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodChaosSpec {
    pub action: String,
}

/// Resolved workflow node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultStep {
    /// Children run back to back
    Serial(Vec<FaultStep>),
    /// Children start together
    Parallel(Vec<FaultStep>),
    /// A concrete chaos action
    Leaf { name: String, duration_ms: u64 },
}

impl FaultStep {
    /// Lay this step out from `start_ms`, recording each leaf start.
    /// Returns the instant the step finishes.
    fn layout(&self, start_ms: u64, onsets: &mut Vec<u64>) -> u64 {
        match self {
            FaultStep::Leaf { duration_ms, .. } => {
                onsets.push(start_ms);
                start_ms.saturating_add(*duration_ms)
            }
            FaultStep::Serial(children) => children
                .iter()
                .fold(start_ms, |cursor, child| child.layout(cursor, onsets)),
            FaultStep::Parallel(children) => children
                .iter()
                .map(|child| child.layout(start_ms, onsets))
                .max()
                .unwrap_or(start_ms),
        }
    }

    /// Total span of this step in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.layout(0, &mut Vec::new())
    }
}

/// A fault description: one action, or a named tree of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultWorkflow {
    SingleAction { action: String },
    Tree { name: String, root: FaultStep },
}

impl FaultWorkflow {
    /// Load a workflow document; `.toml` files are read as TOML, anything
    /// else as JSON
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let document: WorkflowDocument = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text)?,
            _ => serde_json::from_str(&text)?,
        };
        Self::from_document(&document)
    }

    /// Build the step tree reachable from `spec.entry`
    pub fn from_document(document: &WorkflowDocument) -> Result<Self> {
        let spec = &document.spec;
        if let Some(action) = &spec.action {
            return Ok(FaultWorkflow::SingleAction {
                action: action.clone(),
            });
        }

        let entry = spec.entry.as_deref().ok_or_else(|| {
            AnalysisError::malformed(
                "fault workflow",
                0,
                "document has neither spec.action nor spec.entry",
            )
        })?;

        let templates: HashMap<&str, &TemplateSpec> =
            spec.templates.iter().map(|t| (t.name.as_str(), t)).collect();
        let mut visiting = Vec::new();
        let root = build_step(entry, &templates, &mut visiting)?;

        let name = document
            .metadata
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| entry.to_string());

        Ok(FaultWorkflow::Tree { name, root })
    }

    /// Fault-onset instants (seconds since run start), sorted and
    /// deduplicated, for a workflow whose first step starts at `anchor_secs`
    pub fn resolve_onsets(&self, anchor_secs: f64) -> Vec<f64> {
        let anchor_ms = (anchor_secs * 1000.0).round().max(0.0) as u64;
        let mut onsets = match self {
            FaultWorkflow::SingleAction { .. } => vec![anchor_ms],
            FaultWorkflow::Tree { root, .. } => {
                let mut onsets = Vec::new();
                root.layout(anchor_ms, &mut onsets);
                onsets
            }
        };
        onsets.sort_unstable();
        onsets.dedup();
        onsets.into_iter().map(|ms| ms as f64 / 1000.0).collect()
    }
}

fn build_step<'a>(
    name: &'a str,
    templates: &HashMap<&'a str, &'a TemplateSpec>,
    visiting: &mut Vec<&'a str>,
) -> Result<FaultStep> {
    if visiting.contains(&name) {
        return Err(AnalysisError::CyclicWorkflow(name.to_string()));
    }
    let template: &'a TemplateSpec = templates
        .get(name)
        .copied()
        .ok_or_else(|| AnalysisError::UnknownTemplate(name.to_string()))?;

    visiting.push(name);
    let mut children = || {
        template
            .children
            .iter()
            .map(|child| build_step(child.as_str(), templates, visiting))
            .collect::<Result<Vec<_>>>()
    };
    let step = match template.template_type.as_str() {
        "Serial" => FaultStep::Serial(children()?),
        "Parallel" => FaultStep::Parallel(children()?),
        _ => FaultStep::Leaf {
            name: template.name.clone(),
            duration_ms: leaf_duration_ms(template)?,
        },
    };
    visiting.pop();
    Ok(step)
}

fn leaf_duration_ms(template: &TemplateSpec) -> Result<u64> {
    let instantaneous = template
        .pod_chaos
        .as_ref()
        .is_some_and(|pod| INSTANTANEOUS_ACTIONS.contains(&pod.action.as_str()));
    if instantaneous {
        return Ok(0);
    }
    match &template.deadline {
        Some(deadline) => parse_duration_ms(deadline),
        None => Ok(0),
    }
}

/// Parse a Go-style duration (`500ms`, `30s`, `1m30s`, `2h`, `1.5s`) into
/// milliseconds. A bare `0` is accepted.
pub fn parse_duration_ms(text: &str) -> Result<u64> {
    let invalid = || AnalysisError::InvalidDuration(text.to_string());
    let s = text.trim();
    if s == "0" {
        return Ok(0);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total_ms = 0.0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let value: f64 = number.parse().map_err(|_| invalid())?;
        let factor = match unit {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            _ => return Err(invalid()),
        };
        total_ms += value * factor;
        rest = tail;
    }

    let total_ms = total_ms.round();
    // u64::MAX rounds up to 2^64 as f64, so anything at or past it overflows
    if !total_ms.is_finite() || total_ms >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(total_ms as u64)
}

/// A fault period `[start_secs, end_secs)` on the run-relative clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaultInterval {
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Ordered fault onsets for one run
#[derive(Debug, Clone, PartialEq)]
pub struct FaultTimeline {
    onsets: Vec<f64>,
    run_end_secs: f64,
}

impl FaultTimeline {
    /// Resolve the onsets of `fault` (optionally shaped by `workflow`)
    /// against the run clock
    pub fn resolve(fault: &FaultInfo, run: &RunInfo, workflow: Option<&FaultWorkflow>) -> Self {
        let anchor = run.relative_secs(fault.start);
        let onsets = match workflow {
            Some(workflow) => workflow.resolve_onsets(anchor),
            None => vec![anchor],
        };
        Self::new(onsets, run.total_secs() as f64)
    }

    /// Build a timeline from onsets (seconds); onsets at or past the end of
    /// the run are dropped
    pub fn new(mut onsets: Vec<f64>, run_end_secs: f64) -> Self {
        onsets.sort_by(|a, b| a.total_cmp(b));
        onsets.dedup();
        let before = onsets.len();
        onsets.retain(|&t| t < run_end_secs);
        if onsets.len() < before {
            tracing::warn!(
                "{} fault onsets fall after the end of the run and are ignored",
                before - onsets.len()
            );
        }
        Self {
            onsets,
            run_end_secs,
        }
    }

    pub fn onsets(&self) -> &[f64] {
        &self.onsets
    }

    pub fn first_onset(&self) -> Option<f64> {
        self.onsets.first().copied()
    }

    /// Consecutive onset pairs; the last interval runs to the end of the run
    pub fn intervals(&self) -> Vec<FaultInterval> {
        self.onsets
            .iter()
            .enumerate()
            .map(|(i, &start)| FaultInterval {
                start_secs: start,
                end_secs: self.onsets.get(i + 1).copied().unwrap_or(self.run_end_secs),
            })
            .collect()
    }
}
