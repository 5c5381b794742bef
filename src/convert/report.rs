//! Conversion report
//!
//! A machine-readable summary of what the driver decided for every loop it
//! saw, emitted as JSON for tooling.

use serde::Serialize;

use crate::analysis::loop_tree::Decision;

/// The decision for one loop
#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    /// Character offsets of the loop in the input
    pub start: usize,
    pub end: usize,
    pub decision: Decision,
    /// Why the loop was left alone, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Summary of one conversion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub loops: Vec<LoopReport>,
    /// Consecutive-loop groups collapsed into concatenated pipelines
    pub groups: usize,
    /// Total replacements applied
    pub rewrites: usize,
    /// Simple names the rewritten file needs in scope
    pub required_symbols: Vec<String>,
}

impl Report {
    pub fn converted(&self) -> usize {
        self.loops
            .iter()
            .filter(|l| matches!(l.decision, Decision::Convertible))
            .count()
    }
}
