//! Metrics collection for Janitor operations

use std::collections::HashMap;
use std::fmt;

/// Kinds of repair the janitor performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepairAction {
    /// Pending inferred row confirmed
    Promoted,
    /// Missing reverse row inserted
    Backfilled,
    /// Inferred row removed before re-inference
    Deleted,
    /// Manual relation replayed through propagation
    Repropagated,
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepairAction::Promoted => "promoted",
            RepairAction::Backfilled => "backfilled",
            RepairAction::Deleted => "deleted",
            RepairAction::Repropagated => "re-propagated",
        };
        f.write_str(name)
    }
}

/// Metrics collected during Janitor operations
#[derive(Debug, Clone, Default)]
pub struct JanitorMetrics {
    /// Row counts per repair action
    pub actions: HashMap<RepairAction, usize>,

    /// Networks visited by repair passes
    pub networks_repaired: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to an action counter
    pub fn record(&mut self, action: RepairAction, count: usize) {
        if count > 0 {
            *self.actions.entry(action).or_insert(0) += count;
        }
    }

    /// Record one repaired network
    pub fn record_network(&mut self) {
        self.networks_repaired += 1;
    }

    /// Record a sweep cycle completion
    pub fn record_sweep(&mut self) {
        self.sweep_count += 1;
    }

    /// Count for one action
    pub fn total(&self, action: RepairAction) -> usize {
        self.actions.get(&action).copied().unwrap_or(0)
    }

    /// Count over every action
    pub fn total_changes(&self) -> usize {
        self.actions.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        self.actions.clear();
        self.networks_repaired = 0;
        self.sweep_count = 0;
        self.total_runtime_ms = 0;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Networks repaired: {}", self.networks_repaired),
            format!("Total runtime: {}ms", self.total_runtime_ms),
        ];

        if !self.actions.is_empty() {
            lines.push(String::new());
            lines.push("Rows by action:".to_string());
            let mut actions: Vec<_> = self.actions.iter().collect();
            actions.sort();
            for (action, count) in actions {
                lines.push(format!("  {}: {}", action, count));
            }
            lines.push(format!("  Total: {}", self.total_changes()));
        }

        lines.join("\n")
    }
}
