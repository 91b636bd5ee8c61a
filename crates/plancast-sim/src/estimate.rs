//! Historical efficiency estimation.
//!
//! Efficiency is `estimated / actual` per completed item: below 1.0 the work
//! overran its estimate, above 1.0 it finished early.

use plancast_core::model::CompletionRecord;
use serde::{Deserialize, Serialize};

use crate::stats;

/// Default number of recent matching records an estimate looks at.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Risk reported when the mean efficiency is zero.
const NEUTRAL_RISK: f64 = 0.5;

/// Efficiency statistics for one `(task_type, role_type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyEstimate {
    pub avg_efficiency: f64,
    /// Coefficient of variation of efficiency, clamped to `[0, 1]`.
    pub risk_score: f64,
    pub sample_size: usize,
}

impl EfficiencyEstimate {
    /// `min(0.95, sample_size / 100)`.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        confidence(self.sample_size)
    }
}

/// Confidence earned by `sample_size` matching records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence(sample_size: usize) -> f64 {
    (sample_size as f64 / 100.0).min(0.95)
}

/// Estimate efficiency from every record matching the pair.
///
/// Returns `None` when nothing matches.
#[must_use]
pub fn estimate(
    task_type: &str,
    role_type: &str,
    history: &[CompletionRecord],
) -> Option<EfficiencyEstimate> {
    let scores: Vec<f64> = history
        .iter()
        .filter(|r| r.matches(task_type, role_type))
        .map(|r| r.efficiency_score)
        .collect();
    from_scores(&scores)
}

/// Estimate from an already-selected set of efficiency scores.
#[must_use]
pub fn from_scores(scores: &[f64]) -> Option<EfficiencyEstimate> {
    let avg_efficiency = stats::mean(scores)?;
    let risk_score = stats::coefficient_of_variation(scores, NEUTRAL_RISK)?.clamp(0.0, 1.0);
    Some(EfficiencyEstimate {
        avg_efficiency,
        risk_score,
        sample_size: scores.len(),
    })
}

/// The `limit` most recent records matching the pair, newest first.
#[must_use]
pub fn recent_matching<'h>(
    task_type: &str,
    role_type: &str,
    history: &'h [CompletionRecord],
    limit: usize,
) -> Vec<&'h CompletionRecord> {
    let mut matching: Vec<&CompletionRecord> = history
        .iter()
        .filter(|r| r.matches(task_type, role_type))
        .collect();
    matching.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    matching.truncate(limit);
    matching
}

/// [`estimate`] restricted to the `limit` most recent matching records.
#[must_use]
pub fn estimate_recent(
    task_type: &str,
    role_type: &str,
    history: &[CompletionRecord],
    limit: usize,
) -> Option<EfficiencyEstimate> {
    let scores: Vec<f64> = recent_matching(task_type, role_type, history, limit)
        .into_iter()
        .map(|r| r.efficiency_score)
        .collect();
    from_scores(&scores)
}
