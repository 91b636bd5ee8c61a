//! Efficiency analytics and estimate-adjustment suggestions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use plancast_core::model::CompletionRecord;
use serde::{Deserialize, Serialize};

use crate::estimate::{DEFAULT_HISTORY_LIMIT, recent_matching};
use crate::stats;

/// Records considered by [`EfficiencySummary::from_history`].
pub const SUMMARY_WINDOW: usize = 100;

/// Trailing window for the "recent" efficiency figure.
pub const RECENT_DAYS: i64 = 30;

const UNDERRUN_THRESHOLD: f64 = 0.8;
const OVERRUN_THRESHOLD: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        })
    }
}

/// Aggregate efficiency over recent completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencySummary {
    pub overall_efficiency: f64,
    pub recent_efficiency: f64,
    pub role_efficiency: BTreeMap<String, f64>,
    pub task_type_efficiency: BTreeMap<String, f64>,
    pub total_completed_tasks: usize,
    pub recent_completed_tasks: usize,
    pub improvement_trend: Trend,
}

impl EfficiencySummary {
    /// Summarize the [`SUMMARY_WINDOW`] most recent records.
    ///
    /// The recent figure covers records completed within [`RECENT_DAYS`] of
    /// `now`. Returns `None` for empty history.
    #[must_use]
    pub fn from_history(history: &[CompletionRecord], now: DateTime<Utc>) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        let mut window: Vec<&CompletionRecord> = history.iter().collect();
        window.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        window.truncate(SUMMARY_WINDOW);

        let scores: Vec<f64> = window.iter().map(|r| r.efficiency_score).collect();
        let overall_efficiency = stats::mean(&scores).unwrap_or(1.0);

        let cutoff = now - Duration::days(RECENT_DAYS);
        let recent: Vec<f64> = history
            .iter()
            .filter(|r| r.completed_at >= cutoff)
            .map(|r| r.efficiency_score)
            .collect();
        let recent_efficiency = stats::mean(&recent).unwrap_or(1.0);

        let improvement_trend = if recent_efficiency > overall_efficiency {
            Trend::Improving
        } else if recent_efficiency < overall_efficiency {
            Trend::Declining
        } else {
            Trend::Stable
        };

        Some(Self {
            overall_efficiency,
            recent_efficiency,
            role_efficiency: mean_by(&window, |r| &r.role_type),
            task_type_efficiency: mean_by(&window, |r| &r.task_type),
            total_completed_tasks: window.len(),
            recent_completed_tasks: recent.len(),
            improvement_trend,
        })
    }
}

fn mean_by<'a>(
    records: &[&'a CompletionRecord],
    key: impl Fn(&'a CompletionRecord) -> &'a String,
) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &record in records {
        groups
            .entry(key(record).clone())
            .or_default()
            .push(record.efficiency_score);
    }
    groups
        .into_iter()
        .filter_map(|(k, scores)| stats::mean(&scores).map(|m| (k, m)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    EstimateAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub severity: Severity,
    pub message: String,
    /// Signed percentage to apply to future estimates.
    pub adjustment_pct: f64,
}

/// Suggest estimate adjustments for a `(task_type, role_type)` pair.
///
/// Looks at the most recent matching records. Mean efficiency below 0.8
/// suggests raising estimates, above 1.2 suggests lowering them.
#[must_use]
pub fn improvement_suggestions(
    task_type: &str,
    role_type: &str,
    history: &[CompletionRecord],
) -> Vec<Suggestion> {
    let scores: Vec<f64> = recent_matching(task_type, role_type, history, DEFAULT_HISTORY_LIMIT)
        .into_iter()
        .map(|r| r.efficiency_score)
        .collect();
    let Some(avg) = stats::mean(&scores) else {
        return Vec::new();
    };

    if avg < UNDERRUN_THRESHOLD && avg > 0.0 {
        let pct = (1.0 / avg - 1.0) * 100.0;
        vec![Suggestion {
            kind: SuggestionKind::EstimateAdjustment,
            severity: Severity::High,
            message: format!(
                "{task_type}/{role_type} work typically takes {:.1}x longer than estimated; \
                 consider increasing estimates by {pct:.0}%",
                1.0 / avg
            ),
            adjustment_pct: pct,
        }]
    } else if avg > OVERRUN_THRESHOLD {
        let pct = (avg - 1.0) * 100.0;
        vec![Suggestion {
            kind: SuggestionKind::EstimateAdjustment,
            severity: Severity::Medium,
            message: format!(
                "{task_type}/{role_type} work typically finishes {avg:.1}x faster than estimated; \
                 consider reducing estimates by {pct:.0}%"
            ),
            adjustment_pct: -pct,
        }]
    } else {
        Vec::new()
    }
}
