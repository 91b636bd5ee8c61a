use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{Priority, Seniority, WorkItem, WorkStatus};

/// Immutable historical fact about one completed work item.
///
/// Written once, when the item reaches [`WorkStatus::Completed`], and only
/// ever read back for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Project the work item belongs to. Empty on records written before ids were kept.
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub work_item_id: String,
    pub task_type: String,
    pub role_type: String,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    /// `estimated / actual`; above 1 means the work finished early.
    pub efficiency_score: f64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub dependencies_count: usize,
    #[serde(default)]
    pub experience_level: Seniority,
    pub completed_at: DateTime<Utc>,
}

/// Returned when a record is requested for an item that is not completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("work item '{id}' is {status}, not completed")]
pub struct NotCompleted {
    pub id: String,
    pub status: WorkStatus,
}

/// Returned when a work item's completion is already in the history log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("completion of work item '{work_item_id}' in project '{project_id}' is already recorded")]
pub struct AlreadyRecorded {
    pub project_id: String,
    pub work_item_id: String,
}

impl CompletionRecord {
    /// Derive the completion record for a finished work item.
    ///
    /// Missing or zero hours on either side yield a neutral efficiency of 1.0.
    /// `completed_at` falls back to `now` when the item carries no timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`NotCompleted`] unless the item status is `completed`.
    pub fn from_completed(
        project_id: &str,
        item: &WorkItem,
        now: DateTime<Utc>,
    ) -> Result<Self, NotCompleted> {
        if item.status != WorkStatus::Completed {
            return Err(NotCompleted {
                id: item.id.clone(),
                status: item.status,
            });
        }

        let actual_hours = item.actual_hours.unwrap_or(0.0);
        Ok(Self {
            project_id: project_id.to_string(),
            work_item_id: item.id.clone(),
            task_type: item.task_type.clone(),
            role_type: item.role_type.clone(),
            estimated_hours: item.estimated_hours,
            actual_hours,
            efficiency_score: efficiency(item.estimated_hours, actual_hours),
            priority: item.priority,
            dependencies_count: item.dependency_count(),
            experience_level: item.seniority,
            completed_at: item.completed_at.unwrap_or(now),
        })
    }

    /// True when this record describes the given task and role pair.
    #[must_use]
    pub fn matches(&self, task_type: &str, role_type: &str) -> bool {
        self.task_type == task_type && self.role_type == role_type
    }

    /// True when both records describe the completion of the same work item.
    ///
    /// Records without a work item id never match.
    #[must_use]
    pub fn same_item(&self, other: &Self) -> bool {
        !self.work_item_id.is_empty()
            && self.work_item_id == other.work_item_id
            && self.project_id == other.project_id
    }

    /// The error reported when this record would be written twice.
    #[must_use]
    pub fn already_recorded(&self) -> AlreadyRecorded {
        AlreadyRecorded {
            project_id: self.project_id.clone(),
            work_item_id: self.work_item_id.clone(),
        }
    }
}

fn efficiency(estimated: f64, actual: f64) -> f64 {
    if estimated > 0.0 && actual > 0.0 {
        estimated / actual
    } else {
        1.0
    }
}
