use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::{fmt, str::FromStr};

use crate::error::InvalidInput;

/// Scheduling priority of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Experience band of the person assigned to a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    #[default]
    Mid,
    Senior,
}

impl Seniority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
        }
    }
}

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Pending,
    InProgress,
    Review,
    Completed,
}

impl WorkStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `pending -> in_progress`
    /// - `in_progress -> review`
    /// - `in_progress -> completed`
    /// - `review -> completed`
    /// - `review -> in_progress` (rework)
    ///
    /// `completed` is terminal: completion records are written exactly once.
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        if self == target {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        let allowed = matches!(
            (self, target),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Review)
                | (Self::InProgress, Self::Completed)
                | (Self::Review, Self::Completed)
                | (Self::Review, Self::InProgress)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
                reason: "transition not allowed by lifecycle rules",
            })
        }
    }
}

/// A project whose work items are scheduled from `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub start_date: DateTime<Utc>,
}

fn default_type() -> String {
    "general".to_string()
}

/// A work unit or task: one role-specific phase of engineering work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub estimated_hours: f64,
    #[serde(default)]
    pub priority: Priority,
    /// Ids of the work items that must finish before this one starts.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default = "default_type")]
    pub task_type: String,
    #[serde(default = "default_type")]
    pub role_type: String,
    #[serde(default)]
    pub seniority: Seniority,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// Create a pending work item with default tags.
    #[must_use]
    pub fn new(id: impl Into<String>, estimated_hours: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            estimated_hours,
            priority: Priority::default(),
            dependencies: BTreeSet::new(),
            task_type: default_type(),
            role_type: default_type(),
            seniority: Seniority::default(),
            status: WorkStatus::default(),
            actual_hours: None,
            completed_at: None,
        }
    }

    /// Builder-style helper adding a dependency.
    #[must_use]
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// Builder-style helper setting the history lookup tags.
    #[must_use]
    pub fn with_types(mut self, task_type: impl Into<String>, role_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self.role_type = role_type.into();
        self
    }

    /// Number of direct dependencies.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Move the item to `target`, recording actual effort on completion.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the lifecycle forbids the move.
    pub fn transition(
        &mut self,
        target: WorkStatus,
        actual_hours: Option<f64>,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.status.can_transition_to(target)?;
        self.status = target;
        if target == WorkStatus::Completed {
            self.actual_hours = actual_hours.or(self.actual_hours);
            self.completed_at = Some(at);
        }
        Ok(())
    }
}

/// Check per-item invariants that do not need the dependency graph.
///
/// Ids must be non-empty and unique, estimates finite and non-negative,
/// and no item may list itself as a dependency.
///
/// # Errors
///
/// Returns the first [`InvalidInput`] found, in input order.
pub fn validate_items(items: &[WorkItem]) -> Result<(), InvalidInput> {
    if items.is_empty() {
        return Err(InvalidInput::NoWorkItems);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.trim().is_empty() {
            return Err(InvalidInput::EmptyId);
        }
        if !seen.insert(item.id.as_str()) {
            return Err(InvalidInput::DuplicateWorkItem(item.id.clone()));
        }
        if !item.estimated_hours.is_finite() || item.estimated_hours < 0.0 {
            return Err(InvalidInput::InvalidEstimate {
                item: item.id.clone(),
                hours: item.estimated_hours,
            });
        }
        if item.dependencies.contains(&item.id) {
            return Err(InvalidInput::SelfDependency(item.id.clone()));
        }
    }

    Ok(())
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: WorkStatus,
    pub to: WorkStatus,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move {} -> {}: {}", self.from, self.to, self.reason)
    }
}

impl std::error::Error for InvalidTransition {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Seniority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "junior" => Ok(Self::Junior),
            "mid" => Ok(Self::Mid),
            "senior" => Ok(Self::Senior),
            _ => Err(ParseEnumError {
                expected: "seniority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for WorkStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_text() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(p.to_string().parse::<Priority>(), Ok(p));
        }
        for s in [Seniority::Junior, Seniority::Mid, Seniority::Senior] {
            assert_eq!(s.to_string().parse::<Seniority>(), Ok(s));
        }
        assert_eq!("In-Progress".parse::<WorkStatus>(), Ok(WorkStatus::InProgress));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn completed_is_terminal() {
        for target in [WorkStatus::Pending, WorkStatus::InProgress, WorkStatus::Review] {
            assert!(WorkStatus::Completed.can_transition_to(target).is_err());
        }
        assert!(WorkStatus::Pending.can_transition_to(WorkStatus::Completed).is_err());
        assert!(WorkStatus::Review.can_transition_to(WorkStatus::InProgress).is_ok());
    }

    #[test]
    fn transition_to_completed_records_effort() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let mut item = WorkItem::new("a", 10.0);
        item.transition(WorkStatus::InProgress, None, at).unwrap();
        item.transition(WorkStatus::Completed, Some(12.5), at).unwrap();
        assert_eq!(item.status, WorkStatus::Completed);
        assert_eq!(item.actual_hours, Some(12.5));
        assert_eq!(item.completed_at, Some(at));
    }

    #[test]
    fn validate_rejects_bad_items() {
        assert_eq!(validate_items(&[]), Err(InvalidInput::NoWorkItems));
        assert_eq!(
            validate_items(&[WorkItem::new("a", 1.0), WorkItem::new("a", 2.0)]),
            Err(InvalidInput::DuplicateWorkItem("a".into()))
        );
        assert!(matches!(
            validate_items(&[WorkItem::new("a", -1.0)]),
            Err(InvalidInput::InvalidEstimate { .. })
        ));
        assert!(matches!(
            validate_items(&[WorkItem::new("a", f64::NAN)]),
            Err(InvalidInput::InvalidEstimate { .. })
        ));
        assert_eq!(
            validate_items(&[WorkItem::new("a", 1.0).depends_on("a")]),
            Err(InvalidInput::SelfDependency("a".into()))
        );
        assert_eq!(validate_items(&[WorkItem::new(" ", 1.0)]), Err(InvalidInput::EmptyId));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"id":"a","estimated_hours":4,"colour":"red"}"#;
        assert!(serde_json::from_str::<WorkItem>(json).is_err());

        let json = r#"{"id":"a","estimated_hours":4,"dependencies":["b"],"priority":"high"}"#;
        let item: WorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.task_type, "general");
        assert_eq!(item.dependency_count(), 1);
    }
}
