use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    PlanParseError,
    ItemNotFound,
    InvalidStateTransition,
    CycleDetected,
    UnknownDependency,
    InvalidWorkItem,
    InvalidParameter,
    InvalidIterations,
    ItemNotCompleted,
    AlreadyRecorded,
    SimulationCancelled,
    DateOutOfRange,
    RunWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PlanParseError => "E1003",
            Self::ItemNotFound => "E2001",
            Self::InvalidStateTransition => "E2002",
            Self::CycleDetected => "E2003",
            Self::UnknownDependency => "E2004",
            Self::InvalidWorkItem => "E2005",
            Self::InvalidParameter => "E2006",
            Self::InvalidIterations => "E2007",
            Self::ItemNotCompleted => "E2008",
            Self::AlreadyRecorded => "E2009",
            Self::SimulationCancelled => "E4001",
            Self::DateOutOfRange => "E4002",
            Self::RunWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::PlanParseError => "Plan file parse error",
            Self::ItemNotFound => "Work item not found",
            Self::InvalidStateTransition => "Invalid status transition",
            Self::CycleDetected => "Dependency cycle detected",
            Self::UnknownDependency => "Dependency references an unknown work item",
            Self::InvalidWorkItem => "Invalid work item",
            Self::InvalidParameter => "Invalid simulation parameter",
            Self::InvalidIterations => "Iteration count must be positive",
            Self::ItemNotCompleted => "Work item is not completed",
            Self::AlreadyRecorded => "Completion already recorded",
            Self::SimulationCancelled => "Simulation cancelled",
            Self::DateOutOfRange => "Completion date out of range",
            Self::RunWriteFailed => "Simulation run write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `plancast init` to create the .plancast directory."),
            Self::ConfigParseError => Some("Fix syntax in .plancast/config.toml and retry."),
            Self::PlanParseError => {
                Some("Check the plan file against the documented project/work_items shape.")
            }
            Self::ItemNotFound => None,
            Self::InvalidStateTransition => {
                Some("Follow valid transitions: pending -> in_progress -> review -> completed.")
            }
            Self::CycleDetected => Some("Remove a dependency link to keep the graph acyclic."),
            Self::UnknownDependency => {
                Some("Add the missing work item or drop it from the dependency list.")
            }
            Self::InvalidWorkItem => Some("Use non-empty unique ids and finite, non-negative hours."),
            Self::InvalidParameter => Some(
                "Keep complexity_factor > 0, resource_availability in (0, 1], \
                 experience_level in 1..=10 and risk_factor in [0, 1).",
            ),
            Self::InvalidIterations => Some("Pass --iterations with a value of at least 1."),
            Self::ItemNotCompleted => Some("Mark the item completed with actual hours first."),
            Self::AlreadyRecorded => {
                Some("Each completed item is recorded once; nothing more to do.")
            }
            Self::SimulationCancelled => None,
            Self::DateOutOfRange => Some("Check estimated hours and the configured duration unit."),
            Self::RunWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `plancast` process releases its lock.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rejected simulation or prediction input.
///
/// Raised at the boundary before any sampling happens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("project has no work items")]
    NoWorkItems,
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("work item id must not be empty")]
    EmptyId,
    #[error("duplicate work item id '{0}'")]
    DuplicateWorkItem(String),
    #[error("work item '{item}' has invalid estimated_hours {hours}")]
    InvalidEstimate { item: String, hours: f64 },
    #[error("work item '{0}' depends on itself")]
    SelfDependency(String),
    #[error("work item '{item}' depends on unknown work item '{dependency}'")]
    UnknownDependency { item: String, dependency: String },
    #[error("dependency cycle involving work items {}", format_cycles(.cycles))]
    Cycle { cycles: Vec<Vec<String>> },
    #[error("invalid {name} {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl InvalidInput {
    /// Machine-readable code for this input error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoWorkItems
            | Self::EmptyId
            | Self::DuplicateWorkItem(_)
            | Self::InvalidEstimate { .. } => ErrorCode::InvalidWorkItem,
            Self::ZeroIterations => ErrorCode::InvalidIterations,
            Self::SelfDependency(_) | Self::Cycle { .. } => ErrorCode::CycleDetected,
            Self::UnknownDependency { .. } => ErrorCode::UnknownDependency,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
        }
    }
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|members| format!("{{{}}}", members.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, InvalidInput};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::PlanParseError,
            ErrorCode::ItemNotFound,
            ErrorCode::InvalidStateTransition,
            ErrorCode::CycleDetected,
            ErrorCode::UnknownDependency,
            ErrorCode::InvalidWorkItem,
            ErrorCode::InvalidParameter,
            ErrorCode::InvalidIterations,
            ErrorCode::ItemNotCompleted,
            ErrorCode::AlreadyRecorded,
            ErrorCode::SimulationCancelled,
            ErrorCode::DateOutOfRange,
            ErrorCode::RunWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CycleDetected.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn cycle_message_lists_members() {
        let err = InvalidInput::Cycle {
            cycles: vec![vec!["a".into(), "b".into()]],
        };
        assert_eq!(err.to_string(), "dependency cycle involving work items {a, b}");
        assert_eq!(err.code(), ErrorCode::CycleDetected);
    }
}
