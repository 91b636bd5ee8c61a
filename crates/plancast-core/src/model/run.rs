use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::item::ParseEnumError;
use super::params::SimulationParameters;

/// How an aggregated project span is turned into a calendar offset.
///
/// Per-item durations are always hours. `Days` reads the summed span as a
/// day count (one simulated hour advances the date by one day), which is how
/// historical forecasts were produced. `Hours` reads it as wall-clock hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Days,
    Hours,
}

impl DurationUnit {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
        }
    }

    /// Seconds represented by one unit of span.
    #[must_use]
    pub const fn seconds(self) -> f64 {
        match self {
            Self::Days => 86_400.0,
            Self::Hours => 3_600.0,
        }
    }

    /// Convert a span in this unit into days.
    #[must_use]
    pub fn to_days(self, span: f64) -> f64 {
        span * self.seconds() / 86_400.0
    }

    /// Add `span` units to `start`, or `None` if the result is unrepresentable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn offset(self, start: DateTime<Utc>, span: f64) -> Option<DateTime<Utc>> {
        let millis = (span * self.seconds() * 1_000.0).round();
        if !millis.is_finite() || millis.abs() >= 9.0e15 {
            return None;
        }
        let delta = TimeDelta::try_milliseconds(millis as i64)?;
        start.checked_add_signed(delta)
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "days" | "day" => Ok(Self::Days),
            "hours" | "hour" => Ok(Self::Hours),
            _ => Err(ParseEnumError {
                expected: "duration unit",
                got: s.to_string(),
            }),
        }
    }
}

/// Aggregated completion-date distribution for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionDistribution {
    pub mean_completion: DateTime<Utc>,
    /// Population standard deviation of completion dates, in days.
    pub std_completion_days: f64,
    pub p50_completion: DateTime<Utc>,
    pub p90_completion: DateTime<Utc>,
    pub p95_completion: DateTime<Utc>,
    pub iterations: usize,
    /// Earliest completion dates in sorted order, capped for payload size.
    pub sample_completion_dates: Vec<DateTime<Utc>>,
}

/// Persisted record of one simulation invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: String,
    pub project_id: String,
    pub iterations: usize,
    pub created_at: DateTime<Utc>,
    pub parameters: SimulationParameters,
    pub duration_unit: DurationUnit,
    pub seed: u64,
    /// BLAKE3 hash of the plan the run was computed from.
    pub plan_hash: String,
    pub distribution: CompletionDistribution,
}

impl SimulationRun {
    /// Derive a stable run id from the run's provenance.
    #[must_use]
    pub fn derive_id(
        project_id: &str,
        created_at: DateTime<Utc>,
        seed: u64,
        iterations: usize,
        plan_hash: &str,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(project_id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(created_at.to_rfc3339().as_bytes());
        hasher.update(b"\x00");
        hasher.update(&seed.to_le_bytes());
        hasher.update(&(iterations as u64).to_le_bytes());
        hasher.update(plan_hash.as_bytes());
        let hex = hasher.finalize().to_hex();
        format!("run-{}", &hex[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_unit_reads_span_as_days() {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        let end = DurationUnit::Days.offset(start, 2.5).unwrap();
        assert_eq!((end - start).num_hours(), 60);

        let end = DurationUnit::Hours.offset(start, 2.5).unwrap();
        assert_eq!((end - start).num_minutes(), 150);
    }

    #[test]
    fn huge_offsets_are_unrepresentable() {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        assert!(DurationUnit::Days.offset(start, 1.0e12).is_none());
        assert!(DurationUnit::Days.offset(start, f64::INFINITY).is_none());
    }

    #[test]
    fn run_ids_depend_on_provenance() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let a = SimulationRun::derive_id("p1", at, 7, 100, "blake3:x");
        let b = SimulationRun::derive_id("p1", at, 8, 100, "blake3:x");
        assert!(a.starts_with("run-"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert_eq!(a, SimulationRun::derive_id("p1", at, 7, 100, "blake3:x"));
    }
}
