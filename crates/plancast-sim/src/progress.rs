//! Checkpoint-level progress estimates for templated work units.
//!
//! A work unit of a given kind walks through an ordered list of checkpoints
//! (reviews, validations, approvals). Each checkpoint kind has a base effort
//! that is run through the duration sampler.

use std::fmt;
use std::str::FromStr;

use plancast_core::model::SimulationParameters;
use plancast_core::model::item::ParseEnumError;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sampler::sample_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    QualityGate,
    Review,
    Validation,
    Test,
    Approval,
    Documentation,
    #[serde(other)]
    Other,
}

impl CheckpointKind {
    /// Base effort in hours before sampler factors.
    #[must_use]
    pub const fn base_hours(self) -> f64 {
        match self {
            Self::QualityGate => 4.0,
            Self::Review | Self::Other => 8.0,
            Self::Validation => 12.0,
            Self::Test => 16.0,
            Self::Approval => 2.0,
            Self::Documentation => 6.0,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::QualityGate => "quality_gate",
            Self::Review => "review",
            Self::Validation => "validation",
            Self::Test => "test",
            Self::Approval => "approval",
            Self::Documentation => "documentation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "quality_gate" => Ok(Self::QualityGate),
            "review" => Ok(Self::Review),
            "validation" => Ok(Self::Validation),
            "test" => Ok(Self::Test),
            "approval" => Ok(Self::Approval),
            "documentation" => Ok(Self::Documentation),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "checkpoint kind",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckpointTemplate {
    pub name: &'static str,
    pub kind: CheckpointKind,
    /// Role that signs off the checkpoint.
    pub required_role: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessTemplate {
    pub role_type: &'static str,
    pub work_unit_type: &'static str,
    pub name: &'static str,
    pub checkpoints: &'static [CheckpointTemplate],
}

const fn cp(name: &'static str, kind: CheckpointKind, required_role: &'static str) -> CheckpointTemplate {
    CheckpointTemplate {
        name,
        kind,
        required_role,
    }
}

use CheckpointKind::{Approval, Documentation, QualityGate, Review, Test, Validation};

const TEMPLATES: &[ProcessTemplate] = &[
    ProcessTemplate {
        role_type: "mechanical_designer",
        work_unit_type: "design",
        name: "Mechanical Design Process",
        checkpoints: &[
            cp("Concept Review", QualityGate, "project_manager"),
            cp("CAD Modeling", Review, "senior_designer"),
            cp("Design Validation", Validation, "simulation_engineer"),
            cp("Manufacturing Review", Review, "manufacturing_engineer"),
            cp("Final Approval", Approval, "project_manager"),
        ],
    },
    ProcessTemplate {
        role_type: "mechanical_designer",
        work_unit_type: "simulation",
        name: "Mechanical Simulation Process",
        checkpoints: &[
            cp("Model Preparation", QualityGate, "simulation_engineer"),
            cp("Mesh Generation", Review, "simulation_engineer"),
            cp("Boundary Conditions", Validation, "senior_engineer"),
            cp("Analysis Run", Test, "simulation_engineer"),
            cp("Results Validation", Validation, "senior_engineer"),
            cp("Report Generation", Documentation, "project_manager"),
        ],
    },
    ProcessTemplate {
        role_type: "electrical_designer",
        work_unit_type: "design",
        name: "Electrical Design Process",
        checkpoints: &[
            cp("Requirements Review", QualityGate, "project_manager"),
            cp("Schematic Design", Review, "senior_designer"),
            cp("PCB Layout", Review, "senior_designer"),
            cp("Electrical Validation", Validation, "electrical_engineer"),
            cp("Safety Review", Review, "safety_engineer"),
            cp("Final Approval", Approval, "project_manager"),
        ],
    },
    ProcessTemplate {
        role_type: "electrical_designer",
        work_unit_type: "simulation",
        name: "Electrical Simulation Process",
        checkpoints: &[
            cp("Circuit Analysis", QualityGate, "electrical_engineer"),
            cp("Signal Integrity", Validation, "senior_engineer"),
            cp("Power Analysis", Validation, "senior_engineer"),
            cp("Thermal Analysis", Validation, "thermal_engineer"),
            cp("EMC Analysis", Validation, "emc_engineer"),
            cp("Results Review", Review, "project_manager"),
        ],
    },
];

/// All built-in process templates.
#[must_use]
pub const fn templates() -> &'static [ProcessTemplate] {
    TEMPLATES
}

/// Look up the template for a role and work unit type.
#[must_use]
pub fn process_template(role_type: &str, work_unit_type: &str) -> Option<&'static ProcessTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.role_type == role_type && t.work_unit_type == work_unit_type)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEstimate {
    pub name: String,
    pub kind: CheckpointKind,
    /// Sampled hours rounded to 0.1.
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnitProgress {
    pub checkpoints: Vec<CheckpointEstimate>,
    /// Sum of the unrounded checkpoint samples, rounded to 0.1.
    pub total_hours: f64,
}

fn round_tenth(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

/// Sample a duration for each checkpoint in order.
pub fn simulate_progress<R: Rng + ?Sized>(
    checkpoints: &[CheckpointTemplate],
    params: &SimulationParameters,
    rng: &mut R,
) -> WorkUnitProgress {
    let mut total = 0.0;
    let checkpoints = checkpoints
        .iter()
        .map(|c| {
            let hours = sample_duration(c.kind.base_hours(), params, rng);
            total += hours;
            CheckpointEstimate {
                name: c.name.to_string(),
                kind: c.kind,
                estimated_hours: round_tenth(hours),
            }
        })
        .collect();

    WorkUnitProgress {
        checkpoints,
        total_hours: round_tenth(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn every_role_has_design_and_simulation_templates() {
        for role in ["mechanical_designer", "electrical_designer"] {
            for unit in ["design", "simulation"] {
                let t = process_template(role, unit).unwrap();
                assert!(!t.checkpoints.is_empty());
            }
        }
        assert!(process_template("mechanical_designer", "procurement").is_none());
        assert_eq!(templates().len(), 4);
    }

    #[test]
    fn zero_risk_progress_is_base_hours_scaled() {
        let params = SimulationParameters {
            risk_factor: 0.0,
            ..SimulationParameters::default()
        };
        let template = process_template("mechanical_designer", "design").unwrap();
        let progress = simulate_progress(template.checkpoints, &params, &mut StdRng::seed_from_u64(1));

        // (4 + 8 + 12 + 8 + 2) * 1.25
        assert!((progress.total_hours - 42.5).abs() < 1e-9);
        assert_eq!(progress.checkpoints.len(), 5);
        assert!((progress.checkpoints[0].estimated_hours - 5.0).abs() < 1e-9);
        assert_eq!(progress.checkpoints[4].kind, CheckpointKind::Approval);
    }

    #[test]
    fn estimates_are_rounded_to_a_tenth() {
        let template = process_template("electrical_designer", "simulation").unwrap();
        let progress = simulate_progress(
            template.checkpoints,
            &SimulationParameters::default(),
            &mut StdRng::seed_from_u64(17),
        );
        for c in &progress.checkpoints {
            let scaled = c.estimated_hours * 10.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn unknown_kind_deserializes_as_other() {
        let kind: CheckpointKind = serde_json::from_str("\"sign_off\"").unwrap();
        assert_eq!(kind, CheckpointKind::Other);
        assert!((kind.base_hours() - 8.0).abs() < f64::EPSILON);
        assert_eq!("quality-gate".parse::<CheckpointKind>().unwrap(), CheckpointKind::QualityGate);
    }
}
