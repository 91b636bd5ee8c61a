use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Scalar modifiers applied by the duration sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParameters {
    /// Multiplier on nominal effort. Must be finite and `> 0`.
    pub complexity_factor: f64,
    /// Fraction of a full-time resource, in `(0, 1]`.
    pub resource_availability: f64,
    /// Team experience on a `1..=10` scale.
    pub experience_level: u8,
    /// Half-width of the uniform jitter band, in `[0, 1)`.
    pub risk_factor: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            complexity_factor: 1.0,
            resource_availability: 0.8,
            experience_level: 5,
            risk_factor: 0.2,
        }
    }
}

impl SimulationParameters {
    /// Reject out-of-range values before any sampling happens.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if !self.complexity_factor.is_finite() || self.complexity_factor <= 0.0 {
            return Err(InvalidInput::InvalidParameter {
                name: "complexity_factor",
                value: self.complexity_factor,
                reason: "must be finite and greater than 0",
            });
        }
        if !(self.resource_availability > 0.0 && self.resource_availability <= 1.0) {
            return Err(InvalidInput::InvalidParameter {
                name: "resource_availability",
                value: self.resource_availability,
                reason: "must be in (0, 1]",
            });
        }
        if !(1..=10).contains(&self.experience_level) {
            return Err(InvalidInput::InvalidParameter {
                name: "experience_level",
                value: f64::from(self.experience_level),
                reason: "must be in 1..=10",
            });
        }
        if !(self.risk_factor >= 0.0 && self.risk_factor < 1.0) {
            return Err(InvalidInput::InvalidParameter {
                name: "risk_factor",
                value: self.risk_factor,
                reason: "must be in [0, 1)",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimulationParameters::default().validate(), Ok(()));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("complexity_factor", SimulationParameters { complexity_factor: 0.0, ..Default::default() }),
            ("resource_availability", SimulationParameters { resource_availability: 0.0, ..Default::default() }),
            ("resource_availability", SimulationParameters { resource_availability: 1.5, ..Default::default() }),
            ("experience_level", SimulationParameters { experience_level: 11, ..Default::default() }),
            ("experience_level", SimulationParameters { experience_level: 0, ..Default::default() }),
            ("risk_factor", SimulationParameters { risk_factor: 1.0, ..Default::default() }),
            ("risk_factor", SimulationParameters { risk_factor: f64::NAN, ..Default::default() }),
        ];

        for (field, params) in cases {
            match params.validate() {
                Err(InvalidInput::InvalidParameter { name, .. }) => assert_eq!(name, field),
                other => panic!("expected {field} rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let params: SimulationParameters = serde_json::from_str(r#"{"risk_factor":0.5}"#).unwrap();
        assert!((params.risk_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(params.experience_level, 5);
        assert!(serde_json::from_str::<SimulationParameters>(r#"{"speed":2}"#).is_err());
    }
}
