//! Duration sampler: one randomized duration from nominal effort.

use plancast_core::model::SimulationParameters;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Deterministic part of the sampled duration, before risk jitter.
///
/// `nominal * complexity * (1 / availability) * (1.5 - experience * 0.1)`
#[must_use]
pub fn base_duration(nominal_hours: f64, params: &SimulationParameters) -> f64 {
    nominal_hours
        * params.complexity_factor
        * (1.0 / params.resource_availability)
        * experience_multiplier(params.experience_level)
}

/// `1.5 - level * 0.1`: level 5 is neutral, level 10 halves the effort.
#[must_use]
pub fn experience_multiplier(level: u8) -> f64 {
    0.1_f64.mul_add(-f64::from(level), 1.5)
}

/// Sample one duration in hours.
///
/// The base duration is scaled by `1 + U` with `U ~ Uniform[-risk, risk]`
/// and clamped to be non-negative. A non-positive or non-finite risk factor
/// disables the jitter.
#[must_use]
pub fn sample_duration<R: Rng + ?Sized>(
    nominal_hours: f64,
    params: &SimulationParameters,
    rng: &mut R,
) -> f64 {
    let risk = params.risk_factor;
    let jitter = if risk.is_finite() && risk > 0.0 {
        Uniform::new_inclusive(-risk, risk).sample(rng)
    } else {
        0.0
    };
    (base_duration(nominal_hours, params) * (1.0 + jitter)).max(0.0)
}
