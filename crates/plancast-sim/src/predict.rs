//! Per-item delay prediction.
//!
//! The predictor picks one of three methods for each item:
//!
//! - **historical**: matching completion history exists, so the estimate is
//!   scaled by the observed efficiency and a complexity multiplier;
//! - **simulation**: no history, so the delay is the mean of sampled durations;
//! - **fallback**: either path produced unusable numbers, so a fixed 20%
//!   buffer is used.
//!
//! Prediction never fails from the caller's point of view.

use std::collections::{HashMap, HashSet};
use std::fmt;

use plancast_core::config::PredictionConfig;
use plancast_core::model::{CompletionRecord, Priority, Seniority, SimulationParameters, WorkItem};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::estimate::{self, EfficiencyEstimate};
use crate::sampler::sample_duration;
use crate::stats;

const SIMULATION_CONFIDENCE: f64 = 0.85;
const FALLBACK_CONFIDENCE: f64 = 0.6;
const FALLBACK_RISK: f64 = 0.5;
const FALLBACK_BUFFER: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Historical,
    Simulation,
    Fallback,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Historical => "historical",
            Self::Simulation => "simulation",
            Self::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayPrediction {
    /// Hours. For the historical method this is the overrun beyond the
    /// estimate; otherwise it is the sampled or buffered processing time.
    pub predicted_delay_hours: f64,
    pub confidence: f64,
    pub risk_score: f64,
    pub method: Method,
    /// Matching history records (historical) or samples drawn (simulation).
    pub sample_size: usize,
}

/// Source of per-item processing hours for the project simulator.
pub trait DurationModel: Sync {
    fn duration_hours(&self, item: &WorkItem, rng: &mut dyn RngCore) -> f64;
}

impl<M: DurationModel + ?Sized> DurationModel for &M {
    fn duration_hours(&self, item: &WorkItem, rng: &mut dyn RngCore) -> f64 {
        (**self).duration_hours(item, rng)
    }
}

/// Reasons a prediction path could not produce a usable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
enum PredictionFailure {
    #[error("no samples to aggregate")]
    EmptySample,
    #[error("non-finite prediction")]
    NonFinite,
}

#[must_use]
pub const fn priority_factor(priority: Priority) -> f64 {
    match priority {
        Priority::High => 0.9,
        Priority::Medium => 1.0,
        Priority::Low => 1.1,
    }
}

#[must_use]
pub const fn seniority_factor(seniority: Seniority) -> f64 {
    match seniority {
        Seniority::Senior => 0.8,
        Seniority::Mid => 1.0,
        Seniority::Junior => 1.3,
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dependency_factor(dependency_count: usize) -> f64 {
    0.1f64.mul_add(dependency_count as f64, 1.0)
}

/// `priority × seniority × (1 + 0.1 · dependencies)`.
#[must_use]
pub fn complexity_multiplier(
    priority: Priority,
    seniority: Seniority,
    dependency_count: usize,
) -> f64 {
    priority_factor(priority) * seniority_factor(seniority) * dependency_factor(dependency_count)
}

/// Delay predictor over an indexed, immutable history snapshot.
#[derive(Debug, Clone)]
pub struct DelayPredictor {
    params: SimulationParameters,
    fallback_samples: usize,
    /// role type -> task type -> estimate over the recent window.
    estimates: HashMap<String, HashMap<String, EfficiencyEstimate>>,
}

impl DelayPredictor {
    /// Index `history` with the default prediction settings.
    #[must_use]
    pub fn new(history: &[CompletionRecord], params: SimulationParameters) -> Self {
        Self::with_config(history, params, &PredictionConfig::default())
    }

    /// Index `history`, keeping the `history_limit` newest records per pair.
    #[must_use]
    pub fn with_config(
        history: &[CompletionRecord],
        params: SimulationParameters,
        config: &PredictionConfig,
    ) -> Self {
        let pairs: HashSet<(&str, &str)> = history
            .iter()
            .map(|r| (r.task_type.as_str(), r.role_type.as_str()))
            .collect();

        let mut estimates: HashMap<String, HashMap<String, EfficiencyEstimate>> = HashMap::new();
        for (task, role) in pairs {
            if let Some(est) = estimate::estimate_recent(task, role, history, config.history_limit)
            {
                estimates
                    .entry(role.to_string())
                    .or_default()
                    .insert(task.to_string(), est);
            }
        }
        debug!(records = history.len(), "indexed completion history");

        Self {
            params,
            fallback_samples: config.fallback_samples,
            estimates,
        }
    }

    #[must_use]
    pub const fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Efficiency estimate for an item's task and role type, if any.
    #[must_use]
    pub fn estimate_for(&self, item: &WorkItem) -> Option<&EfficiencyEstimate> {
        self.estimates
            .get(&item.role_type)
            .and_then(|by_task| by_task.get(&item.task_type))
    }

    /// Predict the delay for one work item.
    #[must_use]
    pub fn predict<R: Rng + ?Sized>(&self, item: &WorkItem, rng: &mut R) -> DelayPrediction {
        let attempt = match self.estimate_for(item).map(|est| historical_path(item, est)) {
            Some(Ok(prediction)) => Ok(prediction),
            Some(Err(err)) => {
                debug!(item = %item.id, %err, "historical prediction unusable");
                self.simulation_path(item, rng)
            }
            None => self.simulation_path(item, rng),
        };

        attempt.unwrap_or_else(|err| {
            debug!(item = %item.id, %err, "falling back to buffered estimate");
            fallback(item)
        })
    }

    fn simulation_path<R: Rng + ?Sized>(
        &self,
        item: &WorkItem,
        rng: &mut R,
    ) -> Result<DelayPrediction, PredictionFailure> {
        let samples: Vec<f64> = (0..self.fallback_samples)
            .map(|_| sample_duration(item.estimated_hours, &self.params, rng))
            .collect();
        let mean = stats::mean(&samples).ok_or(PredictionFailure::EmptySample)?;
        let risk = stats::coefficient_of_variation(&samples, FALLBACK_RISK)
            .ok_or(PredictionFailure::EmptySample)?;
        if !mean.is_finite() || !risk.is_finite() {
            return Err(PredictionFailure::NonFinite);
        }
        Ok(DelayPrediction {
            predicted_delay_hours: mean,
            confidence: SIMULATION_CONFIDENCE,
            risk_score: risk,
            method: Method::Simulation,
            sample_size: samples.len(),
        })
    }
}

impl DurationModel for DelayPredictor {
    fn duration_hours(&self, item: &WorkItem, rng: &mut dyn RngCore) -> f64 {
        self.predict(item, rng).predicted_delay_hours
    }
}

fn historical_path(
    item: &WorkItem,
    est: &EfficiencyEstimate,
) -> Result<DelayPrediction, PredictionFailure> {
    let multiplier = complexity_multiplier(item.priority, item.seniority, item.dependency_count());
    let predicted_actual = item.estimated_hours * est.avg_efficiency * multiplier;
    if !predicted_actual.is_finite() {
        return Err(PredictionFailure::NonFinite);
    }
    Ok(DelayPrediction {
        predicted_delay_hours: (predicted_actual - item.estimated_hours).max(0.0),
        confidence: est.confidence(),
        risk_score: est.risk_score,
        method: Method::Historical,
        sample_size: est.sample_size,
    })
}

fn fallback(item: &WorkItem) -> DelayPrediction {
    DelayPrediction {
        predicted_delay_hours: item.estimated_hours * FALLBACK_BUFFER,
        confidence: FALLBACK_CONFIDENCE,
        risk_score: FALLBACK_RISK,
        method: Method::Fallback,
        sample_size: 0,
    }
}
