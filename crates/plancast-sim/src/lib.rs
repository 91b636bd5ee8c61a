#![forbid(unsafe_code)]
//! plancast-sim: delay prediction and Monte Carlo completion forecasting.
//!
//! # Layout
//!
//! - [`sampler`]: one randomized duration from nominal effort.
//! - [`estimate`]: efficiency statistics over completion history.
//! - [`predict`]: per-item delay prediction with historical, simulation and
//!   fallback methods, plus the [`predict::DurationModel`] seam.
//! - [`simulate`]: dependency-aware Monte Carlo over a project plan.
//! - [`progress`]: checkpoint-level estimates for templated work units.
//! - [`analytics`]: efficiency summaries and estimate-adjustment suggestions.
//! - [`service`]: request-scoped facade used by the CLI.
//!
//! # Determinism
//!
//! Every random draw goes through an RNG passed in by the caller. Simulations
//! derive one RNG per iteration from the run seed (see [`rng`]), so a fixed
//! seed reproduces the same distribution with or without parallelism.

pub mod analytics;
pub mod estimate;
pub mod predict;
pub mod progress;
pub mod rng;
pub mod sampler;
pub mod service;
pub mod simulate;
pub mod stats;

pub use predict::{DelayPrediction, DelayPredictor, DurationModel, Method};
pub use service::{PlanningService, SimulationOutcome, SimulationRequest};
pub use simulate::{
    CancellationToken, ProjectSimulator, SimulationError, SimulationOptions, SimulationReport,
};
