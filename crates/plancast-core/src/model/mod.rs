//! Plan data model: projects, work items, completion history, and runs.

pub mod history;
pub mod item;
pub mod params;
pub mod run;

pub use history::{AlreadyRecorded, CompletionRecord, NotCompleted};
pub use item::{Priority, Project, Seniority, WorkItem, WorkStatus, validate_items};
pub use params::SimulationParameters;
pub use run::{CompletionDistribution, DurationUnit, SimulationRun};
