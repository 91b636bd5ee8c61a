#![forbid(unsafe_code)]
//! plancast-core library.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` types for validation failures callers branch on;
//!   `anyhow::Result` for store and config I/O.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod store;

pub use error::{ErrorCode, InvalidInput};
