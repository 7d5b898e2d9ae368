//! # KILN
//!
//! Frame orchestration over the entity runtime and batched rendering memory.
//!
//! ## Modules
//!
//! - `config`: TOML simulation settings
//! - `frame`: phase-barrier frame loop and timing
//! - `gameplay`: demo actions and components
//! - `swarm`: the headless demo scene

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod frame;
pub mod gameplay;
pub mod swarm;

pub use config::SimulationConfig;
pub use error::{ConfigError, ConfigResult};
pub use frame::{FrameLoop, FrameStats, FrameStatsAccumulator};
pub use swarm::{SharedReport, SwarmReport};
