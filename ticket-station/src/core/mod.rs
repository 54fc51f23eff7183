//! Core: configuration, shared state, station orchestration

pub mod config;
pub mod state;
pub mod station;

pub use config::Config;
pub use state::{StationEvent, StationState};
pub use station::{Station, StationError};
