//! Real-time scenario engine for wind turbine fleets and grid-code compliance.
//!
//! A run steps a fleet of turbines through a scenario (normal operation, a
//! grid voltage fault, or a mechanical failure) on a fixed simulated clock.
//! Each tick evaluates wind input, turbine state, and the grid code, and
//! emits one [`telemetry::TelemetryRecord`] per turbine.

pub mod config;
/// Piecewise-linear interpolation shared by the curve types.
pub mod curve;
pub mod error;
/// Grid conditions, compliance rules and ride-through tracking.
pub mod grid;
/// CSV export.
pub mod io;
pub mod logging;
/// Simulation clock, scenarios, engine and run report.
pub mod sim;
pub mod telemetry;
/// Turbine power curve, mechanics and degradation state machine.
pub mod turbine;
pub mod wind;

#[cfg(feature = "api")]
pub mod api;

pub use error::{Result, SimError};
