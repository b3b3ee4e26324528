/// Fixed-step simulation clock.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Worker-thread execution and cancellation.
pub mod runner;
/// Scenario classes and run parameters.
pub mod scenario;

pub use engine::{Engine, RunOutcome};
pub use kpi::RunReport;
pub use runner::{CancelToken, RunHandle, spawn_run};
pub use scenario::{GridFault, RunLength, Scenario, ScenarioSpec, TurbineFailure};
