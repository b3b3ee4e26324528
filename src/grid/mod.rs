//! Grid conditions and grid-code compliance evaluation.

pub mod compliance;
pub mod condition;
/// LVRT/HVRT duration envelopes.
pub mod ride_through;

pub use compliance::{ComplianceVerdict, FrequencyBand, GridCode, VoltageBand};
pub use condition::GridCondition;
pub use ride_through::{RideThroughCurves, RideThroughStatus, RideThroughTracker};
