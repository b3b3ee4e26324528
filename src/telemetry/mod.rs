//! Per-tick telemetry records and their delivery to consumers.

pub mod pipeline;
pub mod record;

pub use pipeline::{ConsumerHandle, Next, PipelineConfig, PipelineError, Publisher, TelemetryPipeline};
pub use record::{ComplianceFlags, TelemetryRecord};
