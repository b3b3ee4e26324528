/// CSV export of telemetry records.
pub mod export;

pub use export::{export_csv, write_csv};
