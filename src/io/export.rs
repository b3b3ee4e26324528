//! CSV export for telemetry records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::telemetry::TelemetryRecord;

/// Column header for CSV telemetry export, one column per record field.
pub const HEADER: &str = "tick,timestamp_s,turbine_id,wind_speed_ms,wind_direction_deg,\
                          power_kw,reactive_kvar,grid_voltage_pu,grid_frequency_hz,state,\
                          lvrt_active,hvrt_active,ride_through_ok,frequency_band,degraded,\
                          progress,vibration_mm_s,bearing_temp_c,rotor_rpm,blade_pitch_deg";

/// Exports telemetry records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per record, in record order.
/// Produces byte-identical output for identical inputs.
///
/// # Arguments
///
/// * `records` - Telemetry records of a run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[TelemetryRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes telemetry records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[TelemetryRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.tick.to_string(),
            format!("{:.3}", r.timestamp_s),
            r.turbine_id.0.to_string(),
            format!("{:.3}", r.wind_speed_ms),
            format!("{:.1}", r.wind_direction_deg),
            format!("{:.3}", r.power_kw),
            format!("{:.3}", r.reactive_kvar),
            format!("{:.4}", r.grid_voltage_pu),
            format!("{:.3}", r.grid_frequency_hz),
            r.state.as_str().to_string(),
            r.flags.lvrt_active.to_string(),
            r.flags.hvrt_active.to_string(),
            r.flags.ride_through_ok.to_string(),
            r.flags.frequency_band.as_str().to_string(),
            r.flags.degraded.to_string(),
            format!("{:.4}", r.progress),
            format!("{:.3}", r.vibration_mm_s),
            format!("{:.2}", r.bearing_temp_c),
            format!("{:.3}", r.rotor_rpm),
            format!("{:.2}", r.blade_pitch_deg),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
