use serde::Serialize;

use crate::grid::FrequencyBand;
use crate::turbine::{TurbineId, TurbineState};

/// Compliance flags attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceFlags {
    /// Voltage at or below the LVRT floor.
    pub lvrt_active: bool,
    /// Voltage at or above the HVRT threshold.
    pub hvrt_active: bool,
    /// `false` once the current voltage excursion outlasted its envelope.
    pub ride_through_ok: bool,
    pub frequency_band: FrequencyBand,
    /// An input for this tick was invalid and the last good value was used.
    pub degraded: bool,
}

/// One turbine's state at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Tick index within the run.
    pub tick: u64,
    /// Simulated time (s).
    pub timestamp_s: f64,
    pub turbine_id: TurbineId,
    /// Wind speed at hub height (m/s).
    pub wind_speed_ms: f64,
    /// Wind direction (degrees from north).
    pub wind_direction_deg: f64,
    /// Active power delivered to the grid (kW).
    pub power_kw: f64,
    /// Reactive power setpoint (kvar); positive is inductive support.
    pub reactive_kvar: f64,
    pub grid_voltage_pu: f64,
    pub grid_frequency_hz: f64,
    pub state: TurbineState,
    pub flags: ComplianceFlags,
    /// Degradation progress in `[0, 1]`.
    pub progress: f64,
    pub vibration_mm_s: f64,
    pub bearing_temp_c: f64,
    pub rotor_rpm: f64,
    pub blade_pitch_deg: f64,
}
