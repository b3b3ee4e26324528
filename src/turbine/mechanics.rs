/// Wind speed below which the rotor is parked (m/s).
pub const CUT_IN_SPEED_MS: f64 = 3.0;

/// Wind speed at which the rotor reaches rated speed and pitch control starts (m/s).
pub const RATED_SPEED_MS: f64 = 12.0;

const ROTOR_MIN_RPM: f64 = 5.0;
const ROTOR_RPM_PER_MS: f64 = 1.2;
const ROTOR_RATED_RPM: f64 = 15.0;

const PITCH_DEG_PER_MS: f64 = 5.0;
const PITCH_MAX_DEG: f64 = 45.0;

/// Rotor speed in rpm for a given wind speed.
///
/// Parked below cut-in, linear between cut-in and rated wind speed, and
/// held at rated speed above.
pub fn rotor_speed_rpm(wind_speed_ms: f64) -> f64 {
    if wind_speed_ms.is_nan() || wind_speed_ms < CUT_IN_SPEED_MS {
        0.0
    } else if wind_speed_ms < RATED_SPEED_MS {
        ROTOR_MIN_RPM + ROTOR_RPM_PER_MS * (wind_speed_ms - CUT_IN_SPEED_MS)
    } else {
        ROTOR_RATED_RPM
    }
}

/// Blade pitch angle in degrees for a given wind speed.
///
/// Fine pitch (0°) below rated wind speed, then feathering linearly up to
/// the mechanical stop.
pub fn blade_pitch_deg(wind_speed_ms: f64) -> f64 {
    if wind_speed_ms > RATED_SPEED_MS {
        (PITCH_DEG_PER_MS * (wind_speed_ms - RATED_SPEED_MS)).min(PITCH_MAX_DEG)
    } else {
        0.0
    }
}
