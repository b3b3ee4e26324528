//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::Result;
use crate::grid::GridCode;
use crate::sim::engine::Engine;
use crate::sim::scenario::{GridFault, RunLength, Scenario, ScenarioSpec, TurbineFailure};
use crate::telemetry::PipelineConfig;
use crate::turbine::{PowerCurve, TurbineId, TurbineUnit};
use crate::wind::{ConstantWind, PatternWind, WindModel, WindPattern, WindSeries};

/// Top-level scenario configuration parsed from TOML.
///
/// Every section is optional and falls back to the `normal` preset's
/// values. Load from TOML with [`ScenarioConfig::from_toml_file`] or pick a
/// built-in preset with [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Timing and random seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Scenario class and parameters, tagged by `kind`.
    #[serde(default)]
    pub scenario: Scenario,
    /// Turbine fleet.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Wind input, tagged by `model`.
    #[serde(default)]
    pub wind: WindConfig,
    /// Grid-code thresholds.
    #[serde(default)]
    pub grid_code: GridCode,
    /// Telemetry queue sizing.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Step override (s); the scenario's default when absent.
    pub step_s: Option<f64>,
    /// Simulated duration (s). Ignored when `ticks` is set.
    pub duration_s: f64,
    /// Exact tick count.
    pub ticks: Option<u64>,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_s: None,
            duration_s: 3600.0,
            ticks: None,
            seed: 42,
        }
    }
}

/// Turbine fleet parameters. All turbines share one curve and rating.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of turbines.
    pub turbines: u32,
    /// Id of the first turbine; the rest are numbered consecutively.
    pub first_id: u32,
    /// Nameplate rating (kW).
    pub nominal_kw: f64,
    /// Custom `[wind_speed_ms, power_kw]` points; the reference curve
    /// scaled to `nominal_kw` when absent.
    pub power_curve: Option<Vec<(f64, f64)>>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            turbines: 5,
            first_id: 1,
            nominal_kw: 2000.0,
            power_curve: None,
        }
    }
}

fn default_direction_deg() -> f64 {
    270.0
}

fn default_noise_std_ms() -> f64 {
    0.8
}

fn default_interval_s() -> f64 {
    600.0
}

/// Wind input selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum WindConfig {
    Constant {
        speed_ms: f64,
        #[serde(default = "default_direction_deg")]
        direction_deg: f64,
    },
    /// `[time_s, speed_ms]` samples.
    Series {
        samples: Vec<(f64, f64)>,
        #[serde(default = "default_direction_deg")]
        direction_deg: f64,
    },
    Pattern {
        pattern: WindPattern,
        base_speed_ms: f64,
        #[serde(default = "default_noise_std_ms")]
        noise_std_ms: f64,
        #[serde(default = "default_direction_deg")]
        direction_deg: f64,
        #[serde(default = "default_interval_s")]
        interval_s: f64,
    },
}

impl Default for WindConfig {
    fn default() -> Self {
        WindConfig::Pattern {
            pattern: WindPattern::Steady,
            base_speed_ms: 9.0,
            noise_std_ms: default_noise_std_ms(),
            direction_deg: default_direction_deg(),
            interval_s: default_interval_s(),
        }
    }
}

impl WindConfig {
    /// Builds the wind feed; stochastic models are seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCurve` for a malformed series.
    pub fn build(&self, seed: u64) -> Result<WindModel> {
        Ok(match self {
            WindConfig::Constant {
                speed_ms,
                direction_deg,
            } => WindModel::Constant(ConstantWind {
                speed_ms: *speed_ms,
                direction_deg: *direction_deg,
            }),
            WindConfig::Series {
                samples,
                direction_deg,
            } => WindModel::Series(WindSeries::new(samples, *direction_deg)?),
            WindConfig::Pattern {
                pattern,
                base_speed_ms,
                noise_std_ms,
                direction_deg,
                interval_s,
            } => WindModel::Pattern(PatternWind::new(
                *pattern,
                *base_speed_ms,
                *noise_std_ms,
                *direction_deg,
                *interval_s,
                seed,
            )),
        })
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"fleet.nominal_kw"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// One hour of normal operation in steady wind.
    pub fn normal() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            scenario: Scenario::Normal,
            fleet: FleetConfig::default(),
            wind: WindConfig::default(),
            grid_code: GridCode::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    /// A 10 s dip to 0.2 pu one minute into a two-minute run.
    pub fn grid_fault() -> Self {
        Self {
            simulation: SimulationConfig {
                duration_s: 120.0,
                ..SimulationConfig::default()
            },
            scenario: Scenario::GridFault(GridFault {
                fault_start_s: 60.0,
                fault_duration_s: 10.0,
                voltage_floor_pu: 0.2,
                recovery_s: 5.0,
            }),
            ..Self::normal()
        }
    }

    /// Turbine 1 degrades over 30 minutes and fails halfway through an hour.
    pub fn turbine_failure() -> Self {
        Self {
            scenario: Scenario::TurbineFailure(TurbineFailure {
                turbine_id: TurbineId(1),
                failure_time_s: 1800.0,
                degradation_lead_s: 1800.0,
            }),
            wind: WindConfig::Pattern {
                pattern: WindPattern::Diurnal,
                base_speed_ms: 10.0,
                noise_std_ms: default_noise_std_ms(),
                direction_deg: default_direction_deg(),
                interval_s: default_interval_s(),
            },
            ..Self::normal()
        }
    }

    /// A half-second swell to 1.15 pu, inside the HVRT envelope.
    pub fn voltage_swell() -> Self {
        Self {
            simulation: SimulationConfig {
                duration_s: 60.0,
                ..SimulationConfig::default()
            },
            scenario: Scenario::GridFault(GridFault {
                fault_start_s: 30.0,
                fault_duration_s: 0.5,
                voltage_floor_pu: 1.15,
                recovery_s: 2.0,
            }),
            ..Self::normal()
        }
    }

    /// Gusty storm winds that push the fleet past cut-out.
    pub fn storm() -> Self {
        Self {
            wind: WindConfig::Pattern {
                pattern: WindPattern::Gusty,
                base_speed_ms: 23.0,
                noise_std_ms: 2.0,
                direction_deg: 225.0,
                interval_s: 60.0,
            },
            ..Self::normal()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "normal",
        "grid_fault",
        "turbine_failure",
        "voltage_swell",
        "storm",
    ];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "normal" => Ok(Self::normal()),
            "grid_fault" => Ok(Self::grid_fault()),
            "turbine_failure" => Ok(Self::turbine_failure()),
            "voltage_swell" => Ok(Self::voltage_swell()),
            "storm" => Ok(Self::storm()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// The run parameters described by this configuration.
    pub fn spec(&self) -> ScenarioSpec {
        let length = match self.simulation.ticks {
            Some(n) => RunLength::Ticks(n),
            None => RunLength::Duration(self.simulation.duration_s),
        };
        ScenarioSpec {
            scenario: self.scenario,
            step_s: self.simulation.step_s,
            length,
        }
    }

    /// Ids of the configured fleet, in order.
    pub fn turbine_ids(&self) -> impl Iterator<Item = TurbineId> {
        let first = self.fleet.first_id;
        (0..self.fleet.turbines).map(move |i| TurbineId(first + i))
    }

    /// Builds a ready-to-run engine.
    ///
    /// # Errors
    ///
    /// Surfaces `SimError` from curve, wind series and scenario validation.
    pub fn build(&self) -> Result<Engine<WindModel>> {
        let curve = match &self.fleet.power_curve {
            Some(points) => PowerCurve::new(points)?,
            None => PowerCurve::reference(self.fleet.nominal_kw)?,
        };
        let turbines = self
            .turbine_ids()
            .map(|id| TurbineUnit::new(id, curve.clone(), self.fleet.nominal_kw))
            .collect::<Result<Vec<_>>>()?;
        let wind = self.wind.build(self.simulation.seed)?;
        Engine::new(self.spec(), turbines, wind, self.grid_code.clone())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let positive = |x: f64| x.is_finite() && x > 0.0;
        let non_negative = |x: f64| x.is_finite() && x >= 0.0;

        let s = &self.simulation;
        if let Some(step) = s.step_s {
            if !positive(step) {
                errors.push(ConfigError::new("simulation.step_s", "must be > 0"));
            }
        }
        if s.ticks.is_none() && !non_negative(s.duration_s) {
            errors.push(ConfigError::new("simulation.duration_s", "must be >= 0"));
        }

        if let Err(e) = self.spec().validate() {
            errors.push(ConfigError::new("scenario", e.to_string()));
        }
        if let Scenario::TurbineFailure(f) = &self.scenario {
            if !self.turbine_ids().any(|id| id == f.turbine_id) {
                errors.push(ConfigError::new(
                    "scenario.turbine_id",
                    format!("{} is not part of the fleet", f.turbine_id),
                ));
            }
        }

        let fleet = &self.fleet;
        if fleet.turbines == 0 {
            errors.push(ConfigError::new("fleet.turbines", "must be > 0"));
        }
        if fleet.first_id.checked_add(fleet.turbines).is_none() {
            errors.push(ConfigError::new("fleet.first_id", "turbine ids overflow"));
        }
        if !positive(fleet.nominal_kw) {
            errors.push(ConfigError::new("fleet.nominal_kw", "must be > 0"));
        }
        if let Some(points) = &fleet.power_curve {
            if let Err(e) = PowerCurve::new(points) {
                errors.push(ConfigError::new("fleet.power_curve", e.to_string()));
            }
        }

        match &self.wind {
            WindConfig::Constant { speed_ms, .. } => {
                if !non_negative(*speed_ms) {
                    errors.push(ConfigError::new("wind.speed_ms", "must be >= 0"));
                }
            }
            WindConfig::Series { samples, .. } => {
                if let Err(e) = WindSeries::new(samples, 0.0) {
                    errors.push(ConfigError::new("wind.samples", e.to_string()));
                }
            }
            WindConfig::Pattern {
                base_speed_ms,
                noise_std_ms,
                interval_s,
                ..
            } => {
                if !non_negative(*base_speed_ms) {
                    errors.push(ConfigError::new("wind.base_speed_ms", "must be >= 0"));
                }
                if !non_negative(*noise_std_ms) {
                    errors.push(ConfigError::new("wind.noise_std_ms", "must be >= 0"));
                }
                if !positive(*interval_s) {
                    errors.push(ConfigError::new("wind.interval_s", "must be > 0"));
                }
            }
        }

        let g = &self.grid_code;
        if !(0.0 <= g.lvrt_v_min_pu && g.lvrt_v_min_pu < g.lvrt_floor_pu) {
            errors.push(ConfigError::new(
                "grid_code.lvrt_v_min_pu",
                "must be in [0, grid_code.lvrt_floor_pu)",
            ));
        }
        if !(g.lvrt_floor_pu < g.hvrt_threshold_pu) {
            errors.push(ConfigError::new(
                "grid_code.lvrt_floor_pu",
                "must be < grid_code.hvrt_threshold_pu",
            ));
        }
        if !(g.power_factor > 0.0 && g.power_factor <= 1.0) {
            errors.push(ConfigError::new("grid_code.power_factor", "must be in (0, 1]"));
        }
        if !positive(g.nominal_frequency_hz) {
            errors.push(ConfigError::new("grid_code.nominal_frequency_hz", "must be > 0"));
        }
        for (field, (lo, hi)) in [
            ("grid_code.continuous_band_hz", g.continuous_band_hz),
            ("grid_code.temporary_band_hz", g.temporary_band_hz),
        ] {
            if !(lo < hi) {
                errors.push(ConfigError::new(field, "lower bound must be < upper bound"));
            }
        }

        if self.pipeline.capacity == 0 {
            errors.push(ConfigError::new("pipeline.capacity", "must be > 0"));
        }

        errors
    }
}
