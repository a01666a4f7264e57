//! Simulation settings loaded from TOML.
//!
//! Sources, in increasing priority:
//!
//! 1. Built-in defaults
//! 2. A TOML file (explicit path, or `pulse_echo.toml` in the working
//!    directory)
//! 3. Environment variables (`PULSE_ECHO_*`)
//!
//! A file may also describe a complete pulse sequence:
//! ```toml
//! [ensemble]
//! detuning_range = [-10.0, 10.0]
//! detuning_points = 101
//! linewidth = 2.0
//! distribution = "gaussian"
//! n_jobs = 4
//!
//! [sequence]
//! name = "Hahn Echo"
//!
//! [[sequence.operations]]
//! kind = "shaped_pulse"
//! flip_angle = 1.5707963267948966
//! duration = 1.0
//! shape = "gaussian"
//! params = { sigma_factor = 3.0 }
//!
//! [[sequence.operations]]
//! kind = "delay"
//! duration = 5.0
//!
//! [sequence.detection]
//! time_step = 0.01
//! n_points = 1000
//! observables = ["sx", "sy"]
//! ```

use std::{ env, path::Path };
use serde::{ Deserialize, Serialize };
use tracing::warn;
use tracing_subscriber::EnvFilter;
use crate::{
    distribution::LineShape,
    ensemble::{ EnsembleParams, EnsembleSimulator },
    error::{ Error, Result },
    evolution::Thresholds,
    sequence::{
        DetectionParams,
        HardPulseParams,
        PulseParams,
        Sequence,
    },
    shape::ShapeParams,
};

/// File read by [`SimConfig::load`] when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "pulse_echo.toml";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Detuning distribution and worker pool.
    #[serde(default)]
    pub ensemble: EnsembleConfig,

    /// Numerical cutoffs.
    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional declarative pulse sequence.
    #[serde(default)]
    pub sequence: Option<SequenceConfig>,
}

impl SimConfig {
    /// Load configuration from a file, then apply environment overrides.
    ///
    /// With no explicit path, [`DEFAULT_CONFIG_FILE`] is read if it exists and
    /// defaults are used otherwise.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config
            = match config_path {
                Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
                None => {
                    let path = Path::new(DEFAULT_CONFIG_FILE);
                    if path.exists() {
                        Self::from_toml_str(&std::fs::read_to_string(path)?)?
                    } else {
                        Self::default()
                    }
                },
            };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }

    // `PULSE_ECHO_N_JOBS` and `PULSE_ECHO_LOG_LEVEL`
    fn apply_overrides<F>(&mut self, var: F)
    where F: Fn(&str) -> Option<String>
    {
        if let Some(val) = var("PULSE_ECHO_N_JOBS") {
            match val.trim().parse() {
                Ok(n_jobs) => { self.ensemble.n_jobs = n_jobs; },
                Err(_) => {
                    warn!(value = %val, "ignoring invalid PULSE_ECHO_N_JOBS");
                },
            }
        }
        if let Some(val) = var("PULSE_ECHO_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Check every section, including the sequence if one is given.
    pub fn validate(&self) -> Result<()> {
        self.ensemble_params()?.distribution()?;
        let th = &self.thresholds;
        let cutoffs = [
            ("thresholds.hamiltonian", th.hamiltonian),
            ("thresholds.amplitude_integral", th.amplitude_integral),
            ("thresholds.quadrature", th.quadrature),
            ("thresholds.rotation", th.rotation),
        ];
        for (name, value) in cutoffs {
            if !(value >= 0.0) {
                return Err(Error::invalid(
                    name, format!("must be non-negative, got {value}")));
            }
        }
        EnvFilter::try_new(&self.logging.level)
            .map_err(|e| Error::invalid("logging.level", e.to_string()))?;
        if let Some(seq) = self.build_sequence()? { seq.validate()?; }
        Ok(())
    }

    /// Ensemble sampling parameters.
    pub fn ensemble_params(&self) -> Result<EnsembleParams> {
        let [lo, hi] = self.ensemble.detuning_range;
        Ok(EnsembleParams {
            detuning_range: (lo, hi),
            detuning_points: self.ensemble.detuning_points,
            linewidth: self.ensemble.linewidth,
            line_shape: self.ensemble.distribution.parse()?,
        })
    }

    /// Simulator with the configured worker count.
    pub fn simulator(&self) -> Result<EnsembleSimulator> {
        EnsembleSimulator::new(self.ensemble.n_jobs)
    }

    /// Build the configured sequence, if any, carrying the configured
    /// thresholds.
    pub fn build_sequence(&self) -> Result<Option<Sequence>> {
        self.sequence.as_ref()
            .map(|seq| seq.build(self.thresholds))
            .transpose()
    }

    /// Log filter taken from `RUST_LOG` if set, otherwise from the configured
    /// level.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level))
    }
}

/// `[ensemble]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default = "default_detuning_range")]
    pub detuning_range: [f64; 2],

    #[serde(default = "default_detuning_points")]
    pub detuning_points: usize,

    #[serde(default = "default_linewidth")]
    pub linewidth: f64,

    /// Line-shape name: gaussian, lorentzian, exponential, or uniform.
    #[serde(default = "default_distribution")]
    pub distribution: String,

    /// Worker count: 1 runs serially, 0 uses every core.
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            detuning_range: default_detuning_range(),
            detuning_points: default_detuning_points(),
            linewidth: default_linewidth(),
            distribution: default_distribution(),
            n_jobs: default_n_jobs(),
        }
    }
}

fn default_detuning_range() -> [f64; 2] { [-10.0, 10.0] }

fn default_detuning_points() -> usize { 101 }

fn default_linewidth() -> f64 { 2.0 }

fn default_distribution() -> String { LineShape::Gaussian.name().to_string() }

fn default_n_jobs() -> usize { 1 }

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `pulse_echo=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: default_log_level() } }
}

fn default_log_level() -> String { "info".to_string() }

/// `[sequence]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_sequence_name")]
    pub name: String,

    #[serde(default)]
    pub operations: Vec<OperationConfig>,

    #[serde(default)]
    pub detection: Option<DetectionConfig>,
}

fn default_sequence_name() -> String { "Sequence".to_string() }

impl SequenceConfig {
    /// Assemble the sequence. Parameter ranges are checked later, by
    /// [`Sequence::validate`].
    pub fn build(&self, thresholds: Thresholds) -> Result<Sequence> {
        let mut seq = Sequence::new(self.name.as_str()).with_thresholds(thresholds);
        for op in self.operations.iter() {
            seq = match op {
                OperationConfig::ShapedPulse {
                    flip_angle,
                    duration,
                    shape,
                    params,
                    phase_offset,
                    n_time_slices,
                    sx,
                    sy,
                } => {
                    let pulse
                        = PulseParams::from_named(
                            *flip_angle, *duration, shape, params)?
                        .with_phase_offset(*phase_offset)
                        .with_time_slices(*n_time_slices)
                        .with_quadrature(*sx, *sy);
                    seq.add_shaped_pulse(pulse)
                },
                OperationConfig::HardPulse { flip_angle, phase, amplitude } => {
                    let pulse
                        = HardPulseParams::new(*flip_angle)
                        .with_phase(*phase)
                        .with_amplitude(*amplitude);
                    seq.add_hard_pulse(pulse)
                },
                OperationConfig::Delay { duration } => seq.add_delay(*duration),
            };
        }
        if let Some(det) = self.detection.as_ref() {
            seq = seq.set_detection(
                DetectionParams::from_names(det.time_step, det.n_points, &det.observables)?);
        }
        Ok(seq)
    }
}

/// One entry of `[[sequence.operations]]`, selected by its `kind` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationConfig {
    ShapedPulse {
        flip_angle: f64,
        duration: f64,
        #[serde(default = "default_shape")]
        shape: String,
        #[serde(default)]
        params: ShapeParams,
        #[serde(default)]
        phase_offset: f64,
        #[serde(default = "default_time_slices")]
        n_time_slices: usize,
        #[serde(default = "default_one")]
        sx: f64,
        #[serde(default)]
        sy: f64,
    },
    HardPulse {
        flip_angle: f64,
        #[serde(default)]
        phase: f64,
        #[serde(default = "default_one")]
        amplitude: f64,
    },
    Delay {
        duration: f64,
    },
}

fn default_shape() -> String { "gaussian".to_string() }

fn default_time_slices() -> usize { 100 }

fn default_one() -> f64 { 1.0 }

/// `[sequence.detection]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub time_step: f64,
    pub n_points: usize,
    #[serde(default = "default_observables")]
    pub observables: Vec<String>,
}

fn default_observables() -> Vec<String> {
    vec!["sx".to_string(), "sy".to_string()]
}
