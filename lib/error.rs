//! Error types for sequence construction and simulation.
//!
//! Everything here is a configuration problem that the caller can correct;
//! numerical edge cases (vanishing Hamiltonians, degenerate quadrature
//! weights, zero-area envelopes) are handled where they occur and never show
//! up as errors.

use thiserror::Error;

/// Result type alias for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A pulse shape family name was not recognized.
    #[error("unknown pulse shape family '{0}'")]
    UnknownShape(String),

    /// An envelope (or noisy base shape) name was not recognized.
    #[error("unknown envelope '{0}': expected one of gaussian, square, sech")]
    UnknownEnvelope(String),

    /// An observable name was not recognized.
    #[error("unknown observable '{0}': expected one of sx, sy, sz, s+, s-")]
    UnknownObservable(String),

    /// A line-shape (detuning distribution) name was not recognized.
    #[error(
        "unknown distribution '{0}': \
        expected one of gaussian, lorentzian, exponential, uniform"
    )]
    UnknownLineShape(String),

    /// Simulation was requested before detection parameters were set.
    #[error("sequence '{0}' has no detection parameters")]
    MissingDetection(String),

    /// The arrays of a pulse shape do not all have the same length.
    #[error("pulse shape array '{name}' has length {len}, expected {expected}")]
    ShapeLength { name: &'static str, len: usize, expected: usize },

    /// A pulse shape needs at least two samples to define a time slice.
    #[error("pulse shape needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    /// A numerical parameter is out of its allowed range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A shape parameter mapping holds a value of the wrong type.
    #[error("parameter '{key}' of {family} pulse: expected {expected}")]
    ShapeParam { family: String, key: String, expected: &'static str },

    /// Line-shape weights could not be normalized.
    #[error("detuning weights cannot be normalized: {0}")]
    Weights(String),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid<N, R>(name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Self::InvalidParameter { name: name.into(), reason: reason.into() }
    }
}
