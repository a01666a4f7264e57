#![allow(non_snake_case)]

//! Ensemble simulation of pulsed spin-1/2 echo experiments.
//!
//! A [`Sequence`][sequence::Sequence] of shaped pulses, hard pulses and
//! free-evolution delays is applied to a single spin-1/2 density matrix for
//! each detuning sampled from a line shape, and the resulting detection
//! signals are averaged with the line-shape weights by the
//! [ensemble simulator][ensemble::EnsembleSimulator].
//!
//! Where unspecified, detunings and frequency offsets are angular frequencies
//! in the same (arbitrary) units as the inverse of all durations.

pub mod error;
pub mod utils;
pub mod spin;
pub mod shape;
pub mod evolution;
pub mod sequence;
pub mod presets;
pub mod distribution;
pub mod ensemble;
pub mod config;

pub use error::{ Error, Result };
pub use evolution::{ Observable, Thresholds };
pub use shape::{ Envelope, PulseShape, Shape, ShapeParams };
pub use sequence::{
    DelayParams,
    DetectionParams,
    HardPulseParams,
    Operation,
    PulseParams,
    Sequence,
    Signal,
    Signals,
};
pub use distribution::{ DetuningDistribution, LineShape };
pub use ensemble::{ EnsembleParams, EnsembleSimulator, simulate_sequence };
pub use config::SimConfig;
