//! Propagation of a single spin-1/2 density matrix through delays and pulses.
//!
//! Every step is a similarity transform `rho -> U† rho U` with
//! `U = exp(-i H dt)`. Shaped pulses are integrated by slicing: the drive is
//! held constant over each interval of the sampled [`PulseShape`], so each
//! slice contributes one exact SU(2) propagator. No relaxation is modeled.

use std::{ fmt, str::FromStr };
use itertools::izip;
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    error::{ Error, Result },
    shape::PulseShape,
    spin::{
        self,
        DensityMatrix,
        SpinField,
        evolution_operator,
        transform,
    },
};

/// Cutoffs below which quantities are treated as exactly zero.
///
/// These only decide when work may be skipped or when a normalization is
/// undefined; none of them rescale the physics.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// A slice whose Hamiltonian coefficients are all at most this is the
    /// identity.
    pub hamiltonian: f64,
    /// An envelope whose time integral is at most this produces no rotation.
    pub amplitude_integral: f64,
    /// Quadrature weights whose norm is at most this default to pure
    /// in-phase driving.
    pub quadrature: f64,
    /// Free-precession angles of at most this modulus are skipped.
    pub rotation: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hamiltonian: 1e-12,
            amplitude_integral: 1e-12,
            quadrature: 1e-12,
            rotation: 1e-12,
        }
    }
}

/// Calibration of a shaped pulse: net rotation angle, global phase, and the
/// relative weights of the in-phase (`Sx`) and quadrature (`Sy`) drives.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Drive {
    pub flip_angle: f64,
    pub phase_offset: f64,
    pub sx_amplitude: f64,
    pub sy_amplitude: f64,
}

impl Drive {
    /// In-phase drive of the given flip angle with no phase offset.
    pub fn new(flip_angle: f64) -> Self {
        Self {
            flip_angle,
            phase_offset: 0.0,
            sx_amplitude: 1.0,
            sy_amplitude: 0.0,
        }
    }

    /// Return the quadrature weights as a unit vector `(nx, ny)`, or `(1, 0)`
    /// if both weights vanish.
    pub fn axis(&self, th: &Thresholds) -> (f64, f64) {
        let norm = self.sx_amplitude.hypot(self.sy_amplitude);
        if norm > th.quadrature {
            (self.sx_amplitude / norm, self.sy_amplitude / norm)
        } else {
            (1.0, 0.0)
        }
    }
}

/// Factor that rescales the envelope of `shape` so that its time integral is
/// `flip_angle`, or zero if the envelope has (numerically) no area.
pub fn amplitude_scale(shape: &PulseShape, flip_angle: f64, th: &Thresholds)
    -> f64
{
    let area = shape.area();
    if area > th.amplitude_integral { flip_angle / area } else { 0.0 }
}

/// Rotating-frame Hamiltonian coefficients for one pulse slice.
///
/// The drive operator is `nx Sx(phi) + ny Sy(phi)` with the phase-rotated
/// transverse operators
/// ```text
/// Sx(phi) = cos(phi) Sx - sin(phi) Sy
/// Sy(phi) = sin(phi) Sx + cos(phi) Sy
/// ```
/// and the longitudinal part is `(detuning + freq_offset) Sz`.
pub fn slice_field(
    amplitude: f64,
    phase: f64,
    freq_offset: f64,
    detuning: f64,
    axis: (f64, f64),
) -> SpinField
{
    let (nx, ny) = axis;
    let (s, c) = phase.sin_cos();
    SpinField::new(
        amplitude * (nx * c + ny * s),
        amplitude * (ny * c - nx * s),
        detuning + freq_offset,
    )
}

/// Iterate over the `n - 1` slice propagators of a shaped pulse, yielding
/// `None` for slices whose Hamiltonian vanishes.
pub fn slice_propagators<'a>(
    shape: &'a PulseShape,
    drive: &Drive,
    detuning: f64,
    th: &Thresholds,
) -> impl Iterator<Item = Option<nd::Array2<C64>>> + 'a
{
    let scale = amplitude_scale(shape, drive.flip_angle, th);
    let axis = drive.axis(th);
    let phase_offset = drive.phase_offset;
    let cutoff = th.hamiltonian;
    let dt = shape.dt();
    izip!(shape.amplitude(), shape.phase(), shape.frequency())
        .take(shape.len() - 1)
        .map(move |(amp, phase, freq)| {
            let h = slice_field(
                amp * scale, phase + phase_offset, *freq, detuning, axis);
            (h.max_abs() > cutoff).then(|| evolution_operator(h, dt))
        })
}

/// Propagate `rho` through a shaped pulse.
pub fn evolve_shaped_pulse(
    rho: &DensityMatrix,
    shape: &PulseShape,
    drive: &Drive,
    detuning: f64,
    th: &Thresholds,
) -> DensityMatrix
{
    slice_propagators(shape, drive, detuning, th)
        .fold(rho.clone(), |acc, U| match U {
            Some(U) => transform(&U, &acc),
            None => acc,
        })
}

/// Compute the net propagator `U = U_1 U_2 ... U_{n-1}` of a shaped pulse, so
/// that the pulse maps `rho` to `U† rho U`.
pub fn pulse_propagator(
    shape: &PulseShape,
    drive: &Drive,
    detuning: f64,
    th: &Thresholds,
) -> nd::Array2<C64>
{
    slice_propagators(shape, drive, detuning, th)
        .fold(spin::identity(), |acc, U| match U {
            Some(U) => acc.dot(&U),
            None => acc,
        })
}

/// Propagator for free precession about the quantization axis.
pub fn delay_propagator(duration: f64, detuning: f64) -> nd::Array2<C64> {
    evolution_operator(SpinField::new(0.0, 0.0, detuning), duration)
}

/// Propagate `rho` through a free-evolution delay.
pub fn evolve_delay(
    rho: &DensityMatrix,
    duration: f64,
    detuning: f64,
    th: &Thresholds,
) -> DensityMatrix
{
    if (detuning * duration).abs() <= th.rotation { return rho.clone(); }
    transform(&delay_propagator(duration, detuning), rho)
}

/// Propagator for an instantaneous rotation by `angle` about the transverse
/// axis at `phase` from `Sx`.
pub fn hard_propagator(angle: f64, phase: f64) -> nd::Array2<C64> {
    let (s, c) = phase.sin_cos();
    evolution_operator(SpinField::new(c, s, 0.0), angle)
}

/// Propagate `rho` through an instantaneous (infinitely short) pulse, which
/// ignores detuning.
pub fn evolve_hard_pulse(
    rho: &DensityMatrix,
    angle: f64,
    phase: f64,
    th: &Thresholds,
) -> DensityMatrix
{
    if angle.abs() <= th.rotation { return rho.clone(); }
    transform(&hard_propagator(angle, phase), rho)
}

/// A measurable spin quantity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Observable {
    Sx,
    Sy,
    Sz,
    /// `Sx + i Sy`
    SPlus,
    /// `Sx - i Sy`
    SMinus,
}

impl Observable {
    /// All observables.
    pub const ALL: [Self; 5]
        = [Self::Sx, Self::Sy, Self::Sz, Self::SPlus, Self::SMinus];

    /// Conventional short name: `sx`, `sy`, `sz`, `s+`, or `s-`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sx => "sx",
            Self::Sy => "sy",
            Self::Sz => "sz",
            Self::SPlus => "s+",
            Self::SMinus => "s-",
        }
    }

    /// Return `true` if measurements are complex-valued.
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::SPlus | Self::SMinus)
    }

    /// Matrix representation.
    pub fn operator(&self) -> nd::Array2<C64> {
        match self {
            Self::Sx => spin::sx(),
            Self::Sy => spin::sy(),
            Self::Sz => spin::sz(),
            Self::SPlus => spin::splus(),
            Self::SMinus => spin::sminus(),
        }
    }

    /// Measure on `rho`.
    ///
    /// Hermitian observables return the real part of `tr(rho O)` (with zero
    /// imaginary part); `s+` and `s-` return the full complex trace.
    pub fn measure(&self, rho: &DensityMatrix) -> C64 {
        let value = spin::expectation(rho, &self.operator());
        if self.is_complex() { value } else { C64::from(value.re) }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Observable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sx" => Ok(Self::Sx),
            "sy" => Ok(Self::Sy),
            "sz" => Ok(Self::Sz),
            "s+" => Ok(Self::SPlus),
            "s-" => Ok(Self::SMinus),
            _ => Err(Error::UnknownObservable(s.to_string())),
        }
    }
}
