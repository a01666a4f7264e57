//! Time-sampled pulse envelopes.
//!
//! A [`Shape`] names a pulse family together with its parameters; [`generate`]
//! samples it into a [`PulseShape`] on a uniform time grid starting at zero.
//! Shapes can also be described by a family name and a loosely typed
//! [`ShapeParams`] mapping (e.g. read from a configuration file), which is
//! resolved by [`Shape::from_params`].

use std::f64::consts::TAU;
use ndarray as nd;
use rand::{ Rng, SeedableRng, rngs::StdRng };
use rand_distr::StandardNormal;
use toml::Value;
use crate::{
    error::{ Error, Result },
    utils::trapz,
};

/// Family-specific parameter mapping; missing keys take their defaults.
pub type ShapeParams = toml::Table;

/// A sampled pulse: amplitude envelope, phase, and instantaneous frequency
/// offset over a time axis.
///
/// All four arrays have the same length, which is at least 2.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseShape {
    amplitude: nd::Array1<f64>,
    phase: nd::Array1<f64>,
    frequency: nd::Array1<f64>,
    time: nd::Array1<f64>,
}

impl PulseShape {
    /// Assemble a pulse shape, checking that all arrays have the length of
    /// the time axis and that there are at least two samples.
    pub fn new(
        amplitude: nd::Array1<f64>,
        phase: nd::Array1<f64>,
        frequency: nd::Array1<f64>,
        time: nd::Array1<f64>,
    ) -> Result<Self>
    {
        let n = time.len();
        if n < 2 { return Err(Error::TooFewSamples(n)); }
        let lengths = [
            ("amplitude", amplitude.len()),
            ("phase", phase.len()),
            ("frequency", frequency.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(Error::ShapeLength { name, len, expected: n });
            }
        }
        Ok(Self { amplitude, phase, frequency, time })
    }

    /// Amplitude envelope (dimensionless, non-negative).
    pub fn amplitude(&self) -> &nd::Array1<f64> { &self.amplitude }

    /// Phase (radians).
    pub fn phase(&self) -> &nd::Array1<f64> { &self.phase }

    /// Instantaneous frequency offset (detuning units).
    pub fn frequency(&self) -> &nd::Array1<f64> { &self.frequency }

    /// Sample times.
    pub fn time(&self) -> &nd::Array1<f64> { &self.time }

    /// Number of samples.
    pub fn len(&self) -> usize { self.time.len() }

    /// Return `true` if there are no samples.
    pub fn is_empty(&self) -> bool { self.time.is_empty() }

    /// Spacing between the first two samples, taken as the slice duration.
    pub fn dt(&self) -> f64 { self.time[1] - self.time[0] }

    /// Trapezoidal integral of the amplitude envelope over time.
    pub fn area(&self) -> f64 { trapz(&self.amplitude, &self.time) }
}

/// Amplitude-only envelopes, usable on their own or as the envelope of a
/// [chirp][Shape::Chirp] or the base of a [noisy][Shape::Noisy] pulse.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// `exp(-½ ((t - T/2) / (T / sigma_factor))²)`.
    Gaussian { sigma_factor: f64 },
    /// Flat top with linear ramps of length `rise_time` at both ends.
    Square { rise_time: f64 },
    /// `1 / cosh(beta (t - T/2) / T)`.
    Sech { beta: f64 },
}

impl Default for Envelope {
    fn default() -> Self { Self::Gaussian { sigma_factor: 4.0 } }
}

impl Envelope {
    /// Name of the envelope family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian { .. } => "gaussian",
            Self::Square { .. } => "square",
            Self::Sech { .. } => "sech",
        }
    }

    /// Resolve an envelope from its name and a parameter mapping.
    pub fn from_params(name: &str, params: &ShapeParams) -> Result<Self> {
        match name {
            "gaussian" => Ok(Self::Gaussian {
                sigma_factor: get_f64(params, name, "sigma_factor", 4.0)?,
            }),
            "square" => Ok(Self::Square {
                rise_time: get_f64(params, name, "rise_time", 0.0)?,
            }),
            "sech" => Ok(Self::Sech {
                beta: get_f64(params, name, "beta", 5.0)?,
            }),
            other => Err(Error::UnknownEnvelope(other.to_string())),
        }
    }

    fn check(&self) -> Result<()> {
        match *self {
            Self::Gaussian { sigma_factor } if !(sigma_factor > 0.0) => {
                Err(Error::invalid(
                    "sigma_factor",
                    format!("must be positive, got {sigma_factor}"),
                ))
            },
            Self::Square { rise_time } if !(rise_time >= 0.0) => {
                Err(Error::invalid(
                    "rise_time",
                    format!("must be non-negative, got {rise_time}"),
                ))
            },
            _ => Ok(()),
        }
    }

    /// Sample the envelope on `time`, which is assumed to span
    /// `[0, duration]`.
    pub fn sample(&self, duration: f64, time: &nd::Array1<f64>)
        -> nd::Array1<f64>
    {
        let t_center = duration / 2.0;
        match *self {
            Self::Gaussian { sigma_factor } => {
                let sigma = duration / sigma_factor;
                time.mapv(|t| (-0.5 * ((t - t_center) / sigma).powi(2)).exp())
            },
            Self::Square { rise_time } => {
                let n = time.len();
                let mut amp: nd::Array1<f64> = nd::Array1::ones(n);
                let rise
                    = ((rise_time / duration * n as f64).floor() as usize)
                    .min(n / 2);
                if rise_time > 0.0 && rise > 0 {
                    let ramp: nd::Array1<f64>
                        = nd::Array1::linspace(0.0, 1.0, rise);
                    for (k, r) in ramp.iter().enumerate() {
                        amp[k] = *r;
                        amp[n - 1 - k] = *r;
                    }
                }
                amp
            },
            Self::Sech { beta } => {
                time.mapv(|t| (beta * (t - t_center) / duration).cosh().recip())
            },
        }
    }
}

/// A pulse family with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Gaussian envelope, constant phase.
    Gaussian { sigma_factor: f64 },
    /// Rectangular envelope with optional linear rise/fall.
    Square { rise_time: f64 },
    /// Hyperbolic-secant envelope, constant phase.
    Sech { beta: f64 },
    /// Wideband, uniform rate, smooth truncation: a linear frequency sweep
    /// under the envelope `amplitude_factor (1 - |2t/T - 1|^wurst_n)`.
    Wurst {
        freq_start: f64,
        freq_end: f64,
        wurst_n: f64,
        amplitude_factor: f64,
    },
    /// Linear frequency sweep under an arbitrary [`Envelope`].
    Chirp {
        freq_start: f64,
        freq_end: f64,
        envelope: Envelope,
    },
    /// An [`Envelope`] with Gaussian amplitude, phase, and frequency noise.
    ///
    /// The output is reproducible if and only if `seed` is given.
    Noisy {
        base: Envelope,
        amp_noise: f64,
        phase_noise: f64,
        freq_noise: f64,
        seed: Option<u64>,
    },
}

impl Default for Shape {
    fn default() -> Self { Self::gaussian(4.0) }
}

impl From<Envelope> for Shape {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Gaussian { sigma_factor } => Self::Gaussian { sigma_factor },
            Envelope::Square { rise_time } => Self::Square { rise_time },
            Envelope::Sech { beta } => Self::Sech { beta },
        }
    }
}

impl Shape {
    /// Create a new [`Self::Gaussian`].
    pub fn gaussian(sigma_factor: f64) -> Self {
        Self::Gaussian { sigma_factor }
    }

    /// Create a new [`Self::Square`].
    pub fn square(rise_time: f64) -> Self { Self::Square { rise_time } }

    /// Create a new [`Self::Sech`].
    pub fn sech(beta: f64) -> Self { Self::Sech { beta } }

    /// Create a new [`Self::Wurst`] with unit amplitude factor.
    pub fn wurst(freq_start: f64, freq_end: f64, wurst_n: f64) -> Self {
        Self::Wurst { freq_start, freq_end, wurst_n, amplitude_factor: 1.0 }
    }

    /// Create a new [`Self::Chirp`].
    pub fn chirp(freq_start: f64, freq_end: f64, envelope: Envelope) -> Self {
        Self::Chirp { freq_start, freq_end, envelope }
    }

    /// Name of the pulse family.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Gaussian { .. } => "gaussian",
            Self::Square { .. } => "square",
            Self::Sech { .. } => "sech",
            Self::Wurst { .. } => "wurst",
            Self::Chirp { .. } => "chirp",
            Self::Noisy { .. } => "noisy",
        }
    }

    /// Return `false` if sampling this shape draws unseeded random numbers.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Self::Noisy { seed: None, .. })
    }

    /// Resolve a shape from a family name and a parameter mapping.
    ///
    /// Recognized families and keys, with defaults:
    /// - `gaussian`: `sigma_factor = 4.0`
    /// - `square`: `rise_time = 0.0`
    /// - `sech`: `beta = 5.0`
    /// - `wurst`: `freq_start = -5`, `freq_end = 5`, `wurst_n = 40`,
    ///   `amplitude_factor = 1.0`
    /// - `chirp`: `freq_start = -5`, `freq_end = 5`, `envelope = "gaussian"`,
    ///   `envelope_params = {}`
    /// - `noisy`: `base_shape = "gaussian"`, `base_params = {}`,
    ///   `amp_noise = 0.1`, `phase_noise = 0.1`, `freq_noise = 0.0`, `seed`
    ///   unset
    ///
    /// Unrecognized keys are ignored.
    pub fn from_params(family: &str, params: &ShapeParams) -> Result<Self> {
        match family {
            "gaussian" | "square" | "sech" => {
                Envelope::from_params(family, params).map(Self::from)
            },
            "wurst" => Ok(Self::Wurst {
                freq_start: get_f64(params, family, "freq_start", -5.0)?,
                freq_end: get_f64(params, family, "freq_end", 5.0)?,
                wurst_n: get_f64(params, family, "wurst_n", 40.0)?,
                amplitude_factor:
                    get_f64(params, family, "amplitude_factor", 1.0)?,
            }),
            "chirp" => {
                let name = get_str(params, family, "envelope", "gaussian")?;
                let env_params = get_table(params, family, "envelope_params")?;
                Ok(Self::Chirp {
                    freq_start: get_f64(params, family, "freq_start", -5.0)?,
                    freq_end: get_f64(params, family, "freq_end", 5.0)?,
                    envelope: Envelope::from_params(&name, &env_params)?,
                })
            },
            "noisy" => {
                let name = get_str(params, family, "base_shape", "gaussian")?;
                let base_params = get_table(params, family, "base_params")?;
                Ok(Self::Noisy {
                    base: Envelope::from_params(&name, &base_params)?,
                    amp_noise: get_f64(params, family, "amp_noise", 0.1)?,
                    phase_noise: get_f64(params, family, "phase_noise", 0.1)?,
                    freq_noise: get_f64(params, family, "freq_noise", 0.0)?,
                    seed: get_seed(params, family, "seed")?,
                })
            },
            other => Err(Error::UnknownShape(other.to_string())),
        }
    }
}

fn get_f64(params: &ShapeParams, family: &str, key: &str, default: f64)
    -> Result<f64>
{
    match params.get(key) {
        None => Ok(default),
        Some(Value::Float(f)) => Ok(*f),
        Some(Value::Integer(i)) => Ok(*i as f64),
        Some(_) => Err(shape_param(family, key, "a number")),
    }
}

fn get_str(params: &ShapeParams, family: &str, key: &str, default: &str)
    -> Result<String>
{
    match params.get(key) {
        None => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(shape_param(family, key, "a string")),
    }
}

fn get_table(params: &ShapeParams, family: &str, key: &str)
    -> Result<ShapeParams>
{
    match params.get(key) {
        None => Ok(ShapeParams::new()),
        Some(Value::Table(t)) => Ok(t.clone()),
        Some(_) => Err(shape_param(family, key, "a table")),
    }
}

fn get_seed(params: &ShapeParams, family: &str, key: &str)
    -> Result<Option<u64>>
{
    match params.get(key) {
        None => Ok(None),
        Some(Value::Integer(i)) if *i >= 0 => Ok(Some(*i as u64)),
        Some(_) => Err(shape_param(family, key, "a non-negative integer")),
    }
}

fn shape_param(family: &str, key: &str, expected: &'static str) -> Error {
    Error::ShapeParam {
        family: family.to_string(),
        key: key.to_string(),
        expected,
    }
}

// linear sweep from `f0` to `f1` and its running phase, 2π Σ f dt
fn sweep(duration: f64, n: usize, f0: f64, f1: f64)
    -> (nd::Array1<f64>, nd::Array1<f64>)
{
    let frequency: nd::Array1<f64> = nd::Array1::linspace(f0, f1, n);
    let dt = if n > 1 { duration / (n - 1) as f64 } else { 0.0 };
    let mut acc: f64 = 0.0;
    let phase: nd::Array1<f64>
        = frequency.iter()
        .map(|f| { acc += *f; acc * dt * TAU })
        .collect();
    (frequency, phase)
}

fn normal_samples(rng: &mut StdRng, n: usize, scale: f64) -> nd::Array1<f64> {
    (0..n).map(|_| scale * rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Sample `shape` on `n_points` evenly spaced times covering `[0, duration]`.
///
/// Fails if `duration` is not positive, if `n_points < 2`, or if a shape
/// parameter is out of range.
pub fn generate(duration: f64, n_points: usize, shape: &Shape)
    -> Result<PulseShape>
{
    if !(duration > 0.0) || !duration.is_finite() {
        return Err(Error::invalid(
            "duration",
            format!("pulse duration must be positive, got {duration}"),
        ));
    }
    if n_points < 2 { return Err(Error::TooFewSamples(n_points)); }
    let time: nd::Array1<f64> = nd::Array1::linspace(0.0, duration, n_points);
    let zeros = || nd::Array1::<f64>::zeros(n_points);
    match shape {
        Shape::Gaussian { sigma_factor } => {
            let env = Envelope::Gaussian { sigma_factor: *sigma_factor };
            env.check()?;
            PulseShape::new(env.sample(duration, &time), zeros(), zeros(), time)
        },
        Shape::Square { rise_time } => {
            let env = Envelope::Square { rise_time: *rise_time };
            env.check()?;
            PulseShape::new(env.sample(duration, &time), zeros(), zeros(), time)
        },
        Shape::Sech { beta } => {
            let env = Envelope::Sech { beta: *beta };
            PulseShape::new(env.sample(duration, &time), zeros(), zeros(), time)
        },
        Shape::Wurst { freq_start, freq_end, wurst_n, amplitude_factor } => {
            if !(*wurst_n >= 0.0) {
                return Err(Error::invalid(
                    "wurst_n",
                    format!("must be non-negative, got {wurst_n}"),
                ));
            }
            let amplitude
                = time.mapv(|t| {
                    let x = (2.0 * t / duration - 1.0).abs();
                    (amplitude_factor * (1.0 - x.powf(*wurst_n))).max(0.0)
                });
            let (frequency, phase)
                = sweep(duration, n_points, *freq_start, *freq_end);
            PulseShape::new(amplitude, phase, frequency, time)
        },
        Shape::Chirp { freq_start, freq_end, envelope } => {
            envelope.check()?;
            let amplitude = envelope.sample(duration, &time);
            let (frequency, phase)
                = sweep(duration, n_points, *freq_start, *freq_end);
            PulseShape::new(amplitude, phase, frequency, time)
        },
        Shape::Noisy { base, amp_noise, phase_noise, freq_noise, seed } => {
            base.check()?;
            let mut rng
                = match seed {
                    Some(s) => StdRng::seed_from_u64(*s),
                    None => StdRng::from_entropy(),
                };
            let amp_fluct = normal_samples(&mut rng, n_points, *amp_noise);
            let phase_fluct = normal_samples(&mut rng, n_points, *phase_noise);
            let freq_fluct = normal_samples(&mut rng, n_points, *freq_noise);
            let amplitude: nd::Array1<f64>
                = base.sample(duration, &time).iter()
                .zip(&amp_fluct)
                .map(|(a, da)| (a * (1.0 + da)).max(0.0))
                .collect();
            PulseShape::new(amplitude, phase_fluct, freq_fluct, time)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(src: &str) -> ShapeParams {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn gaussian_is_centered_and_symmetric() {
        let p = generate(2.0, 101, &Shape::gaussian(4.0)).unwrap();
        assert_eq!(p.len(), 101);
        assert!(!p.is_empty());
        assert!((p.amplitude()[50] - 1.0).abs() < 1e-15);
        let edge = (-0.5_f64 * 4.0).exp();
        assert!((p.amplitude()[0] - edge).abs() < 1e-12);
        for k in 0..101 {
            assert!((p.amplitude()[k] - p.amplitude()[100 - k]).abs() < 1e-12);
        }
        assert!(p.phase().iter().all(|ph| *ph == 0.0));
        assert!(p.frequency().iter().all(|f| *f == 0.0));
        assert!((p.time()[100] - 2.0).abs() < 1e-15);
        assert!((p.dt() - 0.02).abs() < 1e-15);
    }

    #[test]
    fn square_with_and_without_ramps() {
        let flat = generate(1.0, 50, &Shape::square(0.0)).unwrap();
        assert!(flat.amplitude().iter().all(|a| *a == 1.0));
        assert!((flat.area() - 1.0).abs() < 1e-12);

        let ramped = generate(1.0, 100, &Shape::square(0.1)).unwrap();
        let a = ramped.amplitude();
        assert_eq!(a[0], 0.0);
        assert_eq!(a[9], 1.0);
        assert!((a[1] - 1.0 / 9.0).abs() < 1e-12);
        assert_eq!(a[50], 1.0);
        assert_eq!(a[90], 1.0);
        assert_eq!(a[99], 0.0);

        // ramps longer than half the pulse are clamped
        let clamped = generate(1.0, 10, &Shape::square(5.0)).unwrap();
        assert_eq!(clamped.amplitude()[0], 0.0);
        assert_eq!(clamped.amplitude()[9], 0.0);
    }

    #[test]
    fn sech_profile() {
        let p = generate(1.0, 11, &Shape::sech(5.0)).unwrap();
        assert!((p.amplitude()[5] - 1.0).abs() < 1e-15);
        assert!((p.amplitude()[0] - 1.0 / 2.5_f64.cosh()).abs() < 1e-12);
    }

    #[test]
    fn wurst_sweep() {
        let p = generate(2.0, 5, &Shape::wurst(-4.0, 4.0, 2.0)).unwrap();
        assert_eq!(p.amplitude()[0], 0.0);
        assert_eq!(p.amplitude()[4], 0.0);
        assert!((p.amplitude()[2] - 1.0).abs() < 1e-15);
        assert!((p.amplitude()[1] - 0.75).abs() < 1e-12);
        assert_eq!(p.frequency().to_vec(), vec![-4.0, -2.0, 0.0, 2.0, 4.0]);
        let dt = 0.5;
        let expected = [-4.0, -6.0, -6.0, -4.0, 0.0];
        for (ph, cum) in p.phase().iter().zip(expected) {
            assert!((ph - cum * dt * TAU).abs() < 1e-12);
        }
    }

    #[test]
    fn chirp_uses_named_envelope() {
        let shape = Shape::from_params(
            "chirp",
            &params(r#"
                freq_start = -2
                freq_end = 2.0
                envelope = "sech"
                envelope_params = { beta = 3.0 }
            "#),
        ).unwrap();
        assert_eq!(
            shape,
            Shape::chirp(-2.0, 2.0, Envelope::Sech { beta: 3.0 }),
        );
        let p = generate(1.0, 21, &shape).unwrap();
        let env = generate(1.0, 21, &Shape::sech(3.0)).unwrap();
        assert_eq!(p.amplitude(), env.amplitude());
        assert_eq!(p.frequency()[0], -2.0);
        assert_eq!(p.frequency()[20], 2.0);
    }

    #[test]
    fn noisy_is_reproducible_with_seed() {
        let shape = Shape::from_params(
            "noisy",
            &params("amp_noise = 0.2\nphase_noise = 0.1\nseed = 42"),
        ).unwrap();
        assert!(shape.is_deterministic());
        let a = generate(1.0, 64, &shape).unwrap();
        let b = generate(1.0, 64, &shape).unwrap();
        assert_eq!(a, b);
        let clean = generate(1.0, 64, &Shape::gaussian(4.0)).unwrap();
        assert_ne!(a.amplitude(), clean.amplitude());
        assert!(a.phase().iter().any(|ph| *ph != 0.0));
        assert!(a.frequency().iter().all(|f| *f == 0.0));

        let unseeded = Shape::from_params("noisy", &ShapeParams::new()).unwrap();
        assert!(!unseeded.is_deterministic());
    }

    #[test]
    fn noisy_amplitude_is_clamped() {
        let shape = Shape::Noisy {
            base: Envelope::Square { rise_time: 0.0 },
            amp_noise: 5.0,
            phase_noise: 0.0,
            freq_noise: 0.0,
            seed: Some(7),
        };
        let p = generate(1.0, 500, &shape).unwrap();
        assert!(p.amplitude().iter().all(|a| *a >= 0.0));
        assert!(p.amplitude().iter().any(|a| *a == 0.0));
    }

    #[test]
    fn defaults_from_empty_params() {
        let empty = ShapeParams::new();
        assert_eq!(
            Shape::from_params("gaussian", &empty).unwrap(),
            Shape::gaussian(4.0),
        );
        assert_eq!(
            Shape::from_params("wurst", &empty).unwrap(),
            Shape::Wurst {
                freq_start: -5.0,
                freq_end: 5.0,
                wurst_n: 40.0,
                amplitude_factor: 1.0,
            },
        );
        assert_eq!(
            Shape::from_params("chirp", &empty).unwrap(),
            Shape::chirp(-5.0, 5.0, Envelope::Gaussian { sigma_factor: 4.0 }),
        );
    }

    #[test]
    fn configuration_errors() {
        let empty = ShapeParams::new();
        match Shape::from_params("lorentz", &empty) {
            Err(Error::UnknownShape(name)) => assert_eq!(name, "lorentz"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            Shape::from_params("chirp", &params("envelope = \"triangle\"")),
            Err(Error::UnknownEnvelope(_)),
        ));
        assert!(matches!(
            Shape::from_params("gaussian", &params("sigma_factor = \"wide\"")),
            Err(Error::ShapeParam { .. }),
        ));
        assert!(matches!(
            Shape::from_params("noisy", &params("seed = -1")),
            Err(Error::ShapeParam { .. }),
        ));
        assert!(matches!(
            generate(0.0, 10, &Shape::default()),
            Err(Error::InvalidParameter { .. }),
        ));
        assert!(matches!(
            generate(1.0, 1, &Shape::default()),
            Err(Error::TooFewSamples(1)),
        ));
        assert!(matches!(
            generate(1.0, 10, &Shape::gaussian(0.0)),
            Err(Error::InvalidParameter { .. }),
        ));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, 1.0, 4);
        let err = PulseShape::new(
            nd::Array1::ones(4),
            nd::Array1::zeros(3),
            nd::Array1::zeros(4),
            t,
        );
        assert!(matches!(
            err,
            Err(Error::ShapeLength { name: "phase", len: 3, expected: 4 }),
        ));
    }
}
