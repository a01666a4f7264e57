//! Pulse sequences and single-trajectory simulation.
//!
//! A [`Sequence`] is an ordered list of [`Operation`]s followed by a detection
//! window. It is assembled with by-value builder methods and becomes
//! simulatable once [`DetectionParams`] have been set.

use std::sync::OnceLock;
use indexmap::IndexMap;
use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::{ debug, trace, warn };
use crate::{
    error::{ Error, Result },
    evolution::{
        self,
        Drive,
        Observable,
        Thresholds,
        delay_propagator,
    },
    shape::{ PulseShape, Shape, ShapeParams, generate },
    spin::{ self, DensityMatrix, transform },
};

/// Parameters of a shaped pulse.
///
/// The sampled [`PulseShape`] is generated on first use and cached, so that
/// every trajectory of an ensemble sees the same samples.
#[derive(Clone, Debug)]
pub struct PulseParams {
    flip_angle: f64,
    duration: f64,
    shape: Shape,
    phase_offset: f64,
    n_time_slices: usize,
    sx_amplitude: f64,
    sy_amplitude: f64,
    samples: OnceLock<PulseShape>,
}

impl PulseParams {
    /// Create a new pulse with zero phase offset, 100 time slices, and pure
    /// in-phase driving.
    pub fn new(flip_angle: f64, duration: f64, shape: Shape) -> Self {
        Self {
            flip_angle,
            duration,
            shape,
            phase_offset: 0.0,
            n_time_slices: 100,
            sx_amplitude: 1.0,
            sy_amplitude: 0.0,
            samples: OnceLock::new(),
        }
    }

    /// Like [`Self::new`], but resolve the shape from a family name and a
    /// parameter mapping.
    pub fn from_named(
        flip_angle: f64,
        duration: f64,
        family: &str,
        params: &ShapeParams,
    ) -> Result<Self>
    {
        Ok(Self::new(flip_angle, duration, Shape::from_params(family, params)?))
    }

    /// Set the global phase offset.
    pub fn with_phase_offset(self, phase_offset: f64) -> Self {
        Self { phase_offset, samples: OnceLock::new(), ..self }
    }

    /// Set the number of time samples (one more than the number of
    /// propagation slices).
    pub fn with_time_slices(self, n_time_slices: usize) -> Self {
        Self { n_time_slices, samples: OnceLock::new(), ..self }
    }

    /// Set the in-phase and quadrature drive weights.
    pub fn with_quadrature(self, sx_amplitude: f64, sy_amplitude: f64)
        -> Self
    {
        Self { sx_amplitude, sy_amplitude, samples: OnceLock::new(), ..self }
    }

    pub fn flip_angle(&self) -> f64 { self.flip_angle }

    pub fn duration(&self) -> f64 { self.duration }

    pub fn shape(&self) -> &Shape { &self.shape }

    pub fn phase_offset(&self) -> f64 { self.phase_offset }

    pub fn n_time_slices(&self) -> usize { self.n_time_slices }

    /// In-phase and quadrature weights, as given.
    pub fn quadrature(&self) -> (f64, f64) {
        (self.sx_amplitude, self.sy_amplitude)
    }

    /// Calibration passed to the evolution engine.
    pub fn drive(&self) -> Drive {
        Drive {
            flip_angle: self.flip_angle,
            phase_offset: self.phase_offset,
            sx_amplitude: self.sx_amplitude,
            sy_amplitude: self.sy_amplitude,
        }
    }

    /// Return the sampled shape, generating it on first access.
    pub fn pulse_shape(&self) -> Result<&PulseShape> {
        if let Some(samples) = self.samples.get() { return Ok(samples); }
        let samples = generate(self.duration, self.n_time_slices, &self.shape)?;
        Ok(self.samples.get_or_init(|| samples))
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(Error::invalid(
                format!("operations[{index}].duration"),
                format!("pulse duration must be positive, got {}", self.duration),
            ));
        }
        if self.n_time_slices < 2 {
            return Err(Error::invalid(
                format!("operations[{index}].n_time_slices"),
                format!("need at least 2, got {}", self.n_time_slices),
            ));
        }
        if !self.flip_angle.is_finite() {
            return Err(Error::invalid(
                format!("operations[{index}].flip_angle"),
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Parameters of an instantaneous pulse, which rotates by
/// `flip_angle * amplitude` about the transverse axis at `phase` and ignores
/// detuning.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HardPulseParams {
    pub flip_angle: f64,
    pub phase: f64,
    pub amplitude: f64,
}

impl HardPulseParams {
    /// Create a new hard pulse about `Sx` at unit relative amplitude.
    pub fn new(flip_angle: f64) -> Self {
        Self { flip_angle, phase: 0.0, amplitude: 1.0 }
    }

    pub fn with_phase(self, phase: f64) -> Self { Self { phase, ..self } }

    pub fn with_amplitude(self, amplitude: f64) -> Self {
        Self { amplitude, ..self }
    }

    /// Net rotation angle.
    pub fn angle(&self) -> f64 { self.flip_angle * self.amplitude }
}

/// A period of free precession.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DelayParams {
    pub duration: f64,
}

/// Detection window: `n_points` measurements spaced by `time_step`, the first
/// taken immediately after the last operation.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionParams {
    pub time_step: f64,
    pub n_points: usize,
    pub observables: Vec<Observable>,
}

impl DetectionParams {
    /// Create new detection parameters.
    ///
    /// Repeated observables are dropped, keeping first occurrences in order.
    /// An empty list selects `[sx, sy]`.
    pub fn new<I>(time_step: f64, n_points: usize, observables: I) -> Self
    where I: IntoIterator<Item = Observable>
    {
        let mut uniq: Vec<Observable> = Vec::new();
        for obs in observables {
            if !uniq.contains(&obs) { uniq.push(obs); }
        }
        if uniq.is_empty() { uniq = vec![Observable::Sx, Observable::Sy]; }
        Self { time_step, n_points, observables: uniq }
    }

    /// Like [`Self::new`], but parse observables from their short names.
    pub fn from_names<S>(time_step: f64, n_points: usize, names: &[S])
        -> Result<Self>
    where S: AsRef<str>
    {
        let observables: Vec<Observable>
            = names.iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<_>>()?;
        Ok(Self::new(time_step, n_points, observables))
    }

    /// Detection times relative to the start of the window, `k * time_step`.
    pub fn time_axis(&self) -> nd::Array1<f64> {
        (0..self.n_points).map(|k| k as f64 * self.time_step).collect()
    }

    /// Total length of the window.
    pub fn duration(&self) -> f64 {
        self.n_points.saturating_sub(1) as f64 * self.time_step
    }

    fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0) || !self.time_step.is_finite() {
            return Err(Error::invalid(
                "detection.time_step",
                format!("must be positive, got {}", self.time_step),
            ));
        }
        if self.n_points < 1 {
            return Err(Error::invalid(
                "detection.n_points", "need at least 1 point"));
        }
        if self.observables.is_empty() {
            return Err(Error::invalid(
                "detection.observables", "need at least 1 observable"));
        }
        Ok(())
    }
}

/// A detected time trace.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Real(nd::Array1<f64>),
    Complex(nd::Array1<C64>),
}

impl Signal {
    /// All-zero trace of the right kind for `obs`.
    pub fn zeros(obs: Observable, len: usize) -> Self {
        if obs.is_complex() {
            Self::Complex(nd::Array1::zeros(len))
        } else {
            Self::Real(nd::Array1::zeros(len))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Real(a) => a.len(),
            Self::Complex(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn is_complex(&self) -> bool { matches!(self, Self::Complex(_)) }

    pub fn as_real(&self) -> Option<&nd::Array1<f64>> {
        match self {
            Self::Real(a) => Some(a),
            Self::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&nd::Array1<C64>> {
        match self {
            Self::Real(_) => None,
            Self::Complex(a) => Some(a),
        }
    }

    /// Copy into a complex array.
    pub fn to_complex(&self) -> nd::Array1<C64> {
        match self {
            Self::Real(a) => a.mapv(C64::from),
            Self::Complex(a) => a.clone(),
        }
    }

    /// Pointwise modulus.
    pub fn abs(&self) -> nd::Array1<f64> {
        match self {
            Self::Real(a) => a.mapv(f64::abs),
            Self::Complex(a) => a.mapv(|z| z.norm()),
        }
    }

    // real traces keep only the real part
    fn set(&mut self, k: usize, value: C64) {
        match self {
            Self::Real(a) => { a[k] = value.re; },
            Self::Complex(a) => { a[k] = value; },
        }
    }

    /// Perform `self += weight * other`.
    pub fn scaled_add(&mut self, weight: f64, other: &Self) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::invalid(
                "signal",
                format!(
                    "cannot add traces of length {} and {}",
                    other.len(), self.len(),
                ),
            ));
        }
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a.scaled_add(weight, b),
            (Self::Complex(a), Self::Complex(b))
                => a.scaled_add(C64::from(weight), b),
            _ => {
                return Err(Error::invalid(
                    "signal", "cannot add real and complex traces"));
            },
        }
        Ok(())
    }
}

/// Detected traces keyed by observable, in the order they were requested.
pub type Signals = IndexMap<Observable, Signal>;

/// One step of a pulse sequence.
#[derive(Clone, Debug)]
pub enum Operation {
    ShapedPulse(PulseParams),
    HardPulse(HardPulseParams),
    Delay(DelayParams),
}

impl Operation {
    /// Short name of the operation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShapedPulse(_) => "shaped_pulse",
            Self::HardPulse(_) => "hard_pulse",
            Self::Delay(_) => "delay",
        }
    }

    /// Time taken by the operation; hard pulses take none.
    pub fn duration(&self) -> f64 {
        match self {
            Self::ShapedPulse(p) => p.duration(),
            Self::HardPulse(_) => 0.0,
            Self::Delay(d) => d.duration,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        match self {
            Self::ShapedPulse(p) => p.validate(index),
            Self::HardPulse(h) => {
                if !h.angle().is_finite() || !h.phase.is_finite() {
                    return Err(Error::invalid(
                        format!("operations[{index}].flip_angle"),
                        "rotation angle and phase must be finite",
                    ));
                }
                Ok(())
            },
            Self::Delay(d) => {
                if !(d.duration >= 0.0) || !d.duration.is_finite() {
                    return Err(Error::invalid(
                        format!("operations[{index}].duration"),
                        format!(
                            "delay must be non-negative, got {}", d.duration),
                    ));
                }
                Ok(())
            },
        }
    }

    /// Apply the operation to `rho` at the given detuning.
    pub fn execute(
        &self,
        rho: &DensityMatrix,
        detuning: f64,
        th: &Thresholds,
    ) -> Result<DensityMatrix>
    {
        match self {
            Self::ShapedPulse(p) => {
                let samples = p.pulse_shape()?;
                Ok(evolution::evolve_shaped_pulse(
                    rho, samples, &p.drive(), detuning, th))
            },
            Self::HardPulse(h) => {
                Ok(evolution::evolve_hard_pulse(rho, h.angle(), h.phase, th))
            },
            Self::Delay(d) => {
                Ok(evolution::evolve_delay(rho, d.duration, detuning, th))
            },
        }
    }
}

/// A named pulse sequence with an optional detection window.
#[derive(Clone, Debug)]
pub struct Sequence {
    name: String,
    operations: Vec<Operation>,
    detection: Option<DetectionParams>,
    thresholds: Thresholds,
}

impl Sequence {
    /// Create a new, empty sequence.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
            detection: None,
            thresholds: Thresholds::default(),
        }
    }

    /// Append an operation.
    pub fn add_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Append a shaped pulse.
    pub fn add_shaped_pulse(self, params: PulseParams) -> Self {
        self.add_operation(Operation::ShapedPulse(params))
    }

    /// Append an instantaneous pulse.
    pub fn add_hard_pulse(self, params: HardPulseParams) -> Self {
        self.add_operation(Operation::HardPulse(params))
    }

    /// Append a free-evolution delay.
    pub fn add_delay(self, duration: f64) -> Self {
        self.add_operation(Operation::Delay(DelayParams { duration }))
    }

    /// Set (or replace) the detection window.
    pub fn set_detection(mut self, detection: DetectionParams) -> Self {
        self.detection = Some(detection);
        self
    }

    /// Set the numerical cutoffs used during propagation.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn operations(&self) -> &[Operation] { &self.operations }

    pub fn detection(&self) -> Option<&DetectionParams> {
        self.detection.as_ref()
    }

    pub fn thresholds(&self) -> &Thresholds { &self.thresholds }

    /// Time from the start of the first operation to the start of detection.
    pub fn total_duration(&self) -> f64 {
        self.operations.iter().map(Operation::duration).sum()
    }

    /// Check that the sequence can be simulated, returning its detection
    /// parameters.
    pub fn validate(&self) -> Result<&DetectionParams> {
        let detection
            = self.detection.as_ref()
            .ok_or_else(|| Error::MissingDetection(self.name.clone()))?;
        self.operations.iter().enumerate()
            .try_for_each(|(k, op)| op.validate(k))?;
        detection.validate()?;
        Ok(detection)
    }

    /// Validate, then generate and cache every pulse shape.
    pub fn prepare(&self) -> Result<()> {
        self.validate()?;
        for (k, op) in self.operations.iter().enumerate() {
            if let Operation::ShapedPulse(p) = op {
                let samples = p.pulse_shape()?;
                if samples.area() <= self.thresholds.amplitude_integral {
                    warn!(
                        sequence = %self.name,
                        operation = k,
                        family = p.shape().family(),
                        "pulse envelope has no area; it will not rotate the spin"
                    );
                }
                if !p.shape().is_deterministic() {
                    debug!(
                        sequence = %self.name,
                        operation = k,
                        "unseeded noisy pulse; samples drawn once for all trajectories"
                    );
                }
            }
        }
        debug!(
            sequence = %self.name,
            operations = self.operations.len(),
            duration = self.total_duration(),
            "prepared sequence"
        );
        Ok(())
    }

    /// Apply every operation, in order, to `rho`.
    pub fn evolve(&self, rho: &DensityMatrix, detuning: f64)
        -> Result<DensityMatrix>
    {
        let mut state = rho.clone();
        for (k, op) in self.operations.iter().enumerate() {
            trace!(operation = k, kind = op.kind(), detuning, "execute");
            state = op.execute(&state, detuning, &self.thresholds)?;
        }
        Ok(state)
    }

    /// Simulate one spin at the given detuning and record its detected
    /// signals.
    ///
    /// The spin starts in `initial`, or in thermal equilibrium if `None`.
    pub fn simulate_single(
        &self,
        detuning: f64,
        initial: Option<&DensityMatrix>,
    ) -> Result<Signals>
    {
        let detection = self.validate()?;
        let rho0
            = match initial {
                Some(rho) => { spin::check_shape(rho)?; rho.clone() },
                None => spin::equilibrium(),
            };
        let mut rho = self.evolve(&rho0, detuning)?;

        let n = detection.n_points;
        let step
            = ((detuning * detection.time_step).abs() > self.thresholds.rotation)
            .then(|| delay_propagator(detection.time_step, detuning));
        let mut signals: Signals
            = detection.observables.iter()
            .map(|obs| (*obs, Signal::zeros(*obs, n)))
            .collect();
        for k in 0..n {
            for (obs, signal) in signals.iter_mut() {
                signal.set(k, obs.measure(&rho));
            }
            if let Some(U) = step.as_ref() {
                if k + 1 < n { rho = transform(U, &rho); }
            }
        }
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_PI_2, PI };
    use crate::spin::from_bloch;
    use super::*;

    fn detection() -> DetectionParams {
        DetectionParams::new(0.05, 40, [Observable::Sx, Observable::Sy])
    }

    #[test]
    fn builder_appends_in_order() {
        let seq = Sequence::new("test")
            .add_shaped_pulse(PulseParams::new(FRAC_PI_2, 1.0, Shape::default()))
            .add_delay(2.5)
            .add_hard_pulse(HardPulseParams::new(PI).with_phase(0.3))
            .set_detection(detection());
        assert_eq!(seq.name(), "test");
        let kinds: Vec<&str>
            = seq.operations().iter().map(Operation::kind).collect();
        assert_eq!(kinds, ["shaped_pulse", "delay", "hard_pulse"]);
        assert!((seq.total_duration() - 3.5).abs() < 1e-15);
        assert!(seq.validate().is_ok());
    }

    #[test]
    fn missing_detection() {
        let seq = Sequence::new("nodet").add_delay(1.0);
        assert!(matches!(seq.validate(), Err(Error::MissingDetection(n)) if n == "nodet"));
        assert!(matches!(
            seq.simulate_single(0.0, None),
            Err(Error::MissingDetection(_)),
        ));
    }

    #[test]
    fn invalid_parameters_are_named() {
        let name_of = |seq: Sequence| match seq.validate() {
            Err(Error::InvalidParameter { name, .. }) => name,
            other => panic!("unexpected result {:?}", other),
        };
        let base = || Sequence::new("bad").add_delay(1.0);

        let seq = base()
            .add_shaped_pulse(PulseParams::new(PI, 0.0, Shape::default()))
            .set_detection(detection());
        assert_eq!(name_of(seq), "operations[1].duration");

        let seq = base().add_delay(-0.1).set_detection(detection());
        assert_eq!(name_of(seq), "operations[1].duration");

        let seq = base()
            .add_shaped_pulse(
                PulseParams::new(PI, 1.0, Shape::default()).with_time_slices(1))
            .set_detection(detection());
        assert_eq!(name_of(seq), "operations[1].n_time_slices");

        let seq = base().set_detection(DetectionParams::new(0.0, 10, []));
        assert_eq!(name_of(seq), "detection.time_step");

        let seq = base().set_detection(DetectionParams::new(0.1, 0, []));
        assert_eq!(name_of(seq), "detection.n_points");

        let mut det = DetectionParams::new(0.1, 10, [Observable::Sz]);
        det.observables.clear();
        let seq = base().set_detection(det);
        assert_eq!(name_of(seq), "detection.observables");
    }

    #[test]
    fn detection_observables() {
        let det = DetectionParams::new(0.1, 5, []);
        assert_eq!(det.observables, [Observable::Sx, Observable::Sy]);
        let det = DetectionParams::from_names(0.1, 5, &["sz", "s+", "sz", "sx"])
            .unwrap();
        assert_eq!(
            det.observables,
            [Observable::Sz, Observable::SPlus, Observable::Sx],
        );
        assert!(matches!(
            DetectionParams::from_names(0.1, 5, &["sq"]),
            Err(Error::UnknownObservable(_)),
        ));
        let t = det.time_axis();
        assert_eq!(t.len(), 5);
        assert!((t[4] - 0.4).abs() < 1e-15);
        assert!((det.duration() - 0.4).abs() < 1e-15);
    }

    #[test]
    fn empty_sequence_detects_equilibrium() {
        let seq = Sequence::new("idle")
            .set_detection(DetectionParams::new(0.1, 10, Observable::ALL));
        let signals = seq.simulate_single(3.0, None).unwrap();
        let keys: Vec<Observable> = signals.keys().copied().collect();
        assert_eq!(keys, Observable::ALL);
        let sz = signals[&Observable::Sz].as_real().unwrap();
        assert!(sz.iter().all(|z| (z - 0.5).abs() < 1e-14));
        let sx = signals[&Observable::Sx].as_real().unwrap();
        assert!(sx.iter().all(|x| x.abs() < 1e-14));
        assert!(signals[&Observable::SPlus].is_complex());
    }

    #[test]
    fn free_induction_decay_precesses() {
        let detuning = 2.0;
        let det = DetectionParams::new(
            0.05, 100, [Observable::Sx, Observable::Sy, Observable::SPlus]);
        let t = det.time_axis();
        let seq = Sequence::new("fid")
            .add_hard_pulse(HardPulseParams::new(FRAC_PI_2))
            .set_detection(det);
        let signals = seq.simulate_single(detuning, None).unwrap();
        let sx = signals[&Observable::Sx].as_real().unwrap();
        let sy = signals[&Observable::Sy].as_real().unwrap();
        let sp = signals[&Observable::SPlus].as_complex().unwrap();
        for k in 0..t.len() {
            let (s, c) = (detuning * t[k]).sin_cos();
            assert!((sx[k] - 0.5 * s).abs() < 1e-12);
            assert!((sy[k] - 0.5 * c).abs() < 1e-12);
            assert!((sp[k] - C64::new(sx[k], sy[k])).norm() < 1e-12);
        }
    }

    #[test]
    fn explicit_initial_state() {
        let seq = Sequence::new("init")
            .set_detection(DetectionParams::new(0.1, 3, [Observable::Sz]));
        let down = from_bloch(0.0, 0.0, -1.0);
        let signals = seq.simulate_single(0.0, Some(&down)).unwrap();
        let sz = signals[&Observable::Sz].as_real().unwrap();
        assert!(sz.iter().all(|z| (z + 0.5).abs() < 1e-15));
        let bad = nd::Array2::<C64>::zeros((3, 3));
        assert!(matches!(
            seq.simulate_single(0.0, Some(&bad)),
            Err(Error::InvalidParameter { .. }),
        ));
    }

    #[test]
    fn hard_pulse_amplitude_scales_angle() {
        let th = Thresholds::default();
        let half = Operation::HardPulse(HardPulseParams::new(PI).with_amplitude(0.5));
        let quarter = Operation::HardPulse(HardPulseParams::new(FRAC_PI_2));
        let rho = spin::equilibrium();
        let a = half.execute(&rho, 4.0, &th).unwrap();
        let b = quarter.execute(&rho, -4.0, &th).unwrap();
        assert!(crate::utils::all_close(&a, &b, 1e-15));
        assert_eq!(half.duration(), 0.0);
    }

    #[test]
    fn pulse_shapes_are_cached() {
        let pulse = PulseParams::new(PI, 1.0, Shape::default()).with_time_slices(64);
        let seq = Sequence::new("cache")
            .add_shaped_pulse(pulse)
            .set_detection(detection());
        seq.prepare().unwrap();
        let Operation::ShapedPulse(p) = &seq.operations()[0] else {
            panic!("expected a shaped pulse");
        };
        let first = p.pulse_shape().unwrap() as *const PulseShape;
        let second = p.pulse_shape().unwrap() as *const PulseShape;
        assert_eq!(first, second);
        assert_eq!(p.pulse_shape().unwrap().len(), 64);
    }

    #[test]
    fn named_pulse_parameters() {
        let params: ShapeParams
            = toml::from_str("freq_start = -3\nfreq_end = 3\nwurst_n = 10")
            .unwrap();
        let p = PulseParams::from_named(PI, 2.0, "wurst", &params).unwrap()
            .with_phase_offset(0.5)
            .with_quadrature(0.0, 2.0);
        assert_eq!(p.shape(), &Shape::wurst(-3.0, 3.0, 10.0));
        assert_eq!(p.quadrature(), (0.0, 2.0));
        assert_eq!(p.drive().phase_offset, 0.5);
        assert!(matches!(
            PulseParams::from_named(PI, 1.0, "triangle", &ShapeParams::new()),
            Err(Error::UnknownShape(_)),
        ));
    }

    #[test]
    fn signal_accumulation() {
        let mut acc = Signal::zeros(Observable::Sx, 3);
        acc.scaled_add(0.5, &Signal::Real(nd::array![1.0, 2.0, 3.0])).unwrap();
        acc.scaled_add(0.25, &Signal::Real(nd::array![4.0, 4.0, 4.0])).unwrap();
        assert_eq!(acc, Signal::Real(nd::array![1.5, 2.0, 2.5]));
        assert!(acc.scaled_add(1.0, &Signal::zeros(Observable::SPlus, 3)).is_err());
        assert!(acc.scaled_add(1.0, &Signal::zeros(Observable::Sx, 4)).is_err());
    }
}
