//! Inhomogeneously broadened ensembles.
//!
//! An ensemble is simulated by running one independent trajectory per
//! detuning sample, optionally on a dedicated worker pool, and summing the
//! detected signals with the line-shape weights. Trajectories are collected in
//! sample order and reduced sequentially, so the result does not depend on the
//! number of workers.

use ndarray as nd;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
    iter::{ IntoParallelIterator, ParallelIterator },
};
use tracing::debug;
use crate::{
    distribution::{ DetuningDistribution, LineShape },
    error::{ Error, Result },
    evolution::Observable,
    sequence::{ Sequence, Signal, Signals },
    spin::DensityMatrix,
};

/// How the detuning distribution is sampled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnsembleParams {
    /// Inclusive `(min, max)` detuning.
    pub detuning_range: (f64, f64),
    pub detuning_points: usize,
    pub linewidth: f64,
    pub line_shape: LineShape,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            detuning_range: (-10.0, 10.0),
            detuning_points: 101,
            linewidth: 2.0,
            line_shape: LineShape::Gaussian,
        }
    }
}

impl EnsembleParams {
    /// Sample the detuning distribution.
    pub fn distribution(&self) -> Result<DetuningDistribution> {
        DetuningDistribution::new(
            self.detuning_range,
            self.detuning_points,
            self.linewidth,
            self.line_shape,
        )
    }
}

/// Runs ensemble simulations, serially or on a fixed-size worker pool.
#[derive(Debug)]
pub struct EnsembleSimulator {
    n_jobs: usize,
    pool: Option<ThreadPool>,
}

impl Default for EnsembleSimulator {
    fn default() -> Self { Self::serial() }
}

impl EnsembleSimulator {
    /// Create a new simulator.
    ///
    /// `n_jobs = 1` runs trajectories on the calling thread, `n_jobs = 0` uses
    /// one worker per available core, and any other value creates a pool of
    /// exactly that many workers.
    pub fn new(n_jobs: usize) -> Result<Self> {
        if n_jobs == 1 { return Ok(Self::serial()); }
        let pool = ThreadPoolBuilder::new().num_threads(n_jobs).build()?;
        Ok(Self { n_jobs, pool: Some(pool) })
    }

    /// Create a simulator that runs everything on the calling thread.
    pub fn serial() -> Self { Self { n_jobs: 1, pool: None } }

    /// Requested number of workers, as passed to [`Self::new`].
    pub fn n_jobs(&self) -> usize { self.n_jobs }

    /// Actual number of workers.
    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }

    /// Simulate `sequence` over the ensemble described by `params`, starting
    /// every spin in thermal equilibrium.
    pub fn simulate_sequence(&self, sequence: &Sequence, params: &EnsembleParams)
        -> Result<Signals>
    {
        let dist = params.distribution()?;
        self.simulate_distribution(sequence, &dist, None)
    }

    /// Simulate `sequence` over explicit detuning samples, starting every spin
    /// in `initial` (or thermal equilibrium if `None`).
    ///
    /// The first failing trajectory aborts the whole simulation.
    pub fn simulate_distribution(
        &self,
        sequence: &Sequence,
        dist: &DetuningDistribution,
        initial: Option<&DensityMatrix>,
    ) -> Result<Signals>
    {
        sequence.prepare()?;
        let detection = sequence.validate()?;
        debug!(
            sequence = sequence.name(),
            samples = dist.len(),
            workers = self.num_threads(),
            detection_points = detection.n_points,
            "simulating ensemble"
        );
        let trajectories = self.run_trajectories(sequence, dist, initial)?;
        let signals
            = aggregate(&trajectories, dist.weights(), &detection.observables)?;
        debug!(sequence = sequence.name(), "ensemble complete");
        Ok(signals)
    }

    fn run_trajectories(
        &self,
        sequence: &Sequence,
        dist: &DetuningDistribution,
        initial: Option<&DensityMatrix>,
    ) -> Result<Vec<Signals>>
    {
        let detunings: Vec<f64> = dist.detunings().to_vec();
        match self.pool.as_ref() {
            None => {
                detunings.into_iter()
                    .map(|d| sequence.simulate_single(d, initial))
                    .collect()
            },
            Some(pool) => pool.install(|| {
                detunings.into_par_iter()
                    .map(|d| sequence.simulate_single(d, initial))
                    .collect()
            }),
        }
    }
}

/// Simulate `sequence` over the ensemble described by `params` on the calling
/// thread.
pub fn simulate_sequence(sequence: &Sequence, params: &EnsembleParams)
    -> Result<Signals>
{
    EnsembleSimulator::default().simulate_sequence(sequence, params)
}

/// Compute the weighted sum `Σ_k w_k s_k` of per-trajectory signals for each
/// of `observables`, accumulating in trajectory order.
pub fn aggregate(
    trajectories: &[Signals],
    weights: &nd::Array1<f64>,
    observables: &[Observable],
) -> Result<Signals>
{
    if trajectories.len() != weights.len() {
        return Err(Error::Weights(format!(
            "{} trajectories but {} weights",
            trajectories.len(), weights.len(),
        )));
    }
    let Some(first) = trajectories.first() else {
        return Err(Error::Weights("no trajectories to aggregate".to_string()));
    };
    let missing = |obs: &Observable| {
        Error::invalid("signals", format!("trajectory has no '{obs}' trace"))
    };
    let mut total = Signals::with_capacity(observables.len());
    for obs in observables.iter() {
        let len = first.get(obs).ok_or_else(|| missing(obs))?.len();
        let mut acc = Signal::zeros(*obs, len);
        for (signals, w) in trajectories.iter().zip(weights) {
            let signal = signals.get(obs).ok_or_else(|| missing(obs))?;
            acc.scaled_add(*w, signal)?;
        }
        total.insert(*obs, acc);
    }
    Ok(total)
}
