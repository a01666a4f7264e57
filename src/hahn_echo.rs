//! Simulate an inhomogeneously broadened Hahn echo and write the detected
//! signals to `output/hahn_echo.npz`.
//!
//! Usage: `hahn_echo [CONFIG]`. If the configuration describes a
//! `[sequence]`, that sequence is simulated instead of the built-in echo.

use std::{ fs::File, path::PathBuf };
use anyhow::Context;
use ndarray as nd;
use ndarray_npy::NpzWriter;
use tracing::info;
use tracing_subscriber::{ fmt, prelude::* };
use pulse_echo::{
    mkdir,
    config::SimConfig,
    evolution::Observable,
    presets,
    sequence::{ DetectionParams, Sequence, Signal },
    shape::Shape,
};

const TAU: f64 = 5.0;
const PULSE_DURATION: f64 = 1.0;

fn default_sequence(config: &SimConfig) -> Sequence {
    presets::hahn_echo_refocused(TAU, PULSE_DURATION, Shape::gaussian(3.0))
        .with_thresholds(config.thresholds)
        .set_detection(DetectionParams::new(
            0.01, 1000, [Observable::Sx, Observable::Sy, Observable::Sz]))
}

// file-safe array key
fn key(obs: Observable) -> &'static str {
    match obs {
        Observable::Sx => "sx",
        Observable::Sy => "sy",
        Observable::Sz => "sz",
        Observable::SPlus => "splus",
        Observable::SMinus => "sminus",
    }
}

fn main() -> anyhow::Result<()> {
    let config_path: Option<PathBuf> = std::env::args_os().nth(1).map(PathBuf::from);
    let config = SimConfig::load(config_path.as_deref())
        .context("failed to load configuration")?;
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt::layer().with_target(true))
        .init();
    config.validate().context("invalid configuration")?;

    let sequence
        = match config.build_sequence()? {
            Some(seq) => seq,
            None => default_sequence(&config),
        };
    let params = config.ensemble_params()?;
    let simulator = config.simulator()?;
    info!(
        sequence = sequence.name(),
        operations = sequence.operations().len(),
        samples = params.detuning_points,
        linewidth = params.linewidth,
        line_shape = %params.line_shape,
        workers = simulator.num_threads(),
        "starting simulation"
    );
    let signals = simulator.simulate_sequence(&sequence, &params)?;

    let detection = sequence.validate()?;
    let time: nd::Array1<f64> = detection.time_axis();
    let transverse: Option<nd::Array1<f64>>
        = match (signals.get(&Observable::Sx), signals.get(&Observable::Sy)) {
            (Some(Signal::Real(sx)), Some(Signal::Real(sy))) => {
                Some(sx.iter().zip(sy).map(|(x, y)| x.hypot(*y)).collect())
            },
            _ => signals.get(&Observable::SPlus).map(Signal::abs),
        };
    if let Some(mag) = transverse.as_ref() {
        let (kmax, peak)
            = mag.iter().enumerate()
            .fold((0, f64::NEG_INFINITY), |(kmax, amax), (k, ak)| {
                if *ak > amax { (k, *ak) } else { (kmax, amax) }
            });
        info!(peak, time = time[kmax], "transverse magnetization maximum");
    }

    let outdir = PathBuf::from("output");
    mkdir!(outdir);
    let outfile = outdir.join("hahn_echo.npz");
    let mut npz = NpzWriter::new(File::create(&outfile)?);
    npz.add_array("time", &time)?;
    for (obs, signal) in signals.iter() {
        match signal {
            Signal::Real(a) => { npz.add_array(key(*obs), a)?; },
            Signal::Complex(a) => {
                npz.add_array(format!("{}_re", key(*obs)), &a.mapv(|z| z.re))?;
                npz.add_array(format!("{}_im", key(*obs)), &a.mapv(|z| z.im))?;
            },
        }
    }
    if let Some(mag) = transverse.as_ref() {
        npz.add_array("transverse", mag)?;
    }
    npz.finish()?;
    info!(path = %outfile.display(), "wrote signals");
    Ok(())
}
