//! Sample one pulse of every shape family and write each to
//! `output/pulse_shape_<family>.npz`.

use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{ EnvFilter, fmt, prelude::* };
use pulse_echo::{
    mkdir,
    write_npz,
    shape::{ Envelope, Shape, generate },
};

const DURATION: f64 = 2.0;
const POINTS: usize = 201;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true))
        .init();

    let outdir = PathBuf::from("output");
    mkdir!(outdir);

    let shapes: Vec<Shape> = vec![
        Shape::gaussian(4.0),
        Shape::square(0.1),
        Shape::sech(5.0),
        Shape::wurst(-5.0, 5.0, 40.0),
        Shape::chirp(-5.0, 5.0, Envelope::Gaussian { sigma_factor: 4.0 }),
        Shape::Noisy {
            base: Envelope::Gaussian { sigma_factor: 4.0 },
            amp_noise: 0.1,
            phase_noise: 0.1,
            freq_noise: 0.0,
            seed: Some(10546),
        },
    ];
    for shape in shapes.iter() {
        let pulse = generate(DURATION, POINTS, shape)?;
        info!(
            family = shape.family(),
            area = pulse.area(),
            peak = pulse.amplitude().fold(0.0, |acc: f64, a| acc.max(*a)),
            "generated pulse"
        );
        write_npz!(
            outdir.join(format!("pulse_shape_{}.npz", shape.family())),
            arrays: {
                "time" => pulse.time(),
                "amplitude" => pulse.amplitude(),
                "phase" => pulse.phase(),
                "frequency" => pulse.frequency(),
            }
        );
    }
    Ok(())
}
