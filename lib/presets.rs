//! Ready-made sequences for common echo experiments.
//!
//! Each preset comes with a detection window of [`DETECTION_POINTS`] points
//! spaced by [`DETECTION_DT`]; replace it with [`Sequence::set_detection`] as
//! needed.

use std::f64::consts::{ FRAC_PI_2, PI };
use crate::{
    evolution::Observable,
    sequence::{ DetectionParams, HardPulseParams, PulseParams, Sequence },
    shape::Shape,
};

/// Default detection time step.
pub const DETECTION_DT: f64 = 0.01;

/// Default number of detection points.
pub const DETECTION_POINTS: usize = 800;

fn default_detection() -> DetectionParams {
    DetectionParams::new(
        DETECTION_DT, DETECTION_POINTS, [Observable::Sx, Observable::Sy])
}

/// Two-pulse Hahn echo, `π/2 - τ - π - detect`, with both pulses of the same
/// shape and duration.
///
/// For spins dephased by a static detuning, the echo forms at a time `τ`
/// after the end of the π pulse, up to corrections of order the pulse
/// duration.
pub fn hahn_echo(tau: f64, pulse_duration: f64, shape: Shape) -> Sequence {
    Sequence::new("Hahn Echo")
        .add_shaped_pulse(PulseParams::new(FRAC_PI_2, pulse_duration, shape.clone()))
        .add_delay(tau)
        .add_shaped_pulse(PulseParams::new(PI, pulse_duration, shape))
        .set_detection(default_detection())
}

/// Hahn echo with the refocusing delay, `π/2 - τ - π - τ - detect`.
///
/// Detection starts at the nominal echo time `2τ` after the end of the π/2
/// pulse. With shaped pulses the echo peak sits about half a pulse duration
/// into the window.
pub fn hahn_echo_refocused(tau: f64, pulse_duration: f64, shape: Shape)
    -> Sequence
{
    hahn_echo(tau, pulse_duration, shape).add_delay(tau)
}

/// Hahn echo built from instantaneous pulses, with the given phases for the
/// π/2 and π pulses. The echo forms exactly `τ` after the π pulse.
pub fn hard_hahn_echo(tau: f64, phase_90: f64, phase_180: f64) -> Sequence {
    Sequence::new("Hahn Echo")
        .add_hard_pulse(HardPulseParams::new(FRAC_PI_2).with_phase(phase_90))
        .add_delay(tau)
        .add_hard_pulse(HardPulseParams::new(PI).with_phase(phase_180))
        .set_detection(default_detection())
}

/// Broadband Hahn echo with WURST pulses sweeping from `freq_start` to
/// `freq_end`.
pub fn wurst_echo(
    tau: f64,
    pulse_duration: f64,
    freq_start: f64,
    freq_end: f64,
    wurst_n: f64,
) -> Sequence
{
    let shape = Shape::wurst(freq_start, freq_end, wurst_n);
    Sequence::new("WURST Echo")
        .add_shaped_pulse(PulseParams::new(FRAC_PI_2, pulse_duration, shape.clone()))
        .add_delay(tau)
        .add_shaped_pulse(PulseParams::new(PI, pulse_duration, shape))
        .set_detection(default_detection())
}

/// Three-pulse stimulated echo, `π/2 - τ1 - π/2 - τ2 - π/2 - detect`, with
/// instantaneous pulses at the given phases.
pub fn stimulated_echo(tau1: f64, tau2: f64, phases: [f64; 3]) -> Sequence {
    Sequence::new("Stimulated Echo")
        .add_hard_pulse(HardPulseParams::new(FRAC_PI_2).with_phase(phases[0]))
        .add_delay(tau1)
        .add_hard_pulse(HardPulseParams::new(FRAC_PI_2).with_phase(phases[1]))
        .add_delay(tau2)
        .add_hard_pulse(HardPulseParams::new(FRAC_PI_2).with_phase(phases[2]))
        .set_detection(default_detection())
}

/// Inversion recovery, `π - τ - π/2 - detect`, with instantaneous pulses.
///
/// Without relaxation the inverted magnetization never recovers, so the
/// detected signal only probes the quality of the inversion.
pub fn inversion_recovery(tau: f64) -> Sequence {
    Sequence::new("Inversion Recovery")
        .add_hard_pulse(HardPulseParams::new(PI))
        .add_delay(tau)
        .add_hard_pulse(HardPulseParams::new(FRAC_PI_2))
        .set_detection(default_detection())
}

#[cfg(test)]
mod tests {
    use crate::{
        sequence::{ DelayParams, Operation },
        spin::equilibrium,
    };
    use super::*;

    #[test]
    fn hahn_echo_layout() {
        let seq = hahn_echo(5.0, 1.0, Shape::gaussian(3.0));
        assert_eq!(seq.name(), "Hahn Echo");
        let ops = seq.operations();
        assert_eq!(ops.len(), 3);
        match (&ops[0], &ops[1], &ops[2]) {
            (
                Operation::ShapedPulse(p90),
                Operation::Delay(d),
                Operation::ShapedPulse(p180),
            ) => {
                assert_eq!(p90.flip_angle(), FRAC_PI_2);
                assert_eq!(p180.flip_angle(), PI);
                assert_eq!(p90.shape(), &Shape::gaussian(3.0));
                assert_eq!(d.duration, 5.0);
            },
            _ => panic!("unexpected operations {:?}", ops),
        }
        let det = seq.validate().unwrap();
        assert_eq!(det.n_points, DETECTION_POINTS);
        assert_eq!(det.time_step, DETECTION_DT);
    }

    #[test]
    fn refocused_hahn_echo_layout() {
        let seq = hahn_echo_refocused(5.0, 1.0, Shape::gaussian(3.0));
        let ops = seq.operations();
        assert_eq!(ops.len(), 4);
        for k in [1, 3] {
            let Operation::Delay(DelayParams { duration }) = &ops[k] else {
                panic!("expected a delay, got {:?}", ops[k]);
            };
            assert_eq!(*duration, 5.0);
        }
        assert!((seq.total_duration() - 12.0).abs() < 1e-12);
        assert!(seq.validate().is_ok());
    }

    #[test]
    fn hard_hahn_echo_refocuses_exactly() {
        let tau = 2.0;
        let seq = hard_hahn_echo(tau, 0.0, 0.0)
            .set_detection(DetectionParams::new(0.5, 9, [Observable::Sy]));
        // echo lands at the fifth detection point, t = 2
        for detuning in [-3.0, -0.7, 0.0, 1.1, 4.2] {
            let signals = seq.simulate_single(detuning, None).unwrap();
            let sy = signals[&Observable::Sy].as_real().unwrap();
            assert!((sy[4].abs() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn stimulated_and_inversion_layouts() {
        let seq = stimulated_echo(1.0, 4.0, [0.0, FRAC_PI_2, 0.0]);
        assert_eq!(seq.operations().len(), 5);
        assert!((seq.total_duration() - 5.0).abs() < 1e-15);

        let seq = inversion_recovery(3.0);
        let rho = seq.evolve(&equilibrium(), 0.0).unwrap();
        // π then π/2 about x leaves the spin along -y
        let sy = Observable::Sy.measure(&rho).re;
        assert!((sy + 0.5).abs() < 1e-12);
    }

    #[test]
    fn wurst_echo_uses_sweeps() {
        let seq = wurst_echo(10.0, 2.0, -8.0, 8.0, 40.0);
        assert_eq!(seq.name(), "WURST Echo");
        let Operation::ShapedPulse(p) = &seq.operations()[2] else {
            panic!("expected a shaped pulse");
        };
        assert_eq!(p.shape(), &Shape::wurst(-8.0, 8.0, 40.0));
        assert!(seq.prepare().is_ok());
    }
}
