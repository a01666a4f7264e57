//! Inhomogeneous line shapes sampled on a uniform detuning grid.

use std::{ fmt, str::FromStr };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::error::{ Error, Result };

/// Profile of the static detuning distribution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineShape {
    /// `exp(-(δ/w)²)`
    #[default]
    Gaussian,
    /// `1 / (1 + (δ/w)²)`
    Lorentzian,
    /// `exp(-|δ|/w)`
    Exponential,
    /// Equal weights across the whole range.
    Uniform,
}

impl LineShape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Lorentzian => "lorentzian",
            Self::Exponential => "exponential",
            Self::Uniform => "uniform",
        }
    }

    /// Unnormalized weight at `detuning` for linewidth `width`.
    pub fn weight(&self, detuning: f64, width: f64) -> f64 {
        let x = detuning / width;
        match self {
            Self::Gaussian => (-x.powi(2)).exp(),
            Self::Lorentzian => (1.0 + x.powi(2)).recip(),
            Self::Exponential => (-x.abs()).exp(),
            Self::Uniform => 1.0,
        }
    }
}

impl fmt::Display for LineShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LineShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Self::Gaussian),
            "lorentzian" => Ok(Self::Lorentzian),
            "exponential" => Ok(Self::Exponential),
            "uniform" => Ok(Self::Uniform),
            _ => Err(Error::UnknownLineShape(s.to_string())),
        }
    }
}

/// Detuning samples with normalized, non-negative weights.
#[derive(Clone, Debug, PartialEq)]
pub struct DetuningDistribution {
    detunings: nd::Array1<f64>,
    weights: nd::Array1<f64>,
}

impl DetuningDistribution {
    /// Sample `line_shape` at `n_points` evenly spaced detunings covering
    /// `range` (inclusive).
    ///
    /// A single point sits at the lower end of the range.
    pub fn new(
        range: (f64, f64),
        n_points: usize,
        linewidth: f64,
        line_shape: LineShape,
    ) -> Result<Self>
    {
        let (lo, hi) = range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(Error::invalid(
                "detuning_range",
                format!("expected finite min <= max, got ({lo}, {hi})"),
            ));
        }
        if n_points < 1 {
            return Err(Error::invalid(
                "detuning_points", "need at least 1 point"));
        }
        if !(linewidth > 0.0) || !linewidth.is_finite() {
            return Err(Error::invalid(
                "linewidth",
                format!("must be positive, got {linewidth}"),
            ));
        }
        let detunings: nd::Array1<f64> = nd::Array1::linspace(lo, hi, n_points);
        let weights = detunings.mapv(|d| line_shape.weight(d, linewidth));
        Self::from_weights(detunings, weights)
    }

    /// A single detuning with unit weight.
    pub fn single(detuning: f64) -> Self {
        Self {
            detunings: nd::array![detuning],
            weights: nd::array![1.0],
        }
    }

    /// Normalize arbitrary non-negative weights to unit sum.
    pub fn from_weights(detunings: nd::Array1<f64>, weights: nd::Array1<f64>)
        -> Result<Self>
    {
        if detunings.len() != weights.len() {
            return Err(Error::Weights(format!(
                "{} detunings but {} weights",
                detunings.len(), weights.len(),
            )));
        }
        if weights.iter().any(|w| !(*w >= 0.0) || !w.is_finite()) {
            return Err(Error::Weights(
                "weights must be finite and non-negative".to_string()));
        }
        let total = weights.sum();
        if !(total > 0.0) {
            return Err(Error::Weights(format!("weights sum to {total}")));
        }
        Ok(Self { detunings, weights: weights / total })
    }

    pub fn len(&self) -> usize { self.detunings.len() }

    pub fn is_empty(&self) -> bool { self.detunings.is_empty() }

    pub fn detunings(&self) -> &nd::Array1<f64> { &self.detunings }

    pub fn weights(&self) -> &nd::Array1<f64> { &self.weights }

    /// Iterate over `(detuning, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.detunings.iter().copied().zip(self.weights.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: [LineShape; 4] = [
        LineShape::Gaussian,
        LineShape::Lorentzian,
        LineShape::Exponential,
        LineShape::Uniform,
    ];

    #[test]
    fn weights_are_normalized() {
        for shape in SHAPES {
            for n in [1, 2, 51, 101] {
                let dist
                    = DetuningDistribution::new((-10.0, 10.0), n, 2.0, shape)
                    .unwrap();
                assert_eq!(dist.len(), n);
                assert!((dist.weights().sum() - 1.0).abs() < 1e-9);
                assert!(dist.weights().iter().all(|w| *w >= 0.0));
            }
        }
    }

    #[test]
    fn profiles() {
        let dist = DetuningDistribution::new(
            (-10.0, 10.0), 101, 2.0, LineShape::Gaussian).unwrap();
        assert_eq!(dist.detunings()[50], 0.0);
        let w = dist.weights();
        assert!(w.iter().all(|wk| *wk <= w[50]));
        assert!((w[60] / w[50] - (-1.0_f64).exp()).abs() < 1e-12);
        for k in 0..101 {
            assert!((w[k] - w[100 - k]).abs() < 1e-15);
        }

        assert!((LineShape::Lorentzian.weight(2.0, 2.0) - 0.5).abs() < 1e-15);
        assert!(
            (LineShape::Exponential.weight(-4.0, 2.0) - (-2.0_f64).exp()).abs()
                < 1e-15
        );

        let dist = DetuningDistribution::new(
            (-1.0, 1.0), 4, 0.1, LineShape::Uniform).unwrap();
        assert!(dist.weights().iter().all(|wk| (*wk - 0.25).abs() < 1e-15));
    }

    #[test]
    fn single_sample() {
        let dist = DetuningDistribution::new(
            (0.5, 3.0), 1, 1.0, LineShape::Lorentzian).unwrap();
        assert_eq!(dist.iter().collect::<Vec<_>>(), vec![(0.5, 1.0)]);
        assert_eq!(DetuningDistribution::single(0.5), dist);
    }

    #[test]
    fn parse_names() {
        for shape in SHAPES {
            assert_eq!(shape.name().parse::<LineShape>().unwrap(), shape);
            assert_eq!(shape.to_string(), shape.name());
        }
        assert_eq!(LineShape::default(), LineShape::Gaussian);
        assert!(matches!(
            "voigt".parse::<LineShape>(),
            Err(Error::UnknownLineShape(s)) if s == "voigt",
        ));
    }

    #[test]
    fn invalid_inputs() {
        let g = LineShape::Gaussian;
        assert!(DetuningDistribution::new((1.0, -1.0), 11, 1.0, g).is_err());
        assert!(DetuningDistribution::new((-1.0, 1.0), 0, 1.0, g).is_err());
        assert!(DetuningDistribution::new((-1.0, 1.0), 11, 0.0, g).is_err());
        assert!(DetuningDistribution::new((-1.0, 1.0), 11, -2.0, g).is_err());
        // far tails underflow to zero weight everywhere
        assert!(matches!(
            DetuningDistribution::new((1e3, 2e3), 11, 1.0, g),
            Err(Error::Weights(_)),
        ));
        assert!(matches!(
            DetuningDistribution::from_weights(
                nd::array![0.0, 1.0], nd::array![1.0, -0.5]),
            Err(Error::Weights(_)),
        ));
        assert!(matches!(
            DetuningDistribution::from_weights(
                nd::array![0.0, 1.0], nd::array![1.0]),
            Err(Error::Weights(_)),
        ));
    }
}
