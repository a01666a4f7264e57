//! Spin-1/2 operators, density matrices, and single-step evolution operators.
//!
//! All operators are 2x2 complex arrays in the `(|↑⟩, |↓⟩)` basis. The spin
//! operators are half the Pauli matrices, so that `[Sx, Sy] = i Sz` and cyclic
//! permutations hold.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::{ One, Zero };
use crate::{
    error::{ Error, Result },
    utils::adjoint,
};

/// A 2x2 spin-1/2 density matrix.
pub type DensityMatrix = nd::Array2<C64>;

fn mat(a: [[C64; 2]; 2]) -> nd::Array2<C64> {
    nd::array![[a[0][0], a[0][1]], [a[1][0], a[1][1]]]
}

/// The 2x2 identity.
pub fn identity() -> nd::Array2<C64> { nd::Array2::eye(2) }

/// `Sx = σx / 2`.
pub fn sx() -> nd::Array2<C64> {
    let h = C64::from(0.5);
    mat([[C64::zero(), h], [h, C64::zero()]])
}

/// `Sy = σy / 2`.
pub fn sy() -> nd::Array2<C64> {
    let h = C64::new(0.0, 0.5);
    mat([[C64::zero(), -h], [h, C64::zero()]])
}

/// `Sz = σz / 2`.
pub fn sz() -> nd::Array2<C64> {
    let h = C64::from(0.5);
    mat([[h, C64::zero()], [C64::zero(), -h]])
}

/// Raising combination `S+ = Sx + i Sy`.
pub fn splus() -> nd::Array2<C64> { sx() + sy() * C64::i() }

/// Lowering combination `S- = Sx - i Sy`.
pub fn sminus() -> nd::Array2<C64> { sx() - sy() * C64::i() }

/// Thermal-equilibrium state `½ I + Sz`, i.e. full polarization along the
/// quantization axis.
pub fn equilibrium() -> DensityMatrix { identity() * C64::from(0.5) + sz() }

/// Build the density matrix `½ I + x Sx + y Sy + z Sz` from a Bloch vector.
///
/// The result is only positive semidefinite if `x² + y² + z² ≤ 1`.
pub fn from_bloch(x: f64, y: f64, z: f64) -> DensityMatrix {
    identity() * C64::from(0.5) + SpinField::new(x, y, z).to_matrix()
}

/// Check that `rho` has the shape of a spin-1/2 density matrix.
pub fn check_shape(rho: &DensityMatrix) -> Result<()> {
    if rho.shape() != [2, 2] {
        return Err(Error::invalid(
            "initial_state",
            format!("expected a 2x2 matrix, got shape {:?}", rho.shape()),
        ));
    }
    Ok(())
}

/// Compute `tr(rho · op)`.
pub fn expectation(rho: &DensityMatrix, op: &nd::Array2<C64>) -> C64 {
    rho.dot(op).diag().iter().sum()
}

/// Eigenvalues of a 2x2 Hermitian matrix, in ascending order.
///
/// Only the upper triangle and the real parts of the diagonal are read.
pub fn hermitian_eigvals(A: &nd::Array2<C64>) -> (f64, f64) {
    let a = A[[0, 0]].re;
    let d = A[[1, 1]].re;
    let b = A[[0, 1]];
    let mean = (a + d) / 2.0;
    let r = (((a - d) / 2.0).powi(2) + b.norm_sqr()).sqrt();
    (mean - r, mean + r)
}

/// Return `true` if `rho` is Hermitian with unit trace and non-negative
/// eigenvalues, all to within `tol`.
pub fn is_physical(rho: &DensityMatrix, tol: f64) -> bool {
    if rho.shape() != [2, 2] { return false; }
    let hermitian
        = rho.iter().zip(adjoint(rho).iter())
        .all(|(a, b)| (*a - *b).norm() <= tol);
    let trace: C64 = rho.diag().iter().sum();
    let (lmin, _) = hermitian_eigvals(rho);
    hermitian && (trace - C64::one()).norm() <= tol && lmin >= -tol
}

/// Real coefficients of the linear combination `x Sx + y Sy + z Sz`.
///
/// Every Hamiltonian in the rotating frame of a single spin-1/2 is of this
/// form, up to an irrelevant multiple of the identity.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpinField {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpinField {
    /// Create a new `SpinField`.
    pub fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    /// Euclidean length of the coefficient vector.
    pub fn norm(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Largest coefficient modulus.
    pub fn max_abs(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Scale all coefficients by `a`.
    pub fn scaled(self, a: f64) -> Self {
        Self { x: a * self.x, y: a * self.y, z: a * self.z }
    }

    /// Expand into a 2x2 matrix.
    pub fn to_matrix(&self) -> nd::Array2<C64> {
        mat([
            [C64::from(self.z / 2.0), C64::new(self.x, -self.y) / 2.0],
            [C64::new(self.x, self.y) / 2.0, C64::from(-self.z / 2.0)],
        ])
    }
}

/// Compute the evolution operator `U = exp(-i H dt)` for `H = h · S`.
///
/// Uses the closed form for SU(2),
/// ```text
/// exp(-i (dt/2) h·σ) = cos(|h| dt / 2) I - i sin(|h| dt / 2) (h/|h|)·σ
/// ```
/// so the result is unitary to machine precision. A vanishing `h` gives the
/// identity.
pub fn evolution_operator(h: SpinField, dt: f64) -> nd::Array2<C64> {
    let w = h.norm();
    if w == 0.0 { return identity(); }
    let theta = w * dt / 2.0;
    let (s, c) = theta.sin_cos();
    let (nx, ny, nz) = (h.x / w, h.y / w, h.z / w);
    mat([
        [C64::new(c, -s * nz), C64::new(-s * ny, -s * nx)],
        [C64::new(s * ny, -s * nx), C64::new(c, s * nz)],
    ])
}

/// Apply the similarity transform `rho -> U† rho U`.
pub fn transform(U: &nd::Array2<C64>, rho: &DensityMatrix) -> DensityMatrix {
    adjoint(U).dot(rho).dot(U)
}
