//! Small numerical helpers and output macros.

use ndarray as nd;
use num_complex::Complex64 as C64;

/// Apply the trapezoidal rule to `y` sampled at (possibly nonuniform)
/// coordinates `x`.
///
/// Arrays of unequal length are integrated over their common prefix; fewer
/// than two points integrate to zero.
pub fn trapz(y: &nd::Array1<f64>, x: &nd::Array1<f64>) -> f64 {
    y.iter().zip(y.iter().skip(1))
        .zip(x.iter().zip(x.iter().skip(1)))
        .map(|((yk, ykp1), (xk, xkp1))| (*xkp1 - *xk) * (*yk + *ykp1) / 2.0)
        .sum()
}

/// Conjugate transpose of a 2D array.
pub fn adjoint<S>(A: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array2<C64>
where S: nd::Data<Elem = C64>
{
    A.t().mapv(|a| a.conj())
}

/// Return `true` if every element of `A - B` has modulus at most `tol`.
pub fn all_close<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
    tol: f64,
) -> bool
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.shape() == B.shape()
        && A.iter().zip(B.iter()).all(|(a, b)| (*a - *b).norm() <= tol)
}

/// Create a directory and all its parents, propagating any I/O error with `?`.
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        std::fs::create_dir_all(&$dir)?
    }
}

/// Write a collection of arrays to a single `.npz` file, propagating any error
/// with `?`.
///
/// ```ignore
/// write_npz!(
///     outdir.join("echo.npz"),
///     arrays: {
///         "time" => &time,
///         "sy" => &sy,
///     }
/// );
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $outfile:expr,
        arrays: { $( $key:expr => $arr:expr ),* $(,)? }
    ) => {
        {
            let mut npz
                = ::ndarray_npy::NpzWriter::new(std::fs::File::create($outfile)?);
            $(
                npz.add_array($key, $arr)?;
            )*
            npz.finish()?;
        }
    }
}
