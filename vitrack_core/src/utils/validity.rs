// vitrack_core/src/utils/validity.rs

//! Numerical sanity checks shared by the state, the models and the UKF engine.

use nalgebra::storage::RawStorage;
use nalgebra::{Cholesky, DMatrix, Dim, Matrix, SymmetricEigen};

/// Relative tolerance for treating a tiny negative eigenvalue as zero.
pub const PSD_EIGEN_TOLERANCE: f64 = 1.0e-9;

/// True if any entry is NaN or infinite.
pub fn matrix_contents_invalid<R, C, S>(m: &Matrix<f64, R, C, S>) -> bool
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    m.iter().any(|v| !v.is_finite())
}

/// In-place `(P + Pᵀ) / 2`.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    let sym = (&*m + m.transpose()) * 0.5;
    *m = sym;
}

pub fn is_symmetric(m: &DMatrix<f64>, tolerance: f64) -> bool {
    if !m.is_square() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let scale = 1.0_f64.max(m[(i, j)].abs()).max(m[(j, i)].abs());
            if (m[(i, j)] - m[(j, i)]).abs() > tolerance * scale {
                return false;
            }
        }
    }
    true
}

/// Strict positive definiteness, decided by whether a Cholesky factor exists.
///
/// A zero or negative eigenvalue fails the factorization.
pub fn is_positive_definite(m: &DMatrix<f64>) -> bool {
    if !m.is_square() || matrix_contents_invalid(m) {
        return false;
    }
    Cholesky::new(m.clone()).is_some()
}

/// Symmetric positive semi-definiteness with a small relative slack.
///
/// The matrix must be finite, have a non-negative diagonal and a smallest
/// eigenvalue no lower than `-1e-9 * max(1, trace)`.
pub fn is_positive_semidefinite(m: &DMatrix<f64>) -> bool {
    if !m.is_square() || matrix_contents_invalid(m) {
        return false;
    }
    if m.diagonal().iter().any(|&d| d < 0.0) {
        return false;
    }
    let trace = m.trace();
    let floor = -PSD_EIGEN_TOLERANCE * trace.max(1.0);
    let sym = (m + m.transpose()) * 0.5;
    let eigen = SymmetricEigen::new(sym);
    eigen.eigenvalues.iter().all(|&ev| ev >= floor)
}

/// A square root `L` with `L Lᵀ = m`, for any `m` accepted by
/// [`is_positive_semidefinite`].
///
/// The Cholesky factor is used when it exists. A singular matrix falls back to
/// its eigen decomposition, with eigenvalues inside the tolerance clamped to
/// zero.
pub fn psd_square_root(m: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if !m.is_square() || matrix_contents_invalid(m) {
        return None;
    }
    if let Some(cholesky) = Cholesky::new(m.clone()) {
        return Some(cholesky.l());
    }
    if !is_positive_semidefinite(m) {
        return None;
    }

    let eigen = SymmetricEigen::new((m + m.transpose()) * 0.5);
    let mut root = eigen.eigenvectors;
    for (mut column, &value) in root.column_iter_mut().zip(eigen.eigenvalues.iter()) {
        column *= value.max(0.0).sqrt();
    }
    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn finite_matrices_are_valid() {
        let m = DMatrix::<f64>::identity(4, 4) * 3.0;
        assert!(!matrix_contents_invalid(&m));
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(!matrix_contents_invalid(&v));
    }

    #[test]
    fn nan_and_infinity_are_detected() {
        let mut m = DMatrix::<f64>::zeros(3, 3);
        m[(1, 2)] = f64::NAN;
        assert!(matrix_contents_invalid(&m));
        m[(1, 2)] = f64::INFINITY;
        assert!(matrix_contents_invalid(&m));
    }

    #[test]
    fn symmetrize_averages_off_diagonals() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 3.0]);
        assert!(!is_symmetric(&m, 1e-12));
        symmetrize(&mut m);
        assert_eq!(m[(0, 1)], 3.0);
        assert_eq!(m[(1, 0)], 3.0);
        assert!(is_symmetric(&m, 1e-12));
    }

    #[test]
    fn semi_definite_rank_deficient_is_not_definite() {
        let m = DMatrix::from_diagonal(&DVector::from_vec(vec![1e-5, 0.0, 1e-5]));
        assert!(!is_positive_definite(&m));
        assert!(is_positive_semidefinite(&m));
    }

    #[test]
    fn negative_eigenvalue_is_rejected() {
        // Eigenvalues 3 and -1.
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(!is_positive_definite(&m));
        assert!(!is_positive_semidefinite(&m));
    }

    #[test]
    fn square_root_of_a_singular_matrix_reproduces_it() {
        let mut m = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 0.0, 0.5, 0.0]));
        m[(0, 2)] = 1.0;
        m[(2, 0)] = 1.0;
        assert!(!is_positive_definite(&m));

        let root = psd_square_root(&m).unwrap();
        let product = &root * root.transpose();
        for (a, b) in product.iter().zip(m.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn square_root_uses_cholesky_when_definite() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let root = psd_square_root(&m).unwrap();
        assert_eq!(root[(0, 1)], 0.0);
        assert!((root[(0, 0)] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn square_root_refuses_indefinite_matrices() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(psd_square_root(&m).is_none());
        assert!(psd_square_root(&DMatrix::zeros(2, 3)).is_none());
    }

    #[test]
    fn identity_is_positive_definite() {
        let m = DMatrix::<f64>::identity(6, 6);
        assert!(is_positive_definite(&m));
        assert!(is_positive_semidefinite(&m));
    }
}
