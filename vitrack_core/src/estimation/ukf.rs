// vitrack_core/src/estimation/ukf.rs

//! The unscented correction engine.
//!
//! A correction runs in two phases. [`UnscentedCorrection::begin`] draws
//! sigma points around the current state, pushes them through a measurement
//! model and computes the innovation, gain and proposed tangent-space
//! correction without writing anything. The caller may inspect or gate the
//! result and then either drop it or commit it with
//! [`UnscentedCorrection::finish_correction`] / [`UnscentedCorrection::commit`].
//! Committing consumes the correction, so a result is applied at most once.

use nalgebra::{Cholesky, DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FilterError;
use crate::models::measurement::MeasurementModel;
use crate::state::FilterState;
use crate::utils::validity::{
    is_positive_semidefinite, is_symmetric, matrix_contents_invalid, psd_square_root, symmetrize,
};

/// Relative tolerance on the asymmetry of a measurement covariance.
pub const MEASUREMENT_SYMMETRY_TOLERANCE: f64 = 1.0e-12;

/// Configuration parameters for the UKF's sigma point generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UkfParams {
    pub alpha: f64, // Spreading of sigma points (usually 1e-3)
    pub beta: f64,  // Incorporates prior knowledge of distribution (2.0 is optimal for Gaussian)
    pub kappa: f64, // Secondary scaling parameter (often 0.0 or 3-n)
}

impl Default for UkfParams {
    fn default() -> Self {
        Self {
            alpha: 1.0e-3,
            beta: 2.0,
            kappa: 0.0,
        }
    }
}

impl UkfParams {
    /// `lambda = alpha^2 (n + kappa) - n`
    pub fn lambda(&self, n: usize) -> f64 {
        self.alpha.powi(2) * (n as f64 + self.kappa) - n as f64
    }

    /// The `2n+1` mean and covariance weights for a state of dimension `n`.
    pub fn weights(&self, n: usize) -> Result<SigmaWeights, FilterError> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(FilterError::InvalidParameter {
                name: "alpha",
                reason: format!("must be finite and positive, got {}", self.alpha),
            });
        }
        if !self.beta.is_finite() || !self.kappa.is_finite() {
            return Err(FilterError::InvalidParameter {
                name: "beta",
                reason: "beta and kappa must be finite".to_string(),
            });
        }
        let lambda = self.lambda(n);
        let spread = n as f64 + lambda;
        if !(spread > 0.0) {
            return Err(FilterError::InvalidParameter {
                name: "kappa",
                reason: format!("n + lambda must be positive, got {spread}"),
            });
        }

        let mut mean = DVector::from_element(2 * n + 1, 0.5 / spread);
        let mut covariance = DVector::from_element(2 * n + 1, 0.5 / spread);
        mean[0] = lambda / spread;
        covariance[0] = mean[0] + (1.0 - self.alpha.powi(2) + self.beta);

        Ok(SigmaWeights {
            mean,
            covariance,
            spread,
        })
    }
}

/// Weights for recombining `2n+1` sigma points.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmaWeights {
    /// Weights for calculating the mean from sigma points.
    pub mean: DVector<f64>,
    /// Weights for calculating the covariance from sigma points.
    pub covariance: DVector<f64>,
    /// `n + lambda`, the scale applied to the covariance before factoring.
    pub spread: f64,
}

/// The `2n+1` sigma points of a state.
///
/// Column `i` of `offsets` is the tangent vector that produced `points[i]`
/// from the mean; column 0 is zero and `points[0]` is the mean itself.
#[derive(Debug, Clone)]
pub struct SigmaPointSet<S> {
    pub points: Vec<S>,
    pub offsets: DMatrix<f64>,
    pub weights: SigmaWeights,
}

impl<S: FilterState> SigmaPointSet<S> {
    pub fn generate(state: &S, params: &UkfParams) -> Result<Self, FilterError> {
        let n = state.dim();
        let weights = params.weights(n)?;
        state.check_covariance_shape()?;

        if matrix_contents_invalid(state.covariance()) {
            return Err(FilterError::CovarianceNotPositiveDefinite);
        }

        // Square root: (n + lambda) P = L * L^T. Singular P is allowed.
        let scaled = state.covariance() * weights.spread;
        let l_matrix = psd_square_root(&scaled).ok_or(FilterError::CovarianceNotPositiveDefinite)?;

        let mut offsets = DMatrix::zeros(n, 2 * n + 1);
        for i in 0..n {
            offsets.column_mut(i + 1).copy_from(&l_matrix.column(i));
            offsets.column_mut(i + n + 1).copy_from(&(-l_matrix.column(i)));
        }

        // Perturbations go through the state's own retraction, so rotational
        // components of every sigma point stay valid orientations.
        let points = (0..(2 * n + 1))
            .map(|i| {
                let mut point = state.clone();
                if i > 0 {
                    point.apply_correction(&offsets.column(i).into_owned());
                }
                point
            })
            .collect();

        Ok(Self {
            points,
            offsets,
            weights,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything `begin` computes for a valid correction.
struct Proposal {
    deltaz: DVector<f64>,
    innovation_covariance: DMatrix<f64>,
    kalman_gain: DMatrix<f64>,
    state_correction: DVector<f64>,
    mahalanobis_squared: f64,
}

/// A proposed measurement update, not yet applied.
///
/// Holds the state it was computed from by exclusive borrow, so nothing else
/// can alter the state between the two phases.
#[derive(Debug)]
pub struct UnscentedCorrection<'a, S: FilterState> {
    state: &'a mut S,
    deltaz: DVector<f64>,
    state_correction: DVector<f64>,
    state_correction_finite: bool,
    innovation_covariance: DMatrix<f64>,
    kalman_gain: DMatrix<f64>,
    mahalanobis_squared: f64,
    rejection: Option<FilterError>,
}

impl<'a, S: FilterState> UnscentedCorrection<'a, S> {
    /// Computes the correction of `state` by `model`. Never writes to `state`.
    ///
    /// Failures (a measurement covariance that is not positive definite, a
    /// degenerate innovation covariance, non-finite arithmetic) do not error
    /// here: they come back as a correction with `state_correction_finite()`
    /// false and the reason in `rejection()`.
    pub fn begin<M>(state: &'a mut S, model: &M, params: &UkfParams) -> Self
    where
        M: MeasurementModel<S>,
    {
        let n = state.dim();
        let m = model.dim();
        match propose(&*state, model, params) {
            Ok(proposal) => {
                let state_correction_finite = !matrix_contents_invalid(&proposal.state_correction);
                let rejection = if state_correction_finite {
                    None
                } else {
                    Some(FilterError::NonFiniteCorrection)
                };
                Self {
                    state,
                    deltaz: proposal.deltaz,
                    state_correction: proposal.state_correction,
                    state_correction_finite,
                    innovation_covariance: proposal.innovation_covariance,
                    kalman_gain: proposal.kalman_gain,
                    mahalanobis_squared: proposal.mahalanobis_squared,
                    rejection,
                }
            }
            Err(err) => {
                debug!(reason = %err, "unscented correction could not be computed");
                Self {
                    state,
                    deltaz: DVector::from_element(m, f64::NAN),
                    state_correction: DVector::from_element(n, f64::NAN),
                    state_correction_finite: false,
                    innovation_covariance: DMatrix::from_element(m, m, f64::NAN),
                    kalman_gain: DMatrix::from_element(n, m, f64::NAN),
                    mahalanobis_squared: f64::NAN,
                    rejection: Some(err),
                }
            }
        }
    }

    /// The innovation: measured minus predicted, in the measurement tangent space.
    pub fn deltaz(&self) -> &DVector<f64> {
        &self.deltaz
    }

    /// The proposed tangent-space correction `K * deltaz`.
    pub fn state_correction(&self) -> &DVector<f64> {
        &self.state_correction
    }

    pub fn state_correction_finite(&self) -> bool {
        self.state_correction_finite
    }

    /// Why this correction cannot be committed, if it cannot.
    pub fn rejection(&self) -> Option<&FilterError> {
        self.rejection.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// `S`, including the measurement noise.
    pub fn innovation_covariance(&self) -> &DMatrix<f64> {
        &self.innovation_covariance
    }

    pub fn kalman_gain(&self) -> &DMatrix<f64> {
        &self.kalman_gain
    }

    /// `deltaz^T S^-1 deltaz`, for outlier gating.
    pub fn mahalanobis_squared(&self) -> f64 {
        self.mahalanobis_squared
    }

    /// The state this correction would be applied to.
    pub fn state(&self) -> &S {
        self.state
    }

    /// Applies the correction and the covariance update `P - K S K^T`.
    ///
    /// The state is only written when the corrected mean is finite and the new
    /// covariance is symmetric positive semi-definite; otherwise it keeps its
    /// previous value and the reason is returned.
    pub fn commit(self) -> Result<(), FilterError> {
        let Self {
            state,
            state_correction,
            innovation_covariance,
            kalman_gain,
            rejection,
            ..
        } = self;
        if let Some(err) = rejection {
            warn!(reason = %err, "refusing to commit an invalid correction");
            return Err(err);
        }

        let mut corrected = state.clone();
        corrected.apply_correction(&state_correction);
        if corrected.state_contents_invalid() {
            warn!("corrected state is not finite; keeping the prior state");
            return Err(FilterError::NonFiniteCorrection);
        }

        let mut covariance =
            state.covariance() - &kalman_gain * &innovation_covariance * kalman_gain.transpose();
        symmetrize(&mut covariance);
        if !is_positive_semidefinite(&covariance) {
            warn!("corrected covariance is not positive semi-definite; keeping the prior state");
            return Err(FilterError::InvalidCommittedCovariance);
        }

        corrected.set_covariance(covariance);
        *state = corrected;
        debug!(correction_norm = state_correction.norm(), "committed unscented correction");
        Ok(())
    }

    /// [`commit`](Self::commit), reporting only success.
    pub fn finish_correction(self) -> bool {
        self.commit().is_ok()
    }
}

fn propose<S, M>(state: &S, model: &M, params: &UkfParams) -> Result<Proposal, FilterError>
where
    S: FilterState,
    M: MeasurementModel<S>,
{
    let n = state.dim();
    let m = model.dim();

    // --- 1. Validate the measurement noise ---
    let r = model.covariance(state);
    if r.shape() != (m, m) {
        return Err(FilterError::DimensionMismatch {
            expected: m,
            actual: r.nrows(),
        });
    }
    if matrix_contents_invalid(&r)
        || !is_symmetric(&r, MEASUREMENT_SYMMETRY_TOLERANCE)
        || Cholesky::new(r.clone()).is_none()
    {
        return Err(FilterError::MeasurementCovarianceNotPositiveDefinite);
    }

    // --- 2. Generate sigma points around the current state ---
    let sigma = SigmaPointSet::generate(state, params)?;
    let weights = &sigma.weights;

    // --- 3. Propagate every point through the measurement model ---
    let predictions: Vec<M::Value> = sigma.points.iter().map(|p| model.predict(p)).collect();

    // The spread is measured in a chart centered on the mean point's
    // prediction, where `⊖` is well conditioned.
    let center = &predictions[0];
    let mut spread = DMatrix::zeros(m, sigma.len());
    for (i, z) in predictions.iter().enumerate() {
        let delta = model.difference(z, center);
        if delta.len() != m {
            return Err(FilterError::DimensionMismatch {
                expected: m,
                actual: delta.len(),
            });
        }
        spread.column_mut(i).copy_from(&delta);
    }
    let mean_delta = &spread * &weights.mean;

    // --- 4. Innovation covariance S and cross-covariance C ---
    let mut s_cov = r;
    let mut c_cov = DMatrix::zeros(n, m);
    for i in 0..sigma.len() {
        let diff_z = spread.column(i) - &mean_delta;
        s_cov += weights.covariance[i] * &diff_z * diff_z.transpose();
        c_cov += weights.covariance[i] * sigma.offsets.column(i) * diff_z.transpose();
    }
    symmetrize(&mut s_cov);
    if matrix_contents_invalid(&s_cov) || matrix_contents_invalid(&c_cov) {
        return Err(FilterError::NonFiniteCorrection);
    }

    // --- 5. Kalman gain K = C S^-1, via K^T = S^-1 C^T ---
    let s_chol = Cholesky::new(s_cov.clone()).ok_or(FilterError::InnovationCovarianceSingular)?;
    let kalman_gain = s_chol.solve(&c_cov.transpose()).transpose();

    // --- 6. Innovation and proposed correction ---
    let deltaz = model.residual(center) - &mean_delta;
    let state_correction = &kalman_gain * &deltaz;
    let mahalanobis_squared = deltaz.dot(&s_chol.solve(&deltaz));

    Ok(Proposal {
        deltaz,
        innovation_covariance: s_cov,
        kalman_gain,
        state_correction,
        mahalanobis_squared,
    })
}
