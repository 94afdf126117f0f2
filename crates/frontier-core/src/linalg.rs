use nalgebra::{Cholesky, DMatrix, DVector, Dyn, LU};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FrontierError;
use crate::FrontierResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Numerical tolerances for factorization and validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Max |Σ[i][j] - Σ[j][i]|, relative to the largest absolute entry.
    pub symmetry_tolerance: f64,
    /// How negative xᵀΣx may go, relative to |x|² times the largest entry,
    /// before Σ is rejected as not positive semi-definite.
    pub psd_tolerance: f64,
    /// Relative floor on the spread of centered returns and on the
    /// determinant of the reduced constraint system.
    pub degeneracy_tolerance: f64,
    /// Diagonal shift ε, relative to the mean variance, used when a plain
    /// Cholesky factorization fails.
    pub regularization: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            symmetry_tolerance: 1e-8,
            psd_tolerance: 1e-10,
            degeneracy_tolerance: 1e-12,
            regularization: 1e-10,
        }
    }
}

/// Which factorization ended up backing the solves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Factorization {
    Cholesky,
    RegularizedCholesky { epsilon: f64 },
    Lu,
}

/// Reciprocal condition estimate below which a Cholesky factor is not trusted.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

/// Pivot ratio (in units of machine epsilon times n) at or below which the
/// matrix is treated as rank deficient.
const RANK_DEFICIENCY_FACTOR: f64 = 100.0;

enum Factor {
    Cholesky(Cholesky<f64, Dyn>),
    Lu(LU<f64, Dyn, Dyn>),
}

/// A factorized symmetric matrix, reused for any number of right-hand sides.
pub struct SymmetricSolver {
    factor: Factor,
    method: Factorization,
    dim: usize,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build a dense matrix from caller rows, checking it is square.
pub fn matrix_from_rows(rows: &[Vec<f64>], n: usize) -> FrontierResult<DMatrix<f64>> {
    if rows.len() != n {
        return Err(FrontierError::malformed(
            "covariance_matrix",
            format!("expected {} rows but got {}", n, rows.len()),
        ));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n {
            return Err(FrontierError::malformed(
                "covariance_matrix",
                format!("row {} has {} columns, expected {}", i, row.len(), n),
            ));
        }
    }
    Ok(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
}

/// Check Σ is finite, symmetric within tolerance and has non-negative variances.
#[allow(clippy::needless_range_loop)]
pub fn validate_covariance(sigma: &DMatrix<f64>, opts: &SolverOptions) -> FrontierResult<()> {
    let n = sigma.nrows();
    if sigma.ncols() != n {
        return Err(FrontierError::InvalidCovariance(format!(
            "matrix is {}x{}, expected square",
            n,
            sigma.ncols()
        )));
    }
    if let Some(pos) = sigma.iter().position(|v| !v.is_finite()) {
        return Err(FrontierError::InvalidCovariance(format!(
            "non-finite entry at [{},{}]",
            pos % n,
            pos / n
        )));
    }

    let scale = max_abs(sigma);
    let tolerance = opts.symmetry_tolerance * scale.max(f64::MIN_POSITIVE);
    for i in 0..n {
        for j in (i + 1)..n {
            if (sigma[(i, j)] - sigma[(j, i)]).abs() > tolerance {
                return Err(FrontierError::InvalidCovariance(format!(
                    "not symmetric: [{},{}]={} != [{},{}]={}",
                    i,
                    j,
                    sigma[(i, j)],
                    j,
                    i,
                    sigma[(j, i)]
                )));
            }
        }
    }
    for i in 0..n {
        if sigma[(i, i)] < -opts.psd_tolerance * scale {
            return Err(FrontierError::InvalidCovariance(format!(
                "negative variance {} on diagonal [{},{}]",
                sigma[(i, i)],
                i,
                i
            )));
        }
    }
    Ok(())
}

impl SymmetricSolver {
    /// Factor Σ once.
    ///
    /// A successful Cholesky factor is always kept. When its condition
    /// estimate is poor, a rank check on a partially pivoted LU factor
    /// still rejects a numerically rank-deficient Σ with `SingularMatrix`.
    /// Only when Cholesky fails outright is Σ retried as `Σ + εI`, and if
    /// that fails too the LU factor is used.
    pub fn factor(sigma: &DMatrix<f64>, opts: &SolverOptions) -> FrontierResult<Self> {
        let n = sigma.nrows();

        if let Some(chol) = sigma.clone().cholesky() {
            let rcond = cholesky_rcond(&chol);
            if rcond < MIN_RECIPROCAL_CONDITION {
                debug!(rcond, "cholesky factor ill-conditioned, checking rank");
                check_rank(&sigma.clone().lu(), n)?;
            }
            debug!(n, rcond, "cholesky factorization");
            return Ok(Self {
                factor: Factor::Cholesky(chol),
                method: Factorization::Cholesky,
                dim: n,
            });
        }

        let lu = sigma.clone().lu();
        check_rank(&lu, n)?;

        let mean_variance = sigma.diagonal().mean();
        let epsilon = opts.regularization * mean_variance;
        if epsilon > 0.0 {
            let mut shifted = sigma.clone();
            for i in 0..n {
                shifted[(i, i)] += epsilon;
            }
            if let Some(chol) = shifted.cholesky() {
                if cholesky_rcond(&chol) >= MIN_RECIPROCAL_CONDITION {
                    warn!(epsilon, "covariance regularized before factorization");
                    return Ok(Self {
                        factor: Factor::Cholesky(chol),
                        method: Factorization::RegularizedCholesky { epsilon },
                        dim: n,
                    });
                }
            }
        }

        warn!("cholesky failed, falling back to LU with partial pivoting");
        Ok(Self {
            factor: Factor::Lu(lu),
            method: Factorization::Lu,
            dim: n,
        })
    }

    pub fn method(&self) -> Factorization {
        self.method
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Solve Σx = b against the stored factor.
    pub fn solve(&self, b: &DVector<f64>) -> FrontierResult<DVector<f64>> {
        if b.len() != self.dim {
            return Err(FrontierError::malformed(
                "rhs",
                format!("expected length {} but got {}", self.dim, b.len()),
            ));
        }
        let x = match &self.factor {
            Factor::Cholesky(chol) => chol.solve(b),
            Factor::Lu(lu) => lu.solve(b).ok_or_else(|| {
                FrontierError::SingularMatrix("LU factor has a zero pivot".into())
            })?,
        };
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FrontierError::SingularMatrix(
                "solution has non-finite components".into(),
            ));
        }
        Ok(x)
    }
}

/// One-shot solve of Σx = b.
pub fn solve(
    sigma: &DMatrix<f64>,
    b: &DVector<f64>,
    opts: &SolverOptions,
) -> FrontierResult<DVector<f64>> {
    validate_covariance(sigma, opts)?;
    SymmetricSolver::factor(sigma, opts)?.solve(b)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Matrix-vector product Σx.
pub fn mat_vec(sigma: &DMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    sigma * x
}

/// Quadratic form xᵀΣx, clamped at zero when within tolerance of it.
pub fn quad_form(
    sigma: &DMatrix<f64>,
    x: &DVector<f64>,
    opts: &SolverOptions,
) -> FrontierResult<f64> {
    let value = x.dot(&mat_vec(sigma, x));
    if !value.is_finite() {
        return Err(FrontierError::InvalidCovariance(
            "quadratic form is not finite".into(),
        ));
    }
    let tolerance = opts.psd_tolerance * x.norm_squared() * max_abs(sigma);
    if value < -tolerance {
        return Err(FrontierError::InvalidCovariance(format!(
            "not positive semi-definite: xᵀΣx = {:e}",
            value
        )));
    }
    Ok(value.max(0.0))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn max_abs(m: &DMatrix<f64>) -> f64 {
    m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// (min Lᵢᵢ / max Lᵢᵢ)², a cheap lower-bound style estimate of 1/cond(Σ).
fn cholesky_rcond(chol: &Cholesky<f64, Dyn>) -> f64 {
    let diag = chol.l_dirty().diagonal();
    let (lo, hi) = diag
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if hi <= 0.0 {
        return 0.0;
    }
    (lo / hi).powi(2)
}

fn check_rank(lu: &LU<f64, Dyn, Dyn>, n: usize) -> FrontierResult<()> {
    if is_rank_deficient(lu, n) {
        return Err(FrontierError::SingularMatrix(format!(
            "{} assets are not linearly independent",
            n
        )));
    }
    Ok(())
}

fn is_rank_deficient(lu: &LU<f64, Dyn, Dyn>, n: usize) -> bool {
    let u = lu.u();
    let (lo, hi) = u
        .diagonal()
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| {
            (lo.min(v.abs()), hi.max(v.abs()))
        });
    if hi == 0.0 || !lo.is_finite() {
        return true;
    }
    lo <= RANK_DEFICIENCY_FACTOR * n as f64 * f64::EPSILON * hi
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
