use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analytics::{self, AssetPoint, MinVariancePortfolio};
use crate::error::FrontierError;
use crate::linalg::{self, Factorization, SolverOptions, SymmetricSolver};
use crate::request::{max_of, min_of, FrontierRequest, TargetSpec};
use crate::types::{with_metadata, ComputationOutput};
use crate::FrontierResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single point on the efficient frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub risk: f64,
    #[serde(rename = "return")]
    pub expected_return: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

/// The scalar reductions shared by every target in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reductions {
    /// 1ᵀ Σ⁻¹ 1
    pub a: f64,
    /// 1ᵀ Σ⁻¹ mu
    pub b: f64,
    /// muᵀ Σ⁻¹ mu
    pub c: f64,
    /// a·c − b²
    pub determinant: f64,
}

/// Output of a frontier batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierOutput {
    /// One point per target return, in target order.
    pub frontier: Vec<FrontierPoint>,
    /// Global minimum-variance portfolio (the frontier's vertex).
    pub min_variance_portfolio: MinVariancePortfolio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_assets: Option<Vec<AssetPoint>>,
}

/// Σ factored once, with `Σx1 = 1` and `Σx2 = mu` already solved.
///
/// Weights are combined from `x1` and the centered direction
/// `x̃ = x2 − m̄·x1`, where `m̄ = b/a` is the minimum-variance return. The
/// 2×2 constraint system in that basis is well scaled even when `a·c` and
/// `b²` nearly cancel, so both constraints hold to rounding on
/// ill-conditioned Σ. Every target return after construction costs one
/// vector combination and one quadratic form.
pub struct FrontierSolver {
    mu: DVector<f64>,
    sigma: DMatrix<f64>,
    x1: DVector<f64>,
    centered: DVector<f64>,
    basis: Basis,
    reductions: Reductions,
    method: Factorization,
    opts: SolverOptions,
}

/// Constraint values of the `(x1, x̃)` basis.
#[derive(Debug, Clone, Copy)]
struct Basis {
    /// m̄ = b / a
    mean_return: f64,
    /// muᵀ x1
    return_of_x1: f64,
    /// 1ᵀ x̃, zero up to rounding
    budget_of_centered: f64,
    /// muᵀ x̃ = c − b²/a
    return_of_centered: f64,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

impl FrontierSolver {
    /// Build a solver from caller-shaped inputs.
    pub fn new(mu: &[f64], sigma: &[Vec<f64>], opts: SolverOptions) -> FrontierResult<Self> {
        let n = mu.len();
        if n < 2 {
            return Err(FrontierError::InsufficientAssets { n });
        }
        let sigma = linalg::matrix_from_rows(sigma, n)?;
        Self::from_matrix(DVector::from_column_slice(mu), sigma, opts)
    }

    pub fn from_matrix(
        mu: DVector<f64>,
        sigma: DMatrix<f64>,
        opts: SolverOptions,
    ) -> FrontierResult<Self> {
        let n = mu.len();
        if n < 2 {
            return Err(FrontierError::InsufficientAssets { n });
        }
        if sigma.nrows() != n || sigma.ncols() != n {
            return Err(FrontierError::malformed(
                "covariance_matrix",
                format!("expected {}x{} but got {}x{}", n, n, sigma.nrows(), sigma.ncols()),
            ));
        }
        linalg::validate_covariance(&sigma, &opts)?;

        let factor = SymmetricSolver::factor(&sigma, &opts)?;
        let ones = DVector::from_element(n, 1.0);
        let x1 = factor.solve(&ones)?;
        let x2 = factor.solve(&mu)?;

        let a = ones.dot(&x1);
        let b = ones.dot(&x2);
        let c = mu.dot(&x2);
        if a <= 0.0 {
            return Err(FrontierError::InvalidCovariance(format!(
                "1ᵀΣ⁻¹1 = {:e} is not positive",
                a
            )));
        }

        let mean_return = b / a;
        let centered = &x2 - &x1 * mean_return;
        let basis = Basis {
            mean_return,
            return_of_x1: mu.dot(&x1),
            budget_of_centered: ones.dot(&centered),
            return_of_centered: mu.dot(&centered),
        };
        // a·(muᵀx̃) − (1ᵀx̃)·(muᵀx1), algebraically a·c − b².
        let determinant = a * basis.return_of_centered
            - basis.budget_of_centered * basis.return_of_x1;
        debug!(n, a, b, c, determinant, "frontier reductions");

        let spread = mu.iter().fold(0.0_f64, |acc, m| acc.max((m - mean_return).abs()));
        let magnitude = mu.iter().fold(0.0_f64, |acc, m| acc.max(m.abs()));
        let scale = (a * basis.return_of_centered).abs()
            + (basis.budget_of_centered * basis.return_of_x1).abs();
        if spread <= opts.degeneracy_tolerance * magnitude
            || !determinant.is_finite()
            || determinant.abs() <= opts.degeneracy_tolerance * scale
        {
            return Err(FrontierError::DegenerateFrontier { determinant });
        }

        Ok(Self {
            mu,
            sigma,
            x1,
            centered,
            basis,
            reductions: Reductions {
                a,
                b,
                c,
                determinant,
            },
            method: factor.method(),
            opts,
        })
    }

    pub fn n_assets(&self) -> usize {
        self.mu.len()
    }

    pub fn reductions(&self) -> Reductions {
        self.reductions
    }

    pub fn factorization(&self) -> Factorization {
        self.method
    }

    pub fn expected_returns(&self) -> &DVector<f64> {
        &self.mu
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    /// Coefficients (α, β) of `w = α·x1 + β·x̃` meeting both constraints.
    fn coefficients(&self, target: f64) -> (f64, f64) {
        let a = self.reductions.a;
        let d = self.reductions.determinant;
        let Basis {
            return_of_x1,
            budget_of_centered,
            return_of_centered,
            ..
        } = self.basis;
        (
            (return_of_centered - budget_of_centered * target) / d,
            (a * target - return_of_x1) / d,
        )
    }

    /// Lagrange multipliers (λ, γ) for the budget and return constraints,
    /// so that `w = λ·x1 + γ·x2`.
    pub fn multipliers(&self, target: f64) -> (f64, f64) {
        let (alpha, beta) = self.coefficients(target);
        (alpha - beta * self.basis.mean_return, beta)
    }

    /// Minimum-variance weights at `target`.
    pub fn weights_for(&self, target: f64) -> DVector<f64> {
        let (alpha, beta) = self.coefficients(target);
        &self.x1 * alpha + &self.centered * beta
    }

    /// Portfolio standard deviation sqrt(wᵀΣw).
    pub fn risk_of(&self, w: &DVector<f64>) -> FrontierResult<f64> {
        Ok(linalg::quad_form(&self.sigma, w, &self.opts)?.sqrt())
    }

    /// Solve one target return.
    pub fn solve_point(
        &self,
        target: f64,
        include_weights: bool,
    ) -> FrontierResult<FrontierPoint> {
        let w = self.weights_for(target);
        let risk = self.risk_of(&w)?;
        Ok(FrontierPoint {
            risk,
            expected_return: target,
            weights: include_weights.then(|| w.iter().copied().collect()),
        })
    }

    /// Solve every target, preserving order. Any failure aborts the batch.
    pub fn solve_batch(
        &self,
        targets: &[f64],
        include_weights: bool,
    ) -> FrontierResult<Vec<FrontierPoint>> {
        debug!(m = targets.len(), "solving frontier batch");

        #[cfg(feature = "parallel")]
        let points: FrontierResult<Vec<FrontierPoint>> = targets
            .par_iter()
            .map(|&r| self.solve_point(r, include_weights))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let points: FrontierResult<Vec<FrontierPoint>> = targets
            .iter()
            .map(|&r| self.solve_point(r, include_weights))
            .collect();

        points
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the efficient frontier for a request with default tolerances.
pub fn compute_frontier(
    request: &FrontierRequest,
) -> FrontierResult<ComputationOutput<FrontierOutput>> {
    compute_frontier_with(request, &SolverOptions::default())
}

/// Compute the efficient frontier for a request.
///
/// Σ is factored once; each target then costs O(n²). Points come back in
/// the order of the explicit or generated target sequence. Targets outside
/// `[min(mu), max(mu)]` are solved, not rejected, and each one is reported
/// in the envelope warnings.
pub fn compute_frontier_with(
    request: &FrontierRequest,
    opts: &SolverOptions,
) -> FrontierResult<ComputationOutput<FrontierOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    request.validate()?;
    let solver = FrontierSolver::new(
        &request.expected_returns,
        &request.covariance_matrix,
        *opts,
    )?;
    let mu = &request.expected_returns;

    let targets = request.resolve_targets();
    let (lo, hi) = (min_of(mu), max_of(mu));
    for (i, r) in targets.iter().enumerate() {
        if *r < lo || *r > hi {
            warnings.push(format!(
                "Target return {} at index {} lies outside [{}, {}]; extrapolated",
                r, i, lo, hi
            ));
        }
    }

    match solver.factorization() {
        Factorization::Cholesky => {}
        Factorization::RegularizedCholesky { epsilon } => warnings.push(format!(
            "Covariance matrix was regularized with epsilon {:e} before factorization",
            epsilon
        )),
        Factorization::Lu => warnings.push(
            "Covariance matrix is not positive definite; solved with LU factorization".into(),
        ),
    }

    let frontier = solver.solve_batch(&targets, request.include_weights)?;
    let min_variance_portfolio = analytics::min_variance_portfolio(&solver, &request.asset_names)?;
    let single_assets = request
        .include_assets
        .then(|| analytics::single_assets(&request.asset_names, &solver));

    let output = FrontierOutput {
        frontier,
        min_variance_portfolio,
        single_assets,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Closed-form Markowitz efficient frontier (budget + return constraints)",
        &serde_json::json!({
            "n_assets": solver.n_assets(),
            "n_points": targets.len(),
            "targets": match request.targets {
                TargetSpec::Explicit(_) => "explicit",
                TargetSpec::Generated(_) => "generated",
            },
            "factorization": solver.factorization(),
            "reductions": solver.reductions(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
