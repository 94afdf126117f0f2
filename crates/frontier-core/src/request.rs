use serde::{Deserialize, Serialize};
use std::str::SplitWhitespace;

use crate::error::FrontierError;
use crate::types::{CovarianceRows, Returns};
use crate::FrontierResult;

/// Generated point count when a JSON request names neither `points` nor
/// `target_returns`.
pub const DEFAULT_POINTS: usize = 50;

/// Largest asset count a request may declare.
pub const MAX_ASSETS: usize = 10_000;

/// Largest target count a request may declare or generate.
pub const MAX_POINTS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the target returns are obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    /// Caller-supplied targets, solved in the given order.
    Explicit(Vec<f64>),
    /// `m` evenly spaced targets spanning `[min(mu), max(mu)]`.
    Generated(usize),
}

impl TargetSpec {
    pub fn len(&self) -> usize {
        match self {
            TargetSpec::Explicit(targets) => targets.len(),
            TargetSpec::Generated(m) => *m,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve into the concrete target sequence.
    pub fn resolve(&self, mu: &[f64]) -> Vec<f64> {
        match self {
            TargetSpec::Explicit(targets) => targets.clone(),
            TargetSpec::Generated(m) => linspace(min_of(mu), max_of(mu), *m),
        }
    }
}

/// A validated-on-use frontier request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonRequest", into = "JsonRequest")]
pub struct FrontierRequest {
    pub asset_names: Vec<String>,
    pub expected_returns: Returns,
    pub covariance_matrix: CovarianceRows,
    pub targets: TargetSpec,
    /// Report the weight vector of every frontier point.
    pub include_weights: bool,
    /// Report each asset's own (risk, return).
    pub include_assets: bool,
}

/// JSON wire shape of [`FrontierRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asset_names: Option<Vec<String>>,
    expected_returns: Returns,
    covariance_matrix: CovarianceRows,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_returns: Option<Vec<f64>>,
    #[serde(default)]
    include_weights: bool,
    #[serde(default)]
    include_assets: bool,
}

impl TryFrom<JsonRequest> for FrontierRequest {
    type Error = FrontierError;

    fn try_from(raw: JsonRequest) -> FrontierResult<Self> {
        let targets = match (raw.points, raw.target_returns) {
            (None, None) => TargetSpec::Generated(DEFAULT_POINTS),
            (Some(m), None) => TargetSpec::Generated(m),
            (None, Some(targets)) => TargetSpec::Explicit(targets),
            (Some(m), Some(targets)) if m == targets.len() => TargetSpec::Explicit(targets),
            (Some(m), Some(targets)) => {
                return Err(FrontierError::malformed(
                    "target_returns",
                    format!("points is {} but {} target returns given", m, targets.len()),
                ))
            }
        };
        let asset_names = raw
            .asset_names
            .unwrap_or_else(|| default_names(raw.expected_returns.len()));
        Ok(FrontierRequest {
            asset_names,
            expected_returns: raw.expected_returns,
            covariance_matrix: raw.covariance_matrix,
            targets,
            include_weights: raw.include_weights,
            include_assets: raw.include_assets,
        })
    }
}

impl From<FrontierRequest> for JsonRequest {
    fn from(req: FrontierRequest) -> Self {
        let (points, target_returns) = match req.targets {
            TargetSpec::Explicit(targets) => (None, Some(targets)),
            TargetSpec::Generated(m) => (Some(m), None),
        };
        JsonRequest {
            asset_names: Some(req.asset_names),
            expected_returns: req.expected_returns,
            covariance_matrix: req.covariance_matrix,
            points,
            target_returns,
            include_weights: req.include_weights,
            include_assets: req.include_assets,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FrontierRequest {
    /// Build a request with default asset names and no optional sections.
    pub fn new(
        expected_returns: Returns,
        covariance_matrix: CovarianceRows,
        targets: TargetSpec,
    ) -> Self {
        Self {
            asset_names: default_names(expected_returns.len()),
            expected_returns,
            covariance_matrix,
            targets,
            include_weights: false,
            include_assets: false,
        }
    }

    /// Parse the JSON request shape.
    pub fn from_json(input: &str) -> FrontierResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse the whitespace-separated text protocol:
    /// `n`, `n` returns, `n*n` covariances (row-major), `m`, then optionally
    /// `m` target returns.
    pub fn parse_text(input: &str) -> FrontierResult<Self> {
        let mut tokens = Tokens::new(input);

        let n = tokens.next_count("n", MAX_ASSETS)?;
        let mu = tokens.next_values("mu", n)?;
        let mut cov = Vec::new();
        for i in 0..n {
            cov.push(tokens.next_values(&format!("covariance row {}", i), n)?);
        }
        let m = tokens.next_count("m", MAX_POINTS)?;

        let targets = if tokens.is_exhausted() {
            TargetSpec::Generated(m)
        } else {
            TargetSpec::Explicit(tokens.next_values("target_returns", m)?)
        };
        if let Some(extra) = tokens.peek() {
            return Err(FrontierError::malformed(
                "request",
                format!("trailing data starting at token {}: '{}'", tokens.consumed + 1, extra),
            ));
        }

        Ok(Self::new(mu, cov, targets))
    }

    /// Parse JSON when the first non-whitespace character is `{`, text otherwise.
    pub fn parse_auto(input: &str) -> FrontierResult<Self> {
        if input.trim_start().starts_with('{') {
            Self::from_json(input)
        } else {
            Self::parse_text(input)
        }
    }

    pub fn n_assets(&self) -> usize {
        self.expected_returns.len()
    }

    /// Replace the generated point count. Explicit targets are left alone.
    pub fn with_points(mut self, m: usize) -> Self {
        if let TargetSpec::Generated(_) = self.targets {
            self.targets = TargetSpec::Generated(m);
        }
        self
    }

    /// Shape and value checks that do not need a factorization.
    pub fn validate(&self) -> FrontierResult<()> {
        let n = self.n_assets();
        if n < 2 {
            return Err(FrontierError::InsufficientAssets { n });
        }
        if n > MAX_ASSETS {
            return Err(FrontierError::malformed(
                "expected_returns",
                format!("{} assets exceeds the limit of {}", n, MAX_ASSETS),
            ));
        }
        if self.targets.len() > MAX_POINTS {
            return Err(FrontierError::malformed(
                "targets",
                format!(
                    "{} targets exceeds the limit of {}",
                    self.targets.len(),
                    MAX_POINTS
                ),
            ));
        }
        if self.asset_names.len() != n {
            return Err(FrontierError::malformed(
                "asset_names",
                format!("expected {} names but got {}", n, self.asset_names.len()),
            ));
        }
        check_finite("expected_returns", &self.expected_returns)?;
        for (i, row) in self.covariance_matrix.iter().enumerate() {
            check_finite(&format!("covariance_matrix[{}]", i), row)?;
        }
        if let TargetSpec::Explicit(targets) = &self.targets {
            check_finite("target_returns", targets)?;
        }
        Ok(())
    }

    /// The concrete target sequence, in output order.
    pub fn resolve_targets(&self) -> Vec<f64> {
        self.targets.resolve(&self.expected_returns)
    }
}

struct Tokens<'a> {
    iter: std::iter::Peekable<SplitWhitespace<'a>>,
    consumed: usize,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            iter: input.split_whitespace().peekable(),
            consumed: 0,
        }
    }

    fn is_exhausted(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.iter.peek().copied()
    }

    fn next_token(&mut self, field: &str) -> FrontierResult<&'a str> {
        let token = self.iter.next().ok_or_else(|| {
            FrontierError::malformed(field, format!("missing after token {}", self.consumed))
        })?;
        self.consumed += 1;
        Ok(token)
    }

    fn next_count(&mut self, field: &str, max: usize) -> FrontierResult<usize> {
        let token = self.next_token(field)?;
        let count = token.parse::<usize>().map_err(|_| {
            FrontierError::malformed(
                field,
                format!("token {} '{}' is not a non-negative integer", self.consumed, token),
            )
        })?;
        if count > max {
            return Err(FrontierError::malformed(
                field,
                format!("token {} declares {} but the limit is {}", self.consumed, count, max),
            ));
        }
        Ok(count)
    }

    fn next_value(&mut self, field: &str) -> FrontierResult<f64> {
        let token = self.next_token(field)?;
        let value = token.parse::<f64>().map_err(|_| {
            FrontierError::malformed(
                field,
                format!("token {} '{}' is not a number", self.consumed, token),
            )
        })?;
        if !value.is_finite() {
            return Err(FrontierError::malformed(
                field,
                format!("token {} '{}' is not finite", self.consumed, token),
            ));
        }
        Ok(value)
    }

    fn next_values(&mut self, field: &str, count: usize) -> FrontierResult<Vec<f64>> {
        let mut out = Vec::new();
        for i in 0..count {
            if self.is_exhausted() {
                return Err(FrontierError::malformed(
                    field,
                    format!("expected {} values but got {}", count, i),
                ));
            }
            out.push(self.next_value(field)?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("asset_{}", i)).collect()
}

fn check_finite(field: &str, values: &[f64]) -> FrontierResult<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(FrontierError::malformed(
            field,
            format!("value at index {} is not finite", i),
        ));
    }
    Ok(())
}

pub(crate) fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub(crate) fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// `m` evenly spaced points from `lo` to `hi`; both ends are exact.
fn linspace(lo: f64, hi: f64, m: usize) -> Vec<f64> {
    match m {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (m - 1) as f64;
            (0..m)
                .map(|i| if i == m - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
