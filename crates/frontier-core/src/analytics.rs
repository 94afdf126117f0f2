use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::frontier::FrontierSolver;
use crate::FrontierResult;

/// A single asset weight with risk/return contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWeight {
    pub name: String,
    pub weight: f64,
    /// Marginal risk contribution times weight.
    pub contribution_to_risk: f64,
    /// Weight times expected return.
    pub contribution_to_return: f64,
}

/// Global minimum-variance portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinVariancePortfolio {
    pub risk: f64,
    #[serde(rename = "return")]
    pub expected_return: f64,
    pub weights: Vec<AssetWeight>,
    /// Weighted average vol / portfolio vol.
    pub diversification_ratio: f64,
    /// Herfindahl-Hirschman index of weights.
    pub hhi_concentration: f64,
}

/// One asset held alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPoint {
    pub name: String,
    pub risk: f64,
    #[serde(rename = "return")]
    pub expected_return: f64,
}

/// The frontier's vertex: `w = Σ⁻¹1 / a`, return `b / a`, risk `sqrt(1 / a)`.
pub fn min_variance_portfolio(
    solver: &FrontierSolver,
    names: &[String],
) -> FrontierResult<MinVariancePortfolio> {
    let r = solver.reductions();
    let target = r.b / r.a;
    let w = solver.weights_for(target);
    let risk = solver.risk_of(&w)?;

    let sigma = solver.covariance();
    let n = solver.n_assets();
    let individual_vols: Vec<f64> = (0..n).map(|i| sigma[(i, i)].max(0.0).sqrt()).collect();
    let weighted_avg_vol: f64 = (0..n).map(|i| w[i] * individual_vols[i]).sum();
    let diversification_ratio = if risk == 0.0 {
        1.0
    } else {
        weighted_avg_vol / risk
    };
    let hhi_concentration: f64 = w.iter().map(|wi| wi * wi).sum();

    Ok(MinVariancePortfolio {
        risk,
        expected_return: target,
        weights: asset_weights(names, &w, solver, risk),
        diversification_ratio,
        hhi_concentration,
    })
}

/// Per-asset weight, risk contribution and return contribution.
pub fn asset_weights(
    names: &[String],
    w: &DVector<f64>,
    solver: &FrontierSolver,
    risk: f64,
) -> Vec<AssetWeight> {
    let mu = solver.expected_returns();
    let sigma_w = solver.covariance() * w;
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mcr = if risk == 0.0 { 0.0 } else { sigma_w[i] / risk };
            AssetWeight {
                name: name.clone(),
                weight: w[i],
                contribution_to_risk: w[i] * mcr,
                contribution_to_return: w[i] * mu[i],
            }
        })
        .collect()
}

/// Each asset's standalone (risk, return), in asset order.
pub fn single_assets(names: &[String], solver: &FrontierSolver) -> Vec<AssetPoint> {
    let mu = solver.expected_returns();
    let sigma = solver.covariance();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| AssetPoint {
            name: name.clone(),
            risk: sigma[(i, i)].max(0.0).sqrt(),
            expected_return: mu[i],
        })
        .collect()
}
