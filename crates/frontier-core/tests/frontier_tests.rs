use frontier_core::linalg::Factorization;
use frontier_core::{compute_frontier, ErrorKind, FrontierRequest, FrontierSolver, SolverOptions};

// ===========================================================================
// Text request → frontier
// ===========================================================================

const THREE_ASSET: &str = "\
3
0.10 0.04 0.07
0.0225 0.009 0.00375
0.009 0.04 0.025
0.00375 0.025 0.0625
";

fn solve_text(input: &str) -> frontier_core::FrontierResult<Vec<(f64, f64)>> {
    let req = FrontierRequest::parse_text(input)?;
    let out = compute_frontier(&req)?;
    Ok(out
        .result
        .frontier
        .iter()
        .map(|p| (p.risk, p.expected_return))
        .collect())
}

fn kind_of(input: &str) -> ErrorKind {
    match solve_text(input) {
        Ok(points) => panic!("expected an error, got {} points", points.len()),
        Err(e) => e.kind(),
    }
}

#[test]
fn test_two_asset_text_request() {
    let points = solve_text("2\n0.10 0.20\n0.04 0.00\n0.00 0.09\n1\n0.15\n").unwrap();
    assert_eq!(points.len(), 1);
    // w = [0.5, 0.5]: variance 0.25·0.04 + 0.25·0.09
    assert!((points[0].0 - 0.0325_f64.sqrt()).abs() < 1e-12);
    assert_eq!(points[0].1, 0.15);
}

#[test]
fn test_generated_frontier_is_a_parabola_in_variance() {
    let points = solve_text(&format!("{}9\n", THREE_ASSET)).unwrap();
    assert_eq!(points.len(), 9);
    assert_eq!(points[0].1, 0.04);
    assert_eq!(points[8].1, 0.10);

    // σ²(r) = (a·r² − 2b·r + c) / d: second differences of σ² are constant
    // on evenly spaced targets.
    let var: Vec<f64> = points.iter().map(|(risk, _)| risk * risk).collect();
    let second: Vec<f64> = var.windows(3).map(|w| w[2] - 2.0 * w[1] + w[0]).collect();
    for d in &second {
        assert!((d - second[0]).abs() < 1e-12, "{} vs {}", d, second[0]);
        assert!(*d > 0.0);
    }
}

#[test]
fn test_explicit_targets_keep_input_order() {
    let points = solve_text(&format!("{}4\n0.09 0.05 0.09 0.06\n", THREE_ASSET)).unwrap();
    let returns: Vec<f64> = points.iter().map(|(_, r)| *r).collect();
    assert_eq!(returns, vec![0.09, 0.05, 0.09, 0.06]);
    assert_eq!(points[0], points[2]);
}

#[test]
fn test_json_and_text_agree() {
    let text = solve_text(&format!("{}5\n", THREE_ASSET)).unwrap();
    let req = FrontierRequest::from_json(
        r#"{
            "expected_returns": [0.10, 0.04, 0.07],
            "covariance_matrix": [
                [0.0225, 0.009, 0.00375],
                [0.009, 0.04, 0.025],
                [0.00375, 0.025, 0.0625]
            ],
            "points": 5
        }"#,
    )
    .unwrap();
    let json: Vec<(f64, f64)> = compute_frontier(&req)
        .unwrap()
        .result
        .frontier
        .iter()
        .map(|p| (p.risk, p.expected_return))
        .collect();
    assert_eq!(text, json);
}

// ===========================================================================
// Every failure kind, from the text protocol
// ===========================================================================

#[test]
fn test_malformed_input_kind() {
    assert_eq!(kind_of("2\n0.1 0.2\n0.04 0\n"), ErrorKind::MalformedInput);
    assert_eq!(kind_of("two\n"), ErrorKind::MalformedInput);
    assert_eq!(
        kind_of("2 0.1 0.2 0.04 0 0 0.09 18446744073709551615"),
        ErrorKind::MalformedInput
    );
}

#[test]
fn test_insufficient_assets_kind() {
    assert_eq!(kind_of("1\n0.1\n0.04\n3\n"), ErrorKind::InsufficientAssets);
}

#[test]
fn test_invalid_covariance_kind() {
    assert_eq!(
        kind_of("2\n0.1 0.2\n0.04 0.01\n0.00 0.09\n3\n"),
        ErrorKind::InvalidCovariance
    );
}

#[test]
fn test_singular_matrix_kind() {
    assert_eq!(
        kind_of("2\n0.1 0.2\n0.04 0.08\n0.08 0.16\n3\n"),
        ErrorKind::SingularMatrix
    );
}

#[test]
fn test_degenerate_frontier_kind() {
    let equal_returns = THREE_ASSET.replacen("0.10 0.04 0.07", "0.08 0.08 0.08", 1);
    assert_eq!(
        kind_of(&format!("{}3\n", equal_returns)),
        ErrorKind::DegenerateFrontier
    );
}

// ===========================================================================
// Factorization paths
// ===========================================================================

#[test]
fn test_positive_definite_solver_uses_cholesky() {
    let req = FrontierRequest::parse_text(&format!("{}2\n", THREE_ASSET)).unwrap();
    let s = FrontierSolver::new(
        &req.expected_returns,
        &req.covariance_matrix,
        SolverOptions::default(),
    )
    .unwrap();
    assert_eq!(s.factorization(), Factorization::Cholesky);
}

#[test]
fn test_regularized_path_from_text() {
    let out = compute_frontier(
        &FrontierRequest::parse_text("3\n0.10 0.20 0.15\n1 0 0\n0 1 0\n0 0 -1e-13\n1\n0.12\n")
            .unwrap(),
    )
    .unwrap();
    assert!(matches!(
        out.assumptions["factorization"]["method"].as_str(),
        Some("regularized_cholesky")
    ));
    assert!(out.warnings.iter().any(|w| w.contains("regularized")));
}
