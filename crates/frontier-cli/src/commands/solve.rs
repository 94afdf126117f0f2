use clap::{Args, ValueEnum};
use tracing::{debug, info};

use frontier_core::{compute_frontier, ComputationOutput, FrontierOutput, FrontierRequest};

use crate::input;

/// Request encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RequestFormat {
    /// JSON if the first non-whitespace character is `{`, text otherwise
    Auto,
    /// n, mu, covariance rows, m, optional target returns
    Text,
    Json,
}

/// Arguments for solving a frontier request
#[derive(Args)]
pub struct SolveArgs {
    /// Path to the request file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Request encoding
    #[arg(long, default_value = "auto")]
    pub format: RequestFormat,

    /// Number of generated points when the request lists no target returns
    #[arg(long)]
    pub points: Option<usize>,

    /// Include the weight vector of every frontier point
    #[arg(long)]
    pub weights: bool,

    /// Include each asset's standalone risk and return
    #[arg(long)]
    pub assets: bool,
}

pub fn run_solve(
    args: SolveArgs,
) -> Result<ComputationOutput<FrontierOutput>, Box<dyn std::error::Error>> {
    let raw = if let Some(ref path) = args.input {
        input::file::read_text(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file> or stdin required for a frontier request".into());
    };

    let mut request = parse_request(&raw, args.format)?;
    if let Some(m) = args.points {
        request = request.with_points(m);
    }
    request.include_weights |= args.weights;
    request.include_assets |= args.assets;
    debug!(
        n = request.n_assets(),
        m = request.targets.len(),
        "parsed frontier request"
    );

    let out = compute_frontier(&request)?;
    info!(
        points = out.result.frontier.len(),
        elapsed_us = out.metadata.computation_time_us,
        "frontier computed"
    );
    Ok(out)
}

fn parse_request(
    raw: &str,
    format: RequestFormat,
) -> Result<FrontierRequest, frontier_core::FrontierError> {
    match format {
        RequestFormat::Auto => FrontierRequest::parse_auto(raw),
        RequestFormat::Text => FrontierRequest::parse_text(raw),
        RequestFormat::Json => FrontierRequest::from_json(raw),
    }
}
