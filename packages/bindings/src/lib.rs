use napi::Result as NapiResult;
use napi_derive::napi;

use frontier_core::{FrontierError, FrontierRequest};

/// Convert a solver failure into a napi::Error, keeping the condition kind.
fn to_napi_error(e: FrontierError) -> napi::Error {
    napi::Error::from_reason(format!("{}: {}", e.kind(), e))
}

fn solve(request: FrontierRequest) -> NapiResult<String> {
    let output = frontier_core::compute_frontier(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(|e| to_napi_error(e.into()))
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_frontier(request_json: String) -> NapiResult<String> {
    let request = FrontierRequest::from_json(&request_json).map_err(to_napi_error)?;
    solve(request)
}

#[napi]
pub fn compute_frontier_text(request_text: String) -> NapiResult<String> {
    let request = FrontierRequest::parse_text(&request_text).map_err(to_napi_error)?;
    solve(request)
}
