pub mod analytics;
pub mod error;
pub mod frontier;
pub mod linalg;
pub mod request;
pub mod types;

pub use error::{ErrorKind, FrontierError};
pub use frontier::{
    compute_frontier, compute_frontier_with, FrontierOutput, FrontierPoint, FrontierSolver,
};
pub use linalg::SolverOptions;
pub use request::{FrontierRequest, TargetSpec, MAX_ASSETS, MAX_POINTS};
pub use types::*;

/// Standard result type for all frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;
