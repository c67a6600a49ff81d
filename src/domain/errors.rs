// Error taxonomy for the facility location pipeline

use super::solver_service::SolverError;

/// Errors surfaced by cost-matrix construction, model building and persistence
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("{collection} collection has an entity without an identifier in field '{field}'")]
    MissingIdentifier { collection: String, field: String },

    #[error("{collection} collection contains identifier '{id}' more than once")]
    DuplicateIdentifier { collection: String, id: String },

    #[error("Missing demand quantity for '{0}'")]
    MissingDemandQuantity(String),

    #[error("Missing capacity for facility '{0}'")]
    MissingCapacity(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;
