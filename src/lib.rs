// Domain layer: optimization model, solver contract and error taxonomy
pub mod domain;

// Geometry preprocessing: reprojection and the travel-cost matrix
pub mod spatial;

// Facility location formulation, extraction and persistence
pub mod location;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Application layer: Use cases and service orchestration
pub mod application;

// Infrastructure layer: Configuration and logging setup
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    PlannerError, PlannerResult, SolutionStatus, SolverBackend, SolverError, SolverService,
};

pub use spatial::{CostMatrix, CostMatrixBuilder, Crs, EntityCollection, Feature};

pub use location::{
    solve_capacitated_flp, DemandQuantities, FacilityCapacities, FacilityLocationSolution,
    FlpModelBuilder, SolutionExtractor, SolveParameters,
};

pub use application::{FacilityLocationService, SolveRequest, SolveResponse};

pub use infrastructure::{init_tracing, PlannerConfig};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
pub use solver::SolverFactory;
