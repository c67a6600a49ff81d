// Capacitated facility location: formulation, extraction, persistence

pub mod extractor;
pub mod model_builder;
pub mod persistence;
pub mod planner;

pub use extractor::{FacilityLocationSolution, SolutionExtractor, INDICATOR_THRESHOLD};
pub use model_builder::{
    DemandQuantities, FacilityCapacities, FlpModel, FlpModelBuilder, DEFAULT_OPENING_COST,
    MISSING_COST_PENALTY,
};
pub use persistence::{
    persist_assignments, read_assignments, write_assignments, write_solution_report, CanonicalNumber,
    PersistOutcome, SolutionRecord,
};
pub use planner::{solve_capacitated_flp, SolveParameters, DEFAULT_TIME_LIMIT};
