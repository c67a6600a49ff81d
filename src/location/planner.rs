//! End-to-end solve: model construction, engine call, extraction.

use super::extractor::{FacilityLocationSolution, SolutionExtractor};
use super::model_builder::{DemandQuantities, FacilityCapacities, FlpModelBuilder, DEFAULT_OPENING_COST};
use crate::domain::errors::{PlannerError, PlannerResult};
use crate::domain::solver_service::SolverService;
use crate::spatial::CostMatrix;
use std::time::{Duration, Instant};
use tracing::info;

/// Default wall-clock budget handed to the engine
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(600);

/// Scalar parameters of a solve call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveParameters {
    pub opening_cost: f64,
    pub time_limit: Duration,
}

impl Default for SolveParameters {
    fn default() -> Self {
        Self {
            opening_cost: DEFAULT_OPENING_COST,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl SolveParameters {
    pub fn with_opening_cost(mut self, cost: f64) -> Self {
        self.opening_cost = cost;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Time limit from seconds, rejecting negative and non-finite values.
    pub fn time_limit_from_secs(secs: f64) -> PlannerResult<Duration> {
        Duration::try_from_secs_f64(secs).map_err(|_| {
            PlannerError::InvalidParameter(format!(
                "time limit must be a non-negative number of seconds, got {}",
                secs
            ))
        })
    }
}

/// Solves the capacitated facility location problem for one request.
///
/// Empty inputs short-circuit to an empty solution with zero solving time.
/// The solving time covers the engine call only and is reported whatever the
/// engine's terminal status.
pub fn solve_capacitated_flp(
    solver: &dyn SolverService,
    cost_matrix: &CostMatrix,
    capacities: &FacilityCapacities,
    quantities: &DemandQuantities,
    parameters: &SolveParameters,
) -> PlannerResult<FacilityLocationSolution> {
    info!(solver = solver.name(), "solving facility location problem");

    let flp = match FlpModelBuilder::new(cost_matrix, capacities, quantities)
        .opening_cost(parameters.opening_cost)
        .build()?
    {
        Some(flp) => flp,
        None => return Ok(FacilityLocationSolution::empty()),
    };

    info!(time_limit_secs = parameters.time_limit.as_secs_f64(), "starting optimization");
    let start = Instant::now();
    let outcome = solver.solve(&flp.model, parameters.time_limit)?;
    let solving_time = start.elapsed();
    info!(
        solving_time_secs = solving_time.as_secs_f64(),
        status = %outcome.status,
        variables = outcome.statistics.num_variables,
        constraints = outcome.statistics.num_constraints,
        "optimization finished"
    );

    Ok(SolutionExtractor::new(&flp).extract(&outcome, solving_time))
}
