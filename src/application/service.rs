// Application service: the facility location use case
// Wires configuration, cost matrix construction, the engine and persistence together

use super::mappers::{self, SolveRequest, SolveResponse, ValidationReport};
use crate::domain::errors::PlannerResult;
use crate::domain::solver_service::SolverService;
use crate::infrastructure::PlannerConfig;
use crate::location::{
    persist_assignments, solve_capacitated_flp, FacilityLocationSolution, FlpModelBuilder,
};
use crate::solver::SolverFactory;
use crate::spatial::{CostMatrix, CostMatrixBuilder, EntityCollection};
use std::sync::Arc;
use tracing::{info, warn};

pub struct FacilityLocationService {
    solver: Arc<dyn SolverService>,
    config: PlannerConfig,
}

impl FacilityLocationService {
    pub fn new(solver: Arc<dyn SolverService>, config: PlannerConfig) -> Self {
        Self { solver, config }
    }

    /// Create the service with the backend named in `config`, installing its log filter
    pub fn from_config(config: PlannerConfig) -> PlannerResult<Self> {
        config.init_tracing();
        let solver = SolverFactory::create_from_backend(config.backend)?;
        Ok(Self::new(solver, config))
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    pub fn cost_matrix_builder(&self) -> CostMatrixBuilder {
        CostMatrixBuilder::new()
            .with_target_crs(self.config.target_crs())
            .with_id_field(self.config.id_field.clone())
    }

    /// Builds the cost matrix and saves it when a path is configured.
    pub fn build_cost_matrix(
        &self,
        demand: &EntityCollection,
        facilities: &EntityCollection,
    ) -> PlannerResult<CostMatrix> {
        let matrix = self.cost_matrix_builder().build(demand, facilities)?;

        match &self.config.cost_matrix_path {
            Some(path) if !matrix.is_empty() => {
                matrix.write(path)?;
                info!(path = %path.display(), rows = matrix.len(), "cost matrix saved");
            }
            Some(path) => info!(path = %path.display(), "cost matrix is empty, nothing written"),
            None => {}
        }
        Ok(matrix)
    }

    /// Solves one request and returns the domain solution.
    ///
    /// Assignments are saved when `assignments_path` is configured; a failed
    /// write is logged and does not affect the returned solution.
    pub fn solve_solution(&self, request: &SolveRequest) -> PlannerResult<FacilityLocationSolution> {
        request.cost_matrix.validate()?;
        let parameters = mappers::request_to_parameters(request, &self.config)?;

        let solution = solve_capacitated_flp(
            self.solver.as_ref(),
            &request.cost_matrix,
            &request.facility_capacities,
            &request.demand_quantities,
            &parameters,
        )?;

        if let Some(path) = &self.config.assignments_path {
            persist_assignments(&solution, path);
        }
        Ok(solution)
    }

    pub fn solve(&self, request: &SolveRequest) -> PlannerResult<SolveResponse> {
        let solution = self.solve_solution(request)?;
        Ok(mappers::solution_to_response(&solution, self.solver.name()))
    }

    /// Checks a request without running the engine.
    pub fn validate_request(&self, request: &SolveRequest) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut report = ValidationReport {
            is_valid: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            num_variables: 0,
            num_constraints: 0,
            num_binary_vars: 0,
        };

        let built = request
            .cost_matrix
            .validate()
            .and_then(|_| mappers::request_to_parameters(request, &self.config))
            .and_then(|params| {
                FlpModelBuilder::new(
                    &request.cost_matrix,
                    &request.facility_capacities,
                    &request.demand_quantities,
                )
                .opening_cost(params.opening_cost)
                .build()
            });

        match built {
            Ok(Some(flp)) => {
                if let Err(e) = self.solver.validate(&flp.model) {
                    errors.push(e.to_string());
                }

                let total_demand: f64 = flp.quantities.iter().sum();
                let total_capacity: f64 = flp.capacities.iter().sum();
                if total_demand > total_capacity {
                    warnings.push(format!(
                        "Total demand {} exceeds total capacity {} (model is infeasible)",
                        total_demand, total_capacity
                    ));
                }

                let missing_pairs = flp.num_demands() * flp.num_facilities()
                    - request.cost_matrix.rows().map(|(_, row)| row.len()).sum::<usize>();
                if missing_pairs > 0 {
                    warnings.push(format!(
                        "{} demand/facility pairs have no cost and are penalized",
                        missing_pairs
                    ));
                }

                report.num_variables = flp.model.num_variables() as u32;
                report.num_constraints = flp.model.num_constraints() as u32;
                report.num_binary_vars = flp.model.num_integer_variables() as u32;
            }
            Ok(None) => warnings.push("Inputs are empty, nothing to solve".to_string()),
            Err(e) => errors.push(e.to_string()),
        }

        for message in &errors {
            warn!(error = %message, "request failed validation");
        }

        report.is_valid = errors.is_empty();
        report.errors = errors;
        report.warnings = warnings;
        report
    }
}
