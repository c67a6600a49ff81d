// Mappers: Convert between request/response DTOs and domain values
// Keeps the exchange format out of the planning logic

use crate::domain::errors::{PlannerError, PlannerResult};
use crate::infrastructure::PlannerConfig;
use crate::location::{
    DemandQuantities, FacilityCapacities, FacilityLocationSolution, SolutionRecord, SolveParameters,
};
use crate::spatial::CostMatrix;
use serde::{Deserialize, Serialize};

/// Solve request as exchanged with callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub cost_matrix: CostMatrix,
    pub facility_capacities: FacilityCapacities,
    pub demand_quantities: DemandQuantities,
    /// Falls back to the configured opening cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_opening_cost: Option<f64>,
    /// Falls back to the configured time limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<f64>,
}

impl SolveRequest {
    pub fn new(
        cost_matrix: CostMatrix,
        facility_capacities: FacilityCapacities,
        demand_quantities: DemandQuantities,
    ) -> Self {
        Self {
            cost_matrix,
            facility_capacities,
            demand_quantities,
            fixed_opening_cost: None,
            time_limit_secs: None,
        }
    }

    pub fn with_opening_cost(mut self, cost: f64) -> Self {
        self.fixed_opening_cost = Some(cost);
        self
    }

    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }
}

/// Solve response: the canonical solution record plus the engine that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub solver: String,
    #[serde(flatten)]
    pub record: SolutionRecord,
}

/// Outcome of checking a request without solving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_binary_vars: u32,
}

/// Resolve request parameters against configured defaults
pub fn request_to_parameters(request: &SolveRequest, config: &PlannerConfig) -> PlannerResult<SolveParameters> {
    let opening_cost = request.fixed_opening_cost.unwrap_or(config.fixed_opening_cost);
    if !opening_cost.is_finite() || opening_cost < 0.0 {
        return Err(PlannerError::InvalidParameter(format!(
            "fixed opening cost must be a non-negative number, got {}",
            opening_cost
        )));
    }

    let time_limit = match request.time_limit_secs {
        Some(secs) => SolveParameters::time_limit_from_secs(secs)?,
        None => config.time_limit(),
    };

    Ok(SolveParameters::default()
        .with_opening_cost(opening_cost)
        .with_time_limit(time_limit))
}

/// Convert a domain solution to the response DTO
pub fn solution_to_response(solution: &FacilityLocationSolution, solver_name: &str) -> SolveResponse {
    SolveResponse {
        solver: solver_name.to_string(),
        record: SolutionRecord::from(solution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SolutionStatus;
    use std::time::Duration;

    fn request_json() -> &'static str {
        r#"{
            "cost_matrix": {"PRAC1": {"F_A": 10, "F_B": 20}},
            "facility_capacities": {"F_A": 2, "F_B": 1},
            "demand_quantities": {"PRAC1": 1}
        }"#
    }

    #[test]
    fn optional_fields_fall_back_to_config() {
        let request: SolveRequest = serde_json::from_str(request_json()).unwrap();
        assert_eq!(request.cost_matrix.cost("PRAC1", "F_B"), Some(20.0));

        let config = PlannerConfig::default();
        let params = request_to_parameters(&request, &config).unwrap();
        assert_eq!(params.opening_cost, config.fixed_opening_cost);
        assert_eq!(params.time_limit, Duration::from_secs(600));
    }

    #[test]
    fn request_values_override_config() {
        let request: SolveRequest = serde_json::from_str(request_json()).unwrap();
        let request = request.with_opening_cost(1.0).with_time_limit_secs(2.0);

        let params = request_to_parameters(&request, &PlannerConfig::default()).unwrap();
        assert_eq!(params.opening_cost, 1.0);
        assert_eq!(params.time_limit, Duration::from_secs(2));
    }

    #[test]
    fn rejects_invalid_parameters() {
        let request: SolveRequest = serde_json::from_str(request_json()).unwrap();
        let config = PlannerConfig::default();

        let err = request_to_parameters(&request.clone().with_opening_cost(-1.0), &config).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidParameter(_)));

        let err = request_to_parameters(&request.with_time_limit_secs(-5.0), &config).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidParameter(_)));
    }

    #[test]
    fn response_flattens_the_record() {
        let solution = FacilityLocationSolution {
            status: Some(SolutionStatus::Optimal),
            open_facilities: vec!["F_A".into()],
            assignments: [("PRAC1".to_string(), "F_A".to_string())].into_iter().collect(),
            solving_time: Duration::from_millis(250),
            objective_value: Some(11.0),
            total_assignment_cost: 10.0,
            total_opening_cost: 1.0,
            facility_loads: [("F_A".to_string(), 1.0)].into_iter().collect(),
        };

        let response = solution_to_response(&solution, "HiGHS");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["solver"], "HiGHS");
        assert_eq!(json["open_facilities"], serde_json::json!(["F_A"]));
        assert_eq!(json["solving_time_secs"], serde_json::json!(0.25));
        assert_eq!(json["status"], "optimal");
    }
}
