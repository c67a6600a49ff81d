//! Decodes raw solver output into open facilities and assignments.

use super::model_builder::FlpModel;
use crate::domain::models::SolverOutcome;
use crate::domain::value_objects::SolutionStatus;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// Indicator values above this count as set
pub const INDICATOR_THRESHOLD: f64 = 0.5;

/// Domain result of one solve call
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityLocationSolution {
    /// `None` when no model was built (empty inputs)
    pub status: Option<SolutionStatus>,
    pub open_facilities: Vec<String>,
    /// demand id → facility id
    pub assignments: BTreeMap<String, String>,
    pub solving_time: Duration,
    pub objective_value: Option<f64>,
    pub total_assignment_cost: f64,
    pub total_opening_cost: f64,
    /// facility id → assigned quantity, for every facility in the model
    pub facility_loads: BTreeMap<String, f64>,
}

impl FacilityLocationSolution {
    /// Result for inputs that produced no model.
    pub fn empty() -> Self {
        Self {
            status: None,
            open_facilities: Vec::new(),
            assignments: BTreeMap::new(),
            solving_time: Duration::ZERO,
            objective_value: None,
            total_assignment_cost: 0.0,
            total_opening_cost: 0.0,
            facility_loads: BTreeMap::new(),
        }
    }

    /// Result for an engine run that produced nothing usable.
    pub fn unsolved(status: SolutionStatus, solving_time: Duration) -> Self {
        Self {
            status: Some(status),
            solving_time,
            ..Self::empty()
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.total_assignment_cost + self.total_opening_cost
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn is_open(&self, facility_id: &str) -> bool {
        self.open_facilities.iter().any(|f| f == facility_id)
    }
}

/// Reads a [`SolverOutcome`] back through the index of an [`FlpModel`]
#[derive(Debug, Clone, Copy)]
pub struct SolutionExtractor<'a> {
    flp: &'a FlpModel,
}

impl<'a> SolutionExtractor<'a> {
    pub fn new(flp: &'a FlpModel) -> Self {
        Self { flp }
    }

    pub fn extract(&self, outcome: &SolverOutcome, solving_time: Duration) -> FacilityLocationSolution {
        if !outcome.status.has_incumbent() {
            warn!(status = %outcome.status, message = %outcome.message, "no feasible solution found");
            return FacilityLocationSolution::unsolved(outcome.status, solving_time);
        }

        let flp = self.flp;
        info!(
            status = %outcome.status,
            objective = outcome.objective_value.unwrap_or(f64::NAN),
            "solver finished"
        );

        let open_facilities: Vec<String> = flp
            .open
            .iter()
            .zip(&flp.facility_ids)
            .filter(|(y, _)| outcome.value(**y) > INDICATOR_THRESHOLD)
            .map(|(_, id)| id.clone())
            .collect();

        let mut assignments = BTreeMap::new();
        let mut total_assignment_cost = 0.0;
        let mut loads = vec![0.0; flp.num_facilities()];

        for (d, row) in flp.assign.iter().enumerate() {
            // First facility in iteration order wins; later indicators above the threshold are ignored
            let chosen = row.iter().position(|&x| outcome.value(x) > INDICATOR_THRESHOLD);
            if let Some(f) = chosen {
                let quantity = flp.quantities[d];
                assignments.insert(flp.demand_ids[d].clone(), flp.facility_ids[f].clone());
                total_assignment_cost += flp.unit_costs[d][f] * quantity;
                loads[f] += quantity;
            }
        }

        let facility_loads = flp.facility_ids.iter().cloned().zip(loads).collect();
        let total_opening_cost = open_facilities.len() as f64 * flp.opening_cost;

        info!(
            total_assignment_cost,
            total_opening_cost,
            total_cost = total_assignment_cost + total_opening_cost,
            open = open_facilities.len(),
            assigned = assignments.len(),
            "solution extracted"
        );

        FacilityLocationSolution {
            status: Some(outcome.status),
            open_facilities,
            assignments,
            solving_time,
            objective_value: outcome.objective_value,
            total_assignment_cost,
            total_opening_cost,
            facility_loads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::model_builder::{DemandQuantities, FacilityCapacities, FlpModelBuilder};
    use crate::spatial::CostMatrix;

    fn two_by_two() -> FlpModel {
        let matrix = CostMatrix::from_json_str(
            r#"{"PRAC1": {"F_A": 10, "F_B": 20}, "PRAC2": {"F_A": 5, "F_B": 12}}"#,
        )
        .unwrap();
        let capacities: FacilityCapacities =
            [("F_A".to_string(), 2.0), ("F_B".to_string(), 1.0)].into_iter().collect();
        let quantities: DemandQuantities =
            [("PRAC1".to_string(), 1.0), ("PRAC2".to_string(), 2.0)].into_iter().collect();
        FlpModelBuilder::new(&matrix, &capacities, &quantities)
            .opening_cost(1.0)
            .build()
            .unwrap()
            .unwrap()
    }

    fn outcome(flp: &FlpModel, status: SolutionStatus, set: &[(usize, usize)], open: &[usize]) -> SolverOutcome {
        let mut values = vec![0.0; flp.model.num_variables()];
        for &(d, f) in set {
            values[flp.assign[d][f].index()] = 1.0;
        }
        for &f in open {
            values[flp.open[f].index()] = 1.0;
        }
        let objective = flp.model.objective.evaluate(&values);
        SolverOutcome::with_values(status, objective, values)
    }

    #[test]
    fn reads_open_facilities_assignments_and_costs() {
        let flp = two_by_two();
        let raw = outcome(&flp, SolutionStatus::Optimal, &[(0, 0), (1, 1)], &[0, 1]);

        let solution = SolutionExtractor::new(&flp).extract(&raw, Duration::from_millis(12));
        assert_eq!(solution.status, Some(SolutionStatus::Optimal));
        assert_eq!(solution.open_facilities, vec!["F_A", "F_B"]);
        assert_eq!(solution.assignments["PRAC1"], "F_A");
        assert_eq!(solution.assignments["PRAC2"], "F_B");
        // 10·1 + 12·2
        assert_eq!(solution.total_assignment_cost, 34.0);
        assert_eq!(solution.total_opening_cost, 2.0);
        assert_eq!(solution.total_cost(), 36.0);
        assert_eq!(solution.facility_loads["F_B"], 2.0);
        assert_eq!(solution.solving_time, Duration::from_millis(12));
    }

    #[test]
    fn fractional_values_are_rounded_at_the_threshold() {
        let flp = two_by_two();
        let mut raw = outcome(&flp, SolutionStatus::TimeLimit, &[], &[]);
        raw.variable_values[flp.open[0].index()] = 0.51;
        raw.variable_values[flp.open[1].index()] = 0.49;
        raw.variable_values[flp.assign[0][0].index()] = 0.9999;

        let solution = SolutionExtractor::new(&flp).extract(&raw, Duration::ZERO);
        assert_eq!(solution.open_facilities, vec!["F_A"]);
        assert_eq!(solution.assignments.len(), 1);
        assert_eq!(solution.assignments["PRAC1"], "F_A");
    }

    #[test]
    fn first_matching_facility_wins_under_numerical_slack() {
        let flp = two_by_two();
        let raw = outcome(&flp, SolutionStatus::TimeLimit, &[(0, 0), (0, 1)], &[0, 1]);

        let solution = SolutionExtractor::new(&flp).extract(&raw, Duration::ZERO);
        assert_eq!(solution.assignments["PRAC1"], "F_A");
        assert_eq!(solution.facility_loads["F_A"], 1.0);
        assert_eq!(solution.facility_loads["F_B"], 0.0);
    }

    #[test]
    fn non_success_status_gives_empty_result_with_time() {
        let flp = two_by_two();
        for status in [SolutionStatus::Infeasible, SolutionStatus::Unbounded, SolutionStatus::Error] {
            let raw = SolverOutcome::new(status, "nothing");
            let solution = SolutionExtractor::new(&flp).extract(&raw, Duration::from_secs(3));
            assert_eq!(solution.status, Some(status));
            assert!(solution.open_facilities.is_empty());
            assert!(solution.assignments.is_empty());
            assert_eq!(solution.solving_time, Duration::from_secs(3));
        }
    }

    #[test]
    fn time_limit_without_incumbent_assigns_nothing() {
        let flp = two_by_two();
        let raw = SolverOutcome::new(SolutionStatus::TimeLimit, "no incumbent");
        let solution = SolutionExtractor::new(&flp).extract(&raw, Duration::from_secs(1));
        assert_eq!(solution.status, Some(SolutionStatus::TimeLimit));
        assert!(solution.is_empty());
    }
}
