// HiGHS Solver Adapter
// Translates the domain OptimizationModel into a HiGHS row problem

use crate::domain::{
    models::{OptimizationModel, SolverOutcome, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, SolutionStatus, VariableType},
};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct HighsSolver {
    verbose: bool,
}

impl HighsSolver {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Let HiGHS print its own progress log
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn map_status(status: &HighsModelStatus) -> SolutionStatus {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolutionStatus::Optimal,
        HighsModelStatus::ReachedTimeLimit => SolutionStatus::TimeLimit,
        // Presolve stops at UnboundedOrInfeasible; location models are bounded, so it is infeasibility
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            SolutionStatus::Infeasible
        }
        HighsModelStatus::Unbounded => SolutionStatus::Unbounded,
        _ => SolutionStatus::Error,
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, model: &OptimizationModel, time_limit: Duration) -> Result<SolverOutcome> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        let mut pb = RowProblem::default();

        // Add variables with their objective coefficients
        let cols: Vec<Col> = model
            .variables
            .iter()
            .zip(&model.objective.coefficients)
            .map(|(var_def, &obj_coeff)| match var_def.variable_type {
                VariableType::Binary => pb.add_integer_column(obj_coeff, 0.0..=1.0),
                VariableType::Continuous => {
                    pb.add_column(obj_coeff, var_def.lower_bound..=var_def.upper_bound)
                }
            })
            .collect();

        // Add constraints
        for constraint in &model.constraints {
            let terms: Vec<(Col, f64)> = constraint
                .expression
                .terms
                .iter()
                .filter(|(_, coeff)| *coeff != 0.0)
                .map(|(var, coeff)| (cols[var.index()], *coeff))
                .collect();

            let bound = constraint.bound;
            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(bound..=bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(bound.., &terms);
                }
            }
        }

        let mut highs_model = pb.optimise(Sense::Minimise);
        highs_model.set_option("time_limit", time_limit.as_secs_f64());
        highs_model.set_option("output_flag", self.verbose);

        let solved = highs_model.solve();
        let statistics = SolverStatistics::for_model(model, start_time.elapsed());
        let raw_status = solved.status();
        debug!(?raw_status, "HiGHS returned");

        let status = map_status(&raw_status);
        let outcome = if status.has_incumbent() {
            let variable_values = solved.get_solution().columns().to_vec();
            if variable_values.len() != model.num_variables() {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS returned {} column values for {} variables",
                    variable_values.len(),
                    model.num_variables()
                )));
            }
            let objective = model.objective.evaluate(&variable_values);
            SolverOutcome::with_values(status, objective, variable_values)
                .with_message(format!("{:?} for '{}'", raw_status, model.name))
        } else {
            SolverOutcome::new(status, format!("HiGHS solver returned status: {:?}", raw_status))
        };

        Ok(outcome.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Constraint, LinearExpression, Variable};

    #[test]
    fn solves_a_tiny_knapsack() {
        // min -3a - 2b  s.t.  a + b <= 1
        let mut model = OptimizationModel::new("knapsack");
        let a = model.add_variable(Variable::binary("a"));
        let b = model.add_variable(Variable::binary("b"));
        model.set_objective_coefficient(a, -3.0);
        model.set_objective_coefficient(b, -2.0);
        model.add_constraint(Constraint::leq(
            LinearExpression::new().with_term(a, 1.0).with_term(b, 1.0),
            1.0,
        ));

        let outcome = HighsSolver::new().solve(&model, Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.status, SolutionStatus::Optimal);
        assert!((outcome.value(a) - 1.0).abs() < 1e-6);
        assert!(outcome.value(b).abs() < 1e-6);
        assert!((outcome.objective_value.unwrap() + 3.0).abs() < 1e-6);
        assert_eq!(outcome.statistics.num_binary_vars, 2);
    }

    #[test]
    fn reports_infeasibility_as_status() {
        let mut model = OptimizationModel::new("infeasible");
        let x = model.add_variable(Variable::binary("x"));
        model.add_constraint(Constraint::geq(LinearExpression::new().with_term(x, 1.0), 2.0));

        let outcome = HighsSolver::new().solve(&model, Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.status, SolutionStatus::Infeasible);
        assert!(outcome.variable_values.is_empty());
    }

    #[test]
    fn presolve_infeasibility_is_not_reported_as_unbounded() {
        assert_eq!(
            map_status(&HighsModelStatus::UnboundedOrInfeasible),
            SolutionStatus::Infeasible
        );
        assert_eq!(map_status(&HighsModelStatus::Unbounded), SolutionStatus::Unbounded);
        assert_eq!(map_status(&HighsModelStatus::ReachedTimeLimit), SolutionStatus::TimeLimit);
    }

    #[test]
    fn continuous_variables_respect_bounds() {
        let mut model = OptimizationModel::new("bounded");
        let x = model.add_variable(Variable::continuous("x").with_bounds(2.0, 8.0));
        model.set_objective_coefficient(x, 1.0);

        let outcome = HighsSolver::new().solve(&model, Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.status, SolutionStatus::Optimal);
        assert!((outcome.value(x) - 2.0).abs() < 1e-6);
    }
}
