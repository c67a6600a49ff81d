// Domain service interface for MILP engines
// The facility location formulation only talks to this trait, so any MILP-capable backend can be plugged in

use super::models::{OptimizationModel, SolverOutcome};
use std::time::Duration;

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// `solve` blocks until the engine terminates, which is bounded by `time_limit`.
/// Non-success terminal states (infeasible, time limit without incumbent, ...) are
/// reported through [`SolverOutcome::status`], not as errors.
pub trait SolverService: Send + Sync {
    /// Solve a minimization model within the given wall-clock budget
    fn solve(&self, model: &OptimizationModel, time_limit: Duration) -> Result<SolverOutcome>;

    /// Validate a model without solving it
    fn validate(&self, model: &OptimizationModel) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = model.num_variables();

        if model.objective.coefficients.len() != num_vars {
            errors.push(format!(
                "Objective has {} coefficients but model has {} variables",
                model.objective.coefficients.len(),
                num_vars
            ));
        }

        if let Some(i) = model.objective.coefficients.iter().position(|c| !c.is_finite()) {
            errors.push(format!("Objective coefficient {} is not finite", i));
        }

        for (i, constraint) in model.constraints.iter().enumerate() {
            if !constraint.bound.is_finite() {
                errors.push(format!("Constraint {} '{}' has a non-finite bound", i, constraint.name));
            }
            for (var, coeff) in &constraint.expression.terms {
                if var.index() >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references variable {} but model has {} variables",
                        i,
                        constraint.name,
                        var.index(),
                        num_vars
                    ));
                }
                if !coeff.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has a non-finite coefficient",
                        i, constraint.name
                    ));
                }
            }
        }

        for (i, var) in model.variables.iter().enumerate() {
            if var.lower_bound > var.upper_bound {
                errors.push(format!(
                    "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                    i, var.name, var.lower_bound, var.upper_bound
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;
}
