use crate::domain::{
    models::{OptimizationModel, SolverOutcome, SolverStatistics},
    solver_service::{Result, SolverService},
    value_objects::{ConstraintType, SolutionStatus, VariableType},
};
use good_lp::{
    solvers::{coin_cbc, SolutionStatus as CbcStatus, WithTimeLimit},
    variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable as GoodLpVariable,
};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct CoinCbcSolver {
    verbose: bool,
}

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, model: &OptimizationModel, time_limit: Duration) -> Result<SolverOutcome> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Build variables using good_lp
        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> = model
            .variables
            .iter()
            .map(|var_def| match var_def.variable_type {
                VariableType::Binary => vars.add(variable().binary().name(var_def.name.clone())),
                VariableType::Continuous => vars.add(
                    variable()
                        .min(var_def.lower_bound)
                        .max(var_def.upper_bound)
                        .name(var_def.name.clone()),
                ),
            })
            .collect();

        let mut obj_expr: Expression = 0.into();
        for (var, &coeff) in lp_variables.iter().zip(&model.objective.coefficients) {
            if coeff != 0.0 {
                obj_expr += coeff * *var;
            }
        }

        let mut lp_model = vars
            .minimise(obj_expr)
            .using(coin_cbc::coin_cbc)
            .with_time_limit(time_limit.as_secs_f64());
        lp_model.set_parameter("logLevel", if self.verbose { "1" } else { "0" });

        for constraint in &model.constraints {
            let mut lhs: Expression = 0.into();
            for (var, coeff) in &constraint.expression.terms {
                if *coeff != 0.0 {
                    lhs += *coeff * lp_variables[var.index()];
                }
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        let solution_result = lp_model.solve();
        let statistics = SolverStatistics::for_model(model, start_time.elapsed());

        let outcome = match solution_result {
            Ok(sol) => {
                let status = match sol.status() {
                    CbcStatus::TimeLimit => SolutionStatus::TimeLimit,
                    _ => SolutionStatus::Optimal,
                };
                let variable_values: Vec<f64> = lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective = model.objective.evaluate(&variable_values);
                SolverOutcome::with_values(status, objective, variable_values)
                    .with_message(format!("{} solution found for '{}'", status, model.name))
            }
            Err(ResolutionError::Infeasible) => SolverOutcome::new(
                SolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => SolverOutcome::new(
                SolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            Err(e) => {
                debug!(error = ?e, "CBC failed");
                SolverOutcome::new(SolutionStatus::Error, format!("CBC failed: {}", e))
            }
        };

        Ok(outcome.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}
