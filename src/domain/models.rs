use super::value_objects::{ConstraintType, SolutionStatus, VariableType};
use std::time::Duration;

/// Handle to a variable inside an [`OptimizationModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Decision variable in an optimization model
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub name: String,
}

impl Variable {
    /// Non-negative continuous variable; tighten with [`Variable::with_bounds`]
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: 1.0,
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.variable_type, VariableType::Binary)
    }
}

/// Sparse linear combination of model variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    pub terms: Vec<(VarId, f64)>,
}

impl LinearExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression against a dense vector of variable values.
    /// Variables without a value count as zero.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values.get(var.0).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpression {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Linear constraint `expression (<=|=|>=) bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expression: LinearExpression,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expression: LinearExpression, bound: f64) -> Self {
        Self {
            constraint_type,
            expression,
            bound,
            name: String::new(),
        }
    }

    pub fn leq(expression: LinearExpression, bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, expression, bound)
    }

    pub fn eq(expression: LinearExpression, bound: f64) -> Self {
        Self::new(ConstraintType::Equal, expression, bound)
    }

    pub fn geq(expression: LinearExpression, bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, expression, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Minimization objective, stored densely: one coefficient per variable
#[derive(Debug, Clone, Default)]
pub struct ObjectiveFunction {
    pub coefficients: Vec<f64>,
}

impl ObjectiveFunction {
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.coefficients.get(var.0).copied().unwrap_or(0.0)
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coeff, value)| coeff * value)
            .sum()
    }
}

/// Complete minimization model handed to a solver engine.
///
/// Variables are added first and referenced through the returned [`VarId`];
/// the objective and constraints only ever refer to variables of the same model.
#[derive(Debug, Clone, Default)]
pub struct OptimizationModel {
    pub name: String,
    pub variables: Vec<Variable>,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
}

impl OptimizationModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        self.objective.coefficients.push(0.0);
        VarId(self.variables.len() - 1)
    }

    /// Adds `expression` to the objective. Repeated variables accumulate.
    pub fn add_objective(&mut self, expression: &LinearExpression) {
        for &(var, coeff) in &expression.terms {
            if let Some(slot) = self.objective.coefficients.get_mut(var.0) {
                *slot += coeff;
            }
        }
    }

    pub fn set_objective_coefficient(&mut self, var: VarId, coefficient: f64) {
        if let Some(slot) = self.objective.coefficients.get_mut(var.0) {
            *slot = coefficient;
        }
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time: Duration,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_model(model: &OptimizationModel, solve_time: Duration) -> Self {
        Self {
            solve_time,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_binary_vars: model.num_integer_variables() as u32,
        }
    }
}

/// Raw result of a solver run: status plus one value per model variable
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl SolverOutcome {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_values(
        status: SolutionStatus,
        objective_value: f64,
        variable_values: Vec<f64>,
    ) -> Self {
        Self {
            status,
            objective_value: Some(objective_value),
            variable_values,
            message: String::new(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Value of `var` in this outcome; zero when the engine reported none.
    pub fn value(&self, var: VarId) -> f64 {
        self.variable_values.get(var.0).copied().unwrap_or(0.0)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
