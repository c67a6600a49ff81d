//! Mixed-integer formulation of the capacitated facility location problem.
//!
//! ```text
//! min  Σ_d Σ_f cost(d,f)·q(d)·x(d,f) + Σ_f fixcost·y(f)
//! s.t. Σ_f x(d,f)            = 1            ∀ d
//!      x(d,f) - y(f)        <= 0            ∀ d, f
//!      Σ_d q(d)·x(d,f) - cap(f)·y(f) <= 0   ∀ f
//!      x, y ∈ {0, 1}
//! ```

use crate::domain::errors::{PlannerError, PlannerResult};
use crate::domain::models::{Constraint, LinearExpression, OptimizationModel, VarId, Variable};
use crate::spatial::CostMatrix;
use std::collections::BTreeMap;
use tracing::info;

/// demand id → units of capacity consumed when assigned
pub type DemandQuantities = BTreeMap<String, f64>;

/// facility id → capacity ceiling
pub type FacilityCapacities = BTreeMap<String, f64>;

/// Cost used for a demand/facility pair absent from the cost matrix
pub const MISSING_COST_PENALTY: f64 = 1e9;

/// Default fixed cost of opening one facility
pub const DEFAULT_OPENING_COST: f64 = 0.001;

/// The built model plus the index needed to read a solution back
#[derive(Debug, Clone)]
pub struct FlpModel {
    pub model: OptimizationModel,
    pub demand_ids: Vec<String>,
    pub facility_ids: Vec<String>,
    /// `assign[d][f]` is the assignment indicator of demand `d` to facility `f`
    pub assign: Vec<Vec<VarId>>,
    /// `open[f]` is the open indicator of facility `f`
    pub open: Vec<VarId>,
    /// `unit_costs[d][f]` is the per-unit travel cost (penalty for missing pairs)
    pub unit_costs: Vec<Vec<f64>>,
    pub quantities: Vec<f64>,
    pub capacities: Vec<f64>,
    pub opening_cost: f64,
}

impl FlpModel {
    pub fn num_demands(&self) -> usize {
        self.demand_ids.len()
    }

    pub fn num_facilities(&self) -> usize {
        self.facility_ids.len()
    }
}

/// Builds the CFLP model from a cost matrix and the demand/capacity data
#[derive(Debug, Clone)]
pub struct FlpModelBuilder<'a> {
    cost_matrix: &'a CostMatrix,
    capacities: &'a FacilityCapacities,
    quantities: &'a DemandQuantities,
    opening_cost: f64,
}

impl<'a> FlpModelBuilder<'a> {
    pub fn new(
        cost_matrix: &'a CostMatrix,
        capacities: &'a FacilityCapacities,
        quantities: &'a DemandQuantities,
    ) -> Self {
        Self {
            cost_matrix,
            capacities,
            quantities,
            opening_cost: DEFAULT_OPENING_COST,
        }
    }

    pub fn opening_cost(mut self, cost: f64) -> Self {
        self.opening_cost = cost;
        self
    }

    /// Builds the model, or `None` when there is no demand or no facility.
    ///
    /// Every demand needs a quantity and every facility a capacity; the first
    /// missing one is reported by id.
    pub fn build(&self) -> PlannerResult<Option<FlpModel>> {
        let demand_ids: Vec<String> = self.cost_matrix.demand_ids().cloned().collect();
        let facility_ids: Vec<String> = self.cost_matrix.facility_ids().into_iter().cloned().collect();

        if demand_ids.is_empty() || facility_ids.is_empty() {
            info!("no demand points or facilities found, no model built");
            return Ok(None);
        }

        if !self.opening_cost.is_finite() || self.opening_cost < 0.0 {
            return Err(PlannerError::InvalidParameter(format!(
                "opening cost must be a non-negative number, got {}",
                self.opening_cost
            )));
        }

        let quantities = demand_ids
            .iter()
            .map(|d| {
                let q = *self
                    .quantities
                    .get(d)
                    .ok_or_else(|| PlannerError::MissingDemandQuantity(d.clone()))?;
                if !q.is_finite() || q <= 0.0 {
                    return Err(PlannerError::InvalidParameter(format!(
                        "demand quantity for '{}' must be positive, got {}",
                        d, q
                    )));
                }
                Ok(q)
            })
            .collect::<PlannerResult<Vec<f64>>>()?;

        let capacities = facility_ids
            .iter()
            .map(|f| {
                let c = *self
                    .capacities
                    .get(f)
                    .ok_or_else(|| PlannerError::MissingCapacity(f.clone()))?;
                if !c.is_finite() || c < 0.0 {
                    return Err(PlannerError::InvalidParameter(format!(
                        "capacity for '{}' must be a non-negative number, got {}",
                        f, c
                    )));
                }
                Ok(c)
            })
            .collect::<PlannerResult<Vec<f64>>>()?;

        let unit_costs: Vec<Vec<f64>> = demand_ids
            .iter()
            .map(|d| {
                facility_ids
                    .iter()
                    .map(|f| self.cost_matrix.cost(d, f).unwrap_or(MISSING_COST_PENALTY))
                    .collect()
            })
            .collect();

        let mut model = OptimizationModel::new("flp");

        let assign: Vec<Vec<VarId>> = demand_ids
            .iter()
            .map(|d| {
                facility_ids
                    .iter()
                    .map(|f| model.add_variable(Variable::binary(format!("x_{}_{}", d, f))))
                    .collect()
            })
            .collect();
        let open: Vec<VarId> = facility_ids
            .iter()
            .map(|f| model.add_variable(Variable::binary(format!("y_{}", f))))
            .collect();

        // Objective
        for (d, row) in assign.iter().enumerate() {
            for (f, &x) in row.iter().enumerate() {
                model.set_objective_coefficient(x, unit_costs[d][f] * quantities[d]);
            }
        }
        for &y in &open {
            model.set_objective_coefficient(y, self.opening_cost);
        }

        // Each demand is served by exactly one facility
        for (d, row) in assign.iter().enumerate() {
            let expr: LinearExpression = row.iter().map(|&x| (x, 1.0)).collect();
            model.add_constraint(Constraint::eq(expr, 1.0).with_name(format!("assign_{}", demand_ids[d])));
        }

        // Only open facilities serve demand
        for (d, row) in assign.iter().enumerate() {
            for (f, &x) in row.iter().enumerate() {
                let expr = LinearExpression::new().with_term(x, 1.0).with_term(open[f], -1.0);
                model.add_constraint(
                    Constraint::leq(expr, 0.0)
                        .with_name(format!("link_{}_{}", demand_ids[d], facility_ids[f])),
                );
            }
        }

        // Served quantity stays within capacity while open
        for (f, &y) in open.iter().enumerate() {
            let mut expr: LinearExpression = assign
                .iter()
                .zip(&quantities)
                .map(|(row, &q)| (row[f], q))
                .collect();
            expr.add_term(y, -capacities[f]);
            model.add_constraint(
                Constraint::leq(expr, 0.0).with_name(format!("capacity_{}", facility_ids[f])),
            );
        }

        info!(
            demands = demand_ids.len(),
            facilities = facility_ids.len(),
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "facility location model built"
        );

        Ok(Some(FlpModel {
            model,
            demand_ids,
            facility_ids,
            assign,
            open,
            unit_costs,
            quantities,
            capacities,
            opening_cost: self.opening_cost,
        }))
    }
}
