//! Pairwise travel cost between demand points and facility sites.

use super::crs::{Crs, Projector};
use super::entity::{
    extract_coordinates, reproject_all, EntityCollection, LocatedEntity, ProjectedCoordinate,
};
use crate::domain::errors::{PlannerError, PlannerResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default attribute holding the entity identifier
pub const DEFAULT_ID_FIELD: &str = "string_id";

/// demand id → facility id → non-negative cost
///
/// Serializes as the nested JSON object used to exchange matrices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostMatrix {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CostMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix from nested rows, rejecting negative or non-finite costs.
    pub fn from_rows(rows: BTreeMap<String, BTreeMap<String, f64>>) -> PlannerResult<Self> {
        let matrix = Self { rows };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn insert(&mut self, demand_id: impl Into<String>, facility_id: impl Into<String>, cost: f64) {
        self.rows
            .entry(demand_id.into())
            .or_default()
            .insert(facility_id.into(), cost);
    }

    pub fn cost(&self, demand_id: &str, facility_id: &str) -> Option<f64> {
        self.rows.get(demand_id)?.get(facility_id).copied()
    }

    pub fn row(&self, demand_id: &str) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(demand_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.rows.iter()
    }

    /// Demand ids, in key order.
    pub fn demand_ids(&self) -> impl Iterator<Item = &String> {
        self.rows.keys()
    }

    /// Union of the facility ids appearing in any row, in key order.
    pub fn facility_ids(&self) -> BTreeSet<&String> {
        self.rows.values().flat_map(|row| row.keys()).collect()
    }

    /// Number of demand rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn validate(&self) -> PlannerResult<()> {
        for (demand_id, row) in &self.rows {
            for (facility_id, &cost) in row {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(PlannerError::InvalidParameter(format!(
                        "cost from '{}' to '{}' must be a non-negative number, got {}",
                        demand_id, facility_id, cost
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> PlannerResult<Self> {
        let matrix: CostMatrix = serde_json::from_str(s)?;
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn to_json_string(&self) -> PlannerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Writes the matrix as JSON, creating parent directories as needed.
    pub fn write(&self, path: impl AsRef<Path>) -> PlannerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Turns two entity layers into a Euclidean [`CostMatrix`] in a metric reference system
#[derive(Debug, Clone)]
pub struct CostMatrixBuilder {
    target_crs: Crs,
    id_field: String,
}

impl Default for CostMatrixBuilder {
    fn default() -> Self {
        Self {
            target_crs: Crs::utm_33n(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl CostMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_crs(mut self, crs: Crs) -> Self {
        self.target_crs = crs;
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn target_crs(&self) -> &Crs {
        &self.target_crs
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Computes the all-pairs distance matrix.
    ///
    /// Empty inputs, or inputs without a single usable coordinate on either side,
    /// give an empty matrix. A missing or repeated identifier is an error.
    pub fn build(&self, demand: &EntityCollection, facilities: &EntityCollection) -> PlannerResult<CostMatrix> {
        if demand.is_empty() || facilities.is_empty() {
            info!(
                demand = demand.len(),
                facilities = facilities.len(),
                "one of the input collections is empty, returning empty cost matrix"
            );
            return Ok(CostMatrix::new());
        }

        let demand_entities = demand.located_entities("demand", &self.id_field)?;
        let facility_entities = facilities.located_entities("facility", &self.id_field)?;

        let (demand_entities, facility_entities) = self.reproject(
            demand_entities,
            demand.crs.as_ref(),
            facility_entities,
            facilities.crs.as_ref(),
        );

        let demand_coords = extract_coordinates("demand", &demand_entities);
        let facility_coords = extract_coordinates("facility", &facility_entities);

        if demand_coords.is_empty() || facility_coords.is_empty() {
            warn!("no valid geometries found, cannot calculate cost matrix");
            return Ok(CostMatrix::new());
        }

        let matrix = euclidean_matrix(&demand_coords, &facility_coords);
        info!(
            demand = demand_coords.len(),
            facilities = facility_coords.len(),
            "cost matrix calculated"
        );
        Ok(matrix)
    }

    /// Reprojects both layers into the target system, or neither of them.
    fn reproject(
        &self,
        demand: Vec<LocatedEntity>,
        demand_crs: Option<&Crs>,
        facilities: Vec<LocatedEntity>,
        facility_crs: Option<&Crs>,
    ) -> (Vec<LocatedEntity>, Vec<LocatedEntity>) {
        let projected = Projector::new(demand_crs, &self.target_crs)
            .and_then(|p| reproject_all(&demand, &p))
            .and_then(|d| {
                let f = Projector::new(facility_crs, &self.target_crs)
                    .and_then(|p| reproject_all(&facilities, &p))?;
                Ok((d, f))
            });

        match projected {
            Ok(pair) => {
                if !self.target_crs.is_metric() {
                    warn!(target = %self.target_crs, "target system is not metric, costs are not in metres");
                }
                info!(target = %self.target_crs, "reprojected input collections");
                pair
            }
            Err(e) => {
                warn!(error = %e, "reprojection failed, using original coordinate reference systems");
                (demand, facilities)
            }
        }
    }
}

fn euclidean_matrix(demand: &[ProjectedCoordinate], facilities: &[ProjectedCoordinate]) -> CostMatrix {
    let mut matrix = CostMatrix::new();
    for d in demand {
        let row: BTreeMap<String, f64> = facilities
            .iter()
            .map(|f| {
                let dx = d.coord.x - f.coord.x;
                let dy = d.coord.y - f.coord.y;
                (f.id.clone(), (dx * dx + dy * dy).sqrt())
            })
            .collect();
        matrix.rows.insert(d.id.clone(), row);
    }
    matrix
}
