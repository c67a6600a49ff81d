// Spatial preprocessing: reference systems, located entities and the cost matrix

pub mod cost_matrix;
pub mod crs;
pub mod entity;

pub use cost_matrix::{CostMatrix, CostMatrixBuilder, DEFAULT_ID_FIELD};
pub use crs::{Crs, ProjectionError, Projector};
pub use entity::{EntityCollection, EntityGeometry, Feature, LocatedEntity, ProjectedCoordinate};
