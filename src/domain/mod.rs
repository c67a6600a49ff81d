// Domain module: solver-agnostic models, value objects and the engine contract

pub mod errors;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use errors::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
