// Application layer: use cases and service orchestration

pub mod mappers;
pub mod service;

pub use mappers::{SolveRequest, SolveResponse, ValidationReport};
pub use service::FacilityLocationService;
