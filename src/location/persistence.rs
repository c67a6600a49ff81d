//! Serialization boundary for solve results.
//!
//! Values cross this boundary only after [`CanonicalNumber`] has mapped them to
//! plain `f64`, so the written JSON never depends on the in-memory representation.

use super::extractor::FacilityLocationSolution;
use crate::domain::errors::PlannerResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Conversion of domain numeric types into the single number type written to disk
pub trait CanonicalNumber {
    fn canonical(&self) -> f64;
}

impl CanonicalNumber for f64 {
    fn canonical(&self) -> f64 {
        *self
    }
}

impl CanonicalNumber for u32 {
    fn canonical(&self) -> f64 {
        f64::from(*self)
    }
}

impl CanonicalNumber for usize {
    fn canonical(&self) -> f64 {
        *self as f64
    }
}

impl CanonicalNumber for Duration {
    /// Seconds
    fn canonical(&self) -> f64 {
        self.as_secs_f64()
    }
}

/// Full solve result in canonical, serializable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub status: Option<String>,
    pub open_facilities: Vec<String>,
    pub assignments: BTreeMap<String, String>,
    pub solving_time_secs: f64,
    pub objective_value: Option<f64>,
    pub total_assignment_cost: f64,
    pub total_opening_cost: f64,
    pub total_cost: f64,
    pub facility_loads: BTreeMap<String, f64>,
}

impl From<&FacilityLocationSolution> for SolutionRecord {
    fn from(solution: &FacilityLocationSolution) -> Self {
        Self {
            status: solution.status.map(|s| s.to_string()),
            open_facilities: solution.open_facilities.clone(),
            assignments: solution.assignments.clone(),
            solving_time_secs: solution.solving_time.canonical(),
            objective_value: solution
                .objective_value
                .map(|v| v.canonical())
                .filter(|v| v.is_finite()),
            total_assignment_cost: solution.total_assignment_cost.canonical(),
            total_opening_cost: solution.total_opening_cost.canonical(),
            total_cost: solution.total_cost().canonical(),
            facility_loads: solution
                .facility_loads
                .iter()
                .map(|(id, load)| (id.clone(), load.canonical()))
                .collect(),
        }
    }
}

/// What [`persist_assignments`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Nothing to write: the assignment mapping is empty
    Skipped,
    Written,
    /// Writing failed; the error was logged
    Failed,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> PlannerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Writes the demand id → facility id mapping as a JSON object.
pub fn write_assignments(path: impl AsRef<Path>, assignments: &BTreeMap<String, String>) -> PlannerResult<()> {
    write_json(path.as_ref(), assignments)
}

pub fn read_assignments(path: impl AsRef<Path>) -> PlannerResult<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes the full [`SolutionRecord`] of `solution`.
pub fn write_solution_report(path: impl AsRef<Path>, solution: &FacilityLocationSolution) -> PlannerResult<()> {
    write_json(path.as_ref(), &SolutionRecord::from(solution))
}

/// Saves the assignments of `solution` when there are any.
///
/// Failures are logged and reported through the return value; the in-memory
/// solution stays valid either way.
pub fn persist_assignments(solution: &FacilityLocationSolution, path: impl AsRef<Path>) -> PersistOutcome {
    let path = path.as_ref();
    if solution.assignments.is_empty() {
        return PersistOutcome::Skipped;
    }
    match write_assignments(path, &solution.assignments) {
        Ok(()) => {
            info!(path = %path.display(), "assignments saved");
            PersistOutcome::Written
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "error saving assignments");
            PersistOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SolutionStatus;

    fn solved() -> FacilityLocationSolution {
        FacilityLocationSolution {
            status: Some(SolutionStatus::Optimal),
            open_facilities: vec!["F_A".into()],
            assignments: [("PRAC1".to_string(), "F_A".to_string())].into_iter().collect(),
            solving_time: Duration::from_millis(1500),
            objective_value: Some(11.0),
            total_assignment_cost: 10.0,
            total_opening_cost: 1.0,
            facility_loads: [("F_A".to_string(), 1.0)].into_iter().collect(),
        }
    }

    #[test]
    fn record_uses_plain_numbers() {
        let record = SolutionRecord::from(&solved());
        assert_eq!(record.status.as_deref(), Some("optimal"));
        assert_eq!(record.solving_time_secs, 1.5);
        assert_eq!(record.total_cost, 11.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["solving_time_secs"], serde_json::json!(1.5));
        assert_eq!(json["assignments"]["PRAC1"], "F_A");
    }

    #[test]
    fn writes_assignments_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("cflp_assignments.json");

        assert_eq!(persist_assignments(&solved(), &path), PersistOutcome::Written);
        let back = read_assignments(&path).unwrap();
        assert_eq!(back["PRAC1"], "F_A");
    }

    #[test]
    fn empty_assignments_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.json");

        let outcome = persist_assignments(&FacilityLocationSolution::empty(), &path);
        assert_eq!(outcome, PersistOutcome::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten by a file
        let outcome = persist_assignments(&solved(), dir.path());
        assert_eq!(outcome, PersistOutcome::Failed);
    }

    #[test]
    fn report_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_solution_report(&path, &solved()).unwrap();

        let record: SolutionRecord = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record, SolutionRecord::from(&solved()));
    }

    #[test]
    fn counts_become_floats() {
        assert_eq!(7usize.canonical(), 7.0);
        assert_eq!(3u32.canonical(), 3.0);
    }
}
