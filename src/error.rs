use thiserror::Error;

/// Domain failures raised by the aggregation pipeline.
///
/// Empty results and provinces without coordinates are not errors; only
/// inputs that break a selection invariant end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("employee table is empty")]
    EmptyEmployeeTable,

    #[error("department '{0}' is not present in the employee table")]
    UnknownDepartment(String),

    #[error("invalid age range: low bound {low} exceeds high bound {high}")]
    InvertedAgeRange { low: u32, high: u32 },

    #[error("age range [{low}, {high}] lies outside the observed domain [{min}, {max}]")]
    AgeRangeOutOfDomain { low: u32, high: u32, min: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
