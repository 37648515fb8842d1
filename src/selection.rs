use crate::error::{DashboardError, Result};
use crate::tables::{AgeDomain, Tables};
use serde::Serialize;

/// Age range the slider starts at before clamping.
pub const DEFAULT_AGE_RANGE: (u32, u32) = (20, 50);

/// Inclusive age bounds, `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeRange {
    low: u32,
    high: u32,
}

impl AgeRange {
    /// Clamp both bounds into `domain`, rejecting an inverted range.
    pub fn clamped(low: u32, high: u32, domain: AgeDomain) -> Result<Self> {
        if low > high {
            return Err(DashboardError::InvertedAgeRange { low, high });
        }
        Ok(AgeRange {
            low: domain.clamp(low),
            high: domain.clamp(high),
        })
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    pub fn contains(&self, age: u32) -> bool {
        self.low <= age && age <= self.high
    }
}

/// Current value of both dashboard inputs.
///
/// Only built through constructors that check it against the tables, so a
/// pass never sees an unknown department or an out-of-domain range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    department: String,
    age_range: AgeRange,
}

impl SelectionState {
    pub fn new(tables: &Tables, department: &str, low: u32, high: u32) -> Result<Self> {
        if !tables.has_department(department) {
            return Err(DashboardError::UnknownDepartment(department.to_string()));
        }
        Ok(SelectionState {
            department: department.to_string(),
            age_range: AgeRange::clamped(low, high, tables.age_domain())?,
        })
    }

    /// First department in ascending order and the default age range.
    pub fn default_for(tables: &Tables) -> Self {
        let (low, high) = DEFAULT_AGE_RANGE;
        let domain = tables.age_domain();
        SelectionState {
            // Tables guarantees at least one employee, hence one department
            department: tables.departments()[0].clone(),
            age_range: AgeRange {
                low: domain.clamp(low),
                high: domain.clamp(high),
            },
        }
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn age_range(&self) -> AgeRange {
        self.age_range
    }

    pub fn with_department(&self, tables: &Tables, department: &str) -> Result<Self> {
        SelectionState::new(tables, department, self.age_range.low, self.age_range.high)
    }

    pub fn with_age_range(&self, tables: &Tables, low: u32, high: u32) -> Result<Self> {
        SelectionState::new(tables, &self.department, low, high)
    }

    /// Re-check against `tables`, which may not be the tables this
    /// selection was built from.
    pub fn validate(&self, tables: &Tables) -> Result<()> {
        if !tables.has_department(&self.department) {
            return Err(DashboardError::UnknownDepartment(self.department.clone()));
        }

        let AgeRange { low, high } = self.age_range;
        if low > high {
            return Err(DashboardError::InvertedAgeRange { low, high });
        }

        let domain = tables.age_domain();
        if low < domain.min || high > domain.max {
            return Err(DashboardError::AgeRangeOutOfDomain {
                low,
                high,
                min: domain.min,
                max: domain.max,
            });
        }

        Ok(())
    }

    /// Build without any checks, for exercising `validate`.
    #[cfg(test)]
    pub(crate) fn unchecked(department: &str, low: u32, high: u32) -> Self {
        SelectionState {
            department: department.to_string(),
            age_range: AgeRange { low, high },
        }
    }
}
