use crate::error::{DashboardError, Result};
use crate::records::{EmployeeRecord, ProvinceCoordinate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Observed age bounds of the employee table, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeDomain {
    pub min: u32,
    pub max: u32,
}

impl AgeDomain {
    pub fn clamp(&self, age: u32) -> u32 {
        age.clamp(self.min, self.max)
    }
}

/// The two immutable input tables.
///
/// Built once per process and shared read-only by every pass.
#[derive(Debug, Clone)]
pub struct Tables {
    employees: Vec<EmployeeRecord>,
    coordinates: Vec<ProvinceCoordinate>,
    departments: Vec<String>,
    age_domain: AgeDomain,
}

impl Tables {
    pub fn new(
        employees: Vec<EmployeeRecord>,
        coordinates: Vec<ProvinceCoordinate>,
    ) -> Result<Self> {
        let min = employees.iter().map(|e| e.age).min();
        let max = employees.iter().map(|e| e.age).max();
        let age_domain = match (min, max) {
            (Some(min), Some(max)) => AgeDomain { min, max },
            _ => return Err(DashboardError::EmptyEmployeeTable),
        };

        let departments = employees
            .iter()
            .map(|e| e.department_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Tables {
            employees,
            coordinates,
            departments,
            age_domain,
        })
    }

    pub fn employees(&self) -> &[EmployeeRecord] {
        &self.employees
    }

    pub fn coordinates(&self) -> &[ProvinceCoordinate] {
        &self.coordinates
    }

    /// Distinct department names, ascending.
    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn has_department(&self, department: &str) -> bool {
        self.departments
            .binary_search_by(|d| d.as_str().cmp(department))
            .is_ok()
    }

    pub fn age_domain(&self) -> AgeDomain {
        self.age_domain
    }
}
