use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Gender as recorded in the cleaned employee dataset.
///
/// Declaration order matters: `Ord` puts `Female` before `Male`, which is
/// the column order of the department × gender cross-tabulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per employee. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub join_year: i32,
    pub province: String,
    pub gender: Gender,
    pub department_name: String,
    pub generation: String,
    pub age: u32,
}

/// Map position of a province, joined to employees by exact name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceCoordinate {
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub fn load_employees_csv(csv_path: &Path) -> Result<Vec<EmployeeRecord>> {
    let rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open employee CSV {}", csv_path.display()))?;
    let employees = read_employees(rdr)?;

    log::info!(
        "Loaded {} employee records from {}",
        employees.len(),
        csv_path.display()
    );

    Ok(employees)
}

pub fn load_coordinates_csv(csv_path: &Path) -> Result<Vec<ProvinceCoordinate>> {
    let rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open coordinate CSV {}", csv_path.display()))?;
    let coordinates = read_coordinates(rdr)?;

    log::info!(
        "Loaded {} province coordinates from {}",
        coordinates.len(),
        csv_path.display()
    );

    Ok(coordinates)
}

pub fn read_employees<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<EmployeeRecord>> {
    let mut employees = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        // +2: header row, 1-based lines
        let record: EmployeeRecord = result
            .with_context(|| format!("Failed to deserialize employee on line {}", line + 2))?;
        employees.push(record);
    }

    Ok(employees)
}

pub fn read_coordinates<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<ProvinceCoordinate>> {
    let mut coordinates = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let coordinate: ProvinceCoordinate = result
            .with_context(|| format!("Failed to deserialize coordinate on line {}", line + 2))?;
        coordinates.push(coordinate);
    }

    Ok(coordinates)
}
