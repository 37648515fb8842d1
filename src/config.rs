use crate::records::{load_coordinates_csv, load_employees_csv};
use crate::store::load_snapshot;
use crate::tables::Tables;
use anyhow::{bail, Context, Result};
use clap::Args;
use rusqlite::Connection;
use std::path::PathBuf;

pub const DEFAULT_EMPLOYEES_CSV: &str = "data/employees.csv";
pub const DEFAULT_COORDINATES_CSV: &str = "data/coordinate.csv";

/// Where the dashboard reads its two input tables from.
#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Cleaned employee table (CSV)
    #[arg(long, default_value = DEFAULT_EMPLOYEES_CSV)]
    pub employees: PathBuf,

    /// Province coordinate table (CSV)
    #[arg(long, default_value = DEFAULT_COORDINATES_CSV)]
    pub coordinates: PathBuf,

    /// SQLite snapshot written by `import`; read instead of the CSVs when given
    #[arg(long)]
    pub database: Option<PathBuf>,
}

impl Default for DataArgs {
    fn default() -> Self {
        DataArgs {
            employees: PathBuf::from(DEFAULT_EMPLOYEES_CSV),
            coordinates: PathBuf::from(DEFAULT_COORDINATES_CSV),
            database: None,
        }
    }
}

impl DataArgs {
    /// Load both tables once, from the snapshot if one is configured.
    pub fn load_tables(&self) -> Result<Tables> {
        if let Some(db_path) = &self.database {
            if !db_path.exists() {
                bail!(
                    "Database not found at {}. Run `employee-dashboard import` first.",
                    db_path.display()
                );
            }
            let conn = Connection::open(db_path)
                .with_context(|| format!("Failed to open database {}", db_path.display()))?;
            return load_snapshot(&conn);
        }

        let employees = load_employees_csv(&self.employees)?;
        let coordinates = load_coordinates_csv(&self.coordinates)?;
        Tables::new(employees, coordinates)
            .with_context(|| format!("{} cannot back a dashboard", self.employees.display()))
    }
}
