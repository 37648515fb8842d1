// Employee Demography Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod aggregation;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod records;
pub mod selection;
pub mod store;
pub mod tables;

// Re-export commonly used types
pub use aggregation::{
    compute_all, gender_by_department, generation_breakdown, joining_frequency,
    province_distribution, DashboardPass, DepartmentGenderCount, GenerationCount, JoinCount,
    ProvinceCount,
};
pub use charts::{ChartKind, ChartSpec, DashboardCharts};
pub use config::DataArgs;
pub use dashboard::{Dashboard, InputEvent};
pub use error::DashboardError;
pub use records::{
    load_coordinates_csv, load_employees_csv, EmployeeRecord, Gender, ProvinceCoordinate,
};
pub use selection::{AgeRange, SelectionState, DEFAULT_AGE_RANGE};
pub use store::{import_snapshot, load_snapshot, setup_database, verify_counts};
pub use tables::{AgeDomain, Tables};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
