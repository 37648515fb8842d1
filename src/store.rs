// SQLite snapshot of the two input tables.
// `import` writes it once; later runs can load from it instead of the CSVs.

use crate::records::{EmployeeRecord, Gender, ProvinceCoordinate};
use crate::tables::Tables;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            join_year INTEGER NOT NULL,
            province TEXT NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female')),
            department_name TEXT NOT NULL,
            generation TEXT NOT NULL,
            age INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS province_coordinates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            province TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_coordinates_province ON province_coordinates(province)",
        [],
    )?;

    Ok(())
}

/// Replace the snapshot contents with `employees` and `coordinates`.
///
/// Runs in one transaction, so importing the same files twice leaves the
/// same rows behind.
pub fn import_snapshot(
    conn: &mut Connection,
    employees: &[EmployeeRecord],
    coordinates: &[ProvinceCoordinate],
) -> Result<(usize, usize)> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM employees", [])?;
    tx.execute("DELETE FROM province_coordinates", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO employees (join_year, province, gender, department_name, generation, age)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for employee in employees {
            stmt.execute(params![
                employee.join_year,
                employee.province,
                employee.gender.as_str(),
                employee.department_name,
                employee.generation,
                employee.age,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO province_coordinates (province, latitude, longitude)
             VALUES (?1, ?2, ?3)",
        )?;
        for coordinate in coordinates {
            stmt.execute(params![
                coordinate.province,
                coordinate.latitude,
                coordinate.longitude,
            ])?;
        }
    }

    tx.commit().context("Failed to commit snapshot import")?;

    log::info!(
        "Imported snapshot: {} employees, {} province coordinates",
        employees.len(),
        coordinates.len()
    );

    Ok((employees.len(), coordinates.len()))
}

fn parse_gender(value: &str) -> Result<Gender> {
    match value {
        "Male" => Ok(Gender::Male),
        "Female" => Ok(Gender::Female),
        other => Err(anyhow!("Unexpected gender '{}' in snapshot", other)),
    }
}

pub fn load_employees(conn: &Connection) -> Result<Vec<EmployeeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT join_year, province, gender, department_name, generation, age
         FROM employees ORDER BY id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(join_year, province, gender, department_name, generation, age)| {
            Ok(EmployeeRecord {
                join_year,
                province,
                gender: parse_gender(&gender)?,
                department_name,
                generation,
                age,
            })
        })
        .collect()
}

pub fn load_coordinates(conn: &Connection) -> Result<Vec<ProvinceCoordinate>> {
    let mut stmt = conn.prepare(
        "SELECT province, latitude, longitude FROM province_coordinates ORDER BY id",
    )?;

    let coordinates = stmt
        .query_map([], |row| {
            Ok(ProvinceCoordinate {
                province: row.get(0)?,
                latitude: row.get(1)?,
                longitude: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(coordinates)
}

pub fn load_snapshot(conn: &Connection) -> Result<Tables> {
    let employees = load_employees(conn)?;
    let coordinates = load_coordinates(conn)?;

    log::info!(
        "Loaded snapshot: {} employees, {} province coordinates",
        employees.len(),
        coordinates.len()
    );

    Tables::new(employees, coordinates).context("Snapshot cannot back a dashboard")
}

/// Row counts of (employees, province_coordinates).
pub fn verify_counts(conn: &Connection) -> Result<(i64, i64)> {
    let employees: i64 = conn.query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
    let coordinates: i64 =
        conn.query_row("SELECT COUNT(*) FROM province_coordinates", [], |row| row.get(0))?;
    Ok((employees, coordinates))
}
