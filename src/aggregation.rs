// Aggregation stage: four pure derivations over the employee table.
//
// Every pass recomputes all of them from the immutable tables. Groups are
// collected in ordered maps so row order is a function of the input alone,
// and keys with no matching records never produce a row.

use crate::charts::{dashboard_charts, DashboardCharts};
use crate::error::Result;
use crate::records::{EmployeeRecord, Gender, ProvinceCoordinate};
use crate::selection::{AgeRange, SelectionState};
use crate::tables::Tables;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// DERIVED ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinCount {
    pub join_year: i32,
    pub join_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceCount {
    pub province: String,
    pub male: usize,
    pub female: usize,
    /// Always `male + female`.
    pub total: usize,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationCount {
    pub generation: String,
    pub num_people: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentGenderCount {
    pub department_name: String,
    pub gender: Gender,
    pub num_people: usize,
}

// ============================================================================
// DERIVATIONS
// ============================================================================

/// Hires per join year, ascending by year.
pub fn joining_frequency(employees: &[EmployeeRecord]) -> Vec<JoinCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();

    for employee in employees {
        *counts.entry(employee.join_year).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(join_year, join_count)| JoinCount {
            join_year,
            join_count,
        })
        .collect()
}

/// Male/female head count per province, inner-joined with coordinates.
///
/// Provinces without a coordinate row are dropped. When a province is
/// listed more than once in `coordinates` the first listing is used.
pub fn province_distribution(
    employees: &[EmployeeRecord],
    coordinates: &[ProvinceCoordinate],
) -> Vec<ProvinceCount> {
    let mut by_province: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for employee in employees {
        let entry = by_province
            .entry(employee.province.as_str())
            .or_insert((0, 0));
        match employee.gender {
            Gender::Male => entry.0 += 1,
            Gender::Female => entry.1 += 1,
        }
    }

    let mut lookup: HashMap<&str, &ProvinceCoordinate> = HashMap::new();
    for coordinate in coordinates {
        lookup.entry(coordinate.province.as_str()).or_insert(coordinate);
    }

    by_province
        .into_iter()
        .filter_map(|(province, (male, female))| {
            let Some(coordinate) = lookup.get(province) else {
                log::debug!("Dropping province '{}' from map: no coordinates", province);
                return None;
            };
            Some(ProvinceCount {
                province: province.to_string(),
                male,
                female,
                total: male + female,
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            })
        })
        .collect()
}

/// Head count per generation inside one department, ascending by generation.
pub fn generation_breakdown(employees: &[EmployeeRecord], department: &str) -> Vec<GenerationCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for employee in employees.iter().filter(|e| e.department_name == department) {
        *counts.entry(employee.generation.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(generation, num_people)| GenerationCount {
            generation: generation.to_string(),
            num_people,
        })
        .collect()
}

/// Department × gender head count for employees inside `age_range`, in long
/// form, ascending by count.
///
/// The cross-tabulation spans the departments and genders present in the
/// filtered subset, so a department missing one gender still gets a zero row
/// for it while a department missing entirely gets none. Before sorting the
/// rows are gender-major with departments ascending; the sort is stable, so
/// that order breaks ties.
pub fn gender_by_department(
    employees: &[EmployeeRecord],
    age_range: AgeRange,
) -> Vec<DepartmentGenderCount> {
    let mut cells: BTreeMap<(&str, Gender), usize> = BTreeMap::new();
    let mut departments: BTreeSet<&str> = BTreeSet::new();
    let mut genders: BTreeSet<Gender> = BTreeSet::new();

    for employee in employees.iter().filter(|e| age_range.contains(e.age)) {
        let department = employee.department_name.as_str();
        departments.insert(department);
        genders.insert(employee.gender);
        *cells.entry((department, employee.gender)).or_insert(0) += 1;
    }

    let mut rows: Vec<DepartmentGenderCount> = genders
        .iter()
        .flat_map(|&gender| {
            let cells = &cells;
            departments.iter().map(move |&department| DepartmentGenderCount {
                department_name: department.to_string(),
                gender,
                num_people: cells.get(&(department, gender)).copied().unwrap_or(0),
            })
        })
        .collect();

    rows.sort_by_key(|row| row.num_people);
    rows
}

// ============================================================================
// WHOLE PASS
// ============================================================================

/// Everything one pass produces, tied to the selection it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPass {
    pub selection: SelectionState,
    pub joining: Vec<JoinCount>,
    pub provinces: Vec<ProvinceCount>,
    pub generations: Vec<GenerationCount>,
    pub gender_by_department: Vec<DepartmentGenderCount>,
    pub charts: DashboardCharts,
}

impl DashboardPass {
    /// SHA-256 over the JSON form of the pass.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Run every derivation from scratch for `selection`.
pub fn compute_all(tables: &Tables, selection: &SelectionState) -> Result<DashboardPass> {
    selection.validate(tables)?;

    let employees = tables.employees();
    let pass = DashboardPass {
        selection: selection.clone(),
        joining: joining_frequency(employees),
        provinces: province_distribution(employees, tables.coordinates()),
        generations: generation_breakdown(employees, selection.department()),
        gender_by_department: gender_by_department(employees, selection.age_range()),
        charts: dashboard_charts(selection),
    };

    log::info!(
        "Computed pass for department '{}', ages {}-{}: {} years, {} provinces, {} generations, {} department/gender rows",
        selection.department(),
        selection.age_range().low(),
        selection.age_range().high(),
        pass.joining.len(),
        pass.provinces.len(),
        pass.generations.len(),
        pass.gender_by_department.len(),
    );

    Ok(pass)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::tables::fixtures::*;
    use crate::tables::AgeDomain;

    fn range(low: u32, high: u32) -> AgeRange {
        AgeRange::clamped(low, high, AgeDomain { min: 0, max: 120 }).unwrap()
    }

    fn larger_employees() -> Vec<EmployeeRecord> {
        vec![
            employee(2015, "Jakarta", Gender::Male, "Sales", "Gen X", 48),
            employee(2015, "Bandung", Gender::Female, "IT", "Millenials", 29),
            employee(2017, "Jakarta", Gender::Female, "IT", "Gen Z", 22),
            employee(2017, "Jakarta", Gender::Male, "IT", "Millenials", 33),
            employee(2017, "Bali", Gender::Female, "Finance", "Boomers", 61),
            employee(2019, "Bandung", Gender::Male, "Sales", "Gen Z", 19),
            employee(2019, "Bandung", Gender::Male, "Sales", "Millenials", 35),
            employee(2022, "Surabaya", Gender::Female, "Finance", "Millenials", 38),
        ]
    }

    #[test]
    fn test_worked_example() {
        let employees = example_employees();
        let coordinates = example_coordinates();

        assert_eq!(
            joining_frequency(&employees),
            vec![
                JoinCount { join_year: 2020, join_count: 2 },
                JoinCount { join_year: 2021, join_count: 1 },
            ]
        );

        let provinces = province_distribution(&employees, &coordinates);
        assert_eq!(provinces.len(), 1, "Bali has no coordinates");
        assert_eq!(provinces[0].province, "Jakarta");
        assert_eq!((provinces[0].male, provinces[0].female, provinces[0].total), (1, 1, 2));
        assert_eq!((provinces[0].latitude, provinces[0].longitude), (-6.2, 106.8));

        assert_eq!(
            generation_breakdown(&employees, "Sales"),
            vec![GenerationCount { generation: "Millenials".to_string(), num_people: 2 }]
        );

        let rows = gender_by_department(&employees, range(20, 50));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.department_name == "Sales" && r.num_people == 1));
        assert!(rows.iter().any(|r| r.gender == Gender::Male));
        assert!(rows.iter().any(|r| r.gender == Gender::Female));
    }

    #[test]
    fn test_joining_frequency_has_gaps_not_zero_rows() {
        let years: Vec<i32> = joining_frequency(&larger_employees())
            .iter()
            .map(|j| j.join_year)
            .collect();
        assert_eq!(years, vec![2015, 2017, 2019, 2022]);
    }

    #[test]
    fn test_province_total_is_male_plus_female() {
        let coordinates = vec![
            coordinate("Jakarta", -6.2, 106.8),
            coordinate("Bandung", -6.9, 107.6),
            coordinate("Bali", -8.4, 115.2),
            coordinate("Surabaya", -7.3, 112.7),
        ];
        let provinces = province_distribution(&larger_employees(), &coordinates);

        assert_eq!(provinces.len(), 4);
        for row in &provinces {
            assert_eq!(row.total, row.male + row.female, "{}", row.province);
        }
        let names: Vec<&str> = provinces.iter().map(|p| p.province.as_str()).collect();
        assert_eq!(names, vec!["Bali", "Bandung", "Jakarta", "Surabaya"]);
    }

    #[test]
    fn test_province_join_is_inner() {
        let coordinates = vec![
            coordinate("Jakarta", -6.2, 106.8),
            coordinate("Papua", -4.2, 138.0),
        ];
        let provinces = province_distribution(&larger_employees(), &coordinates);

        // Papua has coordinates but no employees; the rest have no coordinates
        assert_eq!(provinces.len(), 1);
        assert_eq!(provinces[0].province, "Jakarta");
        assert_eq!(provinces[0].total, 3);
    }

    #[test]
    fn test_duplicate_coordinate_first_wins() {
        let coordinates = vec![
            coordinate("Jakarta", -6.2, 106.8),
            coordinate("Jakarta", 0.0, 0.0),
        ];
        let provinces = province_distribution(&example_employees(), &coordinates);
        assert_eq!(provinces.len(), 1);
        assert_eq!(provinces[0].latitude, -6.2);
    }

    #[test]
    fn test_generation_breakdown_filters_department() {
        let generations = generation_breakdown(&larger_employees(), "IT");
        assert_eq!(
            generations,
            vec![
                GenerationCount { generation: "Gen Z".to_string(), num_people: 1 },
                GenerationCount { generation: "Millenials".to_string(), num_people: 2 },
            ]
        );
    }

    #[test]
    fn test_generation_breakdown_unknown_department_is_empty() {
        assert!(generation_breakdown(&larger_employees(), "Legal").is_empty());
    }

    #[test]
    fn test_gender_by_department_inclusive_bounds() {
        // 29 and 48 sit exactly on the bounds
        let rows = gender_by_department(&larger_employees(), range(29, 48));
        let counted: usize = rows.iter().map(|r| r.num_people).sum();
        let expected = larger_employees()
            .iter()
            .filter(|e| (29..=48).contains(&e.age))
            .count();
        assert_eq!(counted, expected);
        assert_eq!(counted, 5);
    }

    #[test]
    fn test_gender_by_department_zero_cells_and_missing_departments() {
        // Ages 30..=40: IT/Male(33), Sales/Male(35), Finance/Female(38)
        let rows = gender_by_department(&larger_employees(), range(30, 40));

        assert_eq!(rows.len(), 6, "3 departments x 2 genders");
        let zero_rows: Vec<(&str, Gender)> = rows
            .iter()
            .filter(|r| r.num_people == 0)
            .map(|r| (r.department_name.as_str(), r.gender))
            .collect();
        assert_eq!(
            zero_rows,
            vec![
                ("IT", Gender::Female),
                ("Sales", Gender::Female),
                ("Finance", Gender::Male),
            ]
        );

        // Nobody over 55 except Finance/Female: no other department appears
        let rows = gender_by_department(&larger_employees(), range(55, 70));
        assert_eq!(
            rows,
            vec![DepartmentGenderCount {
                department_name: "Finance".to_string(),
                gender: Gender::Female,
                num_people: 1,
            }]
        );
    }

    #[test]
    fn test_gender_by_department_sorted_by_count() {
        let rows = gender_by_department(&larger_employees(), range(0, 120));
        assert!(rows.windows(2).all(|w| w[0].num_people <= w[1].num_people));
        assert_eq!(rows.last().map(|r| r.num_people), Some(3)); // Sales/Male
    }

    #[test]
    fn test_gender_by_department_empty_subset() {
        assert!(gender_by_department(&larger_employees(), range(80, 90)).is_empty());
    }

    #[test]
    fn test_compute_all_is_idempotent() {
        let tables = Tables::new(larger_employees(), example_coordinates()).unwrap();
        let selection = SelectionState::new(&tables, "Sales", 20, 50).unwrap();

        let first = compute_all(&tables, &selection).unwrap();
        let second = compute_all(&tables, &selection).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_compute_all_follows_selection() {
        let tables = Tables::new(larger_employees(), example_coordinates()).unwrap();
        let sales = SelectionState::new(&tables, "Sales", 20, 50).unwrap();
        let finance = sales.with_department(&tables, "Finance").unwrap();

        let a = compute_all(&tables, &sales).unwrap();
        let b = compute_all(&tables, &finance).unwrap();

        assert_eq!(a.joining, b.joining);
        assert_eq!(a.provinces, b.provinces);
        assert_ne!(a.generations, b.generations);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(b.charts.generations.title, "Employee Count per Generation in Finance Dept.");
    }

    #[test]
    fn test_compute_all_rejects_foreign_selection() {
        let tables = example_tables();
        let other = Tables::new(larger_employees(), example_coordinates()).unwrap();
        let selection = SelectionState::new(&other, "Finance", 20, 50).unwrap();

        assert!(compute_all(&tables, &selection).is_err());
    }

    #[test]
    fn test_compute_all_rejects_unchecked_age_range() {
        // ages 30..=51
        let tables = example_tables();

        let inverted = SelectionState::unchecked("Sales", 50, 20);
        assert_eq!(
            compute_all(&tables, &inverted).unwrap_err(),
            DashboardError::InvertedAgeRange { low: 50, high: 20 }
        );

        let out_of_domain = SelectionState::unchecked("Sales", 0, 999);
        assert_eq!(
            compute_all(&tables, &out_of_domain).unwrap_err(),
            DashboardError::AgeRangeOutOfDomain { low: 0, high: 999, min: 30, max: 51 }
        );
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let tables = example_tables();
        let pass = compute_all(&tables, &SelectionState::default_for(&tables)).unwrap();
        let fingerprint = pass.fingerprint().unwrap();

        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        // Not the digest of empty input
        assert_ne!(
            fingerprint,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
