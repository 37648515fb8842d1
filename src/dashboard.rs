use crate::aggregation::{compute_all, DashboardPass};
use crate::error::Result;
use crate::selection::SelectionState;
use crate::tables::Tables;
use std::sync::Arc;

/// A change coming from one of the two dashboard controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    SelectDepartment(String),
    SetAgeRange { low: u32, high: u32 },
    Reset,
}

/// Input handler that turns control changes into full recomputation passes.
///
/// The selection and the pass computed from it are replaced together, so a
/// caller never sees a pass that is stale relative to the selection.
pub struct Dashboard {
    tables: Arc<Tables>,
    selection: SelectionState,
    pass: DashboardPass,
}

impl Dashboard {
    /// Run the initial pass with the default selection.
    pub fn new(tables: Arc<Tables>) -> Result<Self> {
        let selection = SelectionState::default_for(&tables);
        let pass = compute_all(&tables, &selection)?;
        Ok(Dashboard {
            tables,
            selection,
            pass,
        })
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn pass(&self) -> &DashboardPass {
        &self.pass
    }

    /// Apply every event of one interaction, then run exactly one pass.
    ///
    /// Events are applied to a staged selection; if any of them is invalid
    /// nothing changes and the error is returned.
    pub fn handle(&mut self, events: &[InputEvent]) -> Result<&DashboardPass> {
        let mut staged = self.selection.clone();

        for event in events {
            staged = match event {
                InputEvent::SelectDepartment(department) => {
                    staged.with_department(&self.tables, department)?
                }
                InputEvent::SetAgeRange { low, high } => {
                    staged.with_age_range(&self.tables, *low, *high)?
                }
                InputEvent::Reset => SelectionState::default_for(&self.tables),
            };
        }

        let pass = compute_all(&self.tables, &staged)?;
        self.selection = staged;
        self.pass = pass;

        Ok(&self.pass)
    }

    pub fn handle_one(&mut self, event: InputEvent) -> Result<&DashboardPass> {
        self.handle(std::slice::from_ref(&event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::records::Gender;
    use crate::tables::fixtures::*;

    fn dashboard() -> Dashboard {
        let tables = Tables::new(
            vec![
                employee(2018, "Jakarta", Gender::Male, "HR", "Gen Z", 23),
                employee(2019, "Jakarta", Gender::Female, "HR", "Millenials", 31),
                employee(2020, "Jakarta", Gender::Female, "Sales", "Gen X", 47),
                employee(2021, "Bali", Gender::Male, "Sales", "Millenials", 36),
            ],
            example_coordinates(),
        )
        .unwrap();
        Dashboard::new(Arc::new(tables)).unwrap()
    }

    #[test]
    fn test_initial_pass_uses_defaults() {
        let dashboard = dashboard();
        assert_eq!(dashboard.selection().department(), "HR");
        assert_eq!(dashboard.selection().age_range().low(), 23);
        assert_eq!(dashboard.selection().age_range().high(), 47);
        assert_eq!(dashboard.pass().selection, *dashboard.selection());
    }

    #[test]
    fn test_department_event_recomputes_generations() {
        let mut dashboard = dashboard();
        let pass = dashboard
            .handle_one(InputEvent::SelectDepartment("Sales".to_string()))
            .unwrap();

        let generations: Vec<&str> = pass.generations.iter().map(|g| g.generation.as_str()).collect();
        assert_eq!(generations, vec!["Gen X", "Millenials"]);
        assert_eq!(dashboard.selection().department(), "Sales");
    }

    #[test]
    fn test_both_inputs_applied_in_one_pass() {
        let mut dashboard = dashboard();
        dashboard
            .handle(&[
                InputEvent::SelectDepartment("Sales".to_string()),
                InputEvent::SetAgeRange { low: 30, high: 40 },
            ])
            .unwrap();

        let pass = dashboard.pass();
        assert_eq!(pass.selection.department(), "Sales");
        assert_eq!(pass.selection.age_range().low(), 30);
        assert!(pass.gender_by_department.iter().all(|r| r.num_people <= 1));
    }

    #[test]
    fn test_invalid_event_leaves_state_untouched() {
        let mut dashboard = dashboard();
        let before = dashboard.pass().fingerprint().unwrap();

        let err = dashboard
            .handle(&[
                InputEvent::SelectDepartment("Sales".to_string()),
                InputEvent::SetAgeRange { low: 40, high: 30 },
            ])
            .unwrap_err();

        assert_eq!(err, DashboardError::InvertedAgeRange { low: 40, high: 30 });
        assert_eq!(dashboard.selection().department(), "HR");
        assert_eq!(dashboard.pass().fingerprint().unwrap(), before);
    }

    #[test]
    fn test_reset_restores_default_pass() {
        let mut dashboard = dashboard();
        let initial = dashboard.pass().clone();

        dashboard
            .handle_one(InputEvent::SetAgeRange { low: 30, high: 35 })
            .unwrap();
        assert_ne!(dashboard.pass(), &initial);

        dashboard.handle_one(InputEvent::Reset).unwrap();
        assert_eq!(dashboard.pass(), &initial);
    }
}
