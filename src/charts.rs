// Chart descriptors handed to the rendering front-ends.
// Each derived table gets one descriptor naming its encodings and labels.

use crate::selection::SelectionState;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    BubbleMap,
    Bar,
    GroupedBar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: String,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: impl Into<String>, x: &str, y: &str) -> Self {
        ChartSpec {
            kind,
            title: title.into(),
            x: x.to_string(),
            y: y.to_string(),
            color: None,
            size: None,
            hover: Vec::new(),
            labels: BTreeMap::new(),
        }
    }

    fn label(mut self, field: &str, label: &str) -> Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    /// Axis or legend label for `field`, falling back to the field name.
    pub fn label_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.labels.get(field).map(String::as_str).unwrap_or(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCharts {
    pub joining: ChartSpec,
    pub provinces: ChartSpec,
    pub generations: ChartSpec,
    pub gender_by_department: ChartSpec,
}

pub fn joining_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Line,
        "Joining Frequency over Time",
        "join_year",
        "join_count",
    )
    .label("join_year", "Year")
    .label("join_count", "Employee Joining")
}

pub fn province_chart() -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::BubbleMap,
        "Employee Count across Indonesia",
        "longitude",
        "latitude",
    );
    spec.size = Some("total".to_string());
    spec.hover = vec!["male".to_string(), "female".to_string()];
    spec.label("male", "Male").label("female", "Female")
}

pub fn generation_chart(department: &str) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Bar,
        format!("Employee Count per Generation in {} Dept.", department),
        "generation",
        "num_people",
    )
    .label("generation", "Generation")
    .label("num_people", "Employee Count")
}

pub fn gender_by_department_chart(low: u32, high: u32) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::GroupedBar,
        format!("Gender per Department, Age {} to {}", low, high),
        "num_people",
        "department_name",
    );
    spec.color = Some("gender".to_string());
    spec.label("num_people", "Employee Count")
        .label("department_name", "Department")
        .label("gender", "Gender")
}

pub fn dashboard_charts(selection: &SelectionState) -> DashboardCharts {
    let range = selection.age_range();
    DashboardCharts {
        joining: joining_chart(),
        provinces: province_chart(),
        generations: generation_chart(selection.department()),
        gender_by_department: gender_by_department_chart(range.low(), range.high()),
    }
}
