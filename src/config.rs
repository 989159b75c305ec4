//! Dashboard configuration types.
//!
//! These structures are supplied by an external configuration store (the
//! original kept them in a key-value `app_config` table); the crate defines
//! the shapes, the shipped defaults, and the column-key normalization the
//! Kanban engine buckets by.

use serde::{Deserialize, Serialize};

use crate::model::Category;

/// One Kanban column definition: `value` is the bucketing key, `label` the
/// display text (and the text written onto milestones created from it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneOption {
    pub value: String,
    pub label: String,
}

impl MilestoneOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Colors for the PLANNED/ACTUAL rows of the main table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowColors {
    pub planned: String,
    pub actual: String,
    pub planned_opacity: f32,
    pub actual_opacity: f32,
    pub sub_subtask_opacity: f32,
}

impl Default for RowColors {
    fn default() -> Self {
        Self {
            planned: "#fbdd2b".into(),
            actual: "#1f3cd1".into(),
            planned_opacity: 0.2,
            actual_opacity: 0.2,
            sub_subtask_opacity: 0.15,
        }
    }
}

/// Hex color per task category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColors {
    pub dev: String,
    pub test: String,
    pub infra: String,
    pub support: String,
}

impl CategoryColors {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Dev => &self.dev,
            Category::Test => &self.test,
            Category::Infra => &self.infra,
            Category::Support => &self.support,
        }
    }
}

impl Default for CategoryColors {
    fn default() -> Self {
        Self {
            dev: "#10b981".into(),
            test: "#3b82f6".into(),
            infra: "#eab308".into(),
            support: "#f97316".into(),
        }
    }
}

/// Opacity per task category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOpacity {
    pub dev: f32,
    pub test: f32,
    pub infra: f32,
    pub support: f32,
}

impl CategoryOpacity {
    pub fn get(&self, category: Category) -> f32 {
        match category {
            Category::Dev => self.dev,
            Category::Test => self.test,
            Category::Infra => self.infra,
            Category::Support => self.support,
        }
    }
}

impl Default for CategoryOpacity {
    fn default() -> Self {
        Self {
            dev: 1.0,
            test: 1.0,
            infra: 1.0,
            support: 1.0,
        }
    }
}

/// The full dashboard configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    pub milestone_options: Vec<MilestoneOption>,
    pub row_colors: RowColors,
    pub category_colors: CategoryColors,
    pub category_opacity: CategoryOpacity,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            milestone_options: vec![
                MilestoneOption::new("planned", "PLANNED"),
                MilestoneOption::new("closed", "CLOSED"),
                MilestoneOption::new("dev-complete", "Dev Complete"),
                MilestoneOption::new("dev-merge-done", "Dev Merge Done"),
                MilestoneOption::new("staging-merge-done", "Staging Merge Done"),
                MilestoneOption::new("prod-merge-done", "Prod Merge Done"),
                MilestoneOption::new("in-progress", "In progress"),
            ],
            row_colors: RowColors::default(),
            category_colors: CategoryColors::default(),
            category_opacity: CategoryOpacity::default(),
        }
    }
}

/// Normalize a milestone text to its Kanban column key: lowercase, with
/// whitespace runs collapsed to single hyphens.
pub fn column_key(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_cover_the_shipped_columns() {
        let config = TrackerConfig::default();
        let values: Vec<&str> = config
            .milestone_options
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(
            values,
            [
                "planned",
                "closed",
                "dev-complete",
                "dev-merge-done",
                "staging-merge-done",
                "prod-merge-done",
                "in-progress",
            ]
        );
    }

    #[test]
    fn column_key_normalizes_case_and_whitespace() {
        assert_eq!(column_key("Dev Complete"), "dev-complete");
        assert_eq!(column_key("CLOSED"), "closed");
        assert_eq!(column_key("Staging  Merge\tDone"), "staging-merge-done");
        assert_eq!(column_key("in-progress"), "in-progress");
    }

    #[test]
    fn option_labels_map_onto_their_keys() {
        for option in TrackerConfig::default().milestone_options {
            assert_eq!(column_key(&option.label), option.value);
        }
    }
}
