//! Core entity types shared by the snapshot layer, the reference store, and
//! every derived-view engine.
//!
//! Identifiers are opaque stable strings. Milestone dates are calendar dates
//! (`NaiveDate`) with no time component; record timestamps are UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// A team member that subtasks and sub-subtasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// Task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dev,
    Test,
    Infra,
    Support,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Dev, Self::Test, Self::Infra, Self::Support];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Infra => "infra",
            Self::Support => "support",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority, valid range 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOW: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const HIGH: Self = Self(3);

    /// Clamp an arbitrary value into the valid range.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(Self::LOW.0, Self::HIGH.0))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Top-level unit of work. Owns zero or more subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub priority: Priority,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Semantic role of a subtask lane.
///
/// An explicit tag replacing the original convention of matching the lane
/// name against `PLANNED` / `ACTUAL` case-insensitively. `Actual` exists
/// only for classifying legacy rows on ingest; the store never creates an
/// ACTUAL lane (it is a computed view, see [`crate::assemble::ActualRow`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskRole {
    /// Holds the target/planned date for each milestone type.
    Planned,
    /// Synthetic roll-up lane; never persisted by this crate.
    Actual,
    /// A regular work lane.
    #[default]
    Ordinary,
}

impl SubtaskRole {
    /// Classify a lane name the way the original schema did.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("PLANNED") {
            Self::Planned
        } else if name.trim().eq_ignore_ascii_case("ACTUAL") {
            Self::Actual
        } else {
            Self::Ordinary
        }
    }
}

/// A lane under a task. Owns zero or more sub-subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub name: String,
    pub role: SubtaskRole,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A leaf breakdown under a subtask, ordered by `order_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSubtask {
    pub id: String,
    pub subtask_id: String,
    pub name: String,
    pub assigned_to: Option<String>,
    pub order_index: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The entity a milestone attaches to: a subtask or a sub-subtask, never
/// both. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneOwner {
    Subtask(String),
    SubSubtask(String),
}

impl MilestoneOwner {
    /// Convert the relational `(subtask_id, sub_subtask_id)` nullable pair,
    /// rejecting rows that set both or neither.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AmbiguousMilestoneOwner`] when both columns are
    /// set and [`ModelError::MissingMilestoneOwner`] when neither is.
    pub fn from_columns(
        subtask_id: Option<String>,
        sub_subtask_id: Option<String>,
    ) -> Result<Self, ModelError> {
        match (subtask_id, sub_subtask_id) {
            (Some(id), None) => Ok(Self::Subtask(id)),
            (None, Some(id)) => Ok(Self::SubSubtask(id)),
            (Some(_), Some(_)) => Err(ModelError::AmbiguousMilestoneOwner),
            (None, None) => Err(ModelError::MissingMilestoneOwner),
        }
    }

    pub fn subtask_id(&self) -> Option<&str> {
        match self {
            Self::Subtask(id) => Some(id),
            Self::SubSubtask(_) => None,
        }
    }

    pub fn sub_subtask_id(&self) -> Option<&str> {
        match self {
            Self::Subtask(_) => None,
            Self::SubSubtask(id) => Some(id),
        }
    }
}

/// A dated label attached to a subtask or sub-subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub owner: MilestoneOwner,
    pub date: NaiveDate,
    pub text: String,
    pub created_by: Option<String>,
}

impl Milestone {
    /// Whether this milestone closes its task (case-insensitive `CLOSED`).
    pub fn is_closed(&self) -> bool {
        is_closed_text(&self.text)
    }
}

/// Case-insensitive check for the reserved `CLOSED` milestone text.
pub fn is_closed_text(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("CLOSED")
}
