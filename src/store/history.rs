//! Append-only action history (audit log).
//!
//! Mirrors the `action_history` relation of the backing schema: one record
//! per notable mutation, with a free-form JSON details payload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Subtask,
    SubSubtask,
    Milestone,
    User,
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub entity: EntityKind,
    pub entity_id: String,
    pub entity_name: String,
    pub details: Value,
    pub performed_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory audit log, append-only.
#[derive(Debug, Default)]
pub struct ActionLog {
    records: Vec<ActionRecord>,
}

impl ActionLog {
    pub fn record(
        &mut self,
        action: ActionKind,
        entity: EntityKind,
        entity_id: &str,
        entity_name: &str,
        details: Value,
        performed_by: Option<&str>,
    ) {
        self.records.push(ActionRecord {
            action,
            entity,
            entity_id: entity_id.to_string(),
            entity_name: entity_name.to_string(),
            details,
            performed_by: performed_by.map(str::to_string),
            recorded_at: Utc::now(),
        });
    }

    /// Records newest first, the order the history view displays them.
    pub fn newest_first(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
