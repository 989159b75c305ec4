//! Error types for the tracker core.
//!
//! The derived-view engines are total functions and never fail; errors only
//! arise at the two edges of the crate: ingesting relational rows into the
//! typed model, and mutating the reference store.

use thiserror::Error;

/// Errors converting raw relational rows into typed entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A milestone row had both `subtask_id` and `sub_subtask_id` set.
    #[error("milestone row sets both subtask_id and sub_subtask_id")]
    AmbiguousMilestoneOwner,

    /// A milestone row had neither owner column set.
    #[error("milestone row sets neither subtask_id nor sub_subtask_id")]
    MissingMilestoneOwner,
}

/// Errors from lifecycle operations against the reference store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("unknown subtask: {0}")]
    UnknownSubtask(String),

    #[error("unknown sub-subtask: {0}")]
    UnknownSubSubtask(String),

    #[error("unknown milestone: {0}")]
    UnknownMilestone(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("name must not be empty")]
    EmptyName,

    /// The ACTUAL lane is computed, never stored.
    #[error("subtask name {0:?} is reserved")]
    ReservedName(String),
}

/// The single opaque error surfaced by a snapshot fetch.
///
/// The core does not retry, classify, or recover from fetch failures; that
/// responsibility stays with the data-access collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
