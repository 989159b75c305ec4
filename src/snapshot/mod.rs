//! Snapshot container and the boundary to the external entity store.
//!
//! The hosted backend is an opaque collaborator behind [`SnapshotSource`];
//! the core only ever sees full snapshots of the five relations. Scoping
//! state (current user, current tenant) travels explicitly in
//! [`FetchContext`], never as ambient globals.

mod loader;

pub use loader::{FetchTicket, LoadState, SnapshotLoader};

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::model::{Milestone, SubSubtask, Subtask, Task, User};

/// A full point-in-time copy of the five relations.
///
/// Ordering contract: `tasks` sorted by category (stable), `sub_subtasks`
/// by `order_index` ascending; the assembler preserves these orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub subtasks: Vec<Subtask>,
    pub sub_subtasks: Vec<SubSubtask>,
    pub milestones: Vec<Milestone>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.tasks.is_empty()
            && self.subtasks.is_empty()
            && self.sub_subtasks.is_empty()
            && self.milestones.is_empty()
    }
}

/// Explicit scoping context for snapshot fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchContext {
    /// The authenticated user on whose behalf the fetch runs.
    pub user_id: Option<String>,
    /// The tenant/realm the users relation is scoped to.
    pub realm: Option<String>,
}

impl FetchContext {
    pub fn for_user(user_id: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            realm: Some(realm.into()),
        }
    }
}

/// Anything that can produce a full snapshot of the five relations.
pub trait SnapshotSource {
    /// Fetch the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's failure as a single opaque [`FetchError`].
    fn fetch(&self, ctx: &FetchContext) -> Result<Snapshot, FetchError>;
}
