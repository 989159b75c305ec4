//! polestar — derived-view computation engine for project-tracking
//! dashboards.
//!
//! The crate turns flat relational rows (tasks, subtasks, sub-subtasks,
//! milestones, users) into the nested, date-indexed, aggregated structures a
//! dashboard renders: calendar buckets, Gantt intervals, Kanban columns,
//! delay/variance reports, workload distribution, and per-user breakdowns.
//!
//! The pipeline:
//!
//! 1. A [`snapshot::SnapshotSource`] supplies a full [`snapshot::Snapshot`]
//!    of the five relations; [`snapshot::SnapshotLoader`] coalesces
//!    change-notification refreshes and discards superseded fetches.
//! 2. [`assemble::assemble`] joins the flat rows into the shared
//!    task → subtask → sub-subtask hierarchy.
//! 3. The engines under [`views`] are pure functions of that hierarchy and
//!    produce JSON-serializable output for any rendering layer.
//!
//! [`store::MemoryStore`] is the in-process reference implementation of the
//! entity store, carrying the lifecycle semantics (default-lane seeding,
//! cascade deletes, the longest-pole roll-up invariant) and the action
//! history log. Persistence, auth, and rendering are external collaborators.

pub mod assemble;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod util;
pub mod views;

pub use assemble::{assemble, ActualRow, SubSubtaskGroup, SubtaskGroup, TaskGroup};
pub use error::{FetchError, ModelError, StoreError};
pub use snapshot::{FetchContext, Snapshot, SnapshotLoader, SnapshotSource};
pub use store::MemoryStore;
