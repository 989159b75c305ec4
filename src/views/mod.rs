//! Derived-view engines.
//!
//! Each engine is a pure, total function of the assembled hierarchy (plus
//! filters and configuration) producing a JSON-serializable structure.
//! Engines never perform I/O, never fail on well-formed input, and are
//! idempotent: recomputing from the same snapshot yields structurally
//! identical output.

pub mod breakdown;
pub mod calendar;
pub mod delay;
pub mod gantt;
pub mod kanban;
pub mod workload;

pub use breakdown::{TaskShare, UserBreakdown, user_breakdowns};
pub use calendar::{CalendarFilter, DayBucket, DayEntry, calendar_view, milestone_texts};
pub use delay::{
    DelayStatus, MilestoneSlip, SubtaskDelay, TaskDelay, UserPerformance, UserTaskDelay,
    task_delays, user_performance,
};
pub use gantt::{GanttChart, GanttKind, GanttNode, gantt_view};
pub use kanban::{KanbanCard, KanbanColumn, KanbanFilter, kanban_view};
pub use workload::{CategoryShare, CategoryTally, UserLoad, WorkloadReport, workload_view};
