//! Gantt intervals: start/end/duration and progress roll-up per node.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::assemble::{SubSubtaskGroup, SubtaskGroup, TaskGroup};
use crate::model::{Category, Milestone, SubtaskRole};
use crate::util::dates;

/// How many days of padding the shared axis gets on each side.
const AXIS_MARGIN_DAYS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GanttKind {
    Task,
    Subtask,
    SubSubtask,
}

/// One row of the chart. Nodes without resolvable dates are still emitted
/// but carry no interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttNode {
    pub id: String,
    pub name: String,
    pub kind: GanttKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub duration_days: i64,
    /// 0..=100.
    pub progress: u8,
    pub children: Vec<GanttNode>,
}

/// The chart plus the shared date axis spanning
/// `[min(starts) − 3 days, max(ends) + 3 days]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttChart {
    pub tasks: Vec<GanttNode>,
    pub axis: Vec<NaiveDate>,
}

/// Build the chart. PLANNED lanes are excluded; the task-level interval
/// merges lane and leaf dates before taking min/max.
pub fn gantt_view(groups: &[TaskGroup]) -> GanttChart {
    let tasks: Vec<GanttNode> = groups.iter().map(task_node).collect();

    let mut all_dates: Vec<NaiveDate> = Vec::new();
    collect_interval_dates(&tasks, &mut all_dates);
    let axis = match (all_dates.iter().min(), all_dates.iter().max()) {
        (Some(&min), Some(&max)) => dates::date_range(
            min.checked_sub_days(Days::new(AXIS_MARGIN_DAYS)).unwrap_or(min),
            max.checked_add_days(Days::new(AXIS_MARGIN_DAYS)).unwrap_or(max),
        ),
        _ => Vec::new(),
    };

    GanttChart { tasks, axis }
}

fn task_node(group: &TaskGroup) -> GanttNode {
    let mut task_dates: Vec<NaiveDate> = Vec::new();
    let children: Vec<GanttNode> = group
        .subtasks
        .iter()
        .filter(|lane| lane.subtask.role != SubtaskRole::Planned)
        .map(|lane| {
            task_dates.extend(lane.all_milestones().map(|m| m.date));
            subtask_node(lane)
        })
        .collect();

    let start = task_dates.iter().min().copied();
    let end = task_dates.iter().max().copied();
    let progress = mean_progress(children.iter().map(|c| c.progress));

    GanttNode {
        id: group.task.id.clone(),
        name: group.task.name.clone(),
        kind: GanttKind::Task,
        category: Some(group.task.category),
        assigned_to: None,
        start,
        end,
        duration_days: interval_days(start, end),
        progress,
        children,
    }
}

fn subtask_node(lane: &SubtaskGroup) -> GanttNode {
    let children: Vec<GanttNode> = lane
        .sub_subtasks
        .iter()
        .map(|leaf| leaf_node(lane, leaf))
        .collect();

    let start = lane.milestones.iter().map(|m| m.date).min();
    let end = lane.milestones.iter().map(|m| m.date).max();
    let progress = if lane.milestones.iter().any(Milestone::is_closed) {
        100
    } else if children.is_empty() {
        0
    } else {
        mean_progress(children.iter().map(|c| c.progress))
    };

    GanttNode {
        id: lane.subtask.id.clone(),
        name: lane.subtask.name.clone(),
        kind: GanttKind::Subtask,
        category: None,
        assigned_to: lane.assigned_user.as_ref().map(|u| u.full_name.clone()),
        start,
        end,
        duration_days: interval_days(start, end),
        progress,
        children,
    }
}

fn leaf_node(lane: &SubtaskGroup, leaf: &SubSubtaskGroup) -> GanttNode {
    let start = leaf.milestones.iter().map(|m| m.date).min();
    let end = leaf.milestones.iter().map(|m| m.date).max();
    let progress = if leaf.milestones.iter().any(Milestone::is_closed) {
        100
    } else {
        0
    };

    GanttNode {
        id: leaf.sub_subtask.id.clone(),
        name: leaf.sub_subtask.name.clone(),
        kind: GanttKind::SubSubtask,
        category: None,
        assigned_to: leaf
            .assigned_user
            .as_ref()
            .or(lane.assigned_user.as_ref())
            .map(|u| u.full_name.clone()),
        start,
        end,
        duration_days: interval_days(start, end),
        progress,
        children: Vec::new(),
    }
}

fn interval_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => dates::span_days(start, end),
        _ => 0,
    }
}

fn mean_progress(values: impl Iterator<Item = u8>) -> u8 {
    let collected: Vec<u8> = values.collect();
    if collected.is_empty() {
        return 0;
    }
    let sum: u32 = collected.iter().map(|&p| u32::from(p)).sum();
    ((f64::from(sum) / collected.len() as f64).round()) as u8
}

fn collect_interval_dates(nodes: &[GanttNode], out: &mut Vec<NaiveDate>) {
    for node in nodes {
        if let Some(start) = node.start {
            out.push(start);
        }
        if let Some(end) = node.end {
            out.push(end);
        }
        collect_interval_dates(&node.children, out);
    }
}
