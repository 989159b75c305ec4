//! Delay/variance: planned vs. actual dates per milestone type.
//!
//! The planned dates come from a task's PLANNED lane; the actual date for a
//! milestone type is the latest occurrence across an ordinary lane and its
//! leaves (same longest-pole rule as the ACTUAL roll-up). Positive delays
//! count toward the averages; early/on-time entries are shown per milestone
//! but excluded from the aggregates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::assemble::{SubtaskGroup, TaskGroup};
use crate::model::{Category, User};
use crate::util::dates::days_delay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelayStatus {
    OnTime,
    Delayed,
    Pending,
}

/// One milestone type compared against its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneSlip {
    pub name: String,
    pub planned: Option<NaiveDate>,
    pub actual: Option<NaiveDate>,
    /// Signed days late; `None` when either date is missing.
    pub days_delay: Option<i64>,
}

/// Delay picture of one ordinary lane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtaskDelay {
    pub subtask_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub milestones: Vec<MilestoneSlip>,
    /// Mean of the positive delays, 0.0 when none.
    pub average_delay: f64,
    /// Largest positive delay, 0 when none.
    pub worst_delay: i64,
    pub status: DelayStatus,
}

/// Delay picture of one task, worst lanes first in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDelay {
    pub task_name: String,
    pub category: Category,
    pub subtasks: Vec<SubtaskDelay>,
    pub average_delay: f64,
    pub worst_delay: i64,
    pub delayed_subtasks: usize,
    pub total_subtasks: usize,
}

/// One (task, lane) entry of the per-user view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTaskDelay {
    pub task_name: String,
    pub subtask_name: String,
    pub milestones: Vec<MilestoneSlip>,
    pub average_delay: f64,
    pub worst_delay: i64,
    pub status: DelayStatus,
}

/// Delay picture of one user across every lane assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPerformance {
    pub user: User,
    pub tasks: Vec<UserTaskDelay>,
    /// Mean of the delayed entries' worst delays, 0.0 when none.
    pub average_delay: f64,
    pub total_delayed: usize,
}

/// Per-task delay report, sorted by worst delay descending.
pub fn task_delays(groups: &[TaskGroup]) -> Vec<TaskDelay> {
    let mut report: Vec<TaskDelay> = groups
        .iter()
        .map(|group| {
            let planned = planned_map(group);
            let subtasks: Vec<SubtaskDelay> = group
                .working_subtasks()
                .map(|lane| {
                    let slips = lane_slips(lane, &planned);
                    let positives = positive_delays(&slips);
                    SubtaskDelay {
                        subtask_name: lane.subtask.name.clone(),
                        assigned_to: lane.assigned_user.as_ref().map(|u| u.full_name.clone()),
                        average_delay: mean(&positives),
                        worst_delay: positives.iter().copied().max().unwrap_or(0),
                        status: classify(&slips, &positives),
                        milestones: slips,
                    }
                })
                .collect();

            let combined: Vec<i64> = subtasks
                .iter()
                .flat_map(|lane| positive_delays(&lane.milestones))
                .collect();
            TaskDelay {
                task_name: group.task.name.clone(),
                category: group.task.category,
                average_delay: mean(&combined),
                worst_delay: combined.iter().copied().max().unwrap_or(0),
                delayed_subtasks: subtasks.iter().filter(|s| s.worst_delay > 0).count(),
                total_subtasks: subtasks.len(),
                subtasks,
            }
        })
        .collect();

    report.sort_by(|a, b| b.worst_delay.cmp(&a.worst_delay));
    report
}

/// The same engine keyed by assignee: each user's lanes across all tasks.
/// Users with no assigned lanes are omitted.
pub fn user_performance(groups: &[TaskGroup], users: &[User]) -> Vec<UserPerformance> {
    users
        .iter()
        .filter_map(|user| {
            let mut tasks: Vec<UserTaskDelay> = Vec::new();
            for group in groups {
                let planned = planned_map(group);
                for lane in group.working_subtasks() {
                    if lane.assigned_user.as_ref().map(|u| u.id.as_str()) != Some(user.id.as_str()) {
                        continue;
                    }
                    let slips = lane_slips(lane, &planned);
                    let positives = positive_delays(&slips);
                    tasks.push(UserTaskDelay {
                        task_name: group.task.name.clone(),
                        subtask_name: lane.subtask.name.clone(),
                        average_delay: mean(&positives),
                        worst_delay: positives.iter().copied().max().unwrap_or(0),
                        status: classify(&slips, &positives),
                        milestones: slips,
                    });
                }
            }
            if tasks.is_empty() {
                return None;
            }
            let delayed: Vec<i64> = tasks
                .iter()
                .filter(|t| t.worst_delay > 0)
                .map(|t| t.worst_delay)
                .collect();
            Some(UserPerformance {
                user: user.clone(),
                average_delay: mean(&delayed),
                total_delayed: delayed.len(),
                tasks,
            })
        })
        .collect()
}

/// `text → planned date` from the PLANNED lane; later rows overwrite.
fn planned_map(group: &TaskGroup) -> BTreeMap<String, NaiveDate> {
    let mut map = BTreeMap::new();
    if let Some(lane) = group.planned_subtask() {
        for milestone in &lane.milestones {
            map.insert(milestone.text.clone(), milestone.date);
        }
    }
    map
}

/// Compare every milestone type on the lane (and its leaves) against the
/// plan. Entries with neither a planned nor an actual date are dropped.
fn lane_slips(lane: &SubtaskGroup, planned: &BTreeMap<String, NaiveDate>) -> Vec<MilestoneSlip> {
    lane.milestone_texts()
        .into_iter()
        .filter_map(|name| {
            let planned_date = planned.get(&name).copied();
            let actual_date = lane.latest_date_for(&name);
            if planned_date.is_none() && actual_date.is_none() {
                return None;
            }
            Some(MilestoneSlip {
                days_delay: match (planned_date, actual_date) {
                    (Some(p), Some(a)) => Some(days_delay(p, a)),
                    _ => None,
                },
                name,
                planned: planned_date,
                actual: actual_date,
            })
        })
        .collect()
}

fn positive_delays(slips: &[MilestoneSlip]) -> Vec<i64> {
    slips
        .iter()
        .filter_map(|s| s.days_delay)
        .filter(|&d| d > 0)
        .collect()
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

fn classify(slips: &[MilestoneSlip], positives: &[i64]) -> DelayStatus {
    if slips.is_empty() {
        DelayStatus::Pending
    } else if positives.is_empty() {
        DelayStatus::OnTime
    } else {
        DelayStatus::Delayed
    }
}
