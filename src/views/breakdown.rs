//! Per-user task breakdown: milestone counts per task and each task's
//! share of the user's total.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::assemble::TaskGroup;
use crate::model::Category;

/// One task's slice of a user's milestones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskShare {
    pub task_id: String,
    pub task_name: String,
    pub category: Category,
    pub milestone_count: usize,
    /// Percentage of the user's total milestone count.
    pub percent: f64,
}

/// One user's breakdown, largest share first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBreakdown {
    pub user_id: String,
    pub user_name: String,
    pub total_milestones: usize,
    pub tasks: Vec<TaskShare>,
}

/// For every assigned lane, attribute the lane's milestones plus all of its
/// leaves' milestones to the lane's assignee, grouped by task. Users are
/// sorted by name, each user's tasks by descending share.
pub fn user_breakdowns(groups: &[TaskGroup]) -> Vec<UserBreakdown> {
    let mut by_user: BTreeMap<String, UserBreakdown> = BTreeMap::new();

    for group in groups {
        for lane in &group.subtasks {
            let Some(assignee) = &lane.assigned_user else {
                continue;
            };
            let entry = by_user
                .entry(assignee.id.clone())
                .or_insert_with(|| UserBreakdown {
                    user_id: assignee.id.clone(),
                    user_name: assignee.full_name.clone(),
                    total_milestones: 0,
                    tasks: Vec::new(),
                });

            let count = lane.all_milestones().count();
            entry.total_milestones += count;
            if let Some(share) = entry.tasks.iter_mut().find(|t| t.task_id == group.task.id) {
                share.milestone_count += count;
            } else {
                entry.tasks.push(TaskShare {
                    task_id: group.task.id.clone(),
                    task_name: group.task.name.clone(),
                    category: group.task.category,
                    milestone_count: count,
                    percent: 0.0,
                });
            }
        }
    }

    let mut breakdowns: Vec<UserBreakdown> = by_user.into_values().collect();
    for breakdown in &mut breakdowns {
        for share in &mut breakdown.tasks {
            share.percent = if breakdown.total_milestones == 0 {
                0.0
            } else {
                share.milestone_count as f64 / breakdown.total_milestones as f64 * 100.0
            };
        }
        breakdown
            .tasks
            .sort_by(|a, b| b.percent.partial_cmp(&a.percent).unwrap_or(std::cmp::Ordering::Equal));
    }
    breakdowns.sort_by(|a, b| a.user_name.cmp(&b.user_name));
    breakdowns
}
