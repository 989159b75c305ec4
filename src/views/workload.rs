//! Workload aggregation: assigned items per user, with category tallies
//! and share-of-total percentages.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::assemble::TaskGroup;
use crate::model::{Category, User};

/// Per-category subtask counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub dev: usize,
    pub test: usize,
    pub infra: usize,
    pub support: usize,
}

impl CategoryTally {
    fn bump(&mut self, category: Category) {
        match category {
            Category::Dev => self.dev += 1,
            Category::Test => self.test += 1,
            Category::Infra => self.infra += 1,
            Category::Support => self.support += 1,
        }
    }

    pub fn get(self, category: Category) -> usize {
        match category {
            Category::Dev => self.dev,
            Category::Test => self.test,
            Category::Infra => self.infra,
            Category::Support => self.support,
        }
    }
}

/// One user's load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserLoad {
    pub user: User,
    pub subtasks: usize,
    pub sub_subtasks: usize,
    /// Distinct tasks the user touches through any assignment.
    pub task_ids: BTreeSet<String>,
    pub by_category: CategoryTally,
    /// Share of all assigned work items, rounded to the nearest percent.
    pub share_percent: u32,
}

impl UserLoad {
    pub fn total(&self) -> usize {
        self.subtasks + self.sub_subtasks
    }
}

/// Dataset-wide distribution of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub items: usize,
    pub percent: u32,
}

/// The full workload report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    /// Sum of every user's assigned items.
    pub total_items: usize,
    /// Heaviest load first.
    pub per_user: Vec<UserLoad>,
    pub by_category: Vec<CategoryShare>,
}

/// Count assigned subtasks and sub-subtasks per user. Every known user
/// appears, loaded or not; percentages divide by the dataset total and are
/// 0 when that total is 0.
pub fn workload_view(groups: &[TaskGroup], users: &[User]) -> WorkloadReport {
    let mut loads: Vec<UserLoad> = users
        .iter()
        .map(|user| UserLoad {
            user: user.clone(),
            subtasks: 0,
            sub_subtasks: 0,
            task_ids: BTreeSet::new(),
            by_category: CategoryTally::default(),
            share_percent: 0,
        })
        .collect();

    for group in groups {
        for lane in &group.subtasks {
            if let Some(assignee) = &lane.assigned_user {
                if let Some(load) = loads.iter_mut().find(|l| l.user.id == assignee.id) {
                    load.subtasks += 1;
                    load.task_ids.insert(group.task.id.clone());
                    load.by_category.bump(group.task.category);
                }
            }
            for leaf in &lane.sub_subtasks {
                if let Some(assignee) = &leaf.assigned_user {
                    if let Some(load) = loads.iter_mut().find(|l| l.user.id == assignee.id) {
                        load.sub_subtasks += 1;
                        load.task_ids.insert(group.task.id.clone());
                    }
                }
            }
        }
    }

    let total_items: usize = loads.iter().map(UserLoad::total).sum();
    for load in &mut loads {
        load.share_percent = percent(load.total(), total_items);
    }
    loads.sort_by(|a, b| b.total().cmp(&a.total()));

    let by_category = Category::ALL
        .iter()
        .map(|&category| {
            let items: usize = loads.iter().map(|l| l.by_category.get(category)).sum();
            CategoryShare {
                category,
                items,
                percent: percent(items, total_items),
            }
        })
        .collect();

    WorkloadReport {
        total_items,
        per_user: loads,
        by_category,
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}
