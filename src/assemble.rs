//! Hierarchy assembly: joining the flat snapshot into the nested
//! task → subtask → sub-subtask model every dashboard consumes.
//!
//! A plain nested-loop join. At the tens-to-low-hundreds-of-rows scale the
//! tracker operates on, rebuilding the whole hierarchy on every snapshot is
//! cheaper than maintaining it incrementally.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Milestone, SubSubtask, Subtask, SubtaskRole, Task, User, is_closed_text};
use crate::snapshot::Snapshot;

/// One task with its fully resolved lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskGroup {
    pub task: Task,
    pub subtasks: Vec<SubtaskGroup>,
}

/// A lane with its assignee, own milestones, and ordered leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskGroup {
    pub subtask: Subtask,
    pub assigned_user: Option<User>,
    /// Subtask-owned milestones only; leaf milestones live on the leaves.
    pub milestones: Vec<Milestone>,
    pub sub_subtasks: Vec<SubSubtaskGroup>,
}

/// A leaf with its assignee and milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubSubtaskGroup {
    pub sub_subtask: SubSubtask,
    pub assigned_user: Option<User>,
    pub milestones: Vec<Milestone>,
}

/// The synthetic ACTUAL lane: for each milestone text under any ordinary
/// lane of a task, the single most-advanced occurrence, keyed by date.
///
/// A read-time projection only — deliberately a separate type from the
/// persisted [`Subtask`] so it can never be CRUDed by accident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActualRow {
    pub by_date: BTreeMap<NaiveDate, String>,
}

/// Join the flat snapshot into one [`TaskGroup`] per task, preserving the
/// snapshot's task order (and `order_index` order for leaves).
///
/// An assignee id that resolves to no known user is treated as unassigned.
pub fn assemble(snapshot: &Snapshot) -> Vec<TaskGroup> {
    let find_user = |id: &Option<String>| -> Option<User> {
        id.as_ref()
            .and_then(|id| snapshot.users.iter().find(|u| u.id == *id))
            .cloned()
    };

    snapshot
        .tasks
        .iter()
        .map(|task| TaskGroup {
            task: task.clone(),
            subtasks: snapshot
                .subtasks
                .iter()
                .filter(|subtask| subtask.task_id == task.id)
                .map(|subtask| SubtaskGroup {
                    subtask: subtask.clone(),
                    assigned_user: find_user(&subtask.assigned_to),
                    milestones: snapshot
                        .milestones
                        .iter()
                        .filter(|m| m.owner.subtask_id() == Some(subtask.id.as_str()))
                        .cloned()
                        .collect(),
                    sub_subtasks: snapshot
                        .sub_subtasks
                        .iter()
                        .filter(|leaf| leaf.subtask_id == subtask.id)
                        .map(|leaf| SubSubtaskGroup {
                            sub_subtask: leaf.clone(),
                            assigned_user: find_user(&leaf.assigned_to),
                            milestones: snapshot
                                .milestones
                                .iter()
                                .filter(|m| m.owner.sub_subtask_id() == Some(leaf.id.as_str()))
                                .cloned()
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

impl TaskGroup {
    /// A task is CLOSED when any lane carries a `CLOSED` milestone
    /// (case-insensitive). Leaf CLOSED milestones reach the lane through
    /// the longest-pole roll-up.
    pub fn is_closed(&self) -> bool {
        self.subtasks
            .iter()
            .any(|lane| lane.milestones.iter().any(Milestone::is_closed))
    }

    /// The PLANNED lane, when present.
    pub fn planned_subtask(&self) -> Option<&SubtaskGroup> {
        self.subtasks
            .iter()
            .find(|lane| lane.subtask.role == SubtaskRole::Planned)
    }

    /// Ordinary lanes: everything except PLANNED and (legacy) ACTUAL rows.
    pub fn working_subtasks(&self) -> impl Iterator<Item = &SubtaskGroup> {
        self.subtasks
            .iter()
            .filter(|lane| lane.subtask.role == SubtaskRole::Ordinary)
    }

    /// Compute the synthetic ACTUAL lane: latest date per milestone text
    /// across the ordinary lanes and their leaves, inverted to a
    /// date-keyed map.
    pub fn actual_rollup(&self) -> ActualRow {
        let mut latest_by_text: BTreeMap<String, NaiveDate> = BTreeMap::new();
        for lane in self.working_subtasks() {
            for milestone in lane.all_milestones() {
                latest_by_text
                    .entry(milestone.text.clone())
                    .and_modify(|date| *date = (*date).max(milestone.date))
                    .or_insert(milestone.date);
            }
        }
        let mut row = ActualRow::default();
        for (text, date) in latest_by_text {
            row.by_date.insert(date, text);
        }
        row
    }
}

impl SubtaskGroup {
    /// The lane's own milestones followed by its leaves' milestones.
    pub fn all_milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones
            .iter()
            .chain(self.sub_subtasks.iter().flat_map(|leaf| leaf.milestones.iter()))
    }

    /// Distinct milestone texts on the lane and its leaves, in first
    /// appearance order.
    pub fn milestone_texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = Vec::new();
        for milestone in self.all_milestones() {
            if !texts.contains(&milestone.text) {
                texts.push(milestone.text.clone());
            }
        }
        texts
    }

    /// Latest date carried by `text` on the lane or any leaf, exact match.
    pub fn latest_date_for(&self, text: &str) -> Option<NaiveDate> {
        self.all_milestones()
            .filter(|m| m.text == text)
            .map(|m| m.date)
            .max()
    }

    /// Whether the lane itself carries a CLOSED milestone.
    pub fn is_closed(&self) -> bool {
        self.milestones.iter().any(|m| is_closed_text(&m.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, MilestoneOwner, Priority, Role};
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_snapshot() -> Snapshot {
        let now = Utc::now();
        Snapshot {
            users: vec![User {
                id: "u-1".into(),
                email: "dana@example.com".into(),
                full_name: "Dana Smith".into(),
                role: Role::User,
            }],
            tasks: vec![Task {
                id: "t-1".into(),
                name: "Login".into(),
                category: Category::Dev,
                priority: Priority::default(),
                created_by: None,
                created_at: now,
                updated_at: now,
            }],
            subtasks: vec![
                Subtask {
                    id: "st-1".into(),
                    task_id: "t-1".into(),
                    name: "PLANNED".into(),
                    role: SubtaskRole::Planned,
                    assigned_to: None,
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                },
                Subtask {
                    id: "st-2".into(),
                    task_id: "t-1".into(),
                    name: "Backend".into(),
                    role: SubtaskRole::Ordinary,
                    assigned_to: Some("u-1".into()),
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                },
                Subtask {
                    id: "st-3".into(),
                    task_id: "t-1".into(),
                    name: "UI".into(),
                    role: SubtaskRole::Ordinary,
                    assigned_to: Some("u-gone".into()),
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                },
            ],
            sub_subtasks: vec![SubSubtask {
                id: "sst-1".into(),
                subtask_id: "st-2".into(),
                name: "OAuth".into(),
                assigned_to: None,
                order_index: 0,
                created_by: None,
                created_at: now,
            }],
            milestones: vec![
                Milestone {
                    id: "m-1".into(),
                    owner: MilestoneOwner::Subtask("st-1".into()),
                    date: d(2024, 3, 1),
                    text: "Dev Complete".into(),
                    created_by: None,
                },
                Milestone {
                    id: "m-2".into(),
                    owner: MilestoneOwner::Subtask("st-2".into()),
                    date: d(2024, 3, 4),
                    text: "Dev Complete".into(),
                    created_by: None,
                },
                Milestone {
                    id: "m-3".into(),
                    owner: MilestoneOwner::SubSubtask("sst-1".into()),
                    date: d(2024, 3, 6),
                    text: "Dev Complete".into(),
                    created_by: None,
                },
            ],
        }
    }

    #[test]
    fn join_resolves_assignees_and_partitions_milestones() {
        let groups = assemble(&sample_snapshot());
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.subtasks.len(), 3);

        let backend = &group.subtasks[1];
        assert_eq!(
            backend.assigned_user.as_ref().map(|u| u.full_name.as_str()),
            Some("Dana Smith")
        );
        // Lane milestones exclude the leaf-owned one.
        assert_eq!(backend.milestones.len(), 1);
        assert_eq!(backend.sub_subtasks[0].milestones.len(), 1);

        // Dangling assignee resolves to unassigned, never an error.
        assert!(group.subtasks[2].assigned_user.is_none());
    }

    #[test]
    fn actual_rollup_takes_latest_per_text_and_skips_planned() {
        let groups = assemble(&sample_snapshot());
        let actual = groups[0].actual_rollup();
        // The PLANNED date (03-01) must not appear; the leaf's 03-06 wins.
        assert_eq!(actual.by_date.len(), 1);
        assert_eq!(
            actual.by_date.get(&d(2024, 3, 6)).map(String::as_str),
            Some("Dev Complete")
        );
    }

    #[test]
    fn lane_helpers_cover_texts_and_latest_dates() {
        let groups = assemble(&sample_snapshot());
        let backend = &groups[0].subtasks[1];
        assert_eq!(backend.milestone_texts(), vec!["Dev Complete".to_string()]);
        assert_eq!(
            backend.latest_date_for("Dev Complete"),
            Some(d(2024, 3, 6))
        );
        assert_eq!(backend.latest_date_for("CLOSED"), None);
        assert!(!groups[0].is_closed());
    }
}
