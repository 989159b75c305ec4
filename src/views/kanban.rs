//! Kanban bucketing: milestones placed into configured columns.

use chrono::NaiveDate;
use serde::Serialize;

use crate::assemble::TaskGroup;
use crate::config::{MilestoneOption, column_key};

/// One milestone occurrence as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanCard {
    pub milestone_id: String,
    pub date: NaiveDate,
    pub text: String,
    pub task_name: String,
    pub subtask_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_subtask_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// A configured column with its bucketed cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanColumn {
    pub key: String,
    pub label: String,
    pub cards: Vec<KanbanCard>,
}

/// Filters applied before bucketing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KanbanFilter {
    /// Keep only cards assigned to this engineer (full name).
    pub engineer_name: Option<String>,
    /// Drop every card of a CLOSED task.
    pub hide_closed: bool,
}

/// Bucket every milestone into the column whose `value` equals the
/// normalized milestone text. Milestones matching no configured column are
/// silently dropped; column order follows the configuration.
pub fn kanban_view(
    groups: &[TaskGroup],
    options: &[MilestoneOption],
    filter: &KanbanFilter,
) -> Vec<KanbanColumn> {
    let mut columns: Vec<KanbanColumn> = options
        .iter()
        .map(|option| KanbanColumn {
            key: option.value.clone(),
            label: option.label.clone(),
            cards: Vec::new(),
        })
        .collect();

    let place = |columns: &mut Vec<KanbanColumn>, card: KanbanCard| {
        let key = column_key(&card.text);
        if let Some(column) = columns.iter_mut().find(|c| c.key == key) {
            column.cards.push(card);
        }
    };

    for group in groups {
        if filter.hide_closed && group.is_closed() {
            continue;
        }
        for lane in &group.subtasks {
            let assignee = lane.assigned_user.as_ref().map(|u| u.full_name.clone());
            if let Some(wanted) = &filter.engineer_name {
                if assignee.as_deref() != Some(wanted.as_str()) {
                    continue;
                }
            }

            for milestone in &lane.milestones {
                place(
                    &mut columns,
                    KanbanCard {
                        milestone_id: milestone.id.clone(),
                        date: milestone.date,
                        text: milestone.text.clone(),
                        task_name: group.task.name.clone(),
                        subtask_name: lane.subtask.name.clone(),
                        sub_subtask_name: None,
                        assignee: assignee.clone(),
                    },
                );
            }
            for leaf in &lane.sub_subtasks {
                for milestone in &leaf.milestones {
                    place(
                        &mut columns,
                        KanbanCard {
                            milestone_id: milestone.id.clone(),
                            date: milestone.date,
                            text: milestone.text.clone(),
                            task_name: group.task.name.clone(),
                            subtask_name: lane.subtask.name.clone(),
                            sub_subtask_name: Some(leaf.sub_subtask.name.clone()),
                            assignee: assignee.clone(),
                        },
                    );
                }
            }
        }
    }

    columns
}
