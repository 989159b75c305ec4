//! Calendar bucketing: every milestone grouped by its date.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::assemble::TaskGroup;
use crate::model::{Category, SubtaskRole};
use crate::util::dates;

const UNASSIGNED: &str = "Unassigned";

/// One milestone occurrence on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub task_name: String,
    /// Lane name; leaf entries compose `"parent → child"`.
    pub subtask_name: String,
    pub milestone_text: String,
    pub engineer_name: String,
    pub engineer_id: Option<String>,
    pub category: Category,
}

/// All entries on one date plus the distinct engineers present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub entries: Vec<DayEntry>,
    pub engineers: BTreeSet<String>,
}

/// Independent filters, AND-composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFilter {
    /// Keep only entries assigned to this engineer id.
    pub engineer: Option<String>,
    /// Keep only entries with exactly this milestone text.
    pub milestone_text: Option<String>,
    /// When false, drop entries from PLANNED lanes.
    pub include_planned: bool,
    /// When false, drop entries from (legacy) ACTUAL lanes.
    pub include_actual: bool,
    /// Keep only PLANNED/ACTUAL lane entries ("task-level only").
    pub task_level_only: bool,
    /// Drop every entry of a CLOSED task.
    pub hide_closed: bool,
}

impl Default for CalendarFilter {
    fn default() -> Self {
        Self {
            engineer: None,
            milestone_text: None,
            include_planned: true,
            include_actual: true,
            task_level_only: false,
            hide_closed: false,
        }
    }
}

impl CalendarFilter {
    fn admits_lane(&self, role: SubtaskRole) -> bool {
        if !self.include_planned && role == SubtaskRole::Planned {
            return false;
        }
        if !self.include_actual && role == SubtaskRole::Actual {
            return false;
        }
        if self.task_level_only && role == SubtaskRole::Ordinary {
            return false;
        }
        true
    }

    fn admits_entry(&self, entry: &DayEntry) -> bool {
        if let Some(engineer) = &self.engineer {
            if entry.engineer_id.as_deref() != Some(engineer.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.milestone_text {
            if entry.milestone_text != *text {
                return false;
            }
        }
        true
    }
}

/// Bucket every milestone (lane- and leaf-owned) by date, applying the
/// filter. Days with no surviving entries are dropped.
pub fn calendar_view(
    groups: &[TaskGroup],
    filter: &CalendarFilter,
) -> BTreeMap<NaiveDate, DayBucket> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for group in groups {
        if filter.hide_closed && group.is_closed() {
            continue;
        }
        for lane in &group.subtasks {
            if !filter.admits_lane(lane.subtask.role) {
                continue;
            }
            let engineer_name = lane
                .assigned_user
                .as_ref()
                .map_or(UNASSIGNED, |u| u.full_name.as_str());
            let engineer_id = lane.assigned_user.as_ref().map(|u| u.id.clone());

            for milestone in &lane.milestones {
                let entry = DayEntry {
                    task_name: group.task.name.clone(),
                    subtask_name: lane.subtask.name.clone(),
                    milestone_text: milestone.text.clone(),
                    engineer_name: engineer_name.to_string(),
                    engineer_id: engineer_id.clone(),
                    category: group.task.category,
                };
                if filter.admits_entry(&entry) {
                    push_entry(&mut days, milestone.date, entry);
                }
            }

            // Leaf entries compose the lane name and, as the original does,
            // carry the lane's assignee.
            for leaf in &lane.sub_subtasks {
                for milestone in &leaf.milestones {
                    let entry = DayEntry {
                        task_name: group.task.name.clone(),
                        subtask_name: format!(
                            "{} → {}",
                            lane.subtask.name, leaf.sub_subtask.name
                        ),
                        milestone_text: milestone.text.clone(),
                        engineer_name: engineer_name.to_string(),
                        engineer_id: engineer_id.clone(),
                        category: group.task.category,
                    };
                    if filter.admits_entry(&entry) {
                        push_entry(&mut days, milestone.date, entry);
                    }
                }
            }
        }
    }

    days
}

fn push_entry(days: &mut BTreeMap<NaiveDate, DayBucket>, date: NaiveDate, entry: DayEntry) {
    let bucket = days.entry(date).or_default();
    if let Some(id) = &entry.engineer_id {
        bucket.engineers.insert(id.clone());
    }
    bucket.entries.push(entry);
}

/// Distinct milestone texts across the dataset, sorted — the option list
/// for the text filter.
pub fn milestone_texts(groups: &[TaskGroup]) -> BTreeSet<String> {
    let mut texts = BTreeSet::new();
    for group in groups {
        for lane in &group.subtasks {
            for milestone in lane.all_milestones() {
                texts.insert(milestone.text.clone());
            }
        }
    }
    texts
}

/// The Sunday-start week grid covering the bucketed days, rounded outward
/// to full weeks. Empty when the view is empty.
pub fn week_grid(view: &BTreeMap<NaiveDate, DayBucket>) -> Vec<Vec<NaiveDate>> {
    match (view.keys().next(), view.keys().next_back()) {
        (Some(&first), Some(&last)) => dates::calendar_weeks(first, last),
        _ => Vec::new(),
    }
}
