//! In-memory reference implementation of the entity store.
//!
//! `MemoryStore` carries the lifecycle semantics the hosted backend is
//! expected to provide: default-lane seeding on task creation, cascaded
//! deletes, unassignment on user removal, the longest-pole roll-up
//! invariant, and the action history log. It doubles as the
//! [`SnapshotSource`] used by tests and embeddings.
//!
//! The longest-pole invariant: for every milestone text occurring under a
//! subtask's sub-subtasks, the subtask's own copy of that text carries the
//! maximum date across those occurrences. It is re-asserted on every
//! milestone insert, date edit, and delete under a sub-subtask, and when a
//! sub-subtask is removed.

pub mod history;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::model::{
    Category, Milestone, MilestoneOwner, Priority, Role, SubSubtask, Subtask, SubtaskRole, Task,
    User,
};
use crate::snapshot::{FetchContext, Snapshot, SnapshotSource};
use history::{ActionKind, ActionLog, EntityKind};

/// Lane names seeded onto every newly created task.
pub const SEEDED_LANES: [&str; 3] = ["PLANNED", "subtask1", "subtask2"];

/// Partial update for a task; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Default)]
struct IdCounters {
    user: u64,
    task: u64,
    subtask: u64,
    sub_subtask: u64,
    milestone: u64,
}

/// The in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Vec<User>,
    tasks: Vec<Task>,
    subtasks: Vec<Subtask>,
    sub_subtasks: Vec<SubSubtask>,
    milestones: Vec<Milestone>,
    history: ActionLog,
    counters: IdCounters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── users ───────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`] for a blank full name.
    pub fn create_user(
        &mut self,
        full_name: &str,
        email: &str,
        role: Role,
        actor: Option<&str>,
    ) -> Result<String, StoreError> {
        require_name(full_name)?;
        self.counters.user += 1;
        let id = format!("u-{:04}", self.counters.user);
        self.users.push(User {
            id: id.clone(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
        });
        self.history.record(
            ActionKind::Create,
            EntityKind::User,
            &id,
            full_name,
            json!({ "email": email, "role": role }),
            actor,
        );
        debug!(user = %id, "user created");
        Ok(id)
    }

    /// Remove a user, first reassigning every subtask they held to
    /// unassigned. Sub-subtasks keep a dangling id, which resolves to
    /// unassigned at assembly time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownUser`] if the id does not resolve.
    pub fn remove_user(&mut self, user_id: &str, actor: Option<&str>) -> Result<(), StoreError> {
        let position = self
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_string()))?;
        for subtask in &mut self.subtasks {
            if subtask.assigned_to.as_deref() == Some(user_id) {
                subtask.assigned_to = None;
                subtask.updated_at = Utc::now();
            }
        }
        let user = self.users.remove(position);
        self.history.record(
            ActionKind::Delete,
            EntityKind::User,
            &user.id,
            &user.full_name,
            json!({ "email": user.email }),
            actor,
        );
        debug!(user = %user.id, "user removed and unassigned");
        Ok(())
    }

    // ── tasks ───────────────────────────────────────────────────────────

    /// Create a task and seed its three default lanes (`PLANNED`,
    /// `subtask1`, `subtask2`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`] for a blank task name.
    pub fn create_task(
        &mut self,
        name: &str,
        category: Category,
        priority: Priority,
        actor: Option<&str>,
    ) -> Result<String, StoreError> {
        require_name(name)?;
        self.counters.task += 1;
        let id = format!("t-{:04}", self.counters.task);
        let now = Utc::now();
        self.tasks.push(Task {
            id: id.clone(),
            name: name.to_string(),
            category,
            priority,
            created_by: actor.map(str::to_string),
            created_at: now,
            updated_at: now,
        });
        for lane in SEEDED_LANES {
            self.push_subtask(&id, lane, None, actor);
        }
        self.history.record(
            ActionKind::Create,
            EntityKind::Task,
            &id,
            name,
            json!({ "category": category }),
            actor,
        );
        debug!(task = %id, %category, "task created with default lanes");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] if the id does not resolve, or
    /// [`StoreError::EmptyName`] when renaming to a blank name.
    pub fn update_task(
        &mut self,
        task_id: &str,
        update: &TaskUpdate,
        actor: Option<&str>,
    ) -> Result<(), StoreError> {
        if let Some(name) = &update.name {
            require_name(name)?;
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::UnknownTask(task_id.to_string()))?;
        if let Some(name) = &update.name {
            task.name.clone_from(name);
        }
        if let Some(category) = update.category {
            task.category = category;
        }
        if let Some(priority) = update.priority {
            task.priority = Priority::clamped(priority.0);
        }
        task.updated_at = Utc::now();
        let (id, name) = (task.id.clone(), task.name.clone());
        self.history.record(
            ActionKind::Update,
            EntityKind::Task,
            &id,
            &name,
            json!({}),
            actor,
        );
        Ok(())
    }

    /// Delete a task and everything under it: milestones of its subtasks
    /// and sub-subtasks first, then sub-subtasks, then subtasks, then the
    /// task itself.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] if the id does not resolve.
    pub fn remove_task(&mut self, task_id: &str, actor: Option<&str>) -> Result<(), StoreError> {
        let position = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| StoreError::UnknownTask(task_id.to_string()))?;

        let lane_ids: Vec<String> = self
            .subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .map(|s| s.id.clone())
            .collect();
        let leaf_ids: Vec<String> = self
            .sub_subtasks
            .iter()
            .filter(|s| lane_ids.iter().any(|id| *id == s.subtask_id))
            .map(|s| s.id.clone())
            .collect();

        self.milestones.retain(|m| match &m.owner {
            MilestoneOwner::Subtask(id) => !lane_ids.contains(id),
            MilestoneOwner::SubSubtask(id) => !leaf_ids.contains(id),
        });
        self.sub_subtasks.retain(|s| !leaf_ids.contains(&s.id));
        self.subtasks.retain(|s| s.task_id != task_id);
        let task = self.tasks.remove(position);

        self.history.record(
            ActionKind::Delete,
            EntityKind::Task,
            &task.id,
            &task.name,
            json!({ "category": task.category }),
            actor,
        );
        debug!(task = %task.id, lanes = lane_ids.len(), "task removed with cascade");
        Ok(())
    }

    // ── subtasks ────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] for an unknown parent,
    /// [`StoreError::UnknownUser`] for an unknown assignee,
    /// [`StoreError::EmptyName`] for a blank name, or
    /// [`StoreError::ReservedName`] for the computed ACTUAL lane.
    pub fn add_subtask(
        &mut self,
        task_id: &str,
        name: &str,
        assigned_to: Option<&str>,
        actor: Option<&str>,
    ) -> Result<String, StoreError> {
        require_name(name)?;
        if SubtaskRole::from_name(name) == SubtaskRole::Actual {
            return Err(StoreError::ReservedName(name.to_string()));
        }
        if !self.tasks.iter().any(|t| t.id == task_id) {
            return Err(StoreError::UnknownTask(task_id.to_string()));
        }
        self.require_user_if_some(assigned_to)?;
        Ok(self.push_subtask(task_id, name, assigned_to, actor))
    }

    /// Rename a lane; the semantic role is re-derived from the new name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubtask`], [`StoreError::EmptyName`],
    /// or [`StoreError::ReservedName`].
    pub fn rename_subtask(&mut self, subtask_id: &str, name: &str) -> Result<(), StoreError> {
        require_name(name)?;
        if SubtaskRole::from_name(name) == SubtaskRole::Actual {
            return Err(StoreError::ReservedName(name.to_string()));
        }
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::UnknownSubtask(subtask_id.to_string()))?;
        subtask.name = name.to_string();
        subtask.role = SubtaskRole::from_name(name);
        subtask.updated_at = Utc::now();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubtask`] or [`StoreError::UnknownUser`].
    pub fn assign_subtask(
        &mut self,
        subtask_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.require_user_if_some(user_id)?;
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::UnknownSubtask(subtask_id.to_string()))?;
        subtask.assigned_to = user_id.map(str::to_string);
        subtask.updated_at = Utc::now();
        Ok(())
    }

    /// Delete a lane, cascading its milestones and sub-subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubtask`] if the id does not resolve.
    pub fn remove_subtask(
        &mut self,
        subtask_id: &str,
        actor: Option<&str>,
    ) -> Result<(), StoreError> {
        let position = self
            .subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::UnknownSubtask(subtask_id.to_string()))?;

        let leaf_ids: Vec<String> = self
            .sub_subtasks
            .iter()
            .filter(|s| s.subtask_id == subtask_id)
            .map(|s| s.id.clone())
            .collect();
        self.milestones.retain(|m| match &m.owner {
            MilestoneOwner::Subtask(id) => id != subtask_id,
            MilestoneOwner::SubSubtask(id) => !leaf_ids.contains(id),
        });
        self.sub_subtasks.retain(|s| s.subtask_id != subtask_id);
        let subtask = self.subtasks.remove(position);

        if subtask.role == SubtaskRole::Planned {
            self.history.record(
                ActionKind::Delete,
                EntityKind::Subtask,
                &subtask.id,
                &subtask.name,
                json!({}),
                actor,
            );
        }
        debug!(subtask = %subtask.id, "subtask removed with cascade");
        Ok(())
    }

    // ── sub-subtasks ────────────────────────────────────────────────────

    /// Add a leaf under a lane, at `max(order_index) + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubtask`], [`StoreError::UnknownUser`],
    /// or [`StoreError::EmptyName`].
    pub fn add_sub_subtask(
        &mut self,
        subtask_id: &str,
        name: &str,
        assigned_to: Option<&str>,
        actor: Option<&str>,
    ) -> Result<String, StoreError> {
        require_name(name)?;
        if !self.subtasks.iter().any(|s| s.id == subtask_id) {
            return Err(StoreError::UnknownSubtask(subtask_id.to_string()));
        }
        self.require_user_if_some(assigned_to)?;

        let order_index = self
            .sub_subtasks
            .iter()
            .filter(|s| s.subtask_id == subtask_id)
            .map(|s| s.order_index)
            .max()
            .map_or(0, |max| max + 1);

        self.counters.sub_subtask += 1;
        let id = format!("sst-{:04}", self.counters.sub_subtask);
        self.sub_subtasks.push(SubSubtask {
            id: id.clone(),
            subtask_id: subtask_id.to_string(),
            name: name.to_string(),
            assigned_to: assigned_to.map(str::to_string),
            order_index,
            created_by: actor.map(str::to_string),
            created_at: Utc::now(),
        });
        debug!(sub_subtask = %id, order_index, "sub-subtask added");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubSubtask`] or [`StoreError::EmptyName`].
    pub fn rename_sub_subtask(&mut self, id: &str, name: &str) -> Result<(), StoreError> {
        require_name(name)?;
        let node = self
            .sub_subtasks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSubSubtask(id.to_string()))?;
        node.name = name.to_string();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubSubtask`] or [`StoreError::UnknownUser`].
    pub fn assign_sub_subtask(
        &mut self,
        id: &str,
        user_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.require_user_if_some(user_id)?;
        let node = self
            .sub_subtasks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSubSubtask(id.to_string()))?;
        node.assigned_to = user_id.map(str::to_string);
        Ok(())
    }

    /// Delete a leaf, cascading its milestones and re-asserting the parent
    /// roll-up for every milestone text the leaf carried.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubSubtask`] if the id does not resolve.
    pub fn remove_sub_subtask(&mut self, id: &str, actor: Option<&str>) -> Result<(), StoreError> {
        let position = self
            .sub_subtasks
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSubSubtask(id.to_string()))?;
        let node = self.sub_subtasks.remove(position);

        let mut touched_texts: Vec<String> = Vec::new();
        self.milestones.retain(|m| {
            if m.owner.sub_subtask_id() == Some(id) {
                if !touched_texts.contains(&m.text) {
                    touched_texts.push(m.text.clone());
                }
                false
            } else {
                true
            }
        });
        for text in &touched_texts {
            self.assert_rollup(&node.subtask_id, text);
        }

        if self.subtask_role(&node.subtask_id) == Some(SubtaskRole::Planned) {
            self.history.record(
                ActionKind::Delete,
                EntityKind::SubSubtask,
                &node.id,
                &node.name,
                json!({}),
                actor,
            );
        }
        debug!(sub_subtask = %node.id, texts = touched_texts.len(), "sub-subtask removed");
        Ok(())
    }

    // ── milestones ──────────────────────────────────────────────────────

    /// Attach a milestone to a subtask or sub-subtask. For a sub-subtask
    /// owner the parent lane's copy of the same text is re-asserted to the
    /// longest pole.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSubtask`] /
    /// [`StoreError::UnknownSubSubtask`] for an unresolved owner, or
    /// [`StoreError::EmptyName`] for blank text.
    pub fn add_milestone(
        &mut self,
        owner: MilestoneOwner,
        date: NaiveDate,
        text: &str,
        actor: Option<&str>,
    ) -> Result<String, StoreError> {
        require_name(text)?;
        match &owner {
            MilestoneOwner::Subtask(id) => {
                if !self.subtasks.iter().any(|s| s.id == *id) {
                    return Err(StoreError::UnknownSubtask(id.clone()));
                }
            }
            MilestoneOwner::SubSubtask(id) => {
                if !self.sub_subtasks.iter().any(|s| s.id == *id) {
                    return Err(StoreError::UnknownSubSubtask(id.clone()));
                }
            }
        }

        self.counters.milestone += 1;
        let id = format!("m-{:04}", self.counters.milestone);
        self.milestones.push(Milestone {
            id: id.clone(),
            owner: owner.clone(),
            date,
            text: text.to_string(),
            created_by: actor.map(str::to_string),
        });

        if let Some(leaf_id) = owner.sub_subtask_id() {
            if let Some(parent_id) = self.parent_lane_of_leaf(leaf_id) {
                self.assert_rollup(&parent_id, text);
            }
        }

        if let Some(lane) = self.owning_lane(&owner) {
            if lane.role == SubtaskRole::Planned {
                let lane_name = lane.name.clone();
                self.history.record(
                    ActionKind::Create,
                    EntityKind::Milestone,
                    &id,
                    text,
                    json!({
                        "subtask_name": lane_name,
                        "date": date,
                        "kind": match owner {
                            MilestoneOwner::Subtask(_) => "subtask",
                            MilestoneOwner::SubSubtask(_) => "sub_subtask",
                        },
                    }),
                    actor,
                );
            }
        }
        debug!(milestone = %id, %date, text, "milestone added");
        Ok(id)
    }

    /// Change a milestone's date. For sub-subtask-owned milestones the
    /// parent roll-up is re-asserted, covering the case where the true
    /// maximum decreases.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownMilestone`] if the id does not resolve.
    pub fn move_milestone(&mut self, id: &str, date: NaiveDate) -> Result<(), StoreError> {
        let milestone = self
            .milestones
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::UnknownMilestone(id.to_string()))?;
        milestone.date = date;
        let owner = milestone.owner.clone();
        let text = milestone.text.clone();

        if let Some(leaf_id) = owner.sub_subtask_id() {
            if let Some(parent_id) = self.parent_lane_of_leaf(leaf_id) {
                self.assert_rollup(&parent_id, &text);
            }
        }
        Ok(())
    }

    /// Delete a milestone. For sub-subtask-owned milestones the parent copy
    /// is recomputed to the next-highest remaining date, or removed when no
    /// occurrence of the text remains.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownMilestone`] if the id does not resolve.
    pub fn remove_milestone(
        &mut self,
        id: &str,
        actor: Option<&str>,
    ) -> Result<Milestone, StoreError> {
        let position = self
            .milestones
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| StoreError::UnknownMilestone(id.to_string()))?;
        let milestone = self.milestones.remove(position);

        if let Some(leaf_id) = milestone.owner.sub_subtask_id() {
            if let Some(parent_id) = self.parent_lane_of_leaf(leaf_id) {
                self.assert_rollup(&parent_id, &milestone.text);
            }
        }

        if let Some(lane) = self.owning_lane(&milestone.owner) {
            if lane.role == SubtaskRole::Planned {
                let lane_name = lane.name.clone();
                self.history.record(
                    ActionKind::Delete,
                    EntityKind::Milestone,
                    &milestone.id,
                    &milestone.text,
                    json!({ "subtask_name": lane_name, "date": milestone.date }),
                    actor,
                );
            }
        }
        debug!(milestone = %milestone.id, "milestone removed");
        Ok(milestone)
    }

    // ── reads ───────────────────────────────────────────────────────────

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    pub fn sub_subtasks(&self) -> &[SubSubtask] {
        &self.sub_subtasks
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    /// Materialize a snapshot with the documented ordering: tasks by
    /// category (stable), sub-subtasks by `order_index`.
    pub fn snapshot(&self) -> Snapshot {
        let mut tasks = self.tasks.clone();
        tasks.sort_by_key(|t| t.category);
        let mut sub_subtasks = self.sub_subtasks.clone();
        sub_subtasks.sort_by_key(|s| s.order_index);
        Snapshot {
            users: self.users.clone(),
            tasks,
            subtasks: self.subtasks.clone(),
            sub_subtasks,
            milestones: self.milestones.clone(),
        }
    }

    // ── internals ───────────────────────────────────────────────────────

    fn push_subtask(
        &mut self,
        task_id: &str,
        name: &str,
        assigned_to: Option<&str>,
        actor: Option<&str>,
    ) -> String {
        self.counters.subtask += 1;
        let id = format!("st-{:04}", self.counters.subtask);
        let now = Utc::now();
        self.subtasks.push(Subtask {
            id: id.clone(),
            task_id: task_id.to_string(),
            name: name.to_string(),
            role: SubtaskRole::from_name(name),
            assigned_to: assigned_to.map(str::to_string),
            created_by: actor.map(str::to_string),
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Re-assert the longest-pole invariant for one `(lane, text)` pair.
    fn assert_rollup(&mut self, subtask_id: &str, text: &str) {
        let leaf_ids: Vec<&str> = self
            .sub_subtasks
            .iter()
            .filter(|s| s.subtask_id == subtask_id)
            .map(|s| s.id.as_str())
            .collect();
        let latest: Option<NaiveDate> = self
            .milestones
            .iter()
            .filter(|m| {
                m.text == text
                    && m.owner
                        .sub_subtask_id()
                        .is_some_and(|id| leaf_ids.contains(&id))
            })
            .map(|m| m.date)
            .max();

        let parent_position = self.milestones.iter().position(|m| {
            m.text == text && m.owner.subtask_id().is_some_and(|id| id == subtask_id)
        });

        match (latest, parent_position) {
            (Some(date), Some(position)) => {
                if self.milestones[position].date != date {
                    trace!(subtask = subtask_id, text, %date, "roll-up date updated");
                    self.milestones[position].date = date;
                }
            }
            (Some(date), None) => {
                self.counters.milestone += 1;
                let id = format!("m-{:04}", self.counters.milestone);
                trace!(subtask = subtask_id, text, %date, "roll-up milestone created");
                self.milestones.push(Milestone {
                    id,
                    owner: MilestoneOwner::Subtask(subtask_id.to_string()),
                    date,
                    text: text.to_string(),
                    created_by: None,
                });
            }
            (None, Some(position)) => {
                trace!(subtask = subtask_id, text, "roll-up milestone removed");
                self.milestones.remove(position);
            }
            (None, None) => {}
        }
    }

    fn parent_lane_of_leaf(&self, leaf_id: &str) -> Option<String> {
        self.sub_subtasks
            .iter()
            .find(|s| s.id == leaf_id)
            .map(|s| s.subtask_id.clone())
    }

    fn owning_lane(&self, owner: &MilestoneOwner) -> Option<&Subtask> {
        let lane_id = match owner {
            MilestoneOwner::Subtask(id) => id.clone(),
            MilestoneOwner::SubSubtask(id) => self.parent_lane_of_leaf(id)?,
        };
        self.subtasks.iter().find(|s| s.id == lane_id)
    }

    fn subtask_role(&self, subtask_id: &str) -> Option<SubtaskRole> {
        self.subtasks
            .iter()
            .find(|s| s.id == subtask_id)
            .map(|s| s.role)
    }

    fn require_user_if_some(&self, user_id: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = user_id {
            if !self.users.iter().any(|u| u.id == id) {
                return Err(StoreError::UnknownUser(id.to_string()));
            }
        }
        Ok(())
    }
}

impl SnapshotSource for MemoryStore {
    /// The store is single-realm; the context is accepted for interface
    /// parity with remote sources.
    fn fetch(&self, _ctx: &FetchContext) -> Result<Snapshot, crate::error::FetchError> {
        Ok(self.snapshot())
    }
}

fn require_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(())
}
