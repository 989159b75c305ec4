//! Shared dataset fixture for integration tests.
//!
//! Seeds a realistic tracker dataset through the store API, so every test
//! exercises the same lifecycle paths (lane seeding, roll-ups, cascades)
//! the application does. Tests address entities by name through the id
//! maps; the fixture is rebuilt per test and never shared mutably.

#![allow(dead_code)]

use std::collections::HashMap;

use chrono::NaiveDate;

use polestar::assemble::{TaskGroup, assemble};
use polestar::model::{Category, MilestoneOwner, Priority, Role, SubtaskRole};
use polestar::store::MemoryStore;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A seeded store plus name → id maps for addressing entities in asserts.
pub struct TrackerFixture {
    pub store: MemoryStore,
    users: HashMap<String, String>,
    tasks: HashMap<String, String>,
    /// Keyed `"task/lane"`.
    lanes: HashMap<String, String>,
    /// Keyed `"task/lane/leaf"`.
    leaves: HashMap<String, String>,
}

impl TrackerFixture {
    pub fn empty() -> Self {
        Self {
            store: MemoryStore::new(),
            users: HashMap::new(),
            tasks: HashMap::new(),
            lanes: HashMap::new(),
            leaves: HashMap::new(),
        }
    }

    /// The canonical dataset used across the derived-view tests:
    ///
    /// - Dana Smith, Riley Chen (users), Ava Patel (admin).
    /// - `Login` (dev): plan Dev Complete 03-01 / Prod Merge Done 03-20;
    ///   lane `Backend` (Dana) with leaves `OAuth`, `Sessions`; lane `UI`
    ///   (Riley). Backend finishes Dev Complete late (03-06 via OAuth),
    ///   UI finishes early (02-28).
    /// - `Billing` (support): plan Dev Complete 04-01; lane `Invoices`
    ///   (Riley) CLOSED on 04-05 — the whole task counts as closed.
    /// - `Backup` (infra): lane `Ops` (Ava), no milestones anywhere.
    pub fn standard() -> Self {
        let mut fixture = Self::empty();
        fixture.add_user("Dana Smith", "dana@example.com", Role::User);
        fixture.add_user("Riley Chen", "riley@example.com", Role::User);
        fixture.add_user("Ava Patel", "ava@example.com", Role::Admin);

        fixture.add_task("Login", Category::Dev);
        fixture.add_lane("Login", "Backend", Some("Dana Smith"));
        fixture.add_leaf("Login", "Backend", "OAuth", None);
        fixture.add_leaf("Login", "Backend", "Sessions", None);
        fixture.add_lane("Login", "UI", Some("Riley Chen"));

        fixture.plan("Login", date(2024, 3, 1), "Dev Complete");
        fixture.plan("Login", date(2024, 3, 20), "Prod Merge Done");
        fixture.lane_milestone("Login", "Backend", date(2024, 3, 4), "Dev Complete");
        fixture.leaf_milestone("Login", "Backend", "OAuth", date(2024, 3, 6), "Dev Complete");
        fixture.leaf_milestone("Login", "Backend", "OAuth", date(2024, 3, 2), "In progress");
        fixture.leaf_milestone("Login", "Backend", "Sessions", date(2024, 3, 3), "In progress");
        fixture.lane_milestone("Login", "UI", date(2024, 2, 28), "Dev Complete");

        fixture.add_task("Billing", Category::Support);
        fixture.add_lane("Billing", "Invoices", Some("Riley Chen"));
        fixture.plan("Billing", date(2024, 4, 1), "Dev Complete");
        fixture.lane_milestone("Billing", "Invoices", date(2024, 4, 5), "CLOSED");

        fixture.add_task("Backup", Category::Infra);
        fixture.add_lane("Backup", "Ops", Some("Ava Patel"));

        fixture
    }

    pub fn add_user(&mut self, name: &str, email: &str, role: Role) -> String {
        let id = self
            .store
            .create_user(name, email, role, None)
            .expect("create user");
        self.users.insert(name.to_string(), id.clone());
        id
    }

    /// Create a task and drop the two seeded placeholder lanes, keeping
    /// PLANNED. Named lanes are added explicitly by the tests.
    pub fn add_task(&mut self, name: &str, category: Category) -> String {
        let id = self
            .store
            .create_task(name, category, Priority::default(), None)
            .expect("create task");
        let placeholders: Vec<String> = self
            .store
            .subtasks()
            .iter()
            .filter(|s| s.task_id == id && s.role == SubtaskRole::Ordinary)
            .map(|s| s.id.clone())
            .collect();
        for lane in placeholders {
            self.store.remove_subtask(&lane, None).expect("trim lane");
        }
        self.tasks.insert(name.to_string(), id.clone());
        id
    }

    pub fn add_lane(&mut self, task: &str, lane: &str, assignee: Option<&str>) -> String {
        let task_id = self.task_id(task);
        let user_id = assignee.map(|name| self.user_id(name));
        let id = self
            .store
            .add_subtask(&task_id, lane, user_id.as_deref(), None)
            .expect("add lane");
        self.lanes.insert(format!("{task}/{lane}"), id.clone());
        id
    }

    pub fn add_leaf(&mut self, task: &str, lane: &str, leaf: &str, assignee: Option<&str>) -> String {
        let lane_id = self.lane_id(task, lane);
        let user_id = assignee.map(|name| self.user_id(name));
        let id = self
            .store
            .add_sub_subtask(&lane_id, leaf, user_id.as_deref(), None)
            .expect("add leaf");
        self.leaves
            .insert(format!("{task}/{lane}/{leaf}"), id.clone());
        id
    }

    /// Add a target date to the task's PLANNED lane.
    pub fn plan(&mut self, task: &str, date: NaiveDate, text: &str) -> String {
        let task_id = self.task_id(task);
        let planned = self
            .store
            .subtasks()
            .iter()
            .find(|s| s.task_id == task_id && s.role == SubtaskRole::Planned)
            .expect("planned lane")
            .id
            .clone();
        self.store
            .add_milestone(MilestoneOwner::Subtask(planned), date, text, None)
            .expect("plan milestone")
    }

    pub fn lane_milestone(&mut self, task: &str, lane: &str, date: NaiveDate, text: &str) -> String {
        let lane_id = self.lane_id(task, lane);
        self.store
            .add_milestone(MilestoneOwner::Subtask(lane_id), date, text, None)
            .expect("lane milestone")
    }

    pub fn leaf_milestone(
        &mut self,
        task: &str,
        lane: &str,
        leaf: &str,
        date: NaiveDate,
        text: &str,
    ) -> String {
        let leaf_id = self.leaf_id(task, lane, leaf);
        self.store
            .add_milestone(MilestoneOwner::SubSubtask(leaf_id), date, text, None)
            .expect("leaf milestone")
    }

    pub fn user_id(&self, name: &str) -> String {
        self.users[name].clone()
    }

    pub fn task_id(&self, name: &str) -> String {
        self.tasks[name].clone()
    }

    pub fn lane_id(&self, task: &str, lane: &str) -> String {
        self.lanes[&format!("{task}/{lane}")].clone()
    }

    pub fn leaf_id(&self, task: &str, lane: &str, leaf: &str) -> String {
        self.leaves[&format!("{task}/{lane}/{leaf}")].clone()
    }

    /// Assemble the current state of the store.
    pub fn groups(&self) -> Vec<TaskGroup> {
        assemble(&self.store.snapshot())
    }

    /// The lane's milestone dates carrying `text`, for roll-up asserts.
    pub fn lane_dates(&self, task: &str, lane: &str, text: &str) -> Vec<NaiveDate> {
        let lane_id = self.lane_id(task, lane);
        self.store
            .milestones()
            .iter()
            .filter(|m| m.owner.subtask_id() == Some(lane_id.as_str()) && m.text == text)
            .map(|m| m.date)
            .collect()
    }
}
