//! In-memory tracker for tests.
//!
//! [`MockTracker`] keeps projects, sprints, work items and sprint members in
//! memory and answers the way the ApiPort API does: unknown ids fail with an
//! upstream 404, sprint transitions are checked, and created resources get
//! server-assigned ids and statuses. Every trait call is counted, and the next
//! call can be made to fail with an arbitrary status.
//!
//! Available in unit tests and with the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! apiport = { path = "...", features = ["test-util"] }
//! ```
//!
//! ```rust,ignore
//! use apiport::mock::MockTracker;
//! use apiport::domain::ProjectId;
//! use apiport::Tracker;
//!
//! #[tokio::test]
//! async fn test_reads_seeded_project() {
//!     let tracker = MockTracker::new().with_project(1, "Alpha");
//!     let project = tracker.get_project(ProjectId::new(1).unwrap()).await.unwrap();
//!     assert_eq!(project["name"], "Alpha");
//!     assert_eq!(tracker.call_count(), 1);
//! }
//! ```

use crate::domain::{
    NewSprint, NewWorkItem, ProjectId, SprintId, UserId, WorkItemId, WorkItemUpdate,
    dedup_work_items,
};
use crate::error::{Error, Result};
use crate::tracker::Tracker;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

const NOT_FOUND_BODY: &str = r#"{"detail":"Not found."}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Membership {
    id: u64,
    sprint: u64,
    user: u64,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    projects: BTreeMap<u64, Value>,
    sprints: BTreeMap<u64, Value>,
    work_items: BTreeMap<u64, Value>,
    members: Vec<Membership>,
    failure: Option<(u16, String)>,
}

impl MockState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Keep generated ids clear of seeded ones.
    fn reserve(&mut self, id: u64) {
        self.next_id = self.next_id.max(id);
    }

    fn project(&self, id: u64) -> Result<&Value> {
        self.projects.get(&id).ok_or_else(not_found)
    }

    fn sprint_mut(&mut self, id: u64) -> Result<&mut Value> {
        self.sprints.get_mut(&id).ok_or_else(not_found)
    }

    fn items_of(&self, project: u64) -> impl Iterator<Item = &Value> {
        self.work_items
            .values()
            .filter(move |item| item["project"] == json!(project))
    }
}

fn not_found() -> Error {
    Error::upstream(404, NOT_FOUND_BODY)
}

fn bad_request(detail: &str) -> Error {
    Error::upstream(400, &json!({ "detail": detail }).to_string())
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// In-memory stand-in for the ApiPort API.
#[derive(Debug, Default)]
pub struct MockTracker {
    state: Mutex<MockState>,
    calls: AtomicUsize,
}

impl MockTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project.
    #[must_use]
    pub fn with_project(mut self, id: u64, name: &str) -> Self {
        let state = self.state.get_mut();
        state.reserve(id);
        state.projects.insert(
            id,
            json!({
                "id": id,
                "name": name,
                "status": "active",
                "description": null,
                "created_at": "2025-01-06T09:00:00Z",
            }),
        );
        self
    }

    /// Seed a sprint with the given status.
    #[must_use]
    pub fn with_sprint(mut self, id: u64, project: u64, name: &str, status: &str) -> Self {
        let state = self.state.get_mut();
        state.reserve(id);
        state.sprints.insert(
            id,
            json!({
                "id": id,
                "project": project,
                "name": name,
                "status": status,
            }),
        );
        self
    }

    /// Seed a work item from raw JSON. `id` and `project` are set on top of `fields`.
    #[must_use]
    pub fn with_work_item(mut self, id: u64, project: u64, fields: Value) -> Self {
        let state = self.state.get_mut();
        state.reserve(id);
        let mut item = into_object(fields);
        item.insert("id".into(), json!(id));
        item.insert("project".into(), json!(project));
        state.work_items.insert(id, Value::Object(item));
        self
    }

    /// Make the next call fail with `status` and `body`, without touching state.
    pub async fn fail_next(&self, status: u16, body: &str) {
        self.state.lock().await.failure = Some((status, body.to_string()));
    }

    /// Number of tracker calls made so far, including failed ones.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored work item.
    pub async fn work_item(&self, id: u64) -> Option<Value> {
        self.state.lock().await.work_items.get(&id).cloned()
    }

    /// User ids currently on a sprint team.
    pub async fn sprint_members(&self, sprint: u64) -> Vec<u64> {
        self.state
            .lock()
            .await
            .members
            .iter()
            .filter(|m| m.sprint == sprint)
            .map(|m| m.user)
            .collect()
    }

    /// Count the call, lock the state and surface an injected failure.
    async fn begin(&self) -> Result<tokio::sync::MutexGuard<'_, MockState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some((status, body)) = state.failure.take() {
            return Err(Error::upstream(status, &body));
        }
        Ok(state)
    }

    async fn transition(&self, id: SprintId, from: &str, to: &str) -> Result<Value> {
        let mut state = self.begin().await?;
        let sprint = state.sprint_mut(id.get())?;
        if sprint["status"] != from {
            return Err(bad_request(&format!(
                "Sprint is {}, expected {from}.",
                sprint["status"].as_str().unwrap_or("unknown")
            )));
        }
        sprint["status"] = json!(to);
        Ok(sprint.clone())
    }
}

#[async_trait]
impl Tracker for MockTracker {
    async fn list_projects(&self) -> Result<Vec<Value>> {
        let state = self.begin().await?;
        Ok(state.projects.values().cloned().collect())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Value> {
        let state = self.begin().await?;
        state.project(id.get()).cloned()
    }

    async fn list_sprints(&self, project: ProjectId) -> Result<Vec<Value>> {
        let state = self.begin().await?;
        state.project(project.get())?;
        Ok(state
            .sprints
            .values()
            .filter(|s| s["project"] == json!(project.get()))
            .cloned()
            .collect())
    }

    async fn get_sprint(&self, id: SprintId) -> Result<Value> {
        let state = self.begin().await?;
        state.sprints.get(&id.get()).cloned().ok_or_else(not_found)
    }

    async fn create_sprint(&self, project: ProjectId, sprint: &NewSprint) -> Result<Value> {
        let mut state = self.begin().await?;
        state.project(project.get())?;

        let id = state.allocate_id();
        let mut stored = into_object(sprint.payload()?);
        stored.insert("id".into(), json!(id));
        stored.insert("project".into(), json!(project.get()));
        let stored = Value::Object(stored);
        state.sprints.insert(id, stored.clone());
        Ok(stored)
    }

    async fn activate_sprint(&self, id: SprintId) -> Result<Value> {
        self.transition(id, "planned", "active").await
    }

    async fn close_sprint(&self, id: SprintId) -> Result<Value> {
        self.transition(id, "active", "closed").await
    }

    async fn list_work_items(&self, project: ProjectId) -> Result<Vec<Value>> {
        let state = self.begin().await?;
        state.project(project.get())?;
        Ok(state.items_of(project.get()).cloned().collect())
    }

    async fn get_work_item(&self, id: WorkItemId) -> Result<Value> {
        let state = self.begin().await?;
        state.work_items.get(&id.get()).cloned().ok_or_else(not_found)
    }

    async fn create_work_item(&self, project: ProjectId, item: &NewWorkItem) -> Result<Value> {
        let mut state = self.begin().await?;
        state.project(project.get())?;
        if let Some(sprint) = item.sprint_id()
            && !state.sprints.contains_key(&sprint.get())
        {
            return Err(bad_request("Unknown sprint."));
        }

        let id = state.allocate_id();
        let mut stored = into_object(item.payload()?);
        let sprint = stored.remove("sprint_id").unwrap_or(Value::Null);
        stored.insert("id".into(), json!(id));
        stored.insert("project".into(), json!(project.get()));
        stored.insert("sprint".into(), sprint);
        let stored = Value::Object(stored);
        state.work_items.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_work_item(&self, id: WorkItemId, update: &WorkItemUpdate) -> Result<Value> {
        update.validate()?;
        let mut state = self.begin().await?;
        let item = state.work_items.get_mut(&id.get()).ok_or_else(not_found)?;

        for (key, value) in into_object(update.payload()?) {
            let key = if key == "sprint_id" { "sprint".to_string() } else { key };
            item[key.as_str()] = value;
        }
        Ok(item.clone())
    }

    async fn get_backlog(&self, project: ProjectId) -> Result<Vec<Value>> {
        let state = self.begin().await?;
        state.project(project.get())?;
        Ok(state
            .items_of(project.get())
            .filter(|item| item["sprint"].is_null())
            .cloned()
            .collect())
    }

    async fn bulk_assign_to_sprint(&self, sprint: SprintId, items: &[WorkItemId]) -> Result<Value> {
        let items = dedup_work_items(items)?;
        let mut state = self.begin().await?;
        state.sprint_mut(sprint.get())?;
        if items.iter().any(|id| !state.work_items.contains_key(&id.get())) {
            return Err(bad_request("Unknown work item."));
        }

        for id in &items {
            if let Some(item) = state.work_items.get_mut(&id.get()) {
                item["sprint"] = json!(sprint.get());
            }
        }
        Ok(json!({ "assigned": items.len(), "sprint_id": sprint.get() }))
    }

    async fn add_sprint_member(&self, sprint: SprintId, user: UserId) -> Result<Value> {
        let mut state = self.begin().await?;
        state.sprint_mut(sprint.get())?;
        if state
            .members
            .iter()
            .any(|m| m.sprint == sprint.get() && m.user == user.get())
        {
            return Err(bad_request("User is already a member of this sprint."));
        }

        let id = state.allocate_id();
        state.members.push(Membership {
            id,
            sprint: sprint.get(),
            user: user.get(),
        });
        Ok(json!({ "id": id, "sprint": sprint.get(), "user": user.get() }))
    }

    async fn remove_sprint_member(&self, sprint: SprintId, member_id: u64) -> Result<Value> {
        let mut state = self.begin().await?;
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.sprint == sprint.get() && m.id == member_id));
        if state.members.len() == before {
            return Err(not_found());
        }
        Ok(Value::Null)
    }
}
