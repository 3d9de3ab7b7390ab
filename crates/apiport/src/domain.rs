//! Typed identifiers and request bodies.
//!
//! Responses from the API are passed through as JSON; only what the client
//! sends is modelled here. Every constructor validates its input so that a
//! value of these types is always safe to send.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted work item priority.
pub const MIN_PRIORITY: u8 = 1;

/// Highest accepted work item priority.
pub const MAX_PRIORITY: u8 = 5;

/// Priority used when none is given.
pub const DEFAULT_PRIORITY: u8 = 2;

/// Date format accepted for sprint start and end dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier, rejecting zero.
            ///
            /// # Errors
            ///
            /// Returns `Error::Validation` if `raw` is zero.
            pub fn new(raw: u64) -> Result<Self> {
                if raw == 0 {
                    return Err(Error::validation($field, "must be a positive integer"));
                }
                Ok(Self(raw))
            }

            /// The raw identifier.
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let raw = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| Error::validation($field, format!("'{s}' is not a positive integer")))?;
                Self::new(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of a project.
    ProjectId,
    "project_id"
);
id_type!(
    /// Identifier of a sprint.
    SprintId,
    "sprint_id"
);
id_type!(
    /// Identifier of a work item.
    WorkItemId,
    "work_item_id"
);
id_type!(
    /// Identifier of a user.
    UserId,
    "user_id"
);

/// Lifecycle state of a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    /// Created, not started.
    Planned,
    /// In progress.
    Active,
    /// Finished.
    Closed,
}

/// Kind of work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    /// General task.
    #[default]
    Task,
    /// User story, counted towards sprint story points.
    UserStory,
    /// Bug fix.
    Bug,
    /// Epic grouping other items.
    Epic,
}

impl WorkItemType {
    /// Wire name of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::UserStory => "user_story",
            Self::Bug => "bug",
            Self::Epic => "epic",
        }
    }
}

impl FromStr for WorkItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "user_story" | "user-story" | "story" => Ok(Self::UserStory),
            "bug" => Ok(Self::Bug),
            "epic" => Ok(Self::Epic),
            other => Err(Error::validation(
                "item_type",
                format!("'{other}' is not one of task, user_story, bug, epic"),
            )),
        }
    }
}

/// Workflow state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl WorkItemStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl FromStr for WorkItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "to_do" => Ok(Self::Todo),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(Error::validation(
                "status",
                format!("'{other}' is not one of todo, in_progress, done"),
            )),
        }
    }
}

/// Work item priority, 1 (highest) through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Validate a raw priority.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` outside `MIN_PRIORITY..=MAX_PRIORITY`.
    pub fn new(raw: u8) -> Result<Self> {
        if (MIN_PRIORITY..=MAX_PRIORITY).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(Error::validation(
                "priority",
                format!("{raw} is outside {MIN_PRIORITY}-{MAX_PRIORITY}"),
            ))
        }
    }

    /// The raw priority.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY)
    }
}

/// Parse a `YYYY-MM-DD` date for `field`.
///
/// # Errors
///
/// Returns `Error::Validation` if the text is not a valid calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::validation(field, format!("'{value}' is not a YYYY-MM-DD date")))
}

/// Trim `value` and reject it when nothing is left.
fn required_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, treating blank as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A sprint to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSprint {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    velocity_target: Option<u32>,
}

impl NewSprint {
    /// Start describing a sprint called `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the name is blank.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: required_text("name", name)?,
            goal: None,
            start_date: None,
            end_date: None,
            velocity_target: None,
        })
    }

    /// Set the sprint goal. Blank goals are dropped.
    #[must_use]
    pub fn with_goal(mut self, goal: Option<String>) -> Self {
        self.goal = optional_text(goal);
        self
    }

    /// Set the start and end dates.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the sprint would end before it starts.
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            return Err(Error::validation(
                "end_date",
                format!("{end} is before start_date {start}"),
            ));
        }
        self.start_date = start;
        self.end_date = end;
        Ok(self)
    }

    /// Set the velocity target in story points.
    #[must_use]
    pub fn with_velocity_target(mut self, target: Option<u32>) -> Self {
        self.velocity_target = target;
        self
    }

    /// Sprint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sprint goal.
    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    /// Planned start date.
    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Planned end date.
    #[must_use]
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Request body; new sprints always start out planned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn payload(&self) -> Result<serde_json::Value> {
        #[derive(Serialize)]
        struct Payload<'a> {
            #[serde(flatten)]
            sprint: &'a NewSprint,
            status: SprintStatus,
        }
        Ok(serde_json::to_value(Payload {
            sprint: self,
            status: SprintStatus::Planned,
        })?)
    }
}

/// A work item to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWorkItem {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    item_type: WorkItemType,
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate_points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sprint_id: Option<SprintId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<WorkItemId>,
}

impl NewWorkItem {
    /// Start describing a task called `title` with default priority.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title is blank.
    pub fn new(title: &str) -> Result<Self> {
        Ok(Self {
            title: required_text("title", title)?,
            description: None,
            item_type: WorkItemType::default(),
            priority: Priority::default(),
            estimate_points: None,
            assignee_id: None,
            sprint_id: None,
            parent_id: None,
        })
    }

    /// Set the description. Blank descriptions are dropped.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = optional_text(description);
        self
    }

    /// Set the item type.
    #[must_use]
    pub fn with_type(mut self, item_type: WorkItemType) -> Self {
        self.item_type = item_type;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the story point estimate.
    #[must_use]
    pub fn with_estimate(mut self, points: Option<u32>) -> Self {
        self.estimate_points = points;
        self
    }

    /// Assign to a user.
    #[must_use]
    pub fn with_assignee(mut self, assignee: Option<UserId>) -> Self {
        self.assignee_id = assignee;
        self
    }

    /// Place in a sprint instead of the backlog.
    #[must_use]
    pub fn with_sprint(mut self, sprint: Option<SprintId>) -> Self {
        self.sprint_id = sprint;
        self
    }

    /// Make this a child of another work item.
    #[must_use]
    pub fn with_parent(mut self, parent: Option<WorkItemId>) -> Self {
        self.parent_id = parent;
        self
    }

    /// Work item title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Work item type.
    #[must_use]
    pub fn item_type(&self) -> WorkItemType {
        self.item_type
    }

    /// Sprint the item is created in, if any.
    #[must_use]
    pub fn sprint_id(&self) -> Option<SprintId> {
        self.sprint_id
    }

    /// Request body; new work items always start out as todo.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn payload(&self) -> Result<serde_json::Value> {
        #[derive(Serialize)]
        struct Payload<'a> {
            #[serde(flatten)]
            item: &'a NewWorkItem,
            status: WorkItemStatus,
        }
        Ok(serde_json::to_value(Payload {
            item: self,
            status: WorkItemStatus::Todo,
        })?)
    }
}

/// Fields to change on an existing work item. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkItemUpdate {
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkItemStatus>,
    /// New assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    /// Move to this sprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<SprintId>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New story point estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate_points: Option<u32>,
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkItemUpdate {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the update before sending it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if no field is set or the title is blank.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::validation(
                "update",
                "at least one field to change is required",
            ));
        }
        if let Some(title) = &self.title {
            required_text("title", title)?;
        }
        Ok(())
    }

    /// Request body containing only the set fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Remove duplicate ids, keeping the first occurrence, and reject empty lists.
///
/// # Errors
///
/// Returns `Error::Validation` if `ids` is empty.
pub fn dedup_work_items(ids: &[WorkItemId]) -> Result<Vec<WorkItemId>> {
    if ids.is_empty() {
        return Err(Error::validation(
            "work_item_ids",
            "at least one work item id is required",
        ));
    }
    let mut seen = std::collections::HashSet::new();
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_ids_reject_zero() {
        assert!(ProjectId::new(0).is_err());
        assert_eq!(ProjectId::new(7).unwrap().get(), 7);
        let err = SprintId::new(0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sprint_id: must be a positive integer");
    }

    #[rstest]
    #[case::plain("42", Some(42))]
    #[case::padded(" 42 ", Some(42))]
    #[case::zero("0", None)]
    #[case::negative("-1", None)]
    #[case::word("abc", None)]
    fn test_id_from_str(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(input.parse::<ProjectId>().ok().map(ProjectId::get), expected);
    }

    #[rstest]
    #[case::task("task", WorkItemType::Task)]
    #[case::story("user_story", WorkItemType::UserStory)]
    #[case::story_hyphen("user-story", WorkItemType::UserStory)]
    #[case::bug_upper("BUG", WorkItemType::Bug)]
    #[case::epic("epic", WorkItemType::Epic)]
    fn test_parse_item_type(#[case] input: &str, #[case] expected: WorkItemType) {
        assert_eq!(input.parse::<WorkItemType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_item_type_rejects_unknown() {
        let err = "chore".parse::<WorkItemType>().unwrap_err();
        assert!(err.is_validation());
    }

    #[rstest]
    #[case::todo("todo", WorkItemStatus::Todo)]
    #[case::in_progress("in_progress", WorkItemStatus::InProgress)]
    #[case::in_progress_hyphen("In-Progress", WorkItemStatus::InProgress)]
    #[case::done("done", WorkItemStatus::Done)]
    fn test_parse_status(#[case] input: &str, #[case] expected: WorkItemStatus) {
        assert_eq!(input.parse::<WorkItemStatus>().unwrap(), expected);
    }

    #[rstest]
    #[case::zero(0, false)]
    #[case::min(1, true)]
    #[case::max(5, true)]
    #[case::above(6, false)]
    fn test_priority_range(#[case] raw: u8, #[case] ok: bool) {
        assert_eq!(Priority::new(raw).is_ok(), ok);
    }

    #[test]
    fn test_sprint_payload_skips_unset_fields() {
        let sprint = NewSprint::new("  Sprint 1 ").unwrap();
        assert_eq!(
            sprint.payload().unwrap(),
            json!({"name": "Sprint 1", "status": "planned"})
        );
    }

    #[test]
    fn test_sprint_payload_with_all_fields() {
        let sprint = NewSprint::new("Sprint 2")
            .unwrap()
            .with_goal(Some("Ship login".into()))
            .with_dates(
                Some(parse_date("start_date", "2025-03-03").unwrap()),
                Some(parse_date("end_date", "2025-03-14").unwrap()),
            )
            .unwrap()
            .with_velocity_target(Some(21));

        assert_eq!(
            sprint.payload().unwrap(),
            json!({
                "name": "Sprint 2",
                "goal": "Ship login",
                "start_date": "2025-03-03",
                "end_date": "2025-03-14",
                "velocity_target": 21,
                "status": "planned",
            })
        );
    }

    #[test]
    fn test_sprint_rejects_blank_name_and_inverted_dates() {
        assert!(NewSprint::new("   ").is_err());

        let start = parse_date("start_date", "2025-03-14").unwrap();
        let end = parse_date("end_date", "2025-03-03").unwrap();
        let err = NewSprint::new("S")
            .unwrap()
            .with_dates(Some(start), Some(end))
            .unwrap_err();
        assert!(err.to_string().contains("end_date"));
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("start_date", "03/14/2025").is_err());
        assert!(parse_date("start_date", "2025-02-30").is_err());
    }

    #[test]
    fn test_work_item_payload_defaults() {
        let item = NewWorkItem::new("Fix login").unwrap();
        assert_eq!(
            item.payload().unwrap(),
            json!({
                "title": "Fix login",
                "item_type": "task",
                "priority": 2,
                "status": "todo",
            })
        );
    }

    #[test]
    fn test_work_item_payload_with_links() {
        let item = NewWorkItem::new("Story")
            .unwrap()
            .with_type(WorkItemType::UserStory)
            .with_priority(Priority::new(1).unwrap())
            .with_estimate(Some(5))
            .with_assignee(Some(UserId::new(3).unwrap()))
            .with_sprint(Some(SprintId::new(9).unwrap()))
            .with_parent(Some(WorkItemId::new(4).unwrap()))
            .with_description(Some("  ".into()));

        assert_eq!(
            item.payload().unwrap(),
            json!({
                "title": "Story",
                "item_type": "user_story",
                "priority": 1,
                "estimate_points": 5,
                "assignee_id": 3,
                "sprint_id": 9,
                "parent_id": 4,
                "status": "todo",
            })
        );
    }

    #[test]
    fn test_update_requires_a_field() {
        let update = WorkItemUpdate::default();
        assert!(update.is_empty());
        assert!(update.validate().is_err());

        let update = WorkItemUpdate {
            status: Some(WorkItemStatus::Done),
            ..Default::default()
        };
        update.validate().unwrap();
        assert_eq!(update.payload().unwrap(), json!({"status": "done"}));
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let update = WorkItemUpdate {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_dedup_work_items() {
        let ids: Vec<_> = [3, 1, 3, 2, 1]
            .into_iter()
            .map(|n| WorkItemId::new(n).unwrap())
            .collect();
        let unique = dedup_work_items(&ids).unwrap();
        assert_eq!(
            unique.iter().map(|id| id.get()).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
        assert!(dedup_work_items(&[]).is_err());
    }
}
