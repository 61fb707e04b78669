//! Domain models for quire.
//!
//! Request types double as the HTTP request bodies and query strings, so
//! their serde defaults are the API defaults.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::defaults;
use crate::error::{AiError, Error, Result};

// =============================================================================
// AI ACTIONS
// =============================================================================

/// A transformation applied to note content by the hosted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    /// Five bullet points plus one key takeaway.
    Summarize,
    /// Grammar and clarity rewrite.
    Improve,
    /// JSON array of short action items.
    ExtractTasks,
}

impl AiAction {
    pub const ALL: [AiAction; 3] = [AiAction::Summarize, AiAction::Improve, AiAction::ExtractTasks];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::Summarize => "summarize",
            AiAction::Improve => "improve",
            AiAction::ExtractTasks => "extract_tasks",
        }
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiAction {
    type Err = AiError;

    /// Parse a wire action name.
    ///
    /// `expand`, `translate` and `custom` have no prompt and are rejected
    /// like any other unknown name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "summarize" => Ok(AiAction::Summarize),
            "improve" => Ok(AiAction::Improve),
            "extract_tasks" => Ok(AiAction::ExtractTasks),
            other => Err(AiError::UnknownAction(other.to_string())),
        }
    }
}

/// One persisted AI execution. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AiRun {
    pub id: Uuid,
    pub user_id: Uuid,
    pub note_id: Uuid,
    pub action: AiAction,
    /// Literal model text; for `extract_tasks` the raw text, not the parsed list.
    pub output: String,
    pub created_at: DateTime<Utc>,
}

/// Interpreted model output returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedOutput {
    pub display_text: String,
    pub task_items: Option<Vec<String>>,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct AiActionOutcome {
    pub run: AiRun,
    pub output: InterpretedOutput,
}

// =============================================================================
// NOTES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl CreateNoteRequest {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }
}

/// Partial note update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub pinned: Option<bool>,
}

impl UpdateNoteRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none() && self.pinned.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteSort {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    CreatedDesc,
    CreatedAsc,
    TitleAsc,
    TitleDesc,
}

/// Filters and pagination for listing a user's notes.
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotesRequest {
    /// Case-insensitive substring matched against title or content
    pub q: Option<String>,
    /// Only notes carrying this tag
    pub tag: Option<String>,
    pub pinned: Option<bool>,
    #[serde(default)]
    pub sort: NoteSort,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListNotesRequest {
    fn default() -> Self {
        Self {
            q: None,
            tag: None,
            pinned: None,
            sort: NoteSort::default(),
            limit: defaults::PAGE_LIMIT,
            offset: defaults::PAGE_OFFSET,
        }
    }
}

impl ListNotesRequest {
    pub fn validate(&self) -> Result<()> {
        validate_page(self.limit, self.offset)
    }

    /// Search text with blank input treated as absent.
    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub total: i64,
}

// =============================================================================
// TASKS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "archived" => Ok(TaskStatus::Archived),
            other => Err(Error::InvalidInput(format!("unknown task status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i16,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "default_task_priority")]
    pub priority: i16,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_priority(self.priority)
    }
}

/// Partial task update.
///
/// `description` and `deadline` distinguish "absent" (`None`) from an
/// explicit JSON `null` (`Some(None)`), which clears the column.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i16>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    #[schema(value_type = Option<String>)]
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    #[default]
    CreatedDesc,
    CreatedAsc,
    DeadlineAsc,
    DeadlineDesc,
    PriorityDesc,
    PriorityAsc,
}

#[derive(Debug, Clone, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksRequest {
    /// Case-insensitive substring matched against title or description
    pub q: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i16>,
    #[serde(default)]
    pub sort: TaskSort,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListTasksRequest {
    fn default() -> Self {
        Self {
            q: None,
            status: None,
            priority: None,
            sort: TaskSort::default(),
            limit: defaults::PAGE_LIMIT,
            offset: defaults::PAGE_OFFSET,
        }
    }
}

impl ListTasksRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        validate_page(self.limit, self.offset)
    }

    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
}

// =============================================================================
// PROFILES
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(Error::InvalidInput(format!("unknown theme '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    /// Same as the identity provider's user id.
    pub id: Uuid,
    pub full_name: Option<String>,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub theme: Option<Theme>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.full_name {
            validate_title(name)?;
        }
        Ok(())
    }
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

fn default_page_limit() -> i64 {
    defaults::PAGE_LIMIT
}

fn default_task_priority() -> i16 {
    defaults::TASK_PRIORITY_DEFAULT
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_title(title: &str) -> Result<()> {
    let len = title.chars().count();
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }
    if len > defaults::TITLE_MAX_CHARS {
        return Err(Error::InvalidInput(format!(
            "Title must be less than {} characters",
            defaults::TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_priority(priority: i16) -> Result<()> {
    if !(defaults::TASK_PRIORITY_MIN..=defaults::TASK_PRIORITY_MAX).contains(&priority) {
        return Err(Error::InvalidInput(format!(
            "Priority must be between {} and {}",
            defaults::TASK_PRIORITY_MIN,
            defaults::TASK_PRIORITY_MAX
        )));
    }
    Ok(())
}

fn validate_page(limit: i64, offset: i64) -> Result<()> {
    if !(1..=defaults::PAGE_LIMIT_MAX).contains(&limit) {
        return Err(Error::InvalidInput(format!(
            "limit must be between 1 and {}",
            defaults::PAGE_LIMIT_MAX
        )));
    }
    if offset < 0 {
        return Err(Error::InvalidInput("offset must not be negative".to_string()));
    }
    Ok(())
}

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Paired with `#[serde(default)]` so a missing field stays `None`.
mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_action_round_trips_wire_names() {
        for action in AiAction::ALL {
            assert_eq!(action.as_str().parse::<AiAction>().unwrap(), action);
            assert_eq!(
                serde_json::to_value(action).unwrap(),
                serde_json::Value::String(action.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_unimplemented_actions_are_unknown() {
        for name in ["expand", "translate", "custom", "", "Summarize"] {
            let err = name.parse::<AiAction>().unwrap_err();
            assert_eq!(err, AiError::UnknownAction(name.to_string()));
        }
    }

    #[test]
    fn test_create_note_defaults() {
        let req: CreateNoteRequest = serde_json::from_str(r#"{"title":"Groceries"}"#).unwrap();
        assert_eq!(req.content, "");
        assert!(req.tags.is_empty());
        assert!(!req.pinned);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let req: CreateNoteRequest = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        assert!(matches!(req.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_title_length_limit() {
        let ok = UpdateNoteRequest {
            title: Some("a".repeat(255)),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_long = UpdateNoteRequest {
            title: Some("a".repeat(256)),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_list_notes_defaults_from_empty_query() {
        let req: ListNotesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.limit, defaults::PAGE_LIMIT);
        assert_eq!(req.offset, 0);
        assert_eq!(req.sort, NoteSort::UpdatedDesc);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_notes_limit_bounds() {
        let req = ListNotesRequest {
            limit: 101,
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = ListNotesRequest {
            limit: 0,
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = ListNotesRequest {
            offset: -1,
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_search_text_is_ignored() {
        let req = ListNotesRequest {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(req.search_text(), None);

        let req = ListNotesRequest {
            q: Some(" roadmap ".to_string()),
            ..Default::default()
        };
        assert_eq!(req.search_text(), Some("roadmap"));
    }

    #[test]
    fn test_create_task_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"Call John"}"#).unwrap();
        assert_eq!(req.status, TaskStatus::Todo);
        assert_eq!(req.priority, 2);
        assert!(req.deadline.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_task_priority_bounds() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"Call John","priority":6}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"Call John","priority":0}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_task_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.description, None);
        assert_eq!(absent.deadline, None);

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"description":null,"deadline":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.deadline, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_str(r#"{"description":"details"}"#).unwrap();
        assert_eq!(set.description, Some(Some("details".to_string())));
    }

    #[test]
    fn test_task_status_wire_names() {
        let status: TaskStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert_eq!("archived".parse::<TaskStatus>().unwrap(), TaskStatus::Archived);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::default(), Theme::System);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateNoteRequest::default().is_empty());
        assert!(UpdateTaskRequest::default().is_empty());
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"deadline":null}"#).unwrap();
        assert!(!req.is_empty());
    }
}
