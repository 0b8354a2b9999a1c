use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable task identifier. Serialized as a UUID string; compared strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Fresh random id, unique for the life of the process.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TaskId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A single to-do item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// When the user expects to do it.
    pub estimated_at: DateTime<Utc>,
    /// `None` while pending; set to the toggle time once done.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Rejected user input on task creation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("description not provided")]
    MissingDescription,
}

/// Full persisted application state: filter flag plus the ordered task list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "default_show_completed")]
    pub show_completed: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_show_completed() -> bool {
    true
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            show_completed: default_show_completed(),
            tasks: Vec::new(),
        }
    }
}

impl AppState {
    pub fn toggle_filter(&mut self) {
        self.show_completed = !self.show_completed;
    }

    /// Flip completion of the matching task using the current time.
    /// Returns `false` when no task matches.
    pub fn toggle_task(&mut self, id: TaskId) -> bool {
        self.toggle_task_at(id, Utc::now())
    }

    pub fn toggle_task_at(&mut self, id: TaskId, now: DateTime<Utc>) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed_at = match task.completed_at {
                    Some(_) => None,
                    None => Some(now),
                };
                true
            }
            None => false,
        }
    }

    /// Append a pending task. Blank descriptions leave the state untouched.
    pub fn add_task(
        &mut self,
        description: &str,
        estimated_at: DateTime<Utc>,
    ) -> Result<TaskId, ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }

        let mut id = TaskId::generate();
        while self.task(id).is_some() {
            id = TaskId::generate();
        }
        self.tasks.push(Task {
            id,
            description: description.to_string(),
            estimated_at,
            completed_at: None,
        });
        Ok(id)
    }

    /// Remove the matching task. Returns `false` when no task matches.
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn visible_tasks(&self) -> Vec<Task> {
        filter_visible(&self.tasks, self.show_completed)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_done()).count()
    }

    pub fn done_count(&self) -> usize {
        self.tasks.len() - self.pending_count()
    }
}

/// Derive the displayed subset. The result never aliases `tasks`.
pub fn filter_visible(tasks: &[Task], show_completed: bool) -> Vec<Task> {
    if show_completed {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| task.completed_at.is_none())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
    }

    fn descriptions(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.description.as_str()).collect()
    }

    #[test]
    fn default_state_shows_completed_and_is_empty() {
        let state = AppState::default();
        assert!(state.show_completed);
        assert!(state.tasks.is_empty());
        assert!(state.visible_tasks().is_empty());
    }

    #[test]
    fn filter_shows_everything_in_order_when_flag_set() {
        let mut state = AppState::default();
        let a = state.add_task("A", at(1)).unwrap();
        state.add_task("B", at(2)).unwrap();
        state.add_task("C", at(3)).unwrap();
        state.toggle_task_at(a, at(4));

        let visible = filter_visible(&state.tasks, true);
        assert_eq!(visible, state.tasks);
    }

    #[test]
    fn filter_hides_done_and_keeps_relative_order() {
        let mut state = AppState::default();
        state.add_task("A", at(1)).unwrap();
        let b = state.add_task("B", at(2)).unwrap();
        state.add_task("C", at(3)).unwrap();
        state.toggle_task_at(b, at(4));

        let visible = filter_visible(&state.tasks, false);
        assert_eq!(descriptions(&visible), vec!["A", "C"]);
        assert!(filter_visible(&[], false).is_empty());
    }

    #[test]
    fn toggle_sets_completion_to_toggle_time_not_estimate() {
        let mut state = AppState::default();
        let id = state.add_task("Buy milk", at(10)).unwrap();

        assert!(state.toggle_task_at(id, at(3)));
        assert_eq!(state.task(id).unwrap().completed_at, Some(at(3)));
    }

    #[test]
    fn toggling_twice_round_trips_nullity() {
        let mut state = AppState::default();
        let id = state.add_task("Buy milk", at(10)).unwrap();

        state.toggle_task(id);
        state.toggle_task(id);
        assert_eq!(state.task(id).unwrap().completed_at, None);

        state.toggle_task_at(id, at(1));
        state.toggle_task_at(id, at(2));
        state.toggle_task_at(id, at(3));
        assert_eq!(state.task(id).unwrap().completed_at, Some(at(3)));
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let mut state = AppState::default();
        state.add_task("A", at(1)).unwrap();
        let before = state.clone();

        assert!(!state.toggle_task(TaskId::generate()));
        assert_eq!(state, before);
    }

    #[test]
    fn whitespace_description_is_rejected_without_mutation() {
        let mut state = AppState::default();
        state.add_task("A", at(1)).unwrap();
        let before = state.clone();

        let err = state.add_task("  ", at(2)).expect_err("blank must fail");
        assert_eq!(err, ValidationError::MissingDescription);
        assert_eq!(state.add_task("", at(2)), Err(ValidationError::MissingDescription));
        assert_eq!(state, before);
    }

    #[test]
    fn add_appends_one_pending_task_with_unique_id() {
        let mut state = AppState::default();
        let first = state.add_task("Walk dog", at(1)).unwrap();
        let future = Utc::now() + Duration::days(3);

        let id = state.add_task("Buy milk", future).unwrap();
        assert_eq!(state.tasks.len(), 2);
        assert_ne!(id, first);
        let task = state.tasks.last().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.description, "Buy milk");
        assert_eq!(task.estimated_at, future);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn add_trims_description() {
        let mut state = AppState::default();
        let id = state.add_task("  Call mom \n", at(1)).unwrap();
        assert_eq!(state.task(id).unwrap().description, "Call mom");
    }

    #[test]
    fn delete_unknown_id_leaves_tasks_unchanged() {
        let mut state = AppState::default();
        state.add_task("A", at(1)).unwrap();
        state.add_task("B", at(2)).unwrap();
        let before = state.tasks.clone();

        assert!(!state.delete_task(TaskId::generate()));
        assert_eq!(state.tasks, before);
    }

    #[test]
    fn delete_removes_only_the_match() {
        let mut state = AppState::default();
        state.add_task("A", at(1)).unwrap();
        let b = state.add_task("B", at(2)).unwrap();
        state.add_task("C", at(3)).unwrap();

        assert!(state.delete_task(b));
        assert_eq!(descriptions(&state.tasks), vec!["A", "C"]);
    }

    #[test]
    fn counts_track_completion() {
        let mut state = AppState::default();
        let a = state.add_task("A", at(1)).unwrap();
        state.add_task("B", at(2)).unwrap();
        state.toggle_task(a);
        assert_eq!(state.pending_count(), 1);
        assert_eq!(state.done_count(), 1);
    }

    #[test]
    fn serializes_to_camel_case_layout() {
        let mut state = AppState::default();
        let id = state.add_task("A", at(1)).unwrap();
        let json: serde_json::Value = serde_json::to_value(&state).unwrap();

        assert_eq!(json["showCompleted"], serde_json::Value::Bool(true));
        assert_eq!(json["tasks"][0]["id"], serde_json::Value::String(id.to_string()));
        assert_eq!(json["tasks"][0]["estimatedAt"], "2024-05-01T09:00:00Z");
        assert!(json["tasks"][0]["completedAt"].is_null());
    }

    #[test]
    fn parses_stored_blob() {
        let raw = r#"{
            "showCompleted": false,
            "tasks": [{
                "id": "6f1c1d0e-3d7e-4f0b-9d43-8f5a2f0c9b11",
                "description": "Pay rent",
                "estimatedAt": "2024-05-01T00:00:00.000Z",
                "completedAt": "2024-05-02T10:30:00.000Z"
            }]
        }"#;
        let state: AppState = serde_json::from_str(raw).unwrap();
        assert!(!state.show_completed);
        assert!(state.tasks[0].is_done());
        assert!(state.visible_tasks().is_empty());
    }

    #[test]
    fn task_id_parses_and_displays() {
        let id = TaskId::generate();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("42".parse::<TaskId>().is_err());
    }
}
