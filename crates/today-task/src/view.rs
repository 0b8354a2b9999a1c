use chrono::{DateTime, Utc};
use today_core::{
    storage::KeyValueStore,
    tasks::{AppState, Task, TaskId, ValidationError},
};
use tracing::{debug, info, instrument, warn};

use crate::persist::{
    load_state, LoadPolicy, PersistError, PersistQueue, WriteOutcome, TASKS_STATE_KEY,
};

/// Visibility of the add-task form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Hidden,
    Visible,
}

/// Whether the newest state made it to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Pending,
    Failed(String),
}

/// Composition root of the "Today" screen.
///
/// Owns the state, the derived visible list and the form flag. Every mutation
/// recomputes the visible list and queues the whole state for writing.
pub struct TaskListView {
    state: AppState,
    visible: Vec<Task>,
    form: FormState,
    queue: PersistQueue,
}

impl TaskListView {
    /// Load the stored state and start the writer for it.
    pub async fn mount<S>(store: S, policy: LoadPolicy) -> Result<Self, PersistError>
    where
        S: KeyValueStore + 'static,
    {
        let state = load_state(&store, policy).await?;
        info!(tasks = state.tasks.len(), "task list mounted");
        let queue = PersistQueue::spawn(store, TASKS_STATE_KEY);
        Ok(Self::with_queue(state, queue))
    }

    pub fn with_queue(state: AppState, queue: PersistQueue) -> Self {
        let visible = state.visible_tasks();
        Self {
            state,
            visible,
            form: FormState::Hidden,
            queue,
        }
    }

    pub fn visible(&self) -> &[Task] {
        &self.visible
    }

    pub fn show_completed(&self) -> bool {
        self.state.show_completed
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_add_form_visible(&self) -> bool {
        self.form == FormState::Visible
    }

    pub fn open_add_form(&mut self) {
        self.form = FormState::Visible;
    }

    pub fn cancel_add_form(&mut self) {
        self.form = FormState::Hidden;
    }

    #[instrument(skip(self))]
    pub fn toggle_filter(&mut self) {
        self.state.toggle_filter();
        self.refresh();
    }

    #[instrument(skip(self))]
    pub fn toggle_task(&mut self, id: TaskId) {
        if !self.state.toggle_task(id) {
            debug!("toggle: no task with that id");
        }
        self.refresh();
    }

    #[instrument(skip(self))]
    pub fn delete_task(&mut self, id: TaskId) {
        if !self.state.delete_task(id) {
            debug!("delete: no task with that id");
        }
        self.refresh();
    }

    /// Save handler of the add form. On rejection nothing changes and the
    /// form stays open.
    #[instrument(skip(self, description))]
    pub fn add_task(
        &mut self,
        description: &str,
        estimated_at: DateTime<Utc>,
    ) -> Result<TaskId, ValidationError> {
        let id = self.state.add_task(description, estimated_at)?;
        self.form = FormState::Hidden;
        self.refresh();
        Ok(id)
    }

    pub fn save_status(&self) -> SaveStatus {
        let WriteOutcome { generation, error } = self.queue.last_outcome();
        match error {
            Some(reason) => SaveStatus::Failed(reason),
            None if generation < self.queue.submitted() => SaveStatus::Pending,
            None => SaveStatus::Saved,
        }
    }

    pub async fn flush(&self) -> Result<(), PersistError> {
        self.queue.flush().await
    }

    pub async fn shutdown(self) -> Result<(), PersistError> {
        self.queue.shutdown().await
    }

    fn refresh(&mut self) {
        self.visible = self.state.visible_tasks();
        if let Err(err) = self.queue.submit(&self.state) {
            warn!("could not queue state for writing: {err}");
        }
    }
}
