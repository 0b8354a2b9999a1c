//! Persistence adapter and composition root for the "Today" task list.
//! The view mutates in-memory state; a single background writer mirrors it
//! to the key-value store.

pub mod persist;
pub mod view;

pub use persist::{LoadPolicy, PersistError, PersistQueue, WriteOutcome, TASKS_STATE_KEY};
pub use view::{FormState, SaveStatus, TaskListView};
