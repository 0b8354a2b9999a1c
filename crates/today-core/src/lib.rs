//! Core model for Today: tasks, the persisted app state, and the key-value
//! storage contract the state is mirrored to.

pub mod storage;
pub mod tasks;
