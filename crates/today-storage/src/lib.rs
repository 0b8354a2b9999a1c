//! Concrete storage implementations for device-local persistence.

pub mod file_store;
