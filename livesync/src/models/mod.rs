//! Domain models

pub mod deployment;
pub mod events;
pub mod log_entry;
