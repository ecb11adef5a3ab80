//! livesync library
//!
//! Keeps a live view of an application's deployments and their logs in
//! sync with a backend: snapshot plus push-event reconciliation for
//! deployments, and paged, searchable, formatted logs.

pub mod app;
pub mod display;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod logview;
pub mod models;
pub mod reconcile;
pub mod server;
pub mod storage;
pub mod sync;
pub mod transport;
pub mod utils;
pub mod workers;
