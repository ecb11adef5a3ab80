//! Backend HTTP API

pub mod client;
pub mod deployments;
pub mod logs;
