//! OpenAPI models for the deployment backend.

pub mod models;
