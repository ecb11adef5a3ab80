//! Deployment state reconciliation

pub mod reconciler;
