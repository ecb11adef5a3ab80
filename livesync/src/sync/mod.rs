pub mod deployments;
pub mod log_pager;
