//! Log view pipeline: paging, search and formatting

pub mod aggregator;
pub mod format;
pub mod progress;
pub mod search;
pub mod verbosity;
pub mod view;
