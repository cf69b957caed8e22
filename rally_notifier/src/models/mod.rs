//! Rally notifier data model — work items, build actions, host builds, Rally records.

pub mod artifact;
pub mod build;
pub mod build_data;
pub mod project;
