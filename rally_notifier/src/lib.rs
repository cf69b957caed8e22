//! Rally Build Notifier — publishes finished CI builds to Rally.
//!
//! Resolves the Rally project and build definition for a job, links the
//! build's changesets and their defects and user stories, and creates a Rally
//! build record. Runs once per build (`publish`) or as a notification
//! service (`serve`).

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod publish;
pub mod rally;
pub mod routes;
pub mod services;
