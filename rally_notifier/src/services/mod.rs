//! Rally publishing services — resolvers, collectors, and the run pipeline.

pub mod action_store;
pub mod build_definition_service;
pub mod build_service;
pub mod changeset_service;
pub mod notifier;
pub mod project_service;
pub mod variables;

#[cfg(test)]
pub(crate) mod stub;
