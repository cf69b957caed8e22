//! In-memory store of Rally build actions attached to published builds.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::build_data::BuildData;

/// Build actions keyed by `(job, build id)`.
#[derive(Debug, Default)]
pub struct ActionStore {
    actions: RwLock<HashMap<(String, String), Arc<BuildData>>>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an action to a build, replacing any earlier one.
    pub fn attach(&self, job: &str, build_id: &str, data: BuildData) -> Arc<BuildData> {
        let data = Arc::new(data);
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((job.to_string(), build_id.to_string()), Arc::clone(&data));
        data
    }

    pub fn get(&self, job: &str, build_id: &str) -> Option<Arc<BuildData>> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(job.to_string(), build_id.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
