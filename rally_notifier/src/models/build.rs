//! rally.build — A finished host build and the Rally build record published for it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome reported by the CI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

/// A finished build as described by the CI host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub job: String,
    pub id: String,
    #[serde(default)]
    pub result: Option<BuildResult>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Build path relative to `root_url`, e.g. `job/app/42/`.
    pub url: String,
    pub root_url: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub change_sets: Vec<ChangeSet>,
}

impl BuildInfo {
    /// Commit ids of every change entry, in host order.
    pub fn commit_ids(&self) -> impl Iterator<Item = &str> {
        self.change_sets
            .iter()
            .flat_map(|set| set.entries.iter())
            .map(|entry| entry.commit_id.as_str())
    }

    pub fn absolute_url(&self) -> String {
        format!("{}{}", self.root_url, self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub entries: Vec<ChangeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub commit_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_build_number() -> String {
    "${BUILD_NUMBER}".to_string()
}

/// Per-job publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    pub project: String,
    pub build_name: String,
    /// Build number template, expanded against the build environment.
    #[serde(default = "default_build_number")]
    pub build_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Failure,
    Unknown,
}

impl BuildStatus {
    /// Unstable builds are reported as failures.
    pub fn from_result(result: Option<BuildResult>) -> Self {
        match result {
            Some(BuildResult::Success) => Self::Success,
            Some(BuildResult::Failure | BuildResult::Unstable) => Self::Failure,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangesetLink {
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// Body of a Rally `build` create request. Field names are fixed by Rally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewBuild {
    pub number: String,
    pub status: BuildStatus,
    pub uri: String,
    pub start: String,
    pub duration: f64,
    pub build_definition: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changesets: Vec<ChangesetLink>,
}
