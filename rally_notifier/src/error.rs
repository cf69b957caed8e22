//! Failure taxonomy for a Rally publishing run.

/// Transport-level failures talking to Rally.
#[derive(Debug, thiserror::Error)]
pub enum RallyError {
    #[error("invalid Rally endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("invalid Rally client configuration: {0}")]
    Configuration(String),
    #[error("Rally request failed: {0}")]
    Request(String),
    #[error("Rally request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Rally response was malformed: {0}")]
    Malformed(String),
}

/// Conditions that abort a publishing run.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Rally(#[from] RallyError),
    #[error("Rally project not found: {project}")]
    ProjectNotFound { project: String },
    #[error("failed to query Rally {what} '{name}': {}", .errors.join("; "))]
    Query {
        what: &'static str,
        name: String,
        errors: Vec<String>,
    },
    #[error("failed to create Rally {what} '{name}': {}", .errors.join("; "))]
    CreateFailed {
        what: &'static str,
        name: String,
        errors: Vec<String>,
    },
}

impl NotifyError {
    /// Fatal before any network call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Rally(RallyError::InvalidEndpoint { .. } | RallyError::Configuration(_))
        )
    }

    /// Short label for logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Rally(RallyError::InvalidEndpoint { .. } | RallyError::Configuration(_)) => {
                "endpoint"
            }
            Self::Rally(_) => "transport",
            Self::ProjectNotFound { .. } => "project",
            Self::Query { what, .. } | Self::CreateFailed { what, .. } => *what,
        }
    }
}
