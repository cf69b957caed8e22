//! Rally build record construction and publishing.

use chrono::{DateTime, Utc};

use crate::error::{NotifyError, RallyError};
use crate::models::build::{BuildInfo, BuildStatus, ChangesetLink, JobSettings, NewBuild};
use crate::models::project::BuildDefinitionRef;
use crate::rally::{CreateRequest, RallyTransport};
use crate::services::variables;

/// Rally's build start format: UTC, minute precision.
pub fn format_start(started_at: DateTime<Utc>) -> String {
    started_at.format("%Y-%m-%dT%H:%MZ").to_string()
}

/// Assemble the build record for a finished host build.
pub fn build_record(
    settings: &JobSettings,
    build: &BuildInfo,
    definition: &BuildDefinitionRef,
    changesets: Vec<ChangesetLink>,
) -> NewBuild {
    NewBuild {
        number: variables::expand(&settings.build_number, &build.env),
        status: BuildStatus::from_result(build.result),
        uri: build.absolute_url(),
        start: format_start(build.started_at),
        duration: build.duration_ms as f64 / 1000.0,
        build_definition: definition.reference.clone(),
        changesets,
    }
}

/// Create the build record in Rally. Returns the new build's reference.
pub async fn publish(transport: &dyn RallyTransport, record: &NewBuild) -> Result<String, NotifyError> {
    let body = serde_json::to_value(record).map_err(|e| RallyError::Malformed(e.to_string()))?;
    let request = CreateRequest::new("build", body);

    let rsp = transport.create(&request).await.inspect_err(|e| {
        tracing::warn!(number = %record.number, error = %e, "Failed to create Rally Build");
    })?;

    match rsp.reference() {
        Some(reference) if rsp.was_successful() => {
            tracing::info!(
                number = %record.number,
                status = record.status.as_str(),
                reference = %reference,
                "Created Rally Build"
            );
            Ok(reference.to_string())
        }
        _ => {
            tracing::warn!(build = %request.object, errors = ?rsp.errors, "Failed to create Rally Build");
            Err(NotifyError::CreateFailed {
                what: "build",
                name: record.number.clone(),
                errors: rsp.errors,
            })
        }
    }
}
