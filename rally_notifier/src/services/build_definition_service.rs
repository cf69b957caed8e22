//! Build definition get-or-create under a resolved project.

use serde_json::json;

use crate::error::NotifyError;
use crate::models::project::{BuildDefinitionRef, ProjectRef};
use crate::rally::{CreateRequest, QueryFilter, QueryRequest, RallyTransport};

/// Find the project's build definition named `name`, creating it when absent.
pub async fn resolve_or_create(
    transport: &dyn RallyTransport,
    project: &ProjectRef,
    name: &str,
    workspace: Option<&str>,
) -> Result<BuildDefinitionRef, NotifyError> {
    let request = QueryRequest::collection(&project.build_definitions_ref())
        .filter(QueryFilter::equals("Name", name))
        .workspace(workspace)
        .limit(1);

    let rsp = transport.query(&request).await.inspect_err(|e| {
        tracing::warn!(build_definition = %name, error = %e, "Failed to get Rally Build Definition");
    })?;

    if !rsp.was_successful() {
        tracing::warn!(build_definition = %name, errors = ?rsp.errors, "Failed to get Rally Build Definition");
        return Err(NotifyError::Query {
            what: "build definition",
            name: name.to_string(),
            errors: rsp.errors,
        });
    }

    if let Some(reference) = rsp.first().and_then(|d| d["_ref"].as_str()) {
        tracing::debug!(build_definition = %name, reference = %reference, "Using existing Rally Build Definition");
        return Ok(BuildDefinitionRef {
            reference: reference.to_string(),
        });
    }

    create(transport, project, name).await
}

async fn create(
    transport: &dyn RallyTransport,
    project: &ProjectRef,
    name: &str,
) -> Result<BuildDefinitionRef, NotifyError> {
    let request = CreateRequest::new(
        "builddefinition",
        json!({
            "Name": name,
            "Project": project.reference,
        }),
    );

    let rsp = transport.create(&request).await.inspect_err(|e| {
        tracing::warn!(build_definition = %name, error = %e, "Failed to create Rally Build Definition");
    })?;

    let reference = match rsp.reference() {
        Some(reference) if rsp.was_successful() => reference.to_string(),
        _ => {
            tracing::warn!(build_definition = %name, errors = ?rsp.errors, "Failed to create Rally Build Definition");
            return Err(NotifyError::CreateFailed {
                what: "build definition",
                name: name.to_string(),
                errors: rsp.errors,
            });
        }
    };

    crate::metrics::build_definition_created();
    tracing::info!(build_definition = %name, reference = %reference, "Created Rally Build Definition");
    Ok(BuildDefinitionRef { reference })
}
