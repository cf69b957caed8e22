//! Rally project lookup by exact name.

use crate::error::{NotifyError, RallyError};
use crate::models::project::ProjectRef;
use crate::rally::request::string_field;
use crate::rally::{Fetch, QueryFilter, QueryRequest, RallyTransport};

/// Resolve a project by exact name. The first match wins.
pub async fn resolve_project(
    transport: &dyn RallyTransport,
    project: &str,
    workspace: Option<&str>,
) -> Result<ProjectRef, NotifyError> {
    let request = QueryRequest::new("project")
        .filter(QueryFilter::equals("Name", project))
        .fetch(Fetch::Fields(vec!["ObjectID".into(), "Name".into()]))
        .workspace(workspace)
        .limit(1);

    let rsp = transport.query(&request).await.inspect_err(|e| {
        tracing::warn!(project = %project, error = %e, "Failed to get Rally Project");
    })?;

    if !rsp.was_successful() {
        tracing::warn!(project = %project, errors = ?rsp.errors, "Failed to get Rally Project");
        return Err(NotifyError::Query {
            what: "project",
            name: project.to_string(),
            errors: rsp.errors,
        });
    }

    let Some(found) = rsp.first() else {
        tracing::warn!(project = %project, "Rally Project not found");
        return Err(NotifyError::ProjectNotFound {
            project: project.to_string(),
        });
    };

    if rsp.total_result_count > 1 {
        tracing::warn!(
            project = %project,
            matches = rsp.total_result_count,
            "Several Rally Projects share this name, using the first"
        );
    }

    let reference = found["_ref"].as_str().map(str::to_string);
    let object_id = string_field(found, "ObjectID");
    match (reference, object_id) {
        (Some(reference), Some(object_id)) => {
            tracing::debug!(project = %project, object_id = %object_id, "Resolved Rally Project");
            Ok(ProjectRef {
                object_id,
                reference,
            })
        }
        _ => {
            tracing::warn!(project = %project, "Rally Project has no _ref or ObjectID");
            Err(RallyError::Malformed(format!("project '{project}' has no _ref or ObjectID")).into())
        }
    }
}
