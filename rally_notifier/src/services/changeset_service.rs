//! Changeset lookup per commit and linked work item collection.
//!
//! Every failure here is scoped to a single change: it is logged and the next
//! change is processed.

use serde_json::Value;

use crate::models::artifact::{detail_link, Artifact, ArtifactKind};
use crate::models::build::ChangesetLink;
use crate::models::build_data::BuildData;
use crate::rally::request::string_field;
use crate::rally::{QueryFilter, QueryRequest, RallyTransport};

/// Look up each commit's Rally changeset and add its defects and user stories to `data`.
///
/// Returns the changesets to link to the build record, in commit order, each once.
pub async fn collect<'a>(
    transport: &dyn RallyTransport,
    commit_ids: impl IntoIterator<Item = &'a str>,
    workspace: Option<&str>,
    artifact_base_url: &str,
    data: &BuildData,
) -> Vec<ChangesetLink> {
    let mut links: Vec<ChangesetLink> = Vec::new();

    for commit_id in commit_ids {
        let Some(changeset) = find_changeset(transport, commit_id, workspace).await else {
            continue;
        };

        if let Some(reference) = changeset["_ref"].as_str() {
            let link = ChangesetLink {
                reference: reference.to_string(),
            };
            if !links.contains(&link) {
                links.push(link);
            }
        }

        let artifacts = &changeset["Artifacts"];
        if artifacts["Count"].as_u64().unwrap_or(0) == 0 {
            continue;
        }
        let Some(collection) = artifacts["_ref"].as_str() else {
            tracing::debug!(commit = %commit_id, "Changeset has artifacts but no collection reference");
            continue;
        };

        for item in fetch_artifacts(transport, commit_id, collection, workspace).await {
            let Some(artifact) = to_artifact(&item, artifact_base_url) else {
                continue;
            };
            let kind = artifact.kind();
            if data.add_artifact(artifact) {
                crate::metrics::artifact_collected(kind.detail_segment());
            }
        }
    }

    links
}

async fn find_changeset(
    transport: &dyn RallyTransport,
    commit_id: &str,
    workspace: Option<&str>,
) -> Option<Value> {
    let request = QueryRequest::new("changeset")
        .filter(QueryFilter::equals("Revision", commit_id))
        .workspace(workspace)
        .limit(1);

    match transport.query(&request).await {
        Ok(rsp) if rsp.was_successful() => {
            let found = rsp.results.into_iter().next();
            if found.is_none() {
                tracing::debug!(commit = %commit_id, "No Rally changeset for commit");
            }
            found
        }
        Ok(rsp) => {
            tracing::debug!(commit = %commit_id, errors = ?rsp.errors, "Rally changeset query failed");
            None
        }
        Err(e) => {
            tracing::debug!(commit = %commit_id, error = %e, "Rally changeset query failed");
            None
        }
    }
}

async fn fetch_artifacts(
    transport: &dyn RallyTransport,
    commit_id: &str,
    collection: &str,
    workspace: Option<&str>,
) -> Vec<Value> {
    let request = QueryRequest::collection(collection).workspace(workspace);

    match transport.query(&request).await {
        Ok(rsp) if rsp.was_successful() => rsp.results,
        Ok(rsp) => {
            tracing::debug!(commit = %commit_id, errors = ?rsp.errors, "Rally artifact query failed");
            Vec::new()
        }
        Err(e) => {
            tracing::debug!(commit = %commit_id, error = %e, "Rally artifact query failed");
            Vec::new()
        }
    }
}

/// Convert a WSAPI work item into an artifact. Unknown types and incomplete items yield `None`.
fn to_artifact(item: &Value, artifact_base_url: &str) -> Option<Artifact> {
    let kind = ArtifactKind::from_rally_type(item["_type"].as_str()?)?;
    let Some(object_id) = string_field(item, "ObjectID") else {
        tracing::debug!(item = %item, "Rally artifact has no ObjectID");
        return None;
    };
    let formatted_id = string_field(item, "FormattedID").unwrap_or_default();
    let title = string_field(item, "_refObjectName")
        .or_else(|| string_field(item, "Name"))
        .unwrap_or_default();
    let link = detail_link(artifact_base_url, kind, &object_id);

    Some(Artifact::new(kind, object_id, formatted_id, title, link))
}
