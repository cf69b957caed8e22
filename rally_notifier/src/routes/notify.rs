//! Post-build notification handler — validates, publishes to Rally, attaches the action.

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::NotifyError;
use crate::models::build::{BuildInfo, JobSettings};
use crate::models::build_data::URL_NAME;
use crate::services::action_store::ActionStore;
use crate::services::notifier::Notifier;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-rally-notifier-signature";

/// A finished build plus the job's publishing settings.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub settings: JobSettings,
    pub build: BuildInfo,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub reference: String,
    pub number: String,
    pub status: &'static str,
    pub defects: usize,
    pub user_stories: usize,
    pub action_url: String,
}

#[derive(Debug, Serialize)]
pub struct NotifyFailure {
    pub stage: &'static str,
    pub error: String,
}

type Failure = (StatusCode, Json<NotifyFailure>);

fn failure(status: StatusCode, stage: &'static str, error: impl ToString) -> Failure {
    (
        status,
        Json(NotifyFailure {
            stage,
            error: error.to_string(),
        }),
    )
}

/// Validate a notification signature (`sha256=<hex>` HMAC of the body).
pub fn validate_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        tracing::debug!("No notification secret set, accepting unsigned payload");
        return true;
    }

    let digest = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };

    HmacSha256::new_from_slice(secret.as_bytes())
        .map(|mut mac| {
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        })
        .unwrap_or(false)
}

/// Handle an incoming post-build notification.
pub async fn handle_notify(
    notifier: &Notifier,
    store: &ActionStore,
    secret: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<NotifyResponse>), Failure> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !validate_signature(secret, &body, signature) {
        tracing::warn!("Notification signature validation failed");
        return Err(failure(StatusCode::UNAUTHORIZED, "signature", "invalid signature"));
    }

    let request: NotifyRequest = serde_json::from_slice(&body)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, "payload", e))?;
    let NotifyRequest { settings, build } = request;

    let publication = notifier.perform(&settings, &build).await.map_err(|e| {
        tracing::warn!(job = %build.job, build = %build.id, stage = e.stage(), "Rally publishing failed: {e}");
        failure(status_for(&e), e.stage(), e)
    })?;

    let data = store.attach(&build.job, &build.id, publication.data);
    tracing::info!(
        job = %build.job,
        build = %build.id,
        reference = %publication.reference,
        artifacts = data.artifacts().len(),
        "Rally action attached"
    );

    Ok((
        StatusCode::CREATED,
        Json(NotifyResponse {
            reference: publication.reference,
            number: publication.record.number,
            status: publication.record.status.as_str(),
            defects: data.defects().len(),
            user_stories: data.user_stories().len(),
            action_url: action_url(&build.job, &build.id),
        }),
    ))
}

/// Path of the action view for a build. Folder jobs (`team/app`) stay one segment.
pub fn action_url(job: &str, build: &str) -> String {
    format!(
        "/builds/{}/{}/{URL_NAME}",
        utf8_percent_encode(job, NON_ALPHANUMERIC),
        utf8_percent_encode(build, NON_ALPHANUMERIC)
    )
}

fn status_for(error: &NotifyError) -> StatusCode {
    if error.is_configuration() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    }
}
