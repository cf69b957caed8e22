//! `publish` command — publish one finished build and write its Rally action.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::models::build::{BuildInfo, JobSettings};
use crate::models::build_data::BuildData;
use crate::services::notifier::Notifier;

const ACTION_FILE_NAME: &str = "rally.json";

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Rally project name
    #[arg(long)]
    pub project: String,

    /// Build definition name, created under the project when absent
    #[arg(long = "build-definition")]
    pub build_name: String,

    /// Build number template, expanded against the build environment
    #[arg(long, default_value = "${BUILD_NUMBER}")]
    pub build_number: String,

    /// Build descriptor JSON file (`-` reads stdin)
    #[arg(long)]
    pub build: PathBuf,

    /// Output file for the Rally action [default: rally.json next to the descriptor]
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl PublishArgs {
    fn settings(&self) -> JobSettings {
        JobSettings {
            project: self.project.clone(),
            build_name: self.build_name.clone(),
            build_number: self.build_number.clone(),
        }
    }

    fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        if self.build.as_os_str() == "-" {
            return PathBuf::from(ACTION_FILE_NAME);
        }
        self.build
            .parent()
            .map(|dir| dir.join(ACTION_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(ACTION_FILE_NAME))
    }
}

fn read_build(path: &Path) -> anyhow::Result<BuildInfo> {
    let raw = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read build descriptor from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build descriptor {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("invalid build descriptor {}", path.display()))
}

/// Persist the action next to the build metadata.
pub fn write_action(path: &Path, data: &BuildData) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Returns `false` when publishing failed; the failure has already been logged.
pub async fn run(notifier: &Notifier, args: &PublishArgs) -> anyhow::Result<bool> {
    let build = read_build(&args.build)?;
    let settings = args.settings();

    let publication = match notifier.perform(&settings, &build).await {
        Ok(publication) => publication,
        Err(e) => {
            tracing::warn!(job = %build.job, build = %build.id, stage = e.stage(), "Rally publishing failed: {e}");
            return Ok(false);
        }
    };

    let output = args.output_path();
    write_action(&output, &publication.data)?;
    tracing::info!(
        reference = %publication.reference,
        output = %output.display(),
        defects = publication.data.defects().len(),
        user_stories = publication.data.user_stories().len(),
        "Rally action written"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use axum::response::Json;
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;

    use super::*;
    use crate::config::RallyConfig;

    fn descriptor() -> serde_json::Value {
        json!({
            "job": "app",
            "id": "42",
            "result": "FAILURE",
            "started_at": "2024-03-05T14:07:00Z",
            "duration_ms": 250,
            "url": "job/app/42/",
            "root_url": "https://ci.example.com/",
            "env": { "BUILD_NUMBER": "42" }
        })
    }

    fn args(dir: &Path) -> PublishArgs {
        let build = dir.join("build.json");
        std::fs::write(&build, descriptor().to_string()).unwrap();
        PublishArgs {
            project: "Mobile".into(),
            build_name: "nightly".into(),
            build_number: "${BUILD_NUMBER}".into(),
            build,
            output: None,
        }
    }

    async fn spawn_fake_rally() -> String {
        let router = Router::new()
            .route(
                "/slm/webservice/v2.0/project",
                get(|| async {
                    Json(json!({ "QueryResult": { "TotalResultCount": 1, "Results": [{
                        "_ref": "https://rally/slm/webservice/v2.0/project/12", "ObjectID": "12"
                    }] } }))
                }),
            )
            .route(
                "/slm/webservice/v2.0/project/12/BuildDefinitions",
                get(|| async { Json(json!({ "QueryResult": { "TotalResultCount": 0, "Results": [] } })) }),
            )
            .route(
                "/slm/webservice/v2.0/builddefinition/create",
                post(|| async {
                    Json(json!({ "CreateResult": { "Object": { "_ref": "https://rally/builddefinition/5" } } }))
                }),
            )
            .route(
                "/slm/webservice/v2.0/build/create",
                post(|| async {
                    Json(json!({ "CreateResult": { "Object": { "_ref": "https://rally/build/77" } } }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn output_defaults_next_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());
        assert_eq!(args.output_path(), dir.path().join("rally.json"));
    }

    #[tokio::test]
    async fn successful_publish_writes_action() {
        let dir = tempfile::tempdir().unwrap();
        let rally = spawn_fake_rally().await;
        let notifier = Notifier::new(RallyConfig::new(&rally, "key"));

        let published = run(&notifier, &args(dir.path())).await.unwrap();

        assert!(published);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("rally.json")).unwrap()).unwrap();
        assert_eq!(written["url_name"], "rally");
        assert_eq!(written["defects"], json!([]));
    }

    #[tokio::test]
    async fn failed_publish_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Notifier::new(RallyConfig::new("not a url", "key"));

        let published = run(&notifier, &args(dir.path())).await.unwrap();

        assert!(!published);
        assert!(!dir.path().join("rally.json").exists());
    }

    #[tokio::test]
    async fn unreadable_descriptor_is_an_error() {
        let notifier = Notifier::new(RallyConfig::new("https://rally1.rallydev.com", "key"));
        let args = PublishArgs {
            project: "Mobile".into(),
            build_name: "nightly".into(),
            build_number: "1".into(),
            build: PathBuf::from("/nonexistent/build.json"),
            output: None,
        };

        assert!(run(&notifier, &args).await.is_err());
    }
}
