//! The publishing run: project → build definition → changesets → build record.

use std::time::Instant;

use crate::config::RallyConfig;
use crate::error::NotifyError;
use crate::models::build::{BuildInfo, JobSettings, NewBuild};
use crate::models::build_data::BuildData;
use crate::rally::{HttpTransport, RallyTransport};
use crate::services::{build_definition_service, build_service, changeset_service, project_service};

/// A build record created in Rally, with the action to attach to the host build.
#[derive(Debug)]
pub struct Publication {
    pub reference: String,
    pub record: NewBuild,
    pub data: BuildData,
}

#[derive(Clone, Debug)]
pub struct Notifier {
    config: RallyConfig,
}

impl Notifier {
    pub fn new(config: RallyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RallyConfig {
        &self.config
    }

    /// Publish one finished build. Opens a Rally connection for this run only.
    pub async fn perform(&self, settings: &JobSettings, build: &BuildInfo) -> Result<Publication, NotifyError> {
        let started = Instant::now();

        let result = match HttpTransport::new(&self.config) {
            Ok(transport) => self.perform_with(&transport, settings, build).await,
            Err(e) => {
                tracing::error!(url = %self.config.url, error = %e, "Failed to parse Rally API URL");
                Err(e.into())
            }
        };

        crate::metrics::run_duration(started.elapsed().as_millis() as u64);
        match &result {
            Ok(_) => crate::metrics::run_finished("published"),
            Err(e) => crate::metrics::run_finished(e.stage()),
        }
        result
    }

    /// Run the publishing steps against a given transport. Stops at the first fatal failure.
    pub async fn perform_with(
        &self,
        transport: &dyn RallyTransport,
        settings: &JobSettings,
        build: &BuildInfo,
    ) -> Result<Publication, NotifyError> {
        let workspace = self.config.workspace();
        tracing::info!(
            job = %build.job,
            build = %build.id,
            project = %settings.project,
            build_definition = %settings.build_name,
            "Publishing build to Rally"
        );

        let project = project_service::resolve_project(transport, &settings.project, workspace).await?;
        let definition =
            build_definition_service::resolve_or_create(transport, &project, &settings.build_name, workspace)
                .await?;

        let data = BuildData::new();
        let changesets = changeset_service::collect(
            transport,
            build.commit_ids(),
            workspace,
            &self.config.artifact_base_url(),
            &data,
        )
        .await;
        tracing::debug!(
            changesets = changesets.len(),
            artifacts = data.artifacts().len(),
            "Collected Rally changesets"
        );

        let record = build_service::build_record(settings, build, &definition, changesets);
        let reference = build_service::publish(transport, &record).await?;

        Ok(Publication {
            reference,
            record,
            data,
        })
    }
}
