//! Template upgrade: replaces the content of artifacts built from a template while
//! keeping each instance's identity and configuration.
//!
//! The template is read from the original environment. Targets are either given
//! explicitly or discovered from the manifest's `template` tags, and are scoped
//! with the selected environment's suffix. An instance already at the template's
//! version is skipped without further remote calls.

use tracing::{debug, error, info, warn};

use crate::contract::IntegrationClient;
use crate::error::{ClientError, EngineError};
use crate::landscape::Landscape;
use crate::model::{DesigntimeArtifact, ACTIVE_VERSION};
use crate::outcome::{ArtifactOutcome, RunReport, TransportStep};

#[derive(Debug, Clone, Default)]
pub struct UpgradeRequest {
    /// Template artifact id in the original environment.
    pub template_id: String,
    /// Environment holding the instances. `None` selects the original environment.
    pub env: Option<String>,
    /// Base ids of the instances. Empty means every manifest artifact tagged with the template.
    pub artifacts: Vec<String>,
    pub deploy: bool,
}

/// Builds the record uploaded for `target`: content from the template download,
/// identity and descriptive metadata from the target.
pub fn restamp(template: DesigntimeArtifact, target: &DesigntimeArtifact) -> DesigntimeArtifact {
    DesigntimeArtifact {
        id: target.id.clone(),
        package_id: target.package_id.clone(),
        name: target.name.clone(),
        description: target.description.clone(),
        sender: target.sender.clone(),
        receiver: target.receiver.clone(),
        configurations: Vec::new(),
        ..template
    }
}

pub struct ArtifactUpgrader<'a, C> {
    landscape: &'a Landscape<C>,
}

impl<'a, C> ArtifactUpgrader<'a, C>
where
    C: IntegrationClient,
{
    pub fn new(landscape: &'a Landscape<C>) -> Self {
        Self { landscape }
    }

    pub async fn run(&self, request: &UpgradeRequest) -> Result<RunReport, EngineError> {
        let origin_env = self.landscape.original_environment();
        let env = self.landscape.environment_or_original(request.env.as_deref())?;
        let origin = self.landscape.client_for_environment(&origin_env.id)?;
        let client = self.landscape.client_for_environment(&env.id)?;

        let template = match origin
            .read_designtime_artifact(&request.template_id, ACTIVE_VERSION)
            .await
        {
            Ok(Some(template)) => template,
            Ok(None) => {
                error!(template_id = %request.template_id, "Template artifact not found");
                return Err(EngineError::TemplateNotFound(request.template_id.clone()));
            }
            Err(e) => {
                error!(template_id = %request.template_id, error = %e, "Failed to read template");
                return Err(EngineError::remote(
                    format!("failed to read template {}", request.template_id),
                    e,
                ));
            }
        };
        if template.is_draft() {
            error!(template_id = %template.id, "Template is in draft state");
            return Err(EngineError::DraftTemplate(template.id));
        }

        let base_ids: Vec<String> = if request.artifacts.is_empty() {
            self.landscape
                .artifacts_by_template(&request.template_id)
                .into_iter()
                .map(|instance| instance.artifact_id)
                .collect()
        } else {
            request.artifacts.clone()
        };
        if base_ids.is_empty() {
            warn!(template_id = %template.id, "No artifacts to upgrade");
        }

        info!(
            template_id = %template.id,
            template_version = %template.version,
            env = %env.id,
            targets = base_ids.len(),
            deploy = request.deploy,
            "Starting template upgrade"
        );

        let mut report = RunReport::default();
        for (index, base_id) in base_ids.iter().enumerate() {
            let target_id = env.scope(base_id);
            match self
                .upgrade_one(origin, client, &template, &target_id, index + 1, request.deploy)
                .await
            {
                Ok(line) => report.lines.push(line),
                Err((step, e)) => {
                    error!(
                        artifact_id = %target_id,
                        %step,
                        error = %e,
                        completed = report.lines.len(),
                        "Aborting template upgrade"
                    );
                    return Err(EngineError::Aborted {
                        artifact_id: target_id,
                        step,
                        completed: report.lines,
                        source: e,
                    });
                }
            }
        }

        info!(
            template_id = %template.id,
            upgraded = report.changed(),
            deployed = report.deployed(),
            total = report.lines.len(),
            "Template upgrade finished"
        );
        Ok(report)
    }

    async fn upgrade_one(
        &self,
        origin: &C,
        client: &C,
        template: &DesigntimeArtifact,
        target_id: &str,
        ordinal: usize,
        deploy: bool,
    ) -> Result<ArtifactOutcome, (TransportStep, ClientError)> {
        let target = client
            .read_designtime_artifact(target_id, ACTIVE_VERSION)
            .await
            .map_err(|e| (TransportStep::Read, e))?
            .ok_or_else(|| {
                (
                    TransportStep::Read,
                    ClientError::NotFound {
                        resource: target_id.to_string(),
                    },
                )
            })?;

        if target.version == template.version {
            info!(artifact_id = target_id, version = %target.version, "Artifact already at template version, skipping");
            return Ok(ArtifactOutcome {
                ordinal,
                artifact_id: target_id.to_string(),
                version: template.version.clone(),
                package_id: target.package_id,
                changed: false,
                deployed: false,
            });
        }

        info!(
            artifact_id = target_id,
            from_version = %target.version,
            to_version = %template.version,
            "Upgrading artifact"
        );
        match client.delete_designtime_artifact(target_id, &target.version).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(artifact_id = target_id, "Artifact already gone before upgrade, continuing");
            }
            Err(e) => return Err((TransportStep::Delete, e)),
        }

        let downloaded = origin
            .download_designtime_artifact(&template.id, &template.version)
            .await
            .map_err(|e| (TransportStep::Download, e))?;
        let record = restamp(downloaded, &target);
        client
            .upload_designtime_artifact(&record)
            .await
            .map_err(|e| (TransportStep::Upload, e))?;

        for configuration in &target.configurations {
            debug!(artifact_id = target_id, key = %configuration.key, "Re-applying configuration");
            client
                .update_designtime_artifact_configuration(target_id, &template.version, configuration)
                .await
                .map_err(|e| (TransportStep::Configure, e))?;
        }

        if deploy {
            client
                .deploy_designtime_artifact(target_id, &template.version)
                .await
                .map_err(|e| (TransportStep::Deploy, e))?;
            info!(artifact_id = target_id, version = %template.version, "Deployment requested");
        }

        Ok(ArtifactOutcome {
            ordinal,
            artifact_id: target_id.to_string(),
            version: template.version.clone(),
            package_id: target.package_id,
            changed: true,
            deployed: deploy,
        })
    }
}
