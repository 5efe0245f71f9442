//! Package promotion: copies the artifacts of a package from the original environment
//! into a target environment.
//!
//! # Flow
//! 1. Preconditions, all checked before any remote mutation:
//!    - the target environment is not the original one and is known to the landscape
//!    - the source package exists
//!    - no selected source artifact is an unsaved draft
//! 2. The target package (`source id + suffix`) is probed and created when missing.
//! 3. Each source artifact is compared with the target by version. Equal versions are
//!    skipped, so re-running an unchanged promotion performs no mutation at all.
//! 4. A transported artifact goes through delete, download, upload, configuration
//!    overlay and optional deploy, in that order.
//!
//! # Error Handling
//! The run is fail-fast: the first remote error inside the per-artifact loop stops it
//! with [`EngineError::Aborted`], which carries the report lines completed so far.
//! Nothing already transported is rolled back.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::contract::IntegrationClient;
use crate::error::{ClientError, EngineError};
use crate::landscape::{Environment, Landscape, Parameter};
use crate::model::{Configuration, DesigntimeArtifact, Package};
use crate::outcome::{ArtifactOutcome, RunReport, TransportStep};

/// Input of a package move.
#[derive(Debug, Clone, Default)]
pub struct MoveRequest {
    /// Package id in the original environment.
    pub package_id: String,
    pub target_env: String,
    /// Source artifact ids to move. Empty means every artifact of the package.
    pub artifacts: Vec<String>,
    pub deploy: bool,
}

/// What happens to one source artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDecision {
    /// The target already holds this version.
    Skip,
    /// The target id is unknown in the target package.
    Create,
    /// The target holds another version, which is deleted first.
    Replace { current_version: String },
}

/// Decides whether `source_version` must be transported given the target's
/// `artifact id -> version` map.
pub fn decide_transport(
    target_versions: &HashMap<String, String>,
    target_id: &str,
    source_version: &str,
) -> TransportDecision {
    match target_versions.get(target_id) {
        None => TransportDecision::Create,
        Some(current) if current == source_version => TransportDecision::Skip,
        Some(current) => TransportDecision::Replace {
            current_version: current.clone(),
        },
    }
}

/// Resolves the configurations to apply on the target.
///
/// The data type of each override is inherited from the source artifact's own
/// configuration when the key exists there, otherwise the manifest's type is used.
pub fn overlay_configurations(
    source: &DesigntimeArtifact,
    overrides: &[Parameter],
) -> Vec<Configuration> {
    overrides
        .iter()
        .map(|p| {
            let data_type = source
                .configuration(&p.key)
                .map(|c| c.data_type.clone())
                .unwrap_or_else(|| p.data_type.clone());
            Configuration::new(&p.key, &p.value, data_type)
        })
        .collect()
}

pub struct PackageMover<'a, C> {
    landscape: &'a Landscape<C>,
}

impl<'a, C> PackageMover<'a, C>
where
    C: IntegrationClient,
{
    pub fn new(landscape: &'a Landscape<C>) -> Self {
        Self { landscape }
    }

    pub async fn run(&self, request: &MoveRequest) -> Result<RunReport, EngineError> {
        let origin = self.landscape.original_environment();
        if request.target_env == origin.id {
            error!(target_env = %request.target_env, "Refusing to move into the original environment");
            return Err(EngineError::TargetIsOriginal(request.target_env.clone()));
        }
        let target_env = self.landscape.environment(&request.target_env)?;
        let source = self.landscape.client_for_environment(&origin.id)?;
        let target = self.landscape.client_for_environment(&target_env.id)?;

        info!(
            package_id = %request.package_id,
            source_env = %origin.id,
            target_env = %target_env.id,
            deploy = request.deploy,
            "Starting package move"
        );

        let source_package = match source.read_package(&request.package_id).await {
            Ok(Some(package)) => package,
            Ok(None) => {
                error!(package_id = %request.package_id, "Source package not found");
                return Err(EngineError::PackageNotFound(request.package_id.clone()));
            }
            Err(e) => {
                error!(package_id = %request.package_id, error = %e, "Failed to read source package");
                return Err(EngineError::remote(
                    format!("failed to read package {}", request.package_id),
                    e,
                ));
            }
        };

        let artifacts = self
            .source_artifacts(source, &request.package_id, &request.artifacts)
            .await?;

        let drafts: Vec<String> = artifacts
            .iter()
            .filter(|a| a.is_draft())
            .map(|a| a.id.clone())
            .collect();
        if !drafts.is_empty() {
            error!(package_id = %request.package_id, drafts = ?drafts, "Draft artifacts block the move");
            return Err(EngineError::DraftArtifacts {
                package: request.package_id.clone(),
                artifacts: drafts,
            });
        }

        let target_package_id = target_env.scope(&request.package_id);
        let target_versions = self
            .prepare_target_package(target, &source_package, &target_package_id, target_env)
            .await?;

        let mut report = RunReport::default();
        for (index, artifact) in artifacts.iter().enumerate() {
            let ordinal = index + 1;
            let target_id = target_env.scope(&artifact.id);
            let decision = decide_transport(&target_versions, &target_id, &artifact.version);

            if decision == TransportDecision::Skip {
                info!(artifact_id = %target_id, version = %artifact.version, "Artifact is up to date, skipping");
                report.lines.push(ArtifactOutcome {
                    ordinal,
                    artifact_id: target_id,
                    version: artifact.version.clone(),
                    package_id: target_package_id.clone(),
                    changed: false,
                    deployed: false,
                });
                continue;
            }

            let transfer = Transfer {
                source,
                target,
                artifact,
                target_id: &target_id,
                target_package_id: &target_package_id,
                target_env,
                overrides: self.landscape.artifact_configuration(
                    &target_env.id,
                    &request.package_id,
                    &artifact.id,
                ),
            };
            if let Err((step, e)) = transfer.execute(&decision, request.deploy).await {
                error!(
                    artifact_id = %target_id,
                    %step,
                    error = %e,
                    completed = report.lines.len(),
                    "Aborting package move"
                );
                return Err(EngineError::Aborted {
                    artifact_id: target_id,
                    step,
                    completed: report.lines,
                    source: e,
                });
            }

            report.lines.push(ArtifactOutcome {
                ordinal,
                artifact_id: target_id,
                version: artifact.version.clone(),
                package_id: target_package_id.clone(),
                changed: true,
                deployed: request.deploy,
            });
        }

        info!(
            package_id = %target_package_id,
            transferred = report.changed(),
            deployed = report.deployed(),
            total = report.lines.len(),
            "Package move finished"
        );
        Ok(report)
    }

    /// Reads the source artifacts with their configuration, filtered to `allow_list`.
    async fn source_artifacts(
        &self,
        source: &C,
        package_id: &str,
        allow_list: &[String],
    ) -> Result<Vec<DesigntimeArtifact>, EngineError> {
        let artifacts = match source.read_designtime_artifacts(package_id, true).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                error!(package_id, error = %e, "Failed to read source artifacts");
                return Err(EngineError::remote(
                    format!("failed to read artifacts of package {package_id}"),
                    e,
                ));
            }
        };
        if allow_list.is_empty() {
            return Ok(artifacts);
        }

        let wanted: HashSet<&str> = allow_list.iter().map(String::as_str).collect();
        for id in &wanted {
            if !artifacts.iter().any(|a| a.id == *id) {
                warn!(package_id, artifact_id = *id, "Requested artifact is not in the source package");
            }
        }
        Ok(artifacts
            .into_iter()
            .filter(|a| wanted.contains(a.id.as_str()))
            .collect())
    }

    /// Probes the target package, creating it when missing, and returns the
    /// versions of the artifacts it already holds.
    async fn prepare_target_package(
        &self,
        target: &C,
        source_package: &Package,
        target_package_id: &str,
        target_env: &Environment,
    ) -> Result<HashMap<String, String>, EngineError> {
        let existing = target.read_package(target_package_id).await.map_err(|e| {
            error!(package_id = target_package_id, error = %e, "Failed to probe target package");
            EngineError::remote(format!("failed to read package {target_package_id}"), e)
        })?;

        if existing.is_none() {
            let package = target_package(source_package, target_package_id, target_env);
            info!(package_id = target_package_id, target_env = %target_env.id, "Target package missing, creating it");
            target.create_package(&package).await.map_err(|e| {
                error!(package_id = target_package_id, error = %e, "Failed to create target package");
                EngineError::remote(format!("failed to create package {target_package_id}"), e)
            })?;
            return Ok(HashMap::new());
        }

        let artifacts = target
            .read_designtime_artifacts(target_package_id, false)
            .await
            .map_err(|e| {
                error!(package_id = target_package_id, error = %e, "Failed to read target artifacts");
                EngineError::remote(
                    format!("failed to read artifacts of package {target_package_id}"),
                    e,
                )
            })?;
        debug!(package_id = target_package_id, count = artifacts.len(), "Read target artifact versions");
        Ok(artifacts.into_iter().map(|a| (a.id, a.version)).collect())
    }
}

/// Descriptive metadata for a package created in `env`.
pub fn target_package(source: &Package, target_package_id: &str, env: &Environment) -> Package {
    Package {
        id: target_package_id.to_string(),
        name: format!("{} {}", env.suffix, source.name).trim().to_string(),
        description: source.description.clone(),
        short_text: format!("{}(environment - '{}')", source.short_text, env.id),
        version: source.version.clone(),
        vendor: source.vendor.clone(),
        ..Package::default()
    }
}

/// Transport of one artifact into the target environment.
struct Transfer<'t, C> {
    source: &'t C,
    target: &'t C,
    artifact: &'t DesigntimeArtifact,
    target_id: &'t str,
    target_package_id: &'t str,
    target_env: &'t Environment,
    overrides: &'t [Parameter],
}

impl<C: IntegrationClient> Transfer<'_, C> {
    async fn execute(
        &self,
        decision: &TransportDecision,
        deploy: bool,
    ) -> Result<(), (TransportStep, ClientError)> {
        let version = self.artifact.version.as_str();

        if let TransportDecision::Replace { current_version } = decision {
            info!(artifact_id = self.target_id, current_version = %current_version, "Deleting outdated target artifact");
            match self
                .target
                .delete_designtime_artifact(self.target_id, current_version)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    warn!(artifact_id = self.target_id, "Target artifact already gone, continuing");
                }
                Err(e) => return Err((TransportStep::Delete, e)),
            }
        }

        let downloaded = self
            .source
            .download_designtime_artifact(&self.artifact.id, version)
            .await
            .map_err(|e| (TransportStep::Download, e))?;

        let record = DesigntimeArtifact {
            id: self.target_id.to_string(),
            version: version.to_string(),
            package_id: self.target_package_id.to_string(),
            name: format!("{} {}", self.artifact.name, self.target_env.suffix)
                .trim()
                .to_string(),
            description: self.artifact.description.clone(),
            sender: self.artifact.sender.clone(),
            receiver: self.artifact.receiver.clone(),
            content: downloaded.content,
            configurations: Vec::new(),
        };
        self.target
            .upload_designtime_artifact(&record)
            .await
            .map_err(|e| (TransportStep::Upload, e))?;
        info!(artifact_id = self.target_id, version, "Uploaded artifact to target");

        for configuration in overlay_configurations(self.artifact, self.overrides) {
            debug!(artifact_id = self.target_id, key = %configuration.key, "Applying configuration override");
            self.target
                .update_designtime_artifact_configuration(self.target_id, version, &configuration)
                .await
                .map_err(|e| (TransportStep::Configure, e))?;
        }

        if deploy {
            self.target
                .deploy_designtime_artifact(self.target_id, version)
                .await
                .map_err(|e| (TransportStep::Deploy, e))?;
            info!(artifact_id = self.target_id, version, "Deployment requested");
        }
        Ok(())
    }
}
