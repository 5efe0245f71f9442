//! Single-environment operations behind the `package` and `artifact` commands that
//! are not promotions: listing, inspecting, deploying and reconfiguring.

use tracing::{error, info};

use crate::contract::IntegrationClient;
use crate::error::{ClientError, EngineError};
use crate::landscape::Landscape;
use crate::model::{Configuration, DesigntimeArtifact, Package, ACTIVE_VERSION};

/// Status shown for an artifact without a runtime instance.
pub const NOT_DEPLOYED: &str = "Not deployed";
/// Deployed version shown for an artifact without a runtime instance.
pub const NO_VERSION: &str = "-";

/// A design-time artifact joined with its runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub artifact: DesigntimeArtifact,
    pub deployed_version: String,
    pub runtime_status: String,
}

/// Configuration of one artifact before and after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChange {
    pub before: Vec<Configuration>,
    pub after: Vec<Configuration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedPackage {
    pub package: Package,
    pub artifacts: Vec<DesigntimeArtifact>,
}

/// Splits `KEY:VALUE` at the first colon, so values may contain colons themselves.
pub fn parse_configuration_pair(pair: &str) -> Result<(String, String), EngineError> {
    match pair.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(EngineError::InvalidConfigurationPair(pair.to_string())),
    }
}

fn remote(context: String) -> impl FnOnce(ClientError) -> EngineError {
    move |e| {
        error!(context = %context, error = %e, "Remote call failed");
        EngineError::remote(context, e)
    }
}

pub struct Operations<'a, C> {
    landscape: &'a Landscape<C>,
}

impl<'a, C> Operations<'a, C>
where
    C: IntegrationClient,
{
    pub fn new(landscape: &'a Landscape<C>) -> Self {
        Self { landscape }
    }

    pub async fn list_packages(&self, env: &str) -> Result<Vec<Package>, EngineError> {
        let client = self.landscape.client_for_environment(env)?;
        client
            .read_packages()
            .await
            .map_err(remote(format!("failed to list packages in {env}")))
    }

    /// Lists the artifacts of a package with the status of their runtime instance.
    pub async fn list_artifacts(
        &self,
        env: &str,
        package_id: &str,
    ) -> Result<Vec<ArtifactStatus>, EngineError> {
        let client = self.landscape.client_for_environment(env)?;
        let artifacts = client
            .read_designtime_artifacts(package_id, false)
            .await
            .map_err(remote(format!("failed to list artifacts of package {package_id}")))?;

        let mut statuses = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let runtime = client
                .read_runtime_artifact(&artifact.id)
                .await
                .map_err(remote(format!("failed to read runtime state of {}", artifact.id)))?;
            let (deployed_version, runtime_status) = match runtime {
                Some(r) => (r.version, r.status),
                None => (NO_VERSION.to_string(), NOT_DEPLOYED.to_string()),
            };
            statuses.push(ArtifactStatus {
                artifact,
                deployed_version,
                runtime_status,
            });
        }
        Ok(statuses)
    }

    /// Reads one artifact with its configuration. `version` defaults to the active one.
    pub async fn get_artifact(
        &self,
        env: &str,
        id: &str,
        version: Option<&str>,
    ) -> Result<DesigntimeArtifact, EngineError> {
        let client = self.landscape.client_for_environment(env)?;
        let version = version.unwrap_or(ACTIVE_VERSION);
        client
            .read_designtime_artifact(id, version)
            .await
            .map_err(remote(format!("failed to read artifact {id}")))?
            .ok_or_else(|| EngineError::ArtifactNotFound(id.to_string()))
    }

    /// Deploys the artifact's current version and returns it.
    pub async fn deploy_artifact(&self, env: &str, id: &str) -> Result<String, EngineError> {
        let artifact = self.get_artifact(env, id, None).await?;
        let client = self.landscape.client_for_environment(env)?;
        client
            .deploy_designtime_artifact(&artifact.id, &artifact.version)
            .await
            .map_err(remote(format!("failed to deploy artifact {id}")))?;
        info!(env, artifact_id = id, version = %artifact.version, "Deployment requested");
        Ok(artifact.version)
    }

    pub async fn undeploy_artifact(&self, env: &str, id: &str) -> Result<(), EngineError> {
        let client = self.landscape.client_for_environment(env)?;
        let runtime = client
            .read_runtime_artifact(id)
            .await
            .map_err(remote(format!("failed to read runtime state of {id}")))?;
        if runtime.is_none() {
            error!(env, artifact_id = id, "Artifact is not deployed");
            return Err(EngineError::NotDeployed(id.to_string()));
        }
        client
            .undeploy_runtime_artifact(id)
            .await
            .map_err(remote(format!("failed to undeploy artifact {id}")))?;
        info!(env, artifact_id = id, "Undeployment requested");
        Ok(())
    }

    /// Applies `KEY:VALUE` pairs to the active version of an artifact.
    ///
    /// Every key must already exist; its data type is carried over. Nothing is
    /// written when a pair is malformed or a key is unknown.
    pub async fn update_configuration(
        &self,
        env: &str,
        id: &str,
        pairs: &[String],
    ) -> Result<ConfigurationChange, EngineError> {
        let parsed = pairs
            .iter()
            .map(|p| parse_configuration_pair(p))
            .collect::<Result<Vec<_>, _>>()?;

        let artifact = self.get_artifact(env, id, None).await?;
        let mut updates = Vec::with_capacity(parsed.len());
        for (key, value) in parsed {
            let Some(existing) = artifact.configuration(&key) else {
                error!(artifact_id = id, key = %key, "Unknown configuration key");
                return Err(EngineError::UnknownConfigurationKey {
                    artifact: id.to_string(),
                    key,
                });
            };
            updates.push(Configuration::new(key, value, existing.data_type.clone()));
        }

        let client = self.landscape.client_for_environment(env)?;
        for configuration in &updates {
            client
                .update_designtime_artifact_configuration(&artifact.id, &artifact.version, configuration)
                .await
                .map_err(remote(format!(
                    "failed to update configuration {} of {id}",
                    configuration.key
                )))?;
        }
        info!(env, artifact_id = id, updated = updates.len(), "Configuration updated");

        let after = client
            .read_designtime_artifact_configurations(&artifact.id, &artifact.version)
            .await
            .map_err(remote(format!("failed to re-read configuration of {id}")))?;
        Ok(ConfigurationChange {
            before: artifact.configurations,
            after,
        })
    }

    /// Copies a package from the discover catalogue and lists what it brought along.
    pub async fn copy_package(&self, env: &str, discover_id: &str) -> Result<CopiedPackage, EngineError> {
        let client = self.landscape.client_for_environment(env)?;
        let package = client
            .copy_package_from_discover(discover_id)
            .await
            .map_err(remote(format!("failed to copy package {discover_id}")))?;
        let artifacts = client
            .read_designtime_artifacts(&package.id, false)
            .await
            .map_err(remote(format!("failed to list artifacts of package {}", package.id)))?;
        info!(env, package_id = %package.id, artifacts = artifacts.len(), "Package copied from discover");
        Ok(CopiedPackage { package, artifacts })
    }

    /// Checks that every system in the landscape is reachable with its credentials.
    pub async fn check_connections(&self) -> Result<Vec<String>, EngineError> {
        let mut checked = Vec::new();
        for system in self.landscape.systems() {
            system
                .client
                .check_connection()
                .await
                .map_err(remote(format!("cannot connect to system {}", system.id)))?;
            checked.push(system.id.clone());
        }
        checked.sort();
        Ok(checked)
    }
}
