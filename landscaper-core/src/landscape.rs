//! In-memory landscape: systems, environments, manifest packages and per-environment overrides.
//!
//! Built once at start-up from a [`Manifest`] and immutable afterwards. Environments
//! refer to systems by id, and every reference is checked while building, so lookups
//! on a built landscape only fail for ids that come from the command line.
//!
//! The landscape is generic over the client type so the engines can be exercised
//! with mocks; production code uses `Landscape<CpiClient>`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::cpi_client::CpiClient;
use crate::credentials::{CredentialKind, CredentialResolver, Credentials};
use crate::error::{ClientError, LandscapeError};
use crate::manifest::{read_manifest, Manifest, SystemEntry};
use crate::model::DEFAULT_PARAMETER_TYPE;

/// Applies an environment suffix to a base id. An empty suffix leaves the id unchanged.
pub fn scoped_id(base_id: &str, suffix: &str) -> String {
    format!("{base_id}{suffix}")
}

/// A tenant and the authenticated client used to reach it.
#[derive(Debug)]
pub struct System<C> {
    pub id: String,
    pub name: String,
    pub host: String,
    pub client: C,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub id: String,
    pub name: String,
    /// Appended to package and artifact ids to scope them to this environment.
    pub suffix: String,
    pub system_id: String,
}

impl Environment {
    pub fn scope(&self, base_id: &str) -> String {
        scoped_id(base_id, &self.suffix)
    }
}

/// A manifest-sourced configuration override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestArtifact {
    pub id: String,
    pub template: Option<String>,
    /// Overrides keyed by environment id.
    pub configurations: HashMap<String, Vec<Parameter>>,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestPackage {
    pub id: String,
    pub artifacts: Vec<ManifestArtifact>,
}

impl ManifestPackage {
    pub fn artifact(&self, id: &str) -> Option<&ManifestArtifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }
}

/// An artifact the manifest declares as built from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInstance {
    pub package_id: String,
    pub artifact_id: String,
}

#[derive(Debug)]
pub struct Landscape<C> {
    name: String,
    systems: HashMap<String, System<C>>,
    environments: HashMap<String, Environment>,
    packages: Vec<ManifestPackage>,
    original_environment: String,
}

impl Landscape<CpiClient> {
    /// Reads the manifest at `path`, resolves credentials and connects one
    /// [`CpiClient`] per system.
    pub fn load<P: AsRef<Path>>(
        path: P,
        resolver: &dyn CredentialResolver,
    ) -> Result<Self, LandscapeError> {
        let manifest = read_manifest(path)?;
        Self::build(manifest, resolver, |system, credentials| {
            CpiClient::for_host(&system.host, credentials.login, credentials.password)
        })
    }
}

fn reject_duplicates<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), LandscapeError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LandscapeError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

impl<C> Landscape<C> {
    /// Validates the manifest's references, then resolves credentials and builds a
    /// client per system through `connect`.
    pub fn build<F>(
        manifest: Manifest,
        resolver: &dyn CredentialResolver,
        mut connect: F,
    ) -> Result<Self, LandscapeError>
    where
        F: FnMut(&SystemEntry, Credentials) -> Result<C, ClientError>,
    {
        let section = manifest.landscape;

        reject_duplicates("system", section.systems.iter().map(|s| s.id.as_str()))?;
        reject_duplicates("environment", section.environments.iter().map(|e| e.id.as_str()))?;

        let mut environments = HashMap::new();
        for entry in &section.environments {
            if !section.systems.iter().any(|s| s.id == entry.system) {
                return Err(LandscapeError::UnknownSystem {
                    environment: entry.id.clone(),
                    system: entry.system.clone(),
                });
            }
            environments.insert(
                entry.id.clone(),
                Environment {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    suffix: entry.suffix.clone(),
                    system_id: entry.system.clone(),
                },
            );
        }

        if !environments.contains_key(&section.original_environment) {
            return Err(LandscapeError::MissingOriginalEnvironment(
                section.original_environment.clone(),
            ));
        }

        let mut packages = Vec::with_capacity(section.packages.len());
        for package in section.packages {
            let mut artifacts = Vec::with_capacity(package.artifacts.len());
            for artifact in package.artifacts {
                let mut configurations: HashMap<String, Vec<Parameter>> = HashMap::new();
                for configuration in artifact.configurations {
                    if !environments.contains_key(&configuration.environment) {
                        return Err(LandscapeError::UnknownOverrideEnvironment {
                            artifact: artifact.id.clone(),
                            environment: configuration.environment,
                        });
                    }
                    let parameters = configuration.parameters.into_iter().map(|p| Parameter {
                        key: p.key,
                        value: p.value,
                        data_type: p
                            .data_type
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| DEFAULT_PARAMETER_TYPE.to_string()),
                    });
                    configurations
                        .entry(configuration.environment)
                        .or_default()
                        .extend(parameters);
                }
                artifacts.push(ManifestArtifact {
                    id: artifact.id,
                    template: artifact.template,
                    configurations,
                });
            }
            packages.push(ManifestPackage {
                id: package.id,
                artifacts,
            });
        }

        let mut systems = HashMap::new();
        for entry in &section.systems {
            let system_name = if entry.name.is_empty() {
                entry.id.as_str()
            } else {
                entry.name.as_str()
            };
            let credentials = Credentials {
                login: resolver.resolve(system_name, CredentialKind::Login, &entry.login)?,
                password: resolver.resolve(system_name, CredentialKind::Password, &entry.password)?,
            };
            let client = connect(entry, credentials).map_err(|source| LandscapeError::Client {
                system: entry.id.clone(),
                source,
            })?;
            debug!(system = %entry.id, host = %entry.host, "System connected");
            systems.insert(
                entry.id.clone(),
                System {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    host: entry.host.clone(),
                    client,
                },
            );
        }

        info!(
            landscape = %section.name,
            systems = systems.len(),
            environments = environments.len(),
            packages = packages.len(),
            original_environment = %section.original_environment,
            "Landscape loaded"
        );

        Ok(Landscape {
            name: section.name,
            systems,
            environments,
            packages,
            original_environment: section.original_environment,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The authoring environment every promotion reads from.
    pub fn original_environment(&self) -> &Environment {
        // Presence is checked in `build`.
        &self.environments[&self.original_environment]
    }

    pub fn environment(&self, id: &str) -> Result<&Environment, LandscapeError> {
        self.environments
            .get(id)
            .ok_or_else(|| LandscapeError::UnknownEnvironment(id.to_string()))
    }

    /// Resolves `id`, or the original environment when `id` is `None`.
    pub fn environment_or_original(&self, id: Option<&str>) -> Result<&Environment, LandscapeError> {
        match id {
            Some(id) => self.environment(id),
            None => Ok(self.original_environment()),
        }
    }

    pub fn system_for_environment(&self, id: &str) -> Result<&System<C>, LandscapeError> {
        let environment = self.environment(id)?;
        self.systems
            .get(&environment.system_id)
            .ok_or_else(|| LandscapeError::UnknownSystem {
                environment: environment.id.clone(),
                system: environment.system_id.clone(),
            })
    }

    pub fn client_for_environment(&self, id: &str) -> Result<&C, LandscapeError> {
        Ok(&self.system_for_environment(id)?.client)
    }

    pub fn systems(&self) -> impl Iterator<Item = &System<C>> {
        self.systems.values()
    }

    pub fn packages(&self) -> &[ManifestPackage] {
        &self.packages
    }

    pub fn package(&self, id: &str) -> Option<&ManifestPackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Overrides declared for an artifact in an environment, keyed by base ids.
    /// Returns an empty slice when the manifest declares none.
    pub fn artifact_configuration(
        &self,
        environment: &str,
        package_id: &str,
        artifact_id: &str,
    ) -> &[Parameter] {
        self.package(package_id)
            .and_then(|p| p.artifact(artifact_id))
            .and_then(|a| a.configurations.get(environment))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Manifest artifacts tagged as built from `template`, in manifest order.
    pub fn artifacts_by_template(&self, template: &str) -> Vec<TemplateInstance> {
        self.packages
            .iter()
            .flat_map(|p| {
                p.artifacts
                    .iter()
                    .filter(|a| a.template.as_deref() == Some(template))
                    .map(move |a| TemplateInstance {
                        package_id: p.id.clone(),
                        artifact_id: a.id.clone(),
                    })
            })
            .collect()
    }
}
