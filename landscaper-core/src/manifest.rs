//! `manifest` module: reads the landscape YAML file into typed manifest entries.
//!
//! This is the only place where the user-supplied YAML is parsed. It stays a thin
//! adapter: the entries keep the file's shape, and [`crate::landscape::Landscape::build`]
//! turns them into the wired landscape (systems, environments, overrides).
//!
//! # Accepted schema
//! ```yaml
//! landscape:
//!   name: Example
//!   systems:
//!     - { id: dev, name: Development, host: dev.example.com, login: DEV_LOGIN, password: DEV_PASSWORD }
//!   packages:
//!     - id: Orders
//!       artifacts:
//!         - id: OrderFlow
//!           template: OrderTemplate
//!           configurations:
//!             - environment: qa
//!               parameters:
//!                 - { key: endpoint, value: "https://qa", type: "xsd:string" }
//!   environments:
//!     - { id: dev, name: Development, suffix: "", system: dev }
//!   originalEnvironment: dev
//! ```
//! `login` and `password` name environment variables. A parameter without `type`
//! is an `xsd:string`.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::{error, info};

use crate::error::LandscapeError;

pub const DEFAULT_LANDSCAPE_FILE: &str = "conf/landscape-prod.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub landscape: LandscapeSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandscapeSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub systems: Vec<SystemEntry>,
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
    #[serde(default)]
    pub environments: Vec<EnvironmentEntry>,
    pub original_environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub host: String,
    /// Name of the environment variable holding the login.
    pub login: String,
    /// Name of the environment variable holding the password.
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub id: String,
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactEntry {
    pub id: String,
    /// Template artifact this one was instantiated from.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub configurations: Vec<ConfigurationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationEntry {
    pub environment: String,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterEntry {
    pub key: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub suffix: String,
    pub system: String,
}

/// Accepts any YAML scalar (`true`, `8080`, `~`) as a parameter value.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        other => Err(D::Error::custom(format!(
            "parameter value must be a scalar, got {other:?}"
        ))),
    }
}

pub fn parse_manifest(content: &str) -> Result<Manifest, LandscapeError> {
    let manifest: Manifest = serde_yaml::from_str(content)?;
    Ok(manifest)
}

/// Reads and parses a landscape file.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, LandscapeError> {
    let path_ref = path.as_ref();
    info!(landscape_path = ?path_ref, "Loading landscape from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, landscape_path = ?path_ref, "Failed to read landscape file");
            return Err(LandscapeError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            });
        }
    };

    match parse_manifest(&content) {
        Ok(manifest) => {
            info!(
                landscape_path = ?path_ref,
                name = %manifest.landscape.name,
                systems = manifest.landscape.systems.len(),
                environments = manifest.landscape.environments.len(),
                packages = manifest.landscape.packages.len(),
                "Parsed landscape YAML successfully"
            );
            Ok(manifest)
        }
        Err(e) => {
            error!(error = %e, landscape_path = ?path_ref, "Failed to parse landscape YAML");
            Err(e)
        }
    }
}
