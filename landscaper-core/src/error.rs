//! Error taxonomy shared by the client, the landscape loader and the engines.
//!
//! - [`ClientError`]: anything a remote call can produce. `NotFound` is an expected
//!   outcome callers branch on; everything else is fatal for the current run.
//! - [`LandscapeError`]: manifest or credential problems. Raised before any remote call.
//! - [`EngineError`]: precondition failures and aborted runs, surfaced to the CLI boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::outcome::{ArtifactOutcome, TransportStep};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The tenant answered 404 for the addressed resource.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-2xx response. `body` is the raw payload returned by the tenant.
    #[error("remote error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response arrived but could not be decoded into the expected shape.
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("tenant did not return an X-CSRF-Token header")]
    MissingCsrfToken,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub(crate) fn decode(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ClientError::Decode {
            what: what.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LandscapeError {
    #[error("failed to read landscape file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse landscape YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("environment {0} is not found")]
    UnknownEnvironment(String),

    #[error("{kind} {id} is defined more than once")]
    DuplicateId { kind: &'static str, id: String },

    #[error("environment {environment} refers to unknown system {system}")]
    UnknownSystem { environment: String, system: String },

    #[error("original environment {0} is not defined in the landscape")]
    MissingOriginalEnvironment(String),

    #[error("configuration of artifact {artifact} refers to unknown environment {environment}")]
    UnknownOverrideEnvironment { artifact: String, environment: String },

    #[error("could not resolve {what} for system {system}: {message}")]
    Credential {
        system: String,
        what: String,
        message: String,
    },

    #[error("could not build client for system {system}: {source}")]
    Client {
        system: String,
        #[source]
        source: ClientError,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot import changes into the original environment {0}")]
    TargetIsOriginal(String),

    #[error("these artifacts in package {package} are in draft state: {}. Please save them as a version", .artifacts.join("|"))]
    DraftArtifacts {
        package: String,
        artifacts: Vec<String>,
    },

    #[error("template {0} is in draft state. Please save it as a version")]
    DraftTemplate(String),

    #[error("template artifact {0} is not found")]
    TemplateNotFound(String),

    #[error("package {0} is not found in the source environment")]
    PackageNotFound(String),

    #[error("artifact {0} is not found")]
    ArtifactNotFound(String),

    #[error("artifact {0} is not deployed")]
    NotDeployed(String),

    #[error("configuration key {key} is not found in artifact {artifact}")]
    UnknownConfigurationKey { artifact: String, key: String },

    #[error("cannot parse configuration {0}, expected KEY:VALUE")]
    InvalidConfigurationPair(String),

    #[error(transparent)]
    Landscape(#[from] LandscapeError),

    /// A remote failure outside the per-artifact loop (probing, listing, creating the package).
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: ClientError,
    },

    /// Fail-fast abort inside the per-artifact loop. `completed` holds the
    /// report lines produced before the failing artifact.
    #[error("{step} failed for artifact {artifact_id}: {source}")]
    Aborted {
        artifact_id: String,
        step: TransportStep,
        completed: Vec<ArtifactOutcome>,
        #[source]
        source: ClientError,
    },
}

impl EngineError {
    pub(crate) fn remote(context: impl Into<String>, source: ClientError) -> Self {
        EngineError::Remote {
            context: context.into(),
            source,
        }
    }

    /// Report lines that were completed before the run stopped, if any.
    pub fn completed(&self) -> &[ArtifactOutcome] {
        match self {
            EngineError::Aborted { completed, .. } => completed,
            _ => &[],
        }
    }
}
