//! # contract: the remote API surface the engines depend on
//!
//! [`IntegrationClient`] is the single seam between the promotion/upgrade engines
//! and an integration tenant. The production implementation is
//! [`crate::cpi_client::CpiClient`]; tests drive the engines through the
//! `mockall`-generated `MockIntegrationClient`.
//!
//! ## Contract
//! - One client per system. Session cookies persist across calls.
//! - Every mutating call fetches a fresh anti-forgery token first. Tokens are not cached.
//! - Reads that may legitimately find nothing return `Ok(None)`.
//! - Any other non-2xx response is [`ClientError::Remote`] with the raw body. Nothing is retried.
//! - Calls are independent request/response exchanges, no batching.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ClientError;
use crate::model::{Configuration, DesigntimeArtifact, Package, RuntimeArtifact};

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    /// Reads one package. `Ok(None)` when the tenant does not know it.
    async fn read_package(&self, id: &str) -> Result<Option<Package>, ClientError>;

    /// Lists every package in the design-time workspace.
    async fn read_packages(&self) -> Result<Vec<Package>, ClientError>;

    /// Creates a package. A conflicting id surfaces as [`ClientError::Remote`].
    async fn create_package(&self, package: &Package) -> Result<(), ClientError>;

    /// Copies a package from the discover catalogue into the design workspace.
    async fn copy_package_from_discover(&self, id: &str) -> Result<Package, ClientError>;

    /// Lists the design-time artifacts of a package.
    ///
    /// With `fetch_config` each artifact's configuration is loaded as well,
    /// at the cost of one extra round-trip per artifact.
    async fn read_designtime_artifacts(
        &self,
        package_id: &str,
        fetch_config: bool,
    ) -> Result<Vec<DesigntimeArtifact>, ClientError>;

    /// Reads one artifact, including its configuration. `Ok(None)` when absent.
    async fn read_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Option<DesigntimeArtifact>, ClientError>;

    async fn read_designtime_artifact_configurations(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Vec<Configuration>, ClientError>;

    /// Reads the artifact and fills [`DesigntimeArtifact::content`] with its base64 archive.
    async fn download_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<DesigntimeArtifact, ClientError>;

    /// Uploads an artifact record. Create-or-replace semantics belong to the tenant.
    async fn upload_designtime_artifact(
        &self,
        artifact: &DesigntimeArtifact,
    ) -> Result<(), ClientError>;

    async fn update_designtime_artifact_configuration(
        &self,
        id: &str,
        version: &str,
        configuration: &Configuration,
    ) -> Result<(), ClientError>;

    /// Deletes an artifact version. A missing artifact is [`ClientError::NotFound`].
    async fn delete_designtime_artifact(&self, id: &str, version: &str)
        -> Result<(), ClientError>;

    /// Reads the deployed instance. `Ok(None)` means "not deployed".
    async fn read_runtime_artifact(&self, id: &str)
        -> Result<Option<RuntimeArtifact>, ClientError>;

    /// Requests deployment. Success means the tenant accepted it, not that it finished.
    async fn deploy_designtime_artifact(&self, id: &str, version: &str)
        -> Result<(), ClientError>;

    async fn undeploy_runtime_artifact(&self, id: &str) -> Result<(), ClientError>;

    /// Fetches an anti-forgery token to prove the tenant is reachable with these credentials.
    async fn check_connection(&self) -> Result<(), ClientError>;
}
