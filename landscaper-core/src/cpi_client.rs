//! reqwest implementation of the [`IntegrationClient`] contract against a Cloud Integration tenant.
//!
//! # CpiClient
//!
//! One authenticated session per system:
//! - HTTP Basic credentials on every request, a cookie jar kept for the client lifetime.
//! - Mutations first fetch an anti-forgery token (`X-CSRF-Token: Fetch`) and attach it.
//!   The token is fetched again for every mutation.
//! - 404 maps to [`ClientError::NotFound`] (or `Ok(None)` on probing reads), any other
//!   non-2xx response to [`ClientError::Remote`] carrying the raw body.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, error, info, warn};

use crate::contract::IntegrationClient;
use crate::error::ClientError;
use crate::model::{Configuration, DesigntimeArtifact, Package, RuntimeArtifact};
use crate::odata::{
    decode_artifact_entry, decode_json, ArtifactRecord, ArtifactUpload, ConfigurationRecord,
    ODataEntity, ODataList, PackageRecord, RuntimeRecord,
};

pub const API_VERSION: &str = "v1";
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Escapes a value for use inside an OData string literal.
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

pub struct CpiClient {
    http: Client,
    base_url: String,
    login: String,
    password: String,
}

impl std::fmt::Debug for CpiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpiClient")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl CpiClient {
    /// Builds a client for an API root such as `https://tenant.example.com/api/v1`.
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "Initialised integration client");
        Ok(CpiClient {
            http,
            base_url,
            login: login.into(),
            password: password.into(),
        })
    }

    /// Builds a client for a tenant host name, using HTTPS and the current API version.
    pub fn for_host(
        host: &str,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let host = host.trim_end_matches('/');
        Self::new(format!("https://{host}/api/{API_VERSION}"), login, password)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn artifact_path(id: &str, version: &str) -> String {
        format!(
            "IntegrationDesigntimeArtifacts(Id='{}',Version='{}')",
            quote(id),
            quote(version)
        )
    }

    /// Sends a request and classifies the response status.
    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ClientError> {
        let response = request
            .basic_auth(&self.login, Some(&self.password))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!(resource, status = %status, "Request succeeded");
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            debug!(resource, "Resource not found");
            return Err(ClientError::NotFound {
                resource: resource.to_string(),
            });
        }
        let body = error_body(resource, response.text().await);
        error!(resource, status = %status, body = %body, "Tenant returned an error");
        Err(ClientError::Remote {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_csrf_token(&self) -> Result<String, ClientError> {
        let request = self
            .http
            .get(self.url("?$format=json"))
            .header(CSRF_HEADER, "Fetch");
        let response = self.send(request, "csrf token").await?;
        response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(ClientError::MissingCsrfToken)
    }

    /// Attaches a freshly fetched token, then sends.
    async fn mutate(&self, request: RequestBuilder, resource: &str) -> Result<Response, ClientError> {
        let token = self.fetch_csrf_token().await?;
        self.send(request.header(CSRF_HEADER, token), resource).await
    }

    async fn get_bytes(&self, path: &str, resource: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.send(self.http.get(self.url(path)), resource).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Body of a failed response. A body that cannot be read is described in its place.
fn error_body<E: std::fmt::Display>(resource: &str, body: Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(e) => {
            warn!(resource, error = %e, "Could not read error response body");
            format!("<unreadable response body: {e}>")
        }
    }
}

/// Turns a probing read's `NotFound` into `Ok(None)`.
fn optional<T>(result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl IntegrationClient for CpiClient {
    async fn read_package(&self, id: &str) -> Result<Option<Package>, ClientError> {
        let path = format!("IntegrationPackages('{}')?$format=json", quote(id));
        let Some(bytes) = optional(self.get_bytes(&path, id).await)? else {
            return Ok(None);
        };
        let entity: ODataEntity<PackageRecord> = decode_json("package", &bytes)?;
        Ok(Some(entity.d.into()))
    }

    async fn read_packages(&self) -> Result<Vec<Package>, ClientError> {
        let bytes = self
            .get_bytes("IntegrationPackages?$format=json", "packages")
            .await?;
        let list: ODataList<PackageRecord> = decode_json("package list", &bytes)?;
        debug!(count = list.d.results.len(), "Read integration packages");
        Ok(list.d.results.into_iter().map(Package::from).collect())
    }

    async fn create_package(&self, package: &Package) -> Result<(), ClientError> {
        info!(package_id = %package.id, "Creating integration package");
        let request = self
            .http
            .post(self.url("IntegrationPackages"))
            .json(&PackageRecord::from(package));
        self.mutate(request, &package.id).await?;
        Ok(())
    }

    async fn copy_package_from_discover(&self, id: &str) -> Result<Package, ClientError> {
        info!(package_id = id, "Copying package from discover catalogue");
        let path = format!("CopyIntegrationPackage?$format=json&Id='{}'", quote(id));
        let request = self.http.post(self.url(&path));
        let response = self.mutate(request, id).await?;
        let bytes = response.bytes().await?;
        let entity: ODataEntity<PackageRecord> = decode_json("copied package", &bytes)?;
        Ok(entity.d.into())
    }

    async fn read_designtime_artifacts(
        &self,
        package_id: &str,
        fetch_config: bool,
    ) -> Result<Vec<DesigntimeArtifact>, ClientError> {
        let path = format!(
            "IntegrationPackages('{}')/IntegrationDesigntimeArtifacts?$format=json",
            quote(package_id)
        );
        let bytes = self.get_bytes(&path, package_id).await?;
        let list: ODataList<ArtifactRecord> = decode_json("artifact list", &bytes)?;

        let mut artifacts = Vec::with_capacity(list.d.results.len());
        for record in list.d.results {
            let mut artifact = DesigntimeArtifact::from(record);
            if fetch_config {
                artifact.configurations = self
                    .read_designtime_artifact_configurations(&artifact.id, &artifact.version)
                    .await?;
            }
            artifacts.push(artifact);
        }
        debug!(package_id, count = artifacts.len(), "Read design-time artifacts");
        Ok(artifacts)
    }

    async fn read_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Option<DesigntimeArtifact>, ClientError> {
        let path = Self::artifact_path(id, version);
        let Some(bytes) = optional(self.get_bytes(&path, id).await)? else {
            return Ok(None);
        };
        let xml = String::from_utf8_lossy(&bytes);
        let mut artifact = decode_artifact_entry(&xml)?;
        artifact.configurations = self
            .read_designtime_artifact_configurations(&artifact.id, &artifact.version)
            .await?;
        Ok(Some(artifact))
    }

    async fn read_designtime_artifact_configurations(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Vec<Configuration>, ClientError> {
        let path = format!(
            "{}/Configurations?$format=json",
            Self::artifact_path(id, version)
        );
        let bytes = self.get_bytes(&path, id).await?;
        let list: ODataList<ConfigurationRecord> = decode_json("configuration list", &bytes)?;
        Ok(list.d.results.into_iter().map(Configuration::from).collect())
    }

    async fn download_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<DesigntimeArtifact, ClientError> {
        let mut artifact = self
            .read_designtime_artifact(id, version)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                resource: format!("{id} ({version})"),
            })?;
        let path = format!("{}/$value", Self::artifact_path(id, version));
        let bytes = self.get_bytes(&path, id).await?;
        info!(artifact_id = id, version, bytes = bytes.len(), "Downloaded artifact content");
        artifact.content = STANDARD.encode(bytes);
        Ok(artifact)
    }

    async fn upload_designtime_artifact(
        &self,
        artifact: &DesigntimeArtifact,
    ) -> Result<(), ClientError> {
        info!(artifact_id = %artifact.id, package_id = %artifact.package_id, "Uploading artifact");
        let request = self
            .http
            .post(self.url("IntegrationDesigntimeArtifacts"))
            .json(&ArtifactUpload::from(artifact));
        self.mutate(request, &artifact.id).await?;
        Ok(())
    }

    async fn update_designtime_artifact_configuration(
        &self,
        id: &str,
        version: &str,
        configuration: &Configuration,
    ) -> Result<(), ClientError> {
        info!(
            artifact_id = id,
            version,
            key = %configuration.key,
            data_type = %configuration.data_type,
            "Updating artifact configuration"
        );
        let path = format!(
            "{}/$links/Configurations('{}')",
            Self::artifact_path(id, version),
            quote(&configuration.key)
        );
        let request = self
            .http
            .put(self.url(&path))
            .json(&ConfigurationRecord::from(configuration));
        self.mutate(request, id).await?;
        Ok(())
    }

    async fn delete_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<(), ClientError> {
        info!(artifact_id = id, version, "Deleting artifact");
        let request = self.http.delete(self.url(&Self::artifact_path(id, version)));
        self.mutate(request, id).await?;
        Ok(())
    }

    async fn read_runtime_artifact(
        &self,
        id: &str,
    ) -> Result<Option<RuntimeArtifact>, ClientError> {
        let path = format!("IntegrationRuntimeArtifacts('{}')?$format=json", quote(id));
        let Some(bytes) = optional(self.get_bytes(&path, id).await)? else {
            return Ok(None);
        };
        let entity: ODataEntity<RuntimeRecord> = decode_json("runtime artifact", &bytes)?;
        Ok(Some(entity.d.into()))
    }

    async fn deploy_designtime_artifact(
        &self,
        id: &str,
        version: &str,
    ) -> Result<(), ClientError> {
        info!(artifact_id = id, version, "Requesting deployment");
        let path = format!(
            "DeployIntegrationDesigntimeArtifact?Id='{}'&Version='{}'",
            quote(id),
            quote(version)
        );
        let request = self.http.post(self.url(&path));
        self.mutate(request, id).await?;
        Ok(())
    }

    async fn undeploy_runtime_artifact(&self, id: &str) -> Result<(), ClientError> {
        info!(artifact_id = id, "Requesting undeployment");
        let path = format!("IntegrationRuntimeArtifacts('{}')", quote(id));
        let request = self.http.delete(self.url(&path));
        self.mutate(request, id).await?;
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), ClientError> {
        match self.fetch_csrf_token().await {
            Ok(_) => {
                debug!(base_url = %self.base_url, "Connection check succeeded");
                Ok(())
            }
            Err(e) => {
                error!(base_url = %self.base_url, error = %e, "Connection check failed");
                Err(e)
            }
        }
    }
}
