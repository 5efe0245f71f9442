#![allow(dead_code)]

use std::collections::HashMap;

use landscaper_core::credentials::{CredentialKind, CredentialResolver};
use landscaper_core::error::LandscapeError;
use landscaper_core::manifest::parse_manifest;
use landscaper_core::model::{Configuration, DesigntimeArtifact, Package};
use landscaper_core::{Landscape, MockIntegrationClient};

/// Two environments on two systems. `qa` scopes ids with `-qa`.
pub const MANIFEST: &str = r#"
landscape:
  name: Test landscape
  systems:
    - { id: dev, name: Development, host: dev.example.com, login: DEV_LOGIN, password: DEV_PASSWORD }
    - { id: qa, name: Quality, host: qa.example.com, login: QA_LOGIN, password: QA_PASSWORD }
  packages:
    - id: Orders
      artifacts:
        - id: OrderFlow
          template: Tmpl
          configurations:
            - environment: qa
              parameters:
                - { key: endpoint, value: "https://x" }
                - { key: retries, value: 5, type: "xsd:integer" }
        - id: B
          template: Tmpl
        - id: Standalone
  environments:
    - { id: dev, name: Development, suffix: "", system: dev }
    - { id: qa, name: Quality, suffix: "-qa", system: qa }
  originalEnvironment: dev
"#;

/// Answers every credential with `<variable>-value`.
pub struct StaticCredentials;

impl CredentialResolver for StaticCredentials {
    fn resolve(
        &self,
        _system_name: &str,
        _kind: CredentialKind,
        variable: &str,
    ) -> Result<String, LandscapeError> {
        Ok(format!("{variable}-value"))
    }
}

/// Builds the test landscape with `dev` and `qa` mocks wired to their systems.
pub fn landscape(
    dev: MockIntegrationClient,
    qa: MockIntegrationClient,
) -> Landscape<MockIntegrationClient> {
    let manifest = parse_manifest(MANIFEST).expect("test manifest parses");
    let mut clients = HashMap::from([("dev".to_string(), dev), ("qa".to_string(), qa)]);
    Landscape::build(manifest, &StaticCredentials, |system, _| {
        Ok(clients
            .remove(&system.id)
            .expect("one mock per system"))
    })
    .expect("test landscape builds")
}

pub fn artifact(id: &str, version: &str, package_id: &str) -> DesigntimeArtifact {
    DesigntimeArtifact {
        id: id.to_string(),
        version: version.to_string(),
        package_id: package_id.to_string(),
        name: format!("{id} flow"),
        description: format!("{id} description"),
        ..DesigntimeArtifact::default()
    }
}

pub fn with_configurations(
    mut artifact: DesigntimeArtifact,
    configurations: &[(&str, &str, &str)],
) -> DesigntimeArtifact {
    artifact.configurations = configurations
        .iter()
        .map(|(k, v, t)| Configuration::new(*k, *v, *t))
        .collect();
    artifact
}

pub fn package(id: &str) -> Package {
    Package {
        id: id.to_string(),
        name: "Orders".to_string(),
        description: "Order processing".to_string(),
        short_text: "Orders".to_string(),
        version: "1.0.0".to_string(),
        vendor: "ACME".to_string(),
        keywords: "orders,sales".to_string(),
        ..Package::default()
    }
}
