//! Tabular rendering of command results. Everything here returns strings; printing
//! happens in [`crate::cli`].

use tabled::builder::Builder;
use tabled::{Table, Tabled};

use landscaper_core::model::{Configuration, DesigntimeArtifact, Package};
use landscaper_core::operations::ArtifactStatus;
use landscaper_core::RunReport;

#[derive(Debug, Tabled)]
struct PackageRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "PackageId")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
}

#[derive(Debug, Tabled)]
struct ArtifactRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ArtifactId")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Package")]
    package_id: String,
    #[tabled(rename = "Deploy Status")]
    status: String,
    #[tabled(rename = "Deployed Version")]
    deployed_version: String,
}

#[derive(Debug, Tabled)]
struct ArtifactListRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ArtifactId")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Debug, Tabled)]
struct ConfigurationRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Type")]
    data_type: String,
}

fn fields(rows: &[(&str, &str)]) -> String {
    let mut builder = Builder::default();
    builder.set_header(["Field", "Value"]);
    for (field, value) in rows {
        builder.push_record([*field, *value]);
    }
    builder.build().to_string()
}

/// Renders a move or upgrade report. `changed_header` names the boolean column,
/// e.g. `Transferred to qa` or `Upgraded`.
pub fn report_table(report: &RunReport, changed_header: &str) -> String {
    let mut builder = Builder::default();
    builder.set_header(["#", "ArtifactId", "Version", "Package", changed_header, "Deployed"]);
    for line in &report.lines {
        builder.push_record([
            line.ordinal.to_string(),
            line.artifact_id.clone(),
            line.version.clone(),
            line.package_id.clone(),
            line.changed.to_string(),
            line.deployed.to_string(),
        ]);
    }
    builder.build().to_string()
}

pub fn packages_table(packages: &[Package]) -> String {
    let rows = packages.iter().enumerate().map(|(i, p)| PackageRow {
        index: i + 1,
        id: p.id.clone(),
        name: p.name.clone(),
        version: p.version.clone(),
    });
    Table::new(rows).to_string()
}

pub fn artifacts_table(statuses: &[ArtifactStatus]) -> String {
    let rows = statuses.iter().enumerate().map(|(i, s)| ArtifactRow {
        index: i + 1,
        id: s.artifact.id.clone(),
        version: s.artifact.version.clone(),
        package_id: s.artifact.package_id.clone(),
        status: s.runtime_status.clone(),
        deployed_version: s.deployed_version.clone(),
    });
    Table::new(rows).to_string()
}

/// Artifacts without runtime state, as listed after a package copy.
pub fn artifact_list_table(artifacts: &[DesigntimeArtifact]) -> String {
    let rows = artifacts.iter().enumerate().map(|(i, a)| ArtifactListRow {
        index: i + 1,
        id: a.id.clone(),
        version: a.version.clone(),
        name: a.name.clone(),
    });
    Table::new(rows).to_string()
}

pub fn artifact_details(artifact: &DesigntimeArtifact) -> String {
    fields(&[
        ("ID", artifact.id.as_str()),
        ("Name", artifact.name.as_str()),
        ("Version", artifact.version.as_str()),
        ("Package", artifact.package_id.as_str()),
        ("Sender", artifact.sender.as_str()),
        ("Receiver", artifact.receiver.as_str()),
    ])
}

pub fn package_details(package: &Package) -> String {
    fields(&[
        ("ID", package.id.as_str()),
        ("Name", package.name.as_str()),
        ("Version", package.version.as_str()),
        ("ShortText", package.short_text.as_str()),
    ])
}

pub fn configuration_table(configurations: &[Configuration]) -> String {
    let rows = configurations.iter().map(|c| ConfigurationRow {
        key: c.key.clone(),
        value: c.value.clone(),
        data_type: c.data_type.clone(),
    });
    Table::new(rows).to_string()
}
