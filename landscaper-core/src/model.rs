//! Domain records exchanged with an integration tenant.
//!
//! These are plain values: the remote tenant is the single source of truth, so
//! every record here is fetched fresh per operation and never cached. Wire
//! shapes (OData JSON, Atom XML) live in [`crate::odata`] and convert into
//! these types.

/// Version selector for "whatever the tenant currently holds". An artifact
/// whose *reported* version equals this label is an unsaved draft.
pub const ACTIVE_VERSION: &str = "Active";

/// Data type assumed for manifest parameters that do not declare one.
pub const DEFAULT_PARAMETER_TYPE: &str = "xsd:string";

/// Returns true when a version label is the draft sentinel rather than a saved version.
pub fn is_draft_version(version: &str) -> bool {
    version == ACTIVE_VERSION
}

/// An integration package as exposed by the design-time API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub description: String,
    pub short_text: String,
    pub version: String,
    pub vendor: String,
    pub partner_content: bool,
    pub update_available: bool,
    pub mode: String,
    pub supported_platform: String,
    pub modified_by: String,
    pub creation_date: String,
    pub modified_date: String,
    pub created_by: String,
    pub products: String,
    pub keywords: String,
    pub countries: String,
    pub industries: String,
    pub line_of_business: String,
}

/// One configuration parameter of a design-time artifact.
///
/// `data_type` is an opaque tag (`xsd:string`, `xsd:boolean`, `custom:schedule`, ...)
/// which the tenant requires on update. It must be carried over from an existing
/// configuration, never derived from the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub key: String,
    pub value: String,
    pub data_type: String,
}

impl Configuration {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            data_type: data_type.into(),
        }
    }
}

/// Editable, versioned definition of an integration flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesigntimeArtifact {
    pub id: String,
    pub version: String,
    pub package_id: String,
    pub name: String,
    pub description: String,
    pub sender: String,
    pub receiver: String,
    /// Base64 encoded artifact archive. Empty unless the artifact was downloaded.
    pub content: String,
    pub configurations: Vec<Configuration>,
}

impl DesigntimeArtifact {
    pub fn is_draft(&self) -> bool {
        is_draft_version(&self.version)
    }

    /// Looks up a configuration entry by parameter key.
    pub fn configuration(&self, key: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.key == key)
    }
}

/// Deployed instance of a design-time artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArtifact {
    pub id: String,
    pub version: String,
    pub name: String,
    pub kind: String,
    pub deployed_by: String,
    pub deployed_on: String,
    pub status: String,
}
