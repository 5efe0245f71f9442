//! Wire shapes of the tenant's OData v2 API and their conversion into [`crate::model`].
//!
//! List endpoints answer `{ "d": { "results": [...] } }`, single-entity endpoints
//! answer `{ "d": { ... } }`. The single design-time artifact read only offers an
//! Atom XML entry, decoded by [`decode_artifact_entry`]. All of them normalize
//! into the same domain records.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;
use crate::model::{Configuration, DesigntimeArtifact, Package, RuntimeArtifact};

#[derive(Debug, Deserialize)]
pub(crate) struct ODataList<T> {
    pub d: ODataResults<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataResults<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataEntity<T> {
    pub d: T,
}

/// OData emits `null` for unset string and boolean properties.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PackageRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub short_text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub vendor: String,
    #[serde(default, deserialize_with = "nullable")]
    pub partner_content: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub update_available: bool,
    #[serde(default, deserialize_with = "nullable", skip_serializing)]
    pub mode: String,
    #[serde(default, deserialize_with = "nullable")]
    pub supported_platform: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing)]
    pub modified_by: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing)]
    pub creation_date: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing)]
    pub modified_date: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing)]
    pub created_by: String,
    #[serde(default, deserialize_with = "nullable")]
    pub products: String,
    #[serde(default, deserialize_with = "nullable")]
    pub keywords: String,
    #[serde(default, deserialize_with = "nullable")]
    pub countries: String,
    #[serde(default, deserialize_with = "nullable")]
    pub industries: String,
    #[serde(default, deserialize_with = "nullable")]
    pub line_of_business: String,
}

impl From<PackageRecord> for Package {
    fn from(r: PackageRecord) -> Self {
        Package {
            id: r.id,
            name: r.name,
            description: r.description,
            short_text: r.short_text,
            version: r.version,
            vendor: r.vendor,
            partner_content: r.partner_content,
            update_available: r.update_available,
            mode: r.mode,
            supported_platform: r.supported_platform,
            modified_by: r.modified_by,
            creation_date: r.creation_date,
            modified_date: r.modified_date,
            created_by: r.created_by,
            products: r.products,
            keywords: r.keywords,
            countries: r.countries,
            industries: r.industries,
            line_of_business: r.line_of_business,
        }
    }
}

impl From<&Package> for PackageRecord {
    fn from(p: &Package) -> Self {
        PackageRecord {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            short_text: p.short_text.clone(),
            version: p.version.clone(),
            vendor: p.vendor.clone(),
            partner_content: p.partner_content,
            update_available: p.update_available,
            supported_platform: p.supported_platform.clone(),
            products: p.products.clone(),
            keywords: p.keywords.clone(),
            countries: p.countries.clone(),
            industries: p.industries.clone(),
            line_of_business: p.line_of_business.clone(),
            ..PackageRecord::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ArtifactRecord {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub package_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sender: String,
    #[serde(default, deserialize_with = "nullable")]
    pub receiver: String,
}

impl From<ArtifactRecord> for DesigntimeArtifact {
    fn from(r: ArtifactRecord) -> Self {
        DesigntimeArtifact {
            id: r.id,
            version: r.version,
            package_id: r.package_id,
            name: r.name,
            description: r.description,
            sender: r.sender,
            receiver: r.receiver,
            content: String::new(),
            configurations: Vec::new(),
        }
    }
}

/// Body of an artifact upload. Version, sender and receiver come from the archive itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ArtifactUpload<'a> {
    pub id: &'a str,
    pub package_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub artifact_content: &'a str,
}

impl<'a> From<&'a DesigntimeArtifact> for ArtifactUpload<'a> {
    fn from(a: &'a DesigntimeArtifact) -> Self {
        ArtifactUpload {
            id: &a.id,
            package_id: &a.package_id,
            name: &a.name,
            description: &a.description,
            artifact_content: &a.content,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ConfigurationRecord {
    pub parameter_key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub parameter_value: String,
    #[serde(default, deserialize_with = "nullable")]
    pub data_type: String,
}

impl From<ConfigurationRecord> for Configuration {
    fn from(r: ConfigurationRecord) -> Self {
        Configuration {
            key: r.parameter_key,
            value: r.parameter_value,
            data_type: r.data_type,
        }
    }
}

impl From<&Configuration> for ConfigurationRecord {
    fn from(c: &Configuration) -> Self {
        ConfigurationRecord {
            parameter_key: c.key.clone(),
            parameter_value: c.value.clone(),
            data_type: c.data_type.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RuntimeRecord {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub r#type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub deployed_by: String,
    #[serde(default, deserialize_with = "nullable")]
    pub deployed_on: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
}

impl From<RuntimeRecord> for RuntimeArtifact {
    fn from(r: RuntimeRecord) -> Self {
        RuntimeArtifact {
            id: r.id,
            version: r.version,
            name: r.name,
            kind: r.r#type,
            deployed_by: r.deployed_by,
            deployed_on: r.deployed_on,
            status: r.status,
        }
    }
}

pub(crate) fn decode_json<'a, T: Deserialize<'a>>(
    what: &str,
    bytes: &'a [u8],
) -> Result<T, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::decode(what, e))
}

/// Decodes an Atom `<entry>` describing one design-time artifact.
///
/// Property elements are matched by local name, so `d:Id` and `Id` are equivalent.
/// Property text is kept verbatim, surrounding whitespace included.
pub(crate) fn decode_artifact_entry(xml: &str) -> Result<DesigntimeArtifact, ClientError> {
    const WHAT: &str = "design-time artifact entry";

    let mut reader = Reader::from_str(xml);

    let mut in_properties = false;
    let mut seen_properties = false;
    let mut current: Option<String> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "properties" {
                    in_properties = true;
                    seen_properties = true;
                } else if in_properties {
                    fields.entry(name.clone()).or_default();
                    current = Some(name);
                }
            }
            Ok(Event::Empty(e)) => {
                if in_properties {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    fields.entry(name).or_default();
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(name) = &current {
                    let text = t.unescape().map_err(|e| ClientError::decode(WHAT, e))?;
                    fields.entry(name.clone()).or_default().push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(name) = &current {
                    fields
                        .entry(name.clone())
                        .or_default()
                        .push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "properties" {
                    in_properties = false;
                } else if current.as_deref() == Some(name.as_str()) {
                    current = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ClientError::decode(WHAT, e)),
            _ => {}
        }
    }

    if !seen_properties {
        return Err(ClientError::decode(WHAT, "no properties element in response"));
    }

    let mut take = |key: &str| fields.remove(key).unwrap_or_default();
    let id = take("Id");
    if id.is_empty() {
        return Err(ClientError::decode(WHAT, "entry has no Id"));
    }

    Ok(DesigntimeArtifact {
        id,
        version: take("Version"),
        package_id: take("PackageId"),
        name: take("Name"),
        description: take("Description"),
        sender: take("Sender"),
        receiver: take("Receiver"),
        content: String::new(),
        configurations: Vec::new(),
    })
}
