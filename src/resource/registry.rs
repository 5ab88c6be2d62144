//! Resource Registry - Load resource definitions from JSON
//!
//! Endpoint layout and field schemas for every Redmine resource type are
//! embedded from `src/resources/*.json` and looked up by key.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/projects.json"),
    include_str!("../resources/custom_fields.json"),
];

/// How a field's value is laid out in the request document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Single element with the value as text
    #[default]
    Scalar,
    /// Container marked `type="array"` holding one `element` child per id
    IdList { element: String },
    /// Single element whose text is the entries joined by `separator`
    Delimited { separator: String },
}

/// Field definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub kind: ValueKind,
    /// Create is refused before any request when this field is missing
    #[serde(default)]
    pub required_on_create: bool,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Collection path without format suffix, e.g. `/projects`
    pub collection_path: String,
    /// Key holding the record array in listing responses
    pub collection_key: String,
    /// Root element of request documents
    pub root_element: String,
    /// Associations requested when showing a single record
    #[serde(default)]
    pub show_include: Vec<String>,
    /// Update documents repeat the record id as their first field
    #[serde(default)]
    pub update_sends_id: bool,
    /// Fields that lead every write document, in this order, when set
    #[serde(default)]
    pub defaults: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

impl ResourceDef {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Value kind for `name`; undeclared fields are scalars
    pub fn kind_of(&self, name: &str) -> &ValueKind {
        const SCALAR: &ValueKind = &ValueKind::Scalar;
        self.field(name).map(|f| &f.kind).unwrap_or(SCALAR)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required_on_create)
            .map(|f| f.name.as_str())
    }

    /// Listing endpoint, e.g. `/projects.json`
    pub fn listing_path(&self) -> String {
        format!("{}.json", self.collection_path)
    }

    /// Member endpoint with the given format suffix. The id is URL-encoded.
    pub fn member_path(&self, id: &str, format: &str) -> String {
        format!(
            "{}/{}.{}",
            self.collection_path,
            urlencoding::encode(id),
            format
        )
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Definition of a resource the crate ships with. An unknown key means the
/// embedded JSON and the code disagree, which is a build defect.
pub fn resource_def(key: &str) -> &'static ResourceDef {
    get_resource(key).unwrap_or_else(|| panic!("Resource `{}` missing from embedded registry", key))
}

/// Get all resource keys
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
