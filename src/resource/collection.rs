//! Fetched collections and the name/id index derived from them

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Server-side record identifier
pub type ResourceId = u64;

/// One record as returned by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    fields: Map<String, Value>,
}

impl ResourceRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Numeric id; numeric strings are accepted too
    pub fn id(&self) -> Option<ResourceId> {
        match self.fields.get("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// All records of one resource type, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
    pub records: Vec<ResourceRecord>,
    /// `total_count` reported with the last page, if any
    pub total_count: Option<u64>,
}

impl ResourceCollection {
    pub fn new(records: Vec<ResourceRecord>, total_count: Option<u64>) -> Self {
        Self {
            records,
            total_count,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceRecord> {
        self.records.iter()
    }
}

/// Direction of a [`Listing`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexBy {
    #[default]
    NameToId,
    IdToName,
}

/// Listing handed back to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    ByName(HashMap<String, ResourceId>),
    ById(BTreeMap<ResourceId, String>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::ByName(map) => map.len(),
            Listing::ById(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Name and id lookups over a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    by_name: HashMap<String, ResourceId>,
    by_id: BTreeMap<ResourceId, String>,
}

impl NameIndex {
    /// Records without a usable id or name are left out. A repeated name
    /// points at the last record carrying it.
    pub fn build(collection: &ResourceCollection) -> Self {
        let mut index = Self::default();
        for record in collection.iter() {
            let (Some(id), Some(name)) = (record.id(), record.name()) else {
                tracing::trace!("skipping record without id/name: {:?}", record.fields());
                continue;
            };
            index.by_name.insert(name.to_string(), id);
            index.by_id.insert(id, name.to_string());
        }
        index
    }

    pub fn id_of(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: ResourceId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn to_listing(&self, index_by: IndexBy) -> Listing {
        match index_by {
            IndexBy::NameToId => Listing::ByName(self.by_name.clone()),
            IndexBy::IdToName => Listing::ById(self.by_id.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) fn record(value: Value) -> ResourceRecord {
    match value {
        Value::Object(fields) => ResourceRecord::new(fields),
        other => panic!("not an object: {other}"),
    }
}
