//! Request payloads
//!
//! [`Params`] is the ordered field map callers hand to create/update, and
//! [`PayloadBuilder`] turns it into a [`Document`] following the resource's
//! field schema.

use super::document::{is_xml_name, Document, Element};
use super::registry::{ResourceDef, ValueKind};
use crate::error::ValidationError;

/// Value of one outgoing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Null, empty text and empty lists never reach the document
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(t) => t.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: ToString> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString, const N: usize> From<[T; N]> for FieldValue {
    fn from(values: [T; N]) -> Self {
        FieldValue::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Ordered field map
///
/// Setting an existing name replaces its value in place, so the position of
/// a default survives an override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    fields: Vec<(String, FieldValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Params::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// True when `name` is present with a non-blank value
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_blank())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Lay `self` over `defaults`: defaults keep their order, overrides
    /// replace in place, new names are appended in caller order
    pub fn merged_over(self, defaults: Params) -> Params {
        let mut merged = defaults;
        for (name, value) in self.fields {
            merged.set(name, value);
        }
        merged
    }

    /// Drop blank fields
    pub fn without_blanks(self) -> Params {
        Params {
            fields: self
                .fields
                .into_iter()
                .filter(|(_, v)| !v.is_blank())
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// Builds request documents for one resource type
#[derive(Debug, Clone, Copy)]
pub struct PayloadBuilder<'a> {
    def: &'a ResourceDef,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(def: &'a ResourceDef) -> Self {
        Self { def }
    }

    /// Null-valued defaults for the resource's leading fields
    pub fn defaults(&self) -> Params {
        self.def
            .defaults
            .iter()
            .map(|name| (name.clone(), FieldValue::Null))
            .collect()
    }

    /// Build the document for `fields`, refusing names that are not XML names
    pub fn build(&self, fields: &Params) -> Result<Document, ValidationError> {
        let mut root = Element::new(&self.def.root_element);
        for (name, value) in fields.iter().filter(|(_, value)| !value.is_blank()) {
            if !is_xml_name(name) {
                return Err(ValidationError::InvalidFieldName {
                    resource: self.def.root_element.clone(),
                    name: name.to_string(),
                });
            }
            root = root.with_child(self.element_for(name, value));
        }

        Ok(Document::new(root))
    }

    fn element_for(&self, name: &str, value: &FieldValue) -> Element {
        match (self.def.kind_of(name), value) {
            (ValueKind::IdList { element }, FieldValue::List(ids)) => Element::new(name)
                .with_attribute("type", "array")
                .with_children(ids.iter().map(|id| Element::text_node(element, id))),
            (ValueKind::Delimited { separator }, FieldValue::List(items)) => {
                Element::text_node(name, items.join(separator.as_str()))
            }
            (_, FieldValue::List(items)) => Element::text_node(name, items.join(",")),
            (_, FieldValue::Text(text)) => Element::text_node(name, text),
            (_, FieldValue::Null) => Element::new(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::document::Content;
    use crate::resource::registry::get_resource;

    fn projects() -> PayloadBuilder<'static> {
        PayloadBuilder::new(get_resource("projects").unwrap())
    }

    fn custom_fields() -> PayloadBuilder<'static> {
        PayloadBuilder::new(get_resource("custom_fields").unwrap())
    }

    #[test]
    fn array_field_becomes_typed_container() {
        let doc = projects().build(&Params::new().with("tracker_ids", vec![3u64, 7])).unwrap();

        let container = doc.root().child("tracker_ids").unwrap();
        assert_eq!(container.attribute("type"), Some("array"));
        let children: Vec<_> = container
            .children()
            .iter()
            .map(|c| (c.name(), c.text().unwrap()))
            .collect();
        assert_eq!(children, vec![("tracker", "3"), ("tracker", "7")]);
    }

    #[test]
    fn issue_custom_field_ids_use_their_own_element_name() {
        let doc = projects()
            .build(&Params::new().with("issue_custom_field_ids", [12]))
            .unwrap();
        let container = doc.root().child("issue_custom_field_ids").unwrap();
        assert_eq!(container.children()[0].name(), "issue_custom_field");
    }

    #[test]
    fn possible_values_are_crlf_joined_text() {
        let doc = custom_fields()
            .build(&Params::new().with("possible_values", ["a", "b"]))
            .unwrap();

        let el = doc.root().child("possible_values").unwrap();
        assert_eq!(el.content(), &Content::Text("a\r\nb".into()));
        assert!(el.attribute("type").is_none());
    }

    #[test]
    fn unset_defaults_are_omitted() {
        let builder = projects();
        let params = Params::new()
            .with("name", "Demo")
            .merged_over(builder.defaults())
            .without_blanks();
        let doc = builder.build(&params).unwrap();

        assert_eq!(doc.root().name(), "project");
        let names: Vec<_> = doc.root().children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["name"]);
    }

    #[test]
    fn build_skips_blank_values_even_without_filtering() {
        let doc = projects()
            .build(
                &Params::new()
                    .with("name", "Demo")
                    .with("description", FieldValue::Null)
                    .with("homepage", "")
                    .with("tracker_ids", Vec::<u64>::new()),
            )
            .unwrap();
        assert_eq!(doc.root().children().len(), 1);
    }

    #[test]
    fn fields_keep_insertion_order() {
        let doc = projects()
            .build(
                &Params::new()
                    .with("identifier", "demo")
                    .with("tracker_ids", [1])
                    .with("name", "Demo"),
            )
            .unwrap();
        let names: Vec<_> = doc.root().children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["identifier", "tracker_ids", "name"]);
    }

    #[test]
    fn undeclared_fields_are_scalars() {
        let doc = projects().build(&Params::new().with("status", 1u64)).unwrap();
        assert_eq!(doc.root().child("status").unwrap().text(), Some("1"));
    }

    #[test]
    fn scalar_given_for_array_field_stays_scalar() {
        let doc = projects().build(&Params::new().with("tracker_ids", "3")).unwrap();
        let el = doc.root().child("tracker_ids").unwrap();
        assert_eq!(el.text(), Some("3"));
        assert!(el.attribute("type").is_none());
    }

    #[test]
    fn merge_keeps_default_positions() {
        let defaults = Params::new()
            .with("id", "demo")
            .with("name", FieldValue::Null)
            .with("identifier", FieldValue::Null);
        let merged = Params::new()
            .with("tracker_ids", [1])
            .with("name", "Renamed")
            .merged_over(defaults);

        let names: Vec<_> = merged.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name", "identifier", "tracker_ids"]);
        assert_eq!(merged.get("name"), Some(&FieldValue::from("Renamed")));
    }

    #[test]
    fn defaults_lead_and_other_fields_keep_caller_order() {
        let builder = projects();
        let params = Params::new()
            .with("is_public", false)
            .with("homepage", "https://example.org")
            .with("identifier", "demo")
            .with("name", "Demo")
            .merged_over(builder.defaults())
            .without_blanks();

        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "identifier", "is_public", "homepage"]);
    }

    #[test]
    fn markup_in_field_name_is_refused() {
        let err = projects()
            .build(
                &Params::new()
                    .with("name", "Demo")
                    .with("a><is_public>1</is_public><b", "x"),
            )
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidFieldName {
                resource: "project".into(),
                name: "a><is_public>1</is_public><b".into(),
            }
        );
    }

    #[test]
    fn field_name_with_space_is_refused() {
        let err = projects()
            .build(&Params::new().with("has space", "y"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFieldName { name, .. } if name == "has space"));
    }

    #[test]
    fn blank_field_with_bad_name_is_skipped() {
        let doc = projects()
            .build(&Params::new().with("name", "Demo").with("bad name", FieldValue::Null))
            .unwrap();
        assert_eq!(doc.root().children().len(), 1);
    }

    #[test]
    fn option_and_bool_conversions() {
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("x")), FieldValue::Text("x".into()));
        assert_eq!(FieldValue::from(false), FieldValue::Text("false".into()));
        assert!(!FieldValue::from(false).is_blank());
    }

    #[test]
    fn serialized_custom_field_payload() {
        let xml = custom_fields()
            .build(&Params::new().with("name", "Severity").with("possible_values", ["low", "high"]))
            .unwrap()
            .to_xml();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?>\n<custom_field><name>Severity</name>\
             <possible_values>low&#13;\nhigh</possible_values></custom_field>\n"
        );
    }
}
