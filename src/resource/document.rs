//! Outgoing request documents
//!
//! An immutable element tree assembled with consuming builder methods and
//! serialized to the XML the Redmine API accepts on POST and PUT.

use std::fmt::Write as _;

/// Element content: nothing, a text node, or child elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Empty,
    Text(String),
    Children(Vec<Element>),
}

/// One XML element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    content: Content,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Content::Empty,
        }
    }

    /// Element with a single text node
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Replace the content with a text node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    /// Append a child element. Any text content is discarded.
    pub fn with_child(mut self, child: Element) -> Self {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            _ => self.content = Content::Children(vec![child]),
        }
        self
    }

    pub fn with_children(self, children: impl IntoIterator<Item = Element>) -> Self {
        children.into_iter().fold(self, Element::with_child)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            _ => &[],
        }
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().iter().find(|c| c.name == name)
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value));
        }

        match &self.content {
            Content::Empty => out.push_str("/>"),
            Content::Text(text) => {
                let _ = write!(out, ">{}</{}>", escape(text), self.name);
            }
            Content::Children(children) => {
                out.push('>');
                for child in children {
                    child.write_xml(out);
                }
                let _ = write!(out, "</{}>", self.name);
            }
        }
    }
}

/// A complete request document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Serialize with an XML prolog
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\"?>\n");
        self.root.write_xml(&mut out);
        out.push('\n');
        out
    }
}

/// Whether `name` can be used as an element name. Namespace prefixes are
/// not accepted.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Characters XML 1.0 does not allow in a document at all
fn is_forbidden(c: char) -> bool {
    (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r'))
        || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Escape markup characters. `\r` becomes a character reference, otherwise
/// XML end-of-line handling on the server folds CRLF into LF. Characters XML
/// cannot carry are dropped.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().filter(|&c| !is_forbidden(c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements() {
        let doc = Document::new(
            Element::new("project")
                .with_child(Element::text_node("name", "Demo"))
                .with_child(
                    Element::new("tracker_ids")
                        .with_attribute("type", "array")
                        .with_children([
                            Element::text_node("tracker", "3"),
                            Element::text_node("tracker", "7"),
                        ]),
                ),
        );

        assert_eq!(
            doc.to_xml(),
            "<?xml version=\"1.0\"?>\n<project><name>Demo</name>\
             <tracker_ids type=\"array\"><tracker>3</tracker><tracker>7</tracker></tracker_ids>\
             </project>\n"
        );
    }

    #[test]
    fn empty_root_is_self_closing() {
        let doc = Document::new(Element::new("custom_field"));
        assert_eq!(doc.to_xml(), "<?xml version=\"1.0\"?>\n<custom_field/>\n");
    }

    #[test]
    fn escapes_markup_and_carriage_returns() {
        let doc = Document::new(
            Element::new("custom_field")
                .with_child(Element::text_node("possible_values", "<a> & 'b'\r\n\"c\"")),
        );
        assert!(doc.to_xml().contains(
            "<possible_values>&lt;a&gt; &amp; &apos;b&apos;&#13;\n&quot;c&quot;</possible_values>"
        ));
    }

    #[test]
    fn drops_characters_xml_cannot_carry() {
        let doc = Document::new(Element::new("project").with_child(Element::text_node(
            "description",
            "bell\u{1}\tok\u{1b}\n",
        )));
        assert!(doc.to_xml().contains("<description>bell\tok\n</description>"));
    }

    #[test]
    fn xml_names() {
        assert!(is_xml_name("name"));
        assert!(is_xml_name("_private"));
        assert!(is_xml_name("issue_custom_field_ids"));
        assert!(is_xml_name("cf-1.value"));
        assert!(!is_xml_name(""));
        assert!(!is_xml_name("1st"));
        assert!(!is_xml_name("-lead"));
        assert!(!is_xml_name("has space"));
        assert!(!is_xml_name("a><b"));
        assert!(!is_xml_name("ns:name"));
    }

    #[test]
    fn child_after_text_replaces_text() {
        let el = Element::text_node("a", "x").with_child(Element::new("b"));
        assert_eq!(el.text(), None);
        assert_eq!(el.children().len(), 1);
    }

    #[test]
    fn lookup_helpers() {
        let el = Element::new("tracker_ids")
            .with_attribute("type", "array")
            .with_child(Element::text_node("tracker", "1"));
        assert_eq!(el.attribute("type"), Some("array"));
        assert_eq!(el.attribute("missing"), None);
        assert_eq!(el.child("tracker").and_then(Element::text), Some("1"));
    }
}
