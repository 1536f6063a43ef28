//! Document events and attribute lists seen by the validator

use crate::core::QName;

/// One attribute of a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QName,
    /// Value after attribute-value normalization
    pub value: String,
    /// Value as written, before entity expansion and normalization
    pub non_normalized_value: String,
    /// Declared type name, attached during validation
    pub type_name: String,
    /// False for attributes synthesized from a DTD default
    pub specified: bool,
}

impl XmlAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        XmlAttribute {
            name: QName::new(name),
            value: value.to_string(),
            non_normalized_value: value.to_string(),
            type_name: "CDATA".to_string(),
            specified: true,
        }
    }
}

/// Ordered attribute list of one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<XmlAttribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Attributes {
            items: pairs.into_iter().map(|(n, v)| XmlAttribute::new(n, v)).collect(),
        }
    }

    pub fn push(&mut self, attribute: XmlAttribute) {
        self.items.push(attribute);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, raw_name: &str) -> Option<usize> {
        self.items.iter().position(|a| a.name.raw == raw_name)
    }

    pub fn get(&self, raw_name: &str) -> Option<&XmlAttribute> {
        self.items.iter().find(|a| a.name.raw == raw_name)
    }

    pub fn value(&self, raw_name: &str) -> Option<&str> {
        self.get(raw_name).map(|a| a.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, XmlAttribute> {
        self.items.iter()
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> Option<&mut XmlAttribute> {
        self.items.get_mut(index)
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a XmlAttribute;
    type IntoIter = std::slice::Iter<'a, XmlAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A document event in the order a parser produces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    XmlDecl { standalone: Option<bool> },
    DoctypeDecl { root: String, public_id: Option<String>, system_id: Option<String> },
    StartElement { name: QName, attributes: Attributes },
    EmptyElement { name: QName, attributes: Attributes },
    EndElement { name: QName },
    Characters(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    StartEntity { name: String },
    EndEntity { name: String },
}

impl DocumentEvent {
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        DocumentEvent::StartElement {
            name: QName::new(name),
            attributes: Attributes::from_pairs(attributes.iter().copied()),
        }
    }

    pub fn empty(name: &str, attributes: &[(&str, &str)]) -> Self {
        DocumentEvent::EmptyElement {
            name: QName::new(name),
            attributes: Attributes::from_pairs(attributes.iter().copied()),
        }
    }

    pub fn end(name: &str) -> Self {
        DocumentEvent::EndElement { name: QName::new(name) }
    }

    pub fn text(text: &str) -> Self {
        DocumentEvent::Characters(text.to_string())
    }
}
