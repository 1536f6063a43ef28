//! Declaration records held by the grammar store
//!
//! Every record is addressed by a plain `usize` handle into its table.

use std::borrow::Cow;
use std::sync::OnceLock;

use crate::core::QName;
use crate::error::DtdError;
use crate::model::ContentMatcher;

pub type ElementIndex = usize;
pub type AttributeIndex = usize;
pub type ContentSpecIndex = usize;
pub type EntityIndex = usize;
pub type NotationIndex = usize;

/// Declared content type of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Empty,
    Any,
    Mixed,
    Children,
}

/// An element declaration, created on first reference
#[derive(Debug, Clone, Default)]
pub struct ElementDecl {
    pub name: QName,
    /// `None` until the `<!ELEMENT>` declaration arrives
    pub content_type: Option<ContentType>,
    pub content_spec: Option<ContentSpecIndex>,
    pub first_attribute: Option<AttributeIndex>,
    pub last_attribute: Option<AttributeIndex>,
    /// Declared in the external subset or inside a parameter entity
    pub is_external: bool,
    /// Compiled on first use, then shared by every validation
    pub(crate) matcher: OnceLock<Option<ContentMatcher>>,
}

impl ElementDecl {
    pub fn new(name: QName) -> Self {
        ElementDecl { name, ..Default::default() }
    }

    pub fn is_declared(&self) -> bool {
        self.content_type.is_some()
    }
}

/// Attribute value kinds; the `*S` plurals are the same kind with `list` set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    CData,
    Id,
    IdRef,
    Entity,
    NmToken,
    Notation,
    Enumeration,
}

/// Default declaration of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DefaultType {
    /// A plain default value with no keyword
    #[default]
    Default,
    Fixed,
    Implied,
    Required,
}

impl DefaultType {
    pub fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            Some("#FIXED") => DefaultType::Fixed,
            Some("#IMPLIED") => DefaultType::Implied,
            Some("#REQUIRED") => DefaultType::Required,
            _ => DefaultType::Default,
        }
    }
}

/// Type and default of a declared attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    pub kind: AttributeKind,
    pub list: bool,
    pub default_type: DefaultType,
    /// Default after attribute-value normalization
    pub default_value: Option<String>,
    /// Default exactly as declared
    pub non_normalized_default: Option<String>,
    /// Allowed tokens for ENUMERATION and NOTATION
    pub enumeration: Vec<String>,
}

impl SimpleType {
    /// Parse an attribute type keyword (`CDATA`, `IDREFS`, `NOTATION`, `ENUMERATION`, ...)
    pub fn from_keyword(type_name: &str) -> Result<(AttributeKind, bool), DtdError> {
        let parsed = match type_name {
            "CDATA" => (AttributeKind::CData, false),
            "ID" => (AttributeKind::Id, false),
            "IDREF" => (AttributeKind::IdRef, false),
            "IDREFS" => (AttributeKind::IdRef, true),
            "ENTITY" => (AttributeKind::Entity, false),
            "ENTITIES" => (AttributeKind::Entity, true),
            "NMTOKEN" => (AttributeKind::NmToken, false),
            "NMTOKENS" => (AttributeKind::NmToken, true),
            t if t.starts_with("NOTATION") => (AttributeKind::Notation, false),
            t if t.starts_with("ENUMERATION") => (AttributeKind::Enumeration, false),
            other => {
                return Err(DtdError::UnknownAttributeType { type_name: other.to_string() });
            }
        };
        Ok(parsed)
    }

    /// Type name attached to attributes in the validated document
    pub fn type_name(&self) -> Cow<'static, str> {
        match (self.kind, self.list) {
            (AttributeKind::CData, _) => Cow::Borrowed("CDATA"),
            (AttributeKind::Id, _) => Cow::Borrowed("ID"),
            (AttributeKind::IdRef, false) => Cow::Borrowed("IDREF"),
            (AttributeKind::IdRef, true) => Cow::Borrowed("IDREFS"),
            (AttributeKind::Entity, false) => Cow::Borrowed("ENTITY"),
            (AttributeKind::Entity, true) => Cow::Borrowed("ENTITIES"),
            (AttributeKind::NmToken, false) => Cow::Borrowed("NMTOKEN"),
            (AttributeKind::NmToken, true) => Cow::Borrowed("NMTOKENS"),
            (AttributeKind::Notation, _) => Cow::Borrowed("NOTATION"),
            (AttributeKind::Enumeration, _) => Cow::Owned(self.enumeration_string()),
        }
    }

    /// `(a|b|c)` form of the enumeration
    pub fn enumeration_string(&self) -> String {
        format!("({})", self.enumeration.join("|"))
    }
}

/// An attribute declaration, linked into its element's chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: QName,
    pub simple_type: SimpleType,
    pub next: Option<AttributeIndex>,
    pub is_external: bool,
}

/// An entity declaration. Parameter entity names keep their `%` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityDecl {
    pub name: String,
    pub is_parameter: bool,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub base_system_id: Option<String>,
    /// NDATA notation, set only for unparsed entities
    pub notation: Option<String>,
    /// Replacement text of an internal entity
    pub value: Option<String>,
    pub is_external: bool,
}

impl EntityDecl {
    pub fn is_unparsed(&self) -> bool {
        self.notation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotationDecl {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub base_system_id: Option<String>,
}

/// Node kinds of the content-spec tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSpecKind {
    Leaf,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    Choice,
    Sequence,
    Any,
    AnyOther,
    AnyLocal,
}

impl ContentSpecKind {
    /// Suffix written after a repeated particle
    pub fn occurrence_char(self) -> Option<char> {
        match self {
            ContentSpecKind::ZeroOrOne => Some('?'),
            ContentSpecKind::ZeroOrMore => Some('*'),
            ContentSpecKind::OneOrMore => Some('+'),
            _ => None,
        }
    }
}

/// One node of a binary content-spec tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpecNode {
    /// Element reference; `None` is the `#PCDATA` leaf
    Leaf(Option<String>),
    Unary(ContentSpecKind, ContentSpecIndex),
    Binary(ContentSpecKind, ContentSpecIndex, ContentSpecIndex),
    /// `##any`, optionally restricted to one namespace
    Any(Option<String>),
    /// `##other`: any namespace but this one
    AnyOther(String),
    /// `##local`: unqualified names only
    AnyLocal,
}

impl ContentSpecNode {
    pub fn kind(&self) -> ContentSpecKind {
        match self {
            ContentSpecNode::Leaf(_) => ContentSpecKind::Leaf,
            ContentSpecNode::Unary(kind, _) | ContentSpecNode::Binary(kind, _, _) => *kind,
            ContentSpecNode::Any(_) => ContentSpecKind::Any,
            ContentSpecNode::AnyOther(_) => ContentSpecKind::AnyOther,
            ContentSpecNode::AnyLocal => ContentSpecKind::AnyLocal,
        }
    }

    /// Name of an element leaf (`None` for `#PCDATA` and non-leaves)
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            ContentSpecNode::Leaf(Some(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_pcdata(&self) -> bool {
        matches!(self, ContentSpecNode::Leaf(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_keywords() {
        assert_eq!(SimpleType::from_keyword("IDREFS").unwrap(), (AttributeKind::IdRef, true));
        assert_eq!(SimpleType::from_keyword("NMTOKEN").unwrap(), (AttributeKind::NmToken, false));
        assert_eq!(SimpleType::from_keyword("ENTITIES").unwrap(), (AttributeKind::Entity, true));
        assert!(SimpleType::from_keyword("BOGUS").is_err());
    }

    #[test]
    fn test_type_names() {
        let t = SimpleType {
            kind: AttributeKind::Enumeration,
            list: false,
            default_type: DefaultType::Implied,
            default_value: None,
            non_normalized_default: None,
            enumeration: vec!["a".into(), "b".into()],
        };
        assert_eq!(t.type_name(), "(a|b)");
        let ids = SimpleType { kind: AttributeKind::IdRef, list: true, ..t };
        assert_eq!(ids.type_name(), "IDREFS");
    }

    #[test]
    fn test_default_keywords() {
        assert_eq!(DefaultType::from_keyword(Some("#FIXED")), DefaultType::Fixed);
        assert_eq!(DefaultType::from_keyword(None), DefaultType::Default);
    }
}
