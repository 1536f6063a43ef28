//! DTD Loader
//!
//! Receives declaration and content-model events from a DTD scanner,
//! records them in the declaration store and runs the declaration-time
//! checks. `end_dtd` seals the result into an immutable [`DtdGrammar`].

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::builder::{ContentSpecBuilder, Occurrence, Separator, TreeShape};
use super::content_model::{self, ContentModelHandler};
use super::decl::{
    AttributeDecl, AttributeKind, ContentSpecIndex, ContentSpecKind, ContentSpecNode, ContentType, DefaultType, ElementDecl,
    ElementIndex, EntityDecl, NotationDecl, SimpleType,
};
use super::description::{GrammarDescription, ResourceIdentifier};
use super::dtd::DtdGrammar;
use super::store::DeclStore;
use crate::core::names::{is_name, is_nmtoken, normalize_spaces, split_tokens};
use crate::core::QName;
use crate::error::{DtdError, ErrorReporter};

/// Loader settings
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderConfig {
    pub tree_shape: TreeShape,
    /// Warn when an `<!ATTLIST>` redefines an attribute
    pub warn_on_duplicate_attdef: bool,
    /// Warn when a content model names an element that is never declared
    pub warn_on_undeclared_elemdef: bool,
}

impl LoaderConfig {
    pub fn balanced() -> Self {
        LoaderConfig { tree_shape: TreeShape::Balanced, ..Default::default() }
    }

    pub fn with_tree_shape(mut self, shape: TreeShape) -> Self {
        self.tree_shape = shape;
        self
    }

    pub fn with_duplicate_attdef_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_duplicate_attdef = enabled;
        self
    }

    pub fn with_undeclared_elemdef_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_undeclared_elemdef = enabled;
        self
    }
}

/// One `<!ATTLIST>` attribute definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDef {
    pub element: String,
    pub name: String,
    /// `CDATA`, `ID`, ..., `NOTATION` or `ENUMERATION`
    pub type_name: String,
    pub enumeration: Vec<String>,
    /// `#FIXED`, `#IMPLIED`, `#REQUIRED` or `None` for a plain default
    pub default_type: Option<String>,
    pub default_value: Option<String>,
}

impl AttributeDef {
    pub fn new(element: &str, name: &str, type_name: &str) -> Self {
        AttributeDef {
            element: element.to_string(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_enumeration(mut self, tokens: &[&str]) -> Self {
        self.enumeration = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_default(mut self, default_type: Option<&str>, value: Option<&str>) -> Self {
        self.default_type = default_type.map(str::to_string);
        self.default_value = value.map(str::to_string);
        self
    }
}

/// Declaration events produced by a DTD scanner
pub trait DtdHandler {
    fn start_dtd(&mut self);
    fn start_external_subset(&mut self);
    fn end_external_subset(&mut self);
    fn start_parameter_entity(&mut self, name: &str);
    fn end_parameter_entity(&mut self, name: &str);
    /// `<!ELEMENT>`; the content model arrives first as content-model events
    fn element_decl(&mut self, name: &str);
    fn attribute_decl(&mut self, def: &AttributeDef) -> Result<(), DtdError>;
    fn internal_entity_decl(&mut self, name: &str, value: &str);
    fn external_entity_decl(&mut self, name: &str, id: &ResourceIdentifier);
    fn unparsed_entity_decl(&mut self, name: &str, id: &ResourceIdentifier, notation: &str);
    fn notation_decl(&mut self, name: &str, id: &ResourceIdentifier);
    fn start_conditional(&mut self, _include: bool) {}
    fn end_conditional(&mut self) {}
}

/// A recorded declaration, replayable into a loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtdEvent {
    Element { name: String, content_model: String },
    Attribute(AttributeDef),
    InternalEntity { name: String, value: String },
    ExternalEntity { name: String, id: ResourceIdentifier },
    UnparsedEntity { name: String, id: ResourceIdentifier, notation: String },
    Notation { name: String, id: ResourceIdentifier },
    StartExternalSubset,
    EndExternalSubset,
    StartParameterEntity(String),
    EndParameterEntity(String),
}

/// Builds a grammar from DTD events
pub struct DtdLoader<R: ErrorReporter> {
    store: DeclStore,
    description: GrammarDescription,
    config: LoaderConfig,
    reporter: R,
    builder: ContentSpecBuilder,
    /// Set by `start_content_model`, consumed by `element_decl`
    model_pending: bool,
    pending_content_type: Option<ContentType>,
    reading_external: bool,
    /// Parameter entities currently open; any entry makes declarations external
    pe_stack: Vec<String>,
    id_attributes: HashMap<ElementIndex, String>,
    notation_attributes: HashMap<ElementIndex, String>,
    /// (notation, referenced by) pairs checked at end of DTD
    notation_refs: Vec<(String, String)>,
}

impl<R: ErrorReporter> DtdLoader<R> {
    pub fn new(description: GrammarDescription, config: LoaderConfig, reporter: R) -> Self {
        DtdLoader {
            store: DeclStore::new(),
            description,
            config,
            reporter,
            builder: ContentSpecBuilder::new(config.tree_shape),
            model_pending: false,
            pending_content_type: None,
            reading_external: false,
            pe_stack: Vec::new(),
            id_attributes: HashMap::new(),
            notation_attributes: HashMap::new(),
            notation_refs: Vec::new(),
        }
    }

    pub fn store(&self) -> &DeclStore {
        &self.store
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn in_external(&self) -> bool {
        self.reading_external || !self.pe_stack.is_empty()
    }

    /// `<!ELEMENT name text>`: parse the content model and declare the element
    pub fn element_decl_text(&mut self, name: &str, content_model: &str) -> Result<(), DtdError> {
        if let Err(e) = content_model::parse(name, content_model, self) {
            self.model_pending = false;
            self.pending_content_type = None;
            return Err(e);
        }
        self.element_decl(name);
        Ok(())
    }

    /// Feed one recorded declaration
    pub fn apply(&mut self, event: &DtdEvent) -> Result<(), DtdError> {
        match event {
            DtdEvent::Element { name, content_model } => self.element_decl_text(name, content_model)?,
            DtdEvent::Attribute(def) => self.attribute_decl(def)?,
            DtdEvent::InternalEntity { name, value } => self.internal_entity_decl(name, value),
            DtdEvent::ExternalEntity { name, id } => self.external_entity_decl(name, id),
            DtdEvent::UnparsedEntity { name, id, notation } => self.unparsed_entity_decl(name, id, notation),
            DtdEvent::Notation { name, id } => self.notation_decl(name, id),
            DtdEvent::StartExternalSubset => self.start_external_subset(),
            DtdEvent::EndExternalSubset => self.end_external_subset(),
            DtdEvent::StartParameterEntity(name) => self.start_parameter_entity(name),
            DtdEvent::EndParameterEntity(name) => self.end_parameter_entity(name),
        }
        Ok(())
    }

    fn declare_element(&mut self, name: &str) {
        let (content_type, model_root) = if std::mem::take(&mut self.model_pending) {
            (self.pending_content_type.take(), self.builder.finish())
        } else {
            (None, None)
        };

        let index = match self.store.element_index(name) {
            Some(index) => {
                let declared = self.store.element_decl(index).is_some_and(ElementDecl::is_declared);
                if declared {
                    warn!("element \"{}\" declared more than once, keeping the first", name);
                    self.reporter.error(DtdError::DuplicateElementDecl { element: name.to_string() });
                    return;
                }
                index
            }
            None => self.store.create_element_decl(),
        };

        let content_spec = match content_type {
            Some(ContentType::Mixed) => {
                if let Some(tree) = model_root {
                    self.check_mixed_children(name, tree);
                }
                let pcdata = self.store.add_leaf(None);
                Some(match model_root {
                    Some(tree) => self.store.add_binary(ContentSpecKind::Choice, pcdata, tree),
                    None => pcdata,
                })
            }
            Some(ContentType::Children) => model_root,
            _ => None,
        };

        let mut decl = ElementDecl::new(QName::new(name));
        decl.content_type = content_type;
        decl.content_spec = content_spec;
        decl.is_external = self.in_external();
        self.store.set_element_decl(index, decl);
    }

    /// Each element type may appear only once in a mixed content model
    fn check_mixed_children(&mut self, element: &str, tree: ContentSpecIndex) {
        let mut seen = HashSet::new();
        for leaf in content_model::flatten_chain(&self.store, tree, ContentSpecKind::Choice) {
            let Some(child) = self.store.content_spec(leaf).and_then(ContentSpecNode::leaf_name) else { continue };
            if !seen.insert(child) {
                self.reporter.error(DtdError::DuplicateMixedChild {
                    element: element.to_string(),
                    child: child.to_string(),
                });
            }
        }
    }

    fn check_default_value(&mut self, def: &AttributeDef, simple_type: &SimpleType) {
        let Some(value) = simple_type.default_value.as_deref() else {
            return;
        };
        let reason = match simple_type.kind {
            AttributeKind::Id | AttributeKind::IdRef | AttributeKind::Entity => {
                let ok = if simple_type.list {
                    let mut tokens = split_tokens(value).peekable();
                    tokens.peek().is_some() && tokens.all(is_name)
                } else {
                    is_name(value)
                };
                (!ok).then_some("not a valid Name")
            }
            AttributeKind::NmToken => {
                let ok = if simple_type.list {
                    let mut tokens = split_tokens(value).peekable();
                    tokens.peek().is_some() && tokens.all(is_nmtoken)
                } else {
                    is_nmtoken(value)
                };
                (!ok).then_some("not a valid Nmtoken")
            }
            AttributeKind::Enumeration | AttributeKind::Notation => {
                (!simple_type.enumeration.iter().any(|t| t == value)).then_some("not one of the enumerated values")
            }
            AttributeKind::CData => None,
        };
        if let Some(reason) = reason {
            self.reporter.error(DtdError::InvalidDefaultValue {
                element: def.element.clone(),
                attribute: def.name.clone(),
                value: value.to_string(),
                reason,
            });
        }
    }

    /// Run the end-of-DTD checks and seal the grammar
    pub fn end_dtd(mut self) -> (DtdGrammar, R) {
        for (notation, referenced_by) in std::mem::take(&mut self.notation_refs) {
            if self.store.notation_index(&notation).is_none() {
                self.reporter.error(DtdError::UndeclaredNotation { notation, referenced_by });
            }
        }

        for index in 0..self.store.element_count() {
            let Some(elem) = self.store.element_decl(index) else { continue };
            if elem.content_type == Some(ContentType::Empty) {
                let element = elem.name.raw.clone();
                let notation_attrs: Vec<String> = self
                    .store
                    .attributes_of(index)
                    .filter(|(_, a)| a.simple_type.kind == AttributeKind::Notation)
                    .map(|(_, a)| a.name.raw.clone())
                    .collect();
                for attribute in notation_attrs {
                    self.reporter.error(DtdError::NotationOnEmptyElement { element: element.clone(), attribute });
                }
            }
        }

        if self.config.warn_on_undeclared_elemdef {
            self.check_content_model_references();
        }

        if self.description.root_name.is_none() {
            self.description.possible_roots = (0..self.store.element_count())
                .filter_map(|i| self.store.element_decl(i))
                .filter(|e| e.is_declared())
                .map(|e| e.name.raw.clone())
                .collect();
        }

        debug!(
            "sealed DTD grammar {:?}: {} element decls",
            self.description.key(),
            self.store.element_count()
        );
        (DtdGrammar::new(self.store, self.description), self.reporter)
    }

    fn check_content_model_references(&mut self) {
        for index in 0..self.store.element_count() {
            let Some(elem) = self.store.element_decl(index) else { continue };
            let Some(root) = elem.content_spec else { continue };
            let element = elem.name.raw.clone();

            let mut seen = HashSet::new();
            let mut stack = vec![root];
            while let Some(i) = stack.pop() {
                match self.store.content_spec(i) {
                    Some(ContentSpecNode::Leaf(Some(child))) => {
                        let declared = self
                            .store
                            .element_index(child)
                            .and_then(|c| self.store.element_decl(c))
                            .is_some_and(ElementDecl::is_declared);
                        if !declared && seen.insert(child.clone()) {
                            self.reporter.error(DtdError::UndeclaredElementInContentModel {
                                element: element.clone(),
                                child: child.clone(),
                            });
                        }
                    }
                    Some(ContentSpecNode::Unary(_, c)) => stack.push(*c),
                    Some(ContentSpecNode::Binary(_, l, r)) => {
                        stack.push(*r);
                        stack.push(*l);
                    }
                    _ => {}
                }
            }
        }
    }
}

impl<R: ErrorReporter> DtdHandler for DtdLoader<R> {
    fn start_dtd(&mut self) {
        self.builder = ContentSpecBuilder::new(self.config.tree_shape);
        self.model_pending = false;
    }

    fn start_external_subset(&mut self) {
        self.reading_external = true;
    }

    fn end_external_subset(&mut self) {
        self.reading_external = false;
    }

    fn start_parameter_entity(&mut self, name: &str) {
        self.pe_stack.push(name.to_string());
    }

    fn end_parameter_entity(&mut self, _name: &str) {
        self.pe_stack.pop();
    }

    fn element_decl(&mut self, name: &str) {
        self.declare_element(name);
    }

    fn attribute_decl(&mut self, def: &AttributeDef) -> Result<(), DtdError> {
        let (kind, list) = SimpleType::from_keyword(&def.type_name)?;
        let element = self.store.element_or_create(&def.element);

        if self.store.attribute_index(element, &def.name).is_some() {
            if self.config.warn_on_duplicate_attdef {
                self.reporter.error(DtdError::DuplicateAttributeDef {
                    element: def.element.clone(),
                    attribute: def.name.clone(),
                });
            }
            warn!("attribute \"{}\" of \"{}\" redefined, keeping the first", def.name, def.element);
            return Ok(());
        }

        let default_type = DefaultType::from_keyword(def.default_type.as_deref());
        let raw_default = match default_type {
            DefaultType::Implied | DefaultType::Required => None,
            _ => def.default_value.clone(),
        };
        let default_value = match (&raw_default, kind) {
            (Some(v), AttributeKind::CData) => Some(v.clone()),
            (Some(v), _) => Some(normalize_spaces(v).unwrap_or_else(|| v.clone())),
            (None, _) => None,
        };
        let simple_type = SimpleType {
            kind,
            list,
            default_type,
            default_value,
            non_normalized_default: raw_default,
            enumeration: def.enumeration.clone(),
        };

        match kind {
            AttributeKind::Id => {
                if self.id_attributes.contains_key(&element) {
                    self.reporter.error(DtdError::DuplicateIdAttribute {
                        element: def.element.clone(),
                        attribute: def.name.clone(),
                    });
                } else {
                    self.id_attributes.insert(element, def.name.clone());
                }
                if !matches!(default_type, DefaultType::Implied | DefaultType::Required) {
                    self.reporter.error(DtdError::IdAttributeWithDefault {
                        element: def.element.clone(),
                        attribute: def.name.clone(),
                    });
                }
            }
            AttributeKind::Notation => {
                if self.notation_attributes.contains_key(&element) {
                    self.reporter.error(DtdError::DuplicateNotationAttribute {
                        element: def.element.clone(),
                        attribute: def.name.clone(),
                    });
                } else {
                    self.notation_attributes.insert(element, def.name.clone());
                }
                for token in &def.enumeration {
                    self.notation_refs.push((
                        token.clone(),
                        format!("attribute \"{}\" of \"{}\"", def.name, def.element),
                    ));
                }
            }
            _ => {}
        }

        if matches!(kind, AttributeKind::Enumeration | AttributeKind::Notation) {
            let mut seen = HashSet::new();
            for token in &def.enumeration {
                if !seen.insert(token.as_str()) {
                    self.reporter.error(DtdError::DuplicateEnumerationToken {
                        element: def.element.clone(),
                        attribute: def.name.clone(),
                        token: token.clone(),
                    });
                }
            }
        }

        if kind != AttributeKind::Id {
            self.check_default_value(def, &simple_type);
        }

        let decl = AttributeDecl {
            name: QName::new(&def.name),
            simple_type,
            next: None,
            is_external: self.in_external(),
        };
        self.store.add_attribute_decl(element, decl);
        Ok(())
    }

    fn internal_entity_decl(&mut self, name: &str, value: &str) {
        let decl = EntityDecl {
            name: name.to_string(),
            is_parameter: name.starts_with('%'),
            value: Some(value.to_string()),
            is_external: self.in_external(),
            ..Default::default()
        };
        self.store.add_entity_decl(decl);
    }

    fn external_entity_decl(&mut self, name: &str, id: &ResourceIdentifier) {
        let decl = EntityDecl {
            name: name.to_string(),
            is_parameter: name.starts_with('%'),
            public_id: id.public_id.clone(),
            system_id: id.literal_system_id.clone(),
            base_system_id: id.base_system_id.clone(),
            is_external: self.in_external(),
            ..Default::default()
        };
        self.store.add_entity_decl(decl);
    }

    fn unparsed_entity_decl(&mut self, name: &str, id: &ResourceIdentifier, notation: &str) {
        let decl = EntityDecl {
            name: name.to_string(),
            public_id: id.public_id.clone(),
            system_id: id.literal_system_id.clone(),
            base_system_id: id.base_system_id.clone(),
            notation: Some(notation.to_string()),
            is_external: self.in_external(),
            ..Default::default()
        };
        if self.store.add_entity_decl(decl).is_some() {
            self.notation_refs
                .push((notation.to_string(), format!("unparsed entity \"{name}\"")));
        }
    }

    fn notation_decl(&mut self, name: &str, id: &ResourceIdentifier) {
        self.store.add_notation_decl(NotationDecl {
            name: name.to_string(),
            public_id: id.public_id.clone(),
            system_id: id.literal_system_id.clone(),
            base_system_id: id.base_system_id.clone(),
        });
    }
}

impl<R: ErrorReporter> ContentModelHandler for DtdLoader<R> {
    fn start_content_model(&mut self, _element: &str) {
        self.builder.start_content_model();
        self.model_pending = true;
        self.pending_content_type = None;
    }

    fn any(&mut self) {
        self.pending_content_type = Some(ContentType::Any);
    }

    fn empty(&mut self) {
        self.pending_content_type = Some(ContentType::Empty);
    }

    fn start_group(&mut self) {
        if self.pending_content_type.is_none() {
            self.pending_content_type = Some(ContentType::Children);
        }
        self.builder.start_group();
    }

    fn pcdata(&mut self) {
        self.pending_content_type = Some(ContentType::Mixed);
        self.builder.pcdata();
    }

    fn element(&mut self, name: &str) {
        self.builder.element(&mut self.store, name);
    }

    fn separator(&mut self, separator: Separator) {
        self.builder.separator(&mut self.store, separator);
    }

    fn occurrence(&mut self, occurrence: Occurrence) {
        self.builder.occurrence(&mut self.store, occurrence);
    }

    fn end_group(&mut self) {
        self.builder.end_group(&mut self.store);
    }

    fn end_content_model(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticCollector;

    fn loader() -> DtdLoader<DiagnosticCollector> {
        loader_with(LoaderConfig::default())
    }

    fn loader_with(config: LoaderConfig) -> DtdLoader<DiagnosticCollector> {
        DtdLoader::new(
            GrammarDescription::new(Some("doc"), ResourceIdentifier::default()),
            config,
            DiagnosticCollector::new(),
        )
    }

    #[test]
    fn test_first_attlist_binds() {
        let mut l = loader();
        l.attribute_decl(&AttributeDef::new("e", "a", "CDATA").with_default(None, Some("X"))).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "a", "CDATA").with_default(None, Some("Y"))).unwrap();
        let (g, reporter) = l.end_dtd();
        let e = g.element_decl_index("e").unwrap();
        let a = g.attribute_decl_index(e, "a").unwrap();
        assert_eq!(g.attribute_decl(a).unwrap().simple_type.default_value.as_deref(), Some("X"));
        assert_eq!(g.attribute_decls(e).count(), 1);
        // Off by default
        assert_eq!(reporter.count("duplicate_attribute_def"), 0);
    }

    #[test]
    fn test_duplicate_attdef_warning_when_enabled() {
        let mut l = loader_with(LoaderConfig::default().with_duplicate_attdef_warnings(true));
        l.attribute_decl(&AttributeDef::new("e", "a", "CDATA")).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "a", "ID")).unwrap();
        let (_, reporter) = l.end_dtd();
        assert_eq!(reporter.count("duplicate_attribute_def"), 1);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_forward_reference_then_declaration() {
        let mut l = loader();
        l.attribute_decl(&AttributeDef::new("e", "a", "CDATA")).unwrap();
        l.element_decl_text("e", "(x|y)").unwrap();
        let (g, reporter) = l.end_dtd();
        let e = g.element_decl_index("e").unwrap();
        assert_eq!(g.content_type(e), Some(ContentType::Children));
        assert!(g.attribute_decl_index(e, "a").is_some());
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_element_ignored() {
        let mut l = loader();
        l.element_decl_text("e", "EMPTY").unwrap();
        l.element_decl_text("e", "(a)").unwrap();
        let (g, reporter) = l.end_dtd();
        let e = g.element_decl_index("e").unwrap();
        assert_eq!(g.content_spec_as_string(e).as_deref(), Some("EMPTY"));
        assert_eq!(reporter.count("duplicate_element_decl"), 1);
    }

    #[test]
    fn test_first_entity_and_notation_bind() {
        let mut l = loader();
        l.internal_entity_decl("x", "one");
        l.internal_entity_decl("x", "two");
        l.notation_decl("gif", &ResourceIdentifier::system("gif.exe"));
        l.notation_decl("gif", &ResourceIdentifier::system("other.exe"));
        let (g, _) = l.end_dtd();
        let x = g.entity_decl_index("x").unwrap();
        assert_eq!(g.entity_decl(x).unwrap().value.as_deref(), Some("one"));
        let n = g.notation_decl_index("gif").unwrap();
        assert_eq!(g.notation_decl(n).unwrap().system_id.as_deref(), Some("gif.exe"));
    }

    #[test]
    fn test_unparsed_entities() {
        let mut l = loader();
        l.notation_decl("gif", &ResourceIdentifier::system("viewer"));
        l.unparsed_entity_decl("pic", &ResourceIdentifier::system("pic.gif"), "gif");
        l.external_entity_decl("chap", &ResourceIdentifier::system("chap.xml"));
        let (g, reporter) = l.end_dtd();
        assert!(g.is_entity_unparsed("pic"));
        assert!(!g.is_entity_unparsed("chap"));
        assert!(g.is_entity_declared("chap"));
        assert!(!g.is_entity_declared("nope"));
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_undeclared_notation_reported_at_end() {
        let mut l = loader();
        l.element_decl_text("e", "(#PCDATA)").unwrap();
        l.attribute_decl(&AttributeDef::new("e", "n", "NOTATION").with_enumeration(&["foo"])).unwrap();
        l.unparsed_entity_decl("pic", &ResourceIdentifier::system("pic.gif"), "gif");
        assert!(l.reporter().diagnostics().is_empty());
        let (_, reporter) = l.end_dtd();
        assert_eq!(reporter.count("undeclared_notation"), 2);
        let msgs: Vec<String> = reporter.diagnostics().iter().map(|d| d.to_string()).collect();
        assert!(msgs.iter().any(|m| m.contains("\"foo\"")));
        assert!(msgs.iter().any(|m| m.contains("\"gif\"")));
    }

    #[test]
    fn test_external_tracking() {
        let mut l = loader();
        l.element_decl_text("internal", "EMPTY").unwrap();
        l.start_parameter_entity("%pe");
        l.element_decl_text("in_pe", "EMPTY").unwrap();
        l.end_parameter_entity("%pe");
        l.start_external_subset();
        l.element_decl_text("ext", "EMPTY").unwrap();
        l.attribute_decl(&AttributeDef::new("ext", "a", "CDATA").with_default(None, Some("v"))).unwrap();
        l.end_external_subset();
        let (g, _) = l.end_dtd();
        let idx = |n: &str| g.element_decl_index(n).unwrap();
        assert!(!g.element_decl_is_external(idx("internal")));
        assert!(g.element_decl_is_external(idx("in_pe")));
        assert!(g.element_decl_is_external(idx("ext")));
        let a = g.attribute_decl_index(idx("ext"), "a").unwrap();
        assert!(g.attribute_decl_is_external(a));
    }

    #[test]
    fn test_attribute_declaration_checks() {
        let mut l = loader();
        l.element_decl_text("e", "EMPTY").unwrap();
        l.attribute_decl(&AttributeDef::new("e", "id1", "ID").with_default(None, Some("x"))).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "id2", "ID").with_default(Some("#IMPLIED"), None)).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "n", "NOTATION").with_enumeration(&["a", "a"])).unwrap();
        l.attribute_decl(
            &AttributeDef::new("e", "c", "ENUMERATION").with_enumeration(&["r", "g"]).with_default(None, Some("b")),
        )
        .unwrap();
        l.attribute_decl(&AttributeDef::new("e", "t", "NMTOKEN").with_default(None, Some("a b"))).unwrap();
        l.notation_decl("a", &ResourceIdentifier::system("a"));
        let (_, reporter) = l.end_dtd();
        assert_eq!(reporter.count("id_attribute_with_default"), 1);
        assert_eq!(reporter.count("duplicate_id_attribute"), 1);
        assert_eq!(reporter.count("duplicate_enumeration_token"), 1);
        assert_eq!(reporter.count("invalid_default_value"), 2);
        assert_eq!(reporter.count("notation_on_empty_element"), 1);
        assert_eq!(reporter.count("undeclared_notation"), 0);
    }

    #[test]
    fn test_unknown_attribute_type() {
        let mut l = loader();
        let err = l.attribute_decl(&AttributeDef::new("e", "a", "STRING")).unwrap_err();
        assert_eq!(err.code(), "unknown_attribute_type");
    }

    #[test]
    fn test_default_normalized_for_tokens() {
        let mut l = loader();
        l.attribute_decl(&AttributeDef::new("e", "t", "NMTOKENS").with_default(None, Some("  a   b "))).unwrap();
        let (g, _) = l.end_dtd();
        let e = g.element_decl_index("e").unwrap();
        let t = g.attribute_decl(g.attribute_decl_index(e, "t").unwrap()).unwrap();
        assert_eq!(t.simple_type.default_value.as_deref(), Some("a b"));
        assert_eq!(t.simple_type.non_normalized_default.as_deref(), Some("  a   b "));
    }

    #[test]
    fn test_possible_roots_without_root_name() {
        let mut l = DtdLoader::new(GrammarDescription::default(), LoaderConfig::default(), DiagnosticCollector::new());
        l.element_decl_text("a", "(b)").unwrap();
        l.element_decl_text("b", "EMPTY").unwrap();
        let (g, _) = l.end_dtd();
        assert_eq!(g.description().possible_roots, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_undeclared_element_in_content_model_warning() {
        let mut l = loader_with(LoaderConfig::default().with_undeclared_elemdef_warnings(true));
        l.element_decl_text("a", "(b,c,b)").unwrap();
        l.element_decl_text("b", "EMPTY").unwrap();
        let (_, reporter) = l.end_dtd();
        assert_eq!(reporter.count("undeclared_element_in_content_model"), 1);
    }

    #[test]
    fn test_duplicate_mixed_child() {
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            let mut l = loader_with(LoaderConfig::default().with_tree_shape(shape));
            l.element_decl_text("p", "(#PCDATA|a|b|a)*").unwrap();
            l.element_decl_text("q", "(#PCDATA|a|b)*").unwrap();
            let (g, reporter) = l.end_dtd();
            assert_eq!(reporter.count("duplicate_mixed_child"), 1, "{shape:?}");
            assert!(reporter.diagnostics()[0].to_string().contains("\"a\""));
            // The declaration itself still binds
            let p = g.element_decl_index("p").unwrap();
            assert_eq!(g.content_type(p), Some(ContentType::Mixed));
        }
    }

    #[test]
    fn test_malformed_model_does_not_leak_state() {
        let mut l = loader();
        assert!(l.element_decl_text("bad", "(a,").is_err());
        assert!(l.element_decl_text("bad", "(a,)").is_err());
        assert!(l.element_decl_text("bad", "()").is_err());
        l.element_decl_text("good", "EMPTY").unwrap();
        let (g, _) = l.end_dtd();
        assert!(g.element_decl_index("bad").is_none());
        assert!(g.element_decl_index("a").is_none());
        let good = g.element_decl_index("good").unwrap();
        assert_eq!(g.content_type(good), Some(ContentType::Empty));
    }

    #[test]
    fn test_replay_events() {
        let events = vec![
            DtdEvent::Element { name: "doc".into(), content_model: "(p)*".into() },
            DtdEvent::Attribute(AttributeDef::new("doc", "v", "CDATA").with_default(Some("#FIXED"), Some("1"))),
            DtdEvent::StartExternalSubset,
            DtdEvent::Element { name: "p".into(), content_model: "(#PCDATA)".into() },
            DtdEvent::EndExternalSubset,
        ];
        let mut l = loader();
        for e in &events {
            l.apply(e).unwrap();
        }
        let (g, _) = l.end_dtd();
        let p = g.element_decl_index("p").unwrap();
        assert!(g.element_decl_is_external(p));
        let doc = g.element_decl_index("doc").unwrap();
        assert_eq!(g.content_spec_as_string(doc).as_deref(), Some("(p)*"));
    }
}
