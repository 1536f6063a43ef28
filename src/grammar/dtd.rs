//! Sealed DTD grammar
//!
//! Read-only view over the declaration store. A `DtdGrammar` is `Send + Sync`
//! and is shared between validators as `Arc<DtdGrammar>`; the only interior
//! mutation is the per-element content matcher, compiled once on first use.

use log::debug;

use super::content_model;
use super::decl::{
    AttributeDecl, AttributeIndex, AttributeKind, ContentSpecIndex, ContentSpecNode, ContentType,
    ElementDecl, ElementIndex, EntityDecl, EntityIndex, NotationDecl, NotationIndex,
};
use super::description::GrammarDescription;
use super::store::{AttributeChain, DeclStore};
use crate::model::{compiler, ContentMatcher};

#[derive(Debug)]
pub struct DtdGrammar {
    store: DeclStore,
    description: GrammarDescription,
}

impl DtdGrammar {
    pub(crate) fn new(store: DeclStore, description: GrammarDescription) -> Self {
        DtdGrammar { store, description }
    }

    pub fn description(&self) -> &GrammarDescription {
        &self.description
    }

    pub fn store(&self) -> &DeclStore {
        &self.store
    }

    // Elements

    pub fn element_decl_index(&self, name: &str) -> Option<ElementIndex> {
        self.store.element_index(name)
    }

    pub fn element_decl(&self, index: ElementIndex) -> Option<&ElementDecl> {
        self.store.element_decl(index)
    }

    pub fn first_element_decl_index(&self) -> Option<ElementIndex> {
        (self.store.element_count() > 0).then_some(0)
    }

    pub fn next_element_decl_index(&self, index: ElementIndex) -> Option<ElementIndex> {
        let next = index + 1;
        (next < self.store.element_count()).then_some(next)
    }

    /// All element records, declared or only referenced, in creation order
    pub fn element_decls(&self) -> impl Iterator<Item = (ElementIndex, &ElementDecl)> {
        (0..self.store.element_count()).filter_map(|i| self.store.element_decl(i).map(|d| (i, d)))
    }

    pub fn element_decl_is_external(&self, index: ElementIndex) -> bool {
        self.store.element_decl(index).is_some_and(|d| d.is_external)
    }

    pub fn content_type(&self, index: ElementIndex) -> Option<ContentType> {
        self.store.element_decl(index)?.content_type
    }

    pub fn content_spec_index(&self, index: ElementIndex) -> Option<ContentSpecIndex> {
        self.store.element_decl(index)?.content_spec
    }

    pub fn content_spec(&self, index: ContentSpecIndex) -> Option<&ContentSpecNode> {
        self.store.content_spec(index)
    }

    /// Content model of an element in DTD notation, `None` if undeclared
    pub fn content_spec_as_string(&self, index: ElementIndex) -> Option<String> {
        let decl = self.store.element_decl(index)?;
        match decl.content_type? {
            ContentType::Empty => Some("EMPTY".to_string()),
            ContentType::Any => Some("ANY".to_string()),
            ContentType::Mixed => {
                let root = decl.content_spec?;
                let mut text = content_model::format(&self.store, root);
                if !self.store.content_spec(root)?.is_pcdata() {
                    text.push('*');
                }
                Some(text)
            }
            ContentType::Children => {
                Some(content_model::format(&self.store, decl.content_spec?))
            }
        }
    }

    /// Matcher for the element's content, compiled on first request.
    /// `None` for EMPTY, ANY and undeclared elements.
    pub fn content_matcher(&self, index: ElementIndex) -> Option<&ContentMatcher> {
        let decl = self.store.element_decl(index)?;
        let content_type = decl.content_type?;
        decl.matcher
            .get_or_init(|| {
                let matcher = compiler::compile(&self.store, content_type, decl.content_spec);
                if let Some(m) = &matcher {
                    debug!("compiled {} matcher for \"{}\"", m.kind_name(), decl.name);
                }
                matcher
            })
            .as_ref()
    }

    // Attributes

    pub fn attribute_decl_index(&self, element: ElementIndex, name: &str) -> Option<AttributeIndex> {
        self.store.attribute_index(element, name)
    }

    pub fn attribute_decl(&self, index: AttributeIndex) -> Option<&AttributeDecl> {
        self.store.attribute_decl(index)
    }

    pub fn first_attribute_decl_index(&self, element: ElementIndex) -> Option<AttributeIndex> {
        self.store.first_attribute_index(element)
    }

    pub fn next_attribute_decl_index(&self, attribute: AttributeIndex) -> Option<AttributeIndex> {
        self.store.next_attribute_index(attribute)
    }

    pub fn attribute_decls(&self, element: ElementIndex) -> AttributeChain<'_> {
        self.store.attributes_of(element)
    }

    pub fn attribute_decl_is_external(&self, index: AttributeIndex) -> bool {
        self.store.attribute_decl(index).is_some_and(|a| a.is_external)
    }

    /// True unless the attribute is declared with a non-CDATA type
    pub fn is_cdata_attribute(&self, element: &str, attribute: &str) -> bool {
        let Some(e) = self.store.element_index(element) else {
            return true;
        };
        match self.store.attribute_index(e, attribute).and_then(|a| self.store.attribute_decl(a)) {
            Some(decl) => decl.simple_type.kind == AttributeKind::CData,
            None => true,
        }
    }

    // Entities and notations

    pub fn entity_decl_index(&self, name: &str) -> Option<EntityIndex> {
        self.store.entity_index(name)
    }

    pub fn entity_decl(&self, index: EntityIndex) -> Option<&EntityDecl> {
        self.store.entity_decl(index)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityDecl> {
        self.store.entity_decl(self.store.entity_index(name)?)
    }

    pub fn is_entity_declared(&self, name: &str) -> bool {
        self.store.entity_index(name).is_some()
    }

    pub fn is_entity_unparsed(&self, name: &str) -> bool {
        self.entity_by_name(name).is_some_and(EntityDecl::is_unparsed)
    }

    pub fn notation_decl_index(&self, name: &str) -> Option<NotationIndex> {
        self.store.notation_index(name)
    }

    pub fn notation_decl(&self, index: NotationIndex) -> Option<&NotationDecl> {
        self.store.notation_decl(index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rayon::prelude::*;

    use super::*;
    use crate::error::DiagnosticCollector;
    use crate::grammar::builder::TreeShape;
    use crate::grammar::description::ResourceIdentifier;
    use crate::grammar::loader::{AttributeDef, DtdHandler, DtdLoader, LoaderConfig};

    fn loader(shape: TreeShape) -> DtdLoader<DiagnosticCollector> {
        DtdLoader::new(
            GrammarDescription::new(Some("doc"), ResourceIdentifier::system("doc.dtd")),
            LoaderConfig::default().with_tree_shape(shape),
            DiagnosticCollector::new(),
        )
    }

    fn spec_string(g: &DtdGrammar, name: &str) -> Option<String> {
        g.content_spec_as_string(g.element_decl_index(name)?)
    }

    #[test]
    fn test_round_trip_textual_notation() {
        let models = [
            "EMPTY",
            "ANY",
            "(#PCDATA)",
            "(#PCDATA|a|b)*",
            "(a)",
            "(a)*",
            "(a,b?,c+)",
            "(a|b|c)",
            "(a,(b|c)*,d?)+",
        ];
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            let mut l = loader(shape);
            for (i, model) in models.iter().enumerate() {
                l.element_decl_text(&format!("e{i}"), model).unwrap();
            }
            let (g, _) = l.end_dtd();
            for (i, model) in models.iter().enumerate() {
                assert_eq!(spec_string(&g, &format!("e{i}")).as_deref(), Some(*model), "{shape:?}");
            }
        }
    }

    #[test]
    fn test_undeclared_element_has_no_string() {
        let mut l = loader(TreeShape::Minimal);
        l.attribute_decl(&AttributeDef::new("x", "a", "CDATA")).unwrap();
        let (g, _) = l.end_dtd();
        let x = g.element_decl_index("x").unwrap();
        assert_eq!(g.content_spec_as_string(x), None);
        assert!(g.content_matcher(x).is_none());
    }

    #[test]
    fn test_iteration() {
        let mut l = loader(TreeShape::Minimal);
        l.element_decl_text("a", "EMPTY").unwrap();
        l.element_decl_text("b", "ANY").unwrap();
        let (g, _) = l.end_dtd();
        let mut names = Vec::new();
        let mut cursor = g.first_element_decl_index();
        while let Some(i) = cursor {
            names.push(g.element_decl(i).unwrap().name.raw.clone());
            cursor = g.next_element_decl_index(i);
        }
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(g.element_decls().count(), 2);
    }

    #[test]
    fn test_attribute_chain_and_tree_root() {
        let mut l = loader(TreeShape::Minimal);
        l.element_decl_text("e", "(x,y)").unwrap();
        for name in ["one", "two", "three"] {
            l.attribute_decl(&AttributeDef::new("e", name, "CDATA")).unwrap();
        }
        let (g, _) = l.end_dtd();
        let e = g.element_decl_index("e").unwrap();

        let mut names = Vec::new();
        let mut cursor = g.first_attribute_decl_index(e);
        while let Some(a) = cursor {
            names.push(g.attribute_decl(a).unwrap().name.raw.clone());
            cursor = g.next_attribute_decl_index(a);
        }
        assert_eq!(names, vec!["one", "two", "three"]);

        let root = g.content_spec_index(e).unwrap();
        assert_eq!(g.content_spec(root).unwrap().kind(), crate::grammar::decl::ContentSpecKind::Sequence);
    }

    #[test]
    fn test_is_cdata_attribute() {
        let mut l = loader(TreeShape::Minimal);
        l.element_decl_text("e", "EMPTY").unwrap();
        l.attribute_decl(&AttributeDef::new("e", "id", "ID").with_default(Some("#IMPLIED"), None)).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "t", "CDATA")).unwrap();
        let (g, _) = l.end_dtd();
        assert!(!g.is_cdata_attribute("e", "id"));
        assert!(g.is_cdata_attribute("e", "t"));
        assert!(g.is_cdata_attribute("e", "undeclared"));
        assert!(g.is_cdata_attribute("nope", "id"));
    }

    #[test]
    fn test_concurrent_first_matcher_use() {
        let mut l = loader(TreeShape::Minimal);
        l.element_decl_text("e", "(a,b?,c+)").unwrap();
        let (g, _) = l.end_dtd();
        let g = Arc::new(g);
        let e = g.element_decl_index("e").unwrap();

        let addresses: Vec<usize> = (0..64)
            .into_par_iter()
            .map(|_| g.content_matcher(e).map(|m| m as *const ContentMatcher as usize).unwrap_or(0))
            .collect();
        assert!(addresses[0] != 0);
        assert!(addresses.iter().all(|&a| a == addresses[0]));
    }
}
