//! Declaration Store
//!
//! Growable arenas for element, attribute, content-spec, entity and notation
//! records plus the name maps used to find them. Records are created on
//! first reference and addressed by index; attribute declarations form a
//! singly linked chain per element.

use std::collections::HashMap;

use super::decl::{
    AttributeDecl, AttributeIndex, ContentSpecIndex, ContentSpecKind, ContentSpecNode,
    ElementDecl, ElementIndex, EntityDecl, EntityIndex, NotationDecl, NotationIndex,
};
use crate::core::QName;

#[derive(Debug, Default)]
pub struct DeclStore {
    elements: Vec<ElementDecl>,
    element_map: HashMap<String, ElementIndex>,
    attributes: Vec<AttributeDecl>,
    content_specs: Vec<ContentSpecNode>,
    entities: Vec<EntityDecl>,
    entity_map: HashMap<String, EntityIndex>,
    notations: Vec<NotationDecl>,
    notation_map: HashMap<String, NotationIndex>,
}

impl DeclStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Elements

    /// Allocate an element slot with no name and no content type
    pub fn create_element_decl(&mut self) -> ElementIndex {
        self.elements.push(ElementDecl::default());
        self.elements.len() - 1
    }

    /// Store an element record and register its raw name.
    /// The attribute chain already linked to the slot is kept.
    pub fn set_element_decl(&mut self, index: ElementIndex, mut decl: ElementDecl) {
        let Some(slot) = self.elements.get_mut(index) else {
            return;
        };
        decl.first_attribute = slot.first_attribute;
        decl.last_attribute = slot.last_attribute;
        self.element_map.insert(decl.name.raw.clone(), index);
        *slot = decl;
    }

    /// Find an element by raw name, creating an undeclared slot on first reference
    pub fn element_or_create(&mut self, name: &str) -> ElementIndex {
        if let Some(&index) = self.element_map.get(name) {
            return index;
        }
        let index = self.create_element_decl();
        self.set_element_decl(index, ElementDecl::new(QName::new(name)));
        index
    }

    pub fn element_decl(&self, index: ElementIndex) -> Option<&ElementDecl> {
        self.elements.get(index)
    }

    pub fn element_index(&self, name: &str) -> Option<ElementIndex> {
        self.element_map.get(name).copied()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // Attributes

    /// Store an attribute record and append it to the element's chain.
    /// Returns `None` when the element index is out of range.
    pub fn add_attribute_decl(&mut self, element: ElementIndex, mut decl: AttributeDecl) -> Option<AttributeIndex> {
        if element >= self.elements.len() {
            return None;
        }
        decl.next = None;
        let index = self.attributes.len();
        self.attributes.push(decl);

        let elem = &mut self.elements[element];
        match elem.last_attribute {
            Some(last) => self.attributes[last].next = Some(index),
            None => elem.first_attribute = Some(index),
        }
        elem.last_attribute = Some(index);
        Some(index)
    }

    pub fn attribute_decl(&self, index: AttributeIndex) -> Option<&AttributeDecl> {
        self.attributes.get(index)
    }

    pub fn first_attribute_index(&self, element: ElementIndex) -> Option<AttributeIndex> {
        self.elements.get(element)?.first_attribute
    }

    pub fn next_attribute_index(&self, attribute: AttributeIndex) -> Option<AttributeIndex> {
        self.attributes.get(attribute)?.next
    }

    /// Walk the element's attribute chain for a raw attribute name
    pub fn attribute_index(&self, element: ElementIndex, name: &str) -> Option<AttributeIndex> {
        let mut cursor = self.first_attribute_index(element);
        while let Some(index) = cursor {
            let decl = &self.attributes[index];
            if decl.name.raw == name {
                return Some(index);
            }
            cursor = decl.next;
        }
        None
    }

    /// Iterate the attribute chain of an element in declaration order
    pub fn attributes_of(&self, element: ElementIndex) -> AttributeChain<'_> {
        AttributeChain {
            store: self,
            cursor: self.first_attribute_index(element),
        }
    }

    // Content specs

    pub fn add_content_spec(&mut self, node: ContentSpecNode) -> ContentSpecIndex {
        self.content_specs.push(node);
        self.content_specs.len() - 1
    }

    pub fn content_spec(&self, index: ContentSpecIndex) -> Option<&ContentSpecNode> {
        self.content_specs.get(index)
    }

    /// Element leaf, or the `#PCDATA` leaf for `None`
    pub fn add_leaf(&mut self, name: Option<&str>) -> ContentSpecIndex {
        self.add_content_spec(ContentSpecNode::Leaf(name.map(str::to_string)))
    }

    pub fn add_unary(&mut self, kind: ContentSpecKind, child: ContentSpecIndex) -> ContentSpecIndex {
        self.add_content_spec(ContentSpecNode::Unary(kind, child))
    }

    pub fn add_binary(&mut self, kind: ContentSpecKind, left: ContentSpecIndex, right: ContentSpecIndex) -> ContentSpecIndex {
        self.add_content_spec(ContentSpecNode::Binary(kind, left, right))
    }

    // Entities

    /// Bind an entity unless one with the same name exists; first declaration wins
    pub fn add_entity_decl(&mut self, decl: EntityDecl) -> Option<EntityIndex> {
        if self.entity_map.contains_key(&decl.name) {
            return None;
        }
        let index = self.entities.len();
        self.entity_map.insert(decl.name.clone(), index);
        self.entities.push(decl);
        Some(index)
    }

    pub fn entity_decl(&self, index: EntityIndex) -> Option<&EntityDecl> {
        self.entities.get(index)
    }

    pub fn entity_index(&self, name: &str) -> Option<EntityIndex> {
        self.entity_map.get(name).copied()
    }

    // Notations

    /// Bind a notation unless one with the same name exists
    pub fn add_notation_decl(&mut self, decl: NotationDecl) -> Option<NotationIndex> {
        if self.notation_map.contains_key(&decl.name) {
            return None;
        }
        let index = self.notations.len();
        self.notation_map.insert(decl.name.clone(), index);
        self.notations.push(decl);
        Some(index)
    }

    pub fn notation_decl(&self, index: NotationIndex) -> Option<&NotationDecl> {
        self.notations.get(index)
    }

    pub fn notation_index(&self, name: &str) -> Option<NotationIndex> {
        self.notation_map.get(name).copied()
    }
}

/// Iterator over one element's attribute declarations
pub struct AttributeChain<'a> {
    store: &'a DeclStore,
    cursor: Option<AttributeIndex>,
}

impl<'a> Iterator for AttributeChain<'a> {
    type Item = (AttributeIndex, &'a AttributeDecl);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let decl = self.store.attribute_decl(index)?;
        self.cursor = decl.next;
        Some((index, decl))
    }
}
