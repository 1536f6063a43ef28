//! Content model compiler
//!
//! Picks the cheapest matcher that can decide an element's content.

use super::dfa::DfaContentModel;
use super::mixed::{MixedContentModel, MixedLeaf};
use super::simple::{SimpleContentModel, SimpleOp};
use super::{ContentMatcher, Wildcard};
use crate::grammar::decl::{ContentSpecIndex, ContentSpecKind, ContentSpecNode, ContentType};
use crate::grammar::store::DeclStore;

/// Compile the matcher for one element. EMPTY and ANY content, and element
/// content without a tree, have no matcher.
pub fn compile(store: &DeclStore, content_type: ContentType, root: Option<ContentSpecIndex>) -> Option<ContentMatcher> {
    match content_type {
        ContentType::Empty | ContentType::Any => None,
        ContentType::Mixed => Some(ContentMatcher::Mixed(compile_mixed(store, root))),
        ContentType::Children => compile_children(store, root?),
    }
}

fn compile_mixed(store: &DeclStore, root: Option<ContentSpecIndex>) -> MixedContentModel {
    let mut leaves = Vec::new();
    let mut stack: Vec<ContentSpecIndex> = root.into_iter().collect();
    while let Some(index) = stack.pop() {
        match store.content_spec(index) {
            Some(ContentSpecNode::Leaf(Some(name))) => leaves.push(MixedLeaf::Name(name.clone())),
            Some(ContentSpecNode::Any(uri)) => leaves.push(MixedLeaf::Wildcard(Wildcard::Any(uri.clone()))),
            Some(ContentSpecNode::AnyOther(uri)) => leaves.push(MixedLeaf::Wildcard(Wildcard::Other(uri.clone()))),
            Some(ContentSpecNode::AnyLocal) => leaves.push(MixedLeaf::Wildcard(Wildcard::Local)),
            Some(ContentSpecNode::Unary(_, child)) => stack.push(*child),
            Some(ContentSpecNode::Binary(_, left, right)) => {
                stack.push(*right);
                stack.push(*left);
            }
            Some(ContentSpecNode::Leaf(None)) | None => {}
        }
    }
    MixedContentModel::new(leaves)
}

fn compile_children(store: &DeclStore, root: ContentSpecIndex) -> Option<ContentMatcher> {
    let node = store.content_spec(root)?;
    let leaf_name = |i: ContentSpecIndex| store.content_spec(i).and_then(ContentSpecNode::leaf_name);

    let simple = match node {
        ContentSpecNode::Leaf(Some(name)) => Some(SimpleContentModel::new(SimpleOp::Leaf, name, None)),
        ContentSpecNode::Binary(kind, left, right) => match (leaf_name(*left), leaf_name(*right)) {
            (Some(first), Some(second)) => {
                let op = if *kind == ContentSpecKind::Choice { SimpleOp::Choice } else { SimpleOp::Sequence };
                Some(SimpleContentModel::new(op, first, Some(second)))
            }
            _ => None,
        },
        ContentSpecNode::Unary(kind, child) => leaf_name(*child).map(|name| {
            let op = match kind {
                ContentSpecKind::ZeroOrOne => SimpleOp::ZeroOrOne,
                ContentSpecKind::ZeroOrMore => SimpleOp::ZeroOrMore,
                _ => SimpleOp::OneOrMore,
            };
            SimpleContentModel::new(op, name, None)
        }),
        _ => None,
    };

    Some(match simple {
        Some(model) => ContentMatcher::Simple(model),
        None => ContentMatcher::Dfa(DfaContentModel::build(store, root)),
    })
}
