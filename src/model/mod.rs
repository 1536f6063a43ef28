//! Content models
//!
//! Compiled matchers deciding whether an element's child sequence fits its
//! declared content. Four strategies, chosen by the compiler:
//!
//! - Simple: one leaf, two leaves under CHOICE/SEQ, or a repeated leaf
//! - Mixed: `(#PCDATA|a|b)*`, a membership test per child
//! - Dfa: everything else, via a position-set automaton

pub mod compiler;
pub mod dfa;
pub mod mixed;
pub mod simple;

use crate::core::QName;

pub use dfa::DfaContentModel;
pub use mixed::MixedContentModel;
pub use simple::SimpleContentModel;

/// One child of an element as seen by a matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(QName),
    /// Character data where the content model may forbid it
    PcData,
}

impl Child {
    pub fn element(name: &str) -> Self {
        Child::Element(QName::new(name))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Child::Element(q) => Some(&q.raw),
            Child::PcData => None,
        }
    }
}

/// Result of matching a child sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOutcome {
    Valid,
    /// The child at this index cannot appear where it does
    Invalid(usize),
    /// Every child fit but the model needs more
    Incomplete,
}

impl ContentOutcome {
    /// Integer form: -1 when valid, the failing index, or the child count
    /// when the sequence ended early.
    pub fn as_index(self, child_count: usize) -> isize {
        match self {
            ContentOutcome::Valid => -1,
            ContentOutcome::Invalid(i) => i as isize,
            ContentOutcome::Incomplete => child_count as isize,
        }
    }

    pub fn is_valid(self) -> bool {
        self == ContentOutcome::Valid
    }
}

/// Namespace constraint of a wildcard leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// Any element, optionally only from one namespace
    Any(Option<String>),
    /// Qualified elements from any namespace but this one
    Other(String),
    /// Unqualified elements
    Local,
}

impl Wildcard {
    pub fn matches(&self, name: &QName) -> bool {
        match self {
            Wildcard::Any(None) => true,
            Wildcard::Any(Some(uri)) => name.uri.as_deref() == Some(uri.as_str()),
            Wildcard::Other(uri) => name.uri.as_deref().is_some_and(|u| u != uri),
            Wildcard::Local => name.uri.is_none(),
        }
    }
}

/// A compiled content model
#[derive(Debug, Clone)]
pub enum ContentMatcher {
    Simple(SimpleContentModel),
    Mixed(MixedContentModel),
    Dfa(DfaContentModel),
}

impl ContentMatcher {
    pub fn validate(&self, children: &[Child]) -> ContentOutcome {
        match self {
            ContentMatcher::Simple(m) => m.validate(children),
            ContentMatcher::Mixed(m) => m.validate(children),
            ContentMatcher::Dfa(m) => m.validate(children),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ContentMatcher::Simple(_) => "simple",
            ContentMatcher::Mixed(_) => "mixed",
            ContentMatcher::Dfa(_) => "dfa",
        }
    }
}
