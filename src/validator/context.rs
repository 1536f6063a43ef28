//! Per-document validation state
//!
//! A `ValidationContext` is owned by one document pass. The grammar it
//! validates against is shared and read-only.

use std::collections::HashSet;

use crate::core::QName;
use crate::error::{DiagnosticCollector, DtdError, ErrorReporter};
use crate::grammar::decl::{ContentType, ElementIndex};
use crate::model::Child;

/// An open element
#[derive(Debug, Clone)]
pub(crate) struct ElementFrame {
    pub name: QName,
    pub index: Option<ElementIndex>,
    pub content_type: Option<ContentType>,
    pub is_external: bool,
    /// Where this element's children start in the shared buffer
    pub children_start: usize,
}

pub struct ValidationContext<R: ErrorReporter = DiagnosticCollector> {
    reporter: R,
    pub(crate) stack: Vec<ElementFrame>,
    /// Children of every open element, innermost last
    pub(crate) children: Vec<Child>,
    pub(crate) ids: HashSet<String>,
    idrefs: Vec<String>,
    idref_seen: HashSet<String>,
    pub(crate) standalone: bool,
    pub(crate) doctype_root: Option<String>,
    pub(crate) seen_root: bool,
    /// Cleared when no grammar is available
    pub(crate) active: bool,
}

impl<R: ErrorReporter> ValidationContext<R> {
    pub fn new(reporter: R) -> Self {
        ValidationContext {
            reporter,
            stack: Vec::new(),
            children: Vec::new(),
            ids: HashSet::new(),
            idrefs: Vec::new(),
            idref_seen: HashSet::new(),
            standalone: false,
            doctype_root: None,
            seen_root: false,
            active: true,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone
    }

    /// Forget everything about the previous document
    pub fn reset(&mut self) {
        self.stack.clear();
        self.children.clear();
        self.ids.clear();
        self.idrefs.clear();
        self.idref_seen.clear();
        self.standalone = false;
        self.doctype_root = None;
        self.seen_root = false;
        self.active = true;
    }

    pub(crate) fn report(&mut self, error: DtdError) {
        self.reporter.error(error);
    }

    /// Record an IDREF for the end-of-document check; each value once
    pub(crate) fn add_idref(&mut self, idref: &str) {
        if self.idref_seen.insert(idref.to_string()) {
            self.idrefs.push(idref.to_string());
        }
    }

    pub(crate) fn take_idrefs(&mut self) -> Vec<String> {
        self.idref_seen.clear();
        std::mem::take(&mut self.idrefs)
    }

    /// Append a child to the innermost open element, merging adjacent text
    pub(crate) fn push_child(&mut self, child: Child) {
        let Some(frame) = self.stack.last() else { return };
        if child == Child::PcData
            && self.children.len() > frame.children_start
            && self.children.last() == Some(&Child::PcData)
        {
            return;
        }
        self.children.push(child);
    }
}

impl Default for ValidationContext<DiagnosticCollector> {
    fn default() -> Self {
        ValidationContext::new(DiagnosticCollector::new())
    }
}
