//! DTD Validator
//!
//! Checks a stream of document events against a sealed grammar. The
//! validator itself is immutable and can be shared across threads; all
//! per-document state lives in the [`ValidationContext`] passed to each call.

use std::sync::Arc;

use log::trace;

use super::attributes::process_attributes;
use super::context::{ElementFrame, ValidationContext};
use super::events::{Attributes, DocumentEvent};
use crate::core::names::is_all_whitespace;
use crate::core::QName;
use crate::error::{DiagnosticCollector, DtdError, ErrorReporter};
use crate::grammar::decl::ContentType;
use crate::grammar::DtdGrammar;
use crate::model::{Child, ContentOutcome};

/// Validator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Split prefixes of synthesized default attributes
    pub namespaces: bool,
    /// Validate only when a grammar is present; otherwise stay silent
    pub dynamic: bool,
}

impl ValidatorConfig {
    pub fn with_namespaces(mut self, enabled: bool) -> Self {
        self.namespaces = enabled;
        self
    }

    pub fn with_dynamic(mut self, enabled: bool) -> Self {
        self.dynamic = enabled;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DtdValidator {
    grammar: Option<Arc<DtdGrammar>>,
    config: ValidatorConfig,
}

impl DtdValidator {
    pub fn new(grammar: Arc<DtdGrammar>) -> Self {
        DtdValidator {
            grammar: Some(grammar),
            config: ValidatorConfig::default(),
        }
    }

    /// A validator with no grammar: reports a missing grammar unless dynamic
    pub fn without_grammar(config: ValidatorConfig) -> Self {
        DtdValidator { grammar: None, config }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn grammar(&self) -> Option<&DtdGrammar> {
        self.grammar.as_deref()
    }

    pub fn config(&self) -> ValidatorConfig {
        self.config
    }

    pub fn new_context(&self) -> ValidationContext<DiagnosticCollector> {
        ValidationContext::default()
    }

    pub fn start_document<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>) {
        cx.reset();
    }

    pub fn xml_decl<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, standalone: Option<bool>) {
        cx.standalone = standalone == Some(true);
    }

    pub fn doctype_decl<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, root: &str) {
        cx.doctype_root = Some(root.to_string());
    }

    pub fn start_element<R: ErrorReporter>(
        &self,
        cx: &mut ValidationContext<R>,
        name: &QName,
        attributes: &mut Attributes,
    ) {
        if !cx.active {
            return;
        }
        let Some(grammar) = self.grammar.as_deref() else {
            if !self.config.dynamic {
                cx.report(DtdError::GrammarNotFound { root: name.raw.clone() });
            }
            cx.active = false;
            return;
        };

        if !cx.seen_root {
            cx.seen_root = true;
            if let Some(doctype_root) = cx.doctype_root.clone() {
                if doctype_root != name.raw {
                    cx.report(DtdError::RootElementMismatch { doctype_root, root: name.raw.clone() });
                }
            }
        }

        cx.push_child(Child::Element(name.clone()));

        let index = grammar.element_decl_index(&name.raw);
        let decl = index.and_then(|i| grammar.element_decl(i));
        let content_type = decl.and_then(|d| d.content_type);
        if content_type.is_none() {
            cx.report(DtdError::ElementNotDeclared { element: name.raw.clone() });
        }
        if let Some(index) = index {
            process_attributes(grammar, self.config.namespaces, cx, index, name, attributes);
        }

        trace!("enter <{}> ({:?})", name, content_type);
        cx.stack.push(ElementFrame {
            name: name.clone(),
            index,
            content_type,
            is_external: decl.is_some_and(|d| d.is_external),
            children_start: cx.children.len(),
        });
    }

    pub fn empty_element<R: ErrorReporter>(
        &self,
        cx: &mut ValidationContext<R>,
        name: &QName,
        attributes: &mut Attributes,
    ) {
        self.start_element(cx, name, attributes);
        self.end_element(cx, name);
    }

    pub fn end_element<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, _name: &QName) {
        if !cx.active {
            return;
        }
        let Some(frame) = cx.stack.pop() else { return };
        let Some(grammar) = self.grammar.as_deref() else { return };

        let children = &cx.children[frame.children_start..];
        let problem = match (frame.content_type, frame.index) {
            (Some(ContentType::Empty), _) if !children.is_empty() => {
                Some(DtdError::EmptyElementHasContent { element: frame.name.raw.clone() })
            }
            (Some(ContentType::Mixed | ContentType::Children), Some(index)) => {
                match grammar.content_matcher(index).map(|m| m.validate(children)) {
                    Some(ContentOutcome::Invalid(i)) => Some(DtdError::ContentInvalid {
                        element: frame.name.raw.clone(),
                        content_model: grammar.content_spec_as_string(index).unwrap_or_default(),
                        index: i,
                    }),
                    Some(ContentOutcome::Incomplete) => Some(DtdError::ContentIncomplete {
                        element: frame.name.raw.clone(),
                        content_model: grammar.content_spec_as_string(index).unwrap_or_default(),
                    }),
                    _ => None,
                }
            }
            _ => None,
        };
        cx.children.truncate(frame.children_start);
        if let Some(problem) = problem {
            cx.report(problem);
        }
        trace!("leave <{}>", frame.name);
    }

    pub fn characters<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, text: &str) {
        if !cx.active || text.is_empty() {
            return;
        }
        let Some(frame) = cx.stack.last() else { return };
        let (content_type, is_external) = (frame.content_type, frame.is_external);
        match content_type {
            Some(ContentType::Children) => {
                if is_all_whitespace(text) {
                    if cx.standalone && is_external {
                        let element = frame.name.raw.clone();
                        cx.report(DtdError::StandaloneWhitespaceInExternalElement { element });
                    }
                } else {
                    cx.push_child(Child::PcData);
                }
            }
            Some(ContentType::Empty | ContentType::Mixed) => cx.push_child(Child::PcData),
            _ => {}
        }
    }

    pub fn comment<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>) {
        self.markup_in_content(cx, "comment");
    }

    pub fn processing_instruction<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, _target: &str) {
        self.markup_in_content(cx, "processing instruction");
    }

    fn markup_in_content<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, what: &'static str) {
        if !cx.active {
            return;
        }
        if let Some(frame) = cx.stack.last() {
            if frame.content_type == Some(ContentType::Empty) {
                let element = frame.name.raw.clone();
                cx.report(DtdError::EmptyContentSpecified { element, what });
            }
        }
    }

    /// Entity reference in content. Parameter entities are named with their `%`.
    pub fn start_entity<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, name: &str) {
        if !cx.active || !cx.standalone {
            return;
        }
        let Some(grammar) = self.grammar.as_deref() else { return };
        if grammar.entity_by_name(name).is_some_and(|e| e.is_external) {
            cx.report(DtdError::StandaloneExternalEntityReference { entity: name.to_string() });
        }
    }

    pub fn end_document<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>) {
        if !cx.active || self.grammar.is_none() {
            return;
        }
        for idref in cx.take_idrefs() {
            if !cx.ids.contains(&idref) {
                cx.report(DtdError::UndeclaredIdRef { idref });
            }
        }
    }

    /// Dispatch one recorded event
    pub fn handle<R: ErrorReporter>(&self, cx: &mut ValidationContext<R>, event: &mut DocumentEvent) {
        match event {
            DocumentEvent::XmlDecl { standalone } => self.xml_decl(cx, *standalone),
            DocumentEvent::DoctypeDecl { root, .. } => self.doctype_decl(cx, root),
            DocumentEvent::StartElement { name, attributes } => self.start_element(cx, name, attributes),
            DocumentEvent::EmptyElement { name, attributes } => self.empty_element(cx, name, attributes),
            DocumentEvent::EndElement { name } => self.end_element(cx, name),
            DocumentEvent::Characters(text) => self.characters(cx, text),
            DocumentEvent::Comment(_) => self.comment(cx),
            DocumentEvent::ProcessingInstruction { target, .. } => self.processing_instruction(cx, target),
            DocumentEvent::StartEntity { name } => self.start_entity(cx, name),
            DocumentEvent::EndEntity { .. } => {}
        }
    }

    /// Validate a whole document and return its reporter
    pub fn validate_events<R: ErrorReporter>(&self, events: impl IntoIterator<Item = DocumentEvent>, reporter: R) -> R {
        let mut cx = ValidationContext::new(reporter);
        self.start_document(&mut cx);
        for mut event in events {
            self.handle(&mut cx, &mut event);
        }
        self.end_document(&mut cx);
        cx.into_reporter()
    }
}
