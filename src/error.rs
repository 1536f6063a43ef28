//! Diagnostics for declaration and validation problems
//!
//! Validity problems are reported, not returned: every check pushes a
//! [`Diagnostic`] into an [`ErrorReporter`] and processing continues.
//! `DtdError` doubles as the `Err` type for API misuse such as malformed
//! content-model text.

use std::fmt;

/// How serious a reported problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

/// Every problem the grammar engine can report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DtdError {
    // ----- declaration problems -----
    /// `<!ELEMENT>` seen twice for the same name; the second is ignored.
    DuplicateElementDecl { element: String },
    /// `<!ATTLIST>` redefines an attribute; the first definition binds.
    DuplicateAttributeDef { element: String, attribute: String },
    /// A second ID-typed attribute on one element type.
    DuplicateIdAttribute { element: String, attribute: String },
    /// A second NOTATION-typed attribute on one element type.
    DuplicateNotationAttribute { element: String, attribute: String },
    /// The same token listed twice in an enumerated type.
    DuplicateEnumerationToken { element: String, attribute: String, token: String },
    /// A declared default does not satisfy the attribute's type.
    InvalidDefaultValue { element: String, attribute: String, value: String, reason: &'static str },
    /// An ID attribute declared with a default other than `#IMPLIED`/`#REQUIRED`.
    IdAttributeWithDefault { element: String, attribute: String },
    /// A notation named by an NDATA clause or a NOTATION type was never declared.
    UndeclaredNotation { notation: String, referenced_by: String },
    /// NOTATION-typed attribute declared on an EMPTY element.
    NotationOnEmptyElement { element: String, attribute: String },
    /// A mixed content model lists the same child element twice.
    DuplicateMixedChild { element: String, child: String },
    /// A content model names an element that has no declaration.
    UndeclaredElementInContentModel { element: String, child: String },
    /// Unknown attribute type keyword handed to the loader.
    UnknownAttributeType { type_name: String },
    /// Content-model text that cannot be turned into grammar events.
    MalformedContentModel { text: String, position: usize, reason: &'static str },

    // ----- structural problems -----
    /// No DTD is available while validation is mandatory.
    GrammarNotFound { root: String },
    /// The document element differs from the DOCTYPE name.
    RootElementMismatch { doctype_root: String, root: String },
    ElementNotDeclared { element: String },
    /// Child at `index` does not fit the element's content model.
    ContentInvalid { element: String, content_model: String, index: usize },
    /// The children ended before the content model was satisfied.
    ContentIncomplete { element: String, content_model: String },
    /// An EMPTY element has children or character data.
    EmptyElementHasContent { element: String },
    /// A comment or processing instruction inside an EMPTY element.
    EmptyContentSpecified { element: String, what: &'static str },

    // ----- attribute problems -----
    RequiredAttributeMissing { element: String, attribute: String },
    AttributeNotDeclared { element: String, attribute: String },
    FixedValueMismatch { element: String, attribute: String, value: String, fixed: String },
    ValueNotInEnumeration { element: String, attribute: String, value: String, allowed: String },
    /// Value does not match the lexical form of its type (ID, IDREF, NMTOKEN, ...).
    InvalidAttributeValue { element: String, attribute: String, value: String, type_name: &'static str },
    EntityNotDeclared { attribute: String, entity: String },
    EntityNotUnparsed { attribute: String, entity: String },
    DuplicateId { id: String, element: String },
    /// An IDREF that matches no ID by the end of the document.
    UndeclaredIdRef { idref: String },

    // ----- standalone="yes" constraints -----
    StandaloneWhitespaceInExternalElement { element: String },
    StandaloneExternalDefault { element: String, attribute: String },
    StandaloneNormalizationChanged { element: String, attribute: String },
    StandaloneExternalEntityReference { entity: String },
}

impl DtdError {
    /// Severity this problem is reported with.
    pub fn severity(&self) -> Severity {
        use DtdError::*;
        match self {
            DuplicateElementDecl { .. }
            | DuplicateAttributeDef { .. }
            | UndeclaredElementInContentModel { .. } => Severity::Warning,
            GrammarNotFound { .. } | UnknownAttributeType { .. } | MalformedContentModel { .. } => {
                Severity::Fatal
            }
            _ => Severity::Error,
        }
    }

    /// Stable identifier used by the BEAM surface and in tests.
    pub fn code(&self) -> &'static str {
        use DtdError::*;
        match self {
            DuplicateElementDecl { .. } => "duplicate_element_decl",
            DuplicateAttributeDef { .. } => "duplicate_attribute_def",
            DuplicateIdAttribute { .. } => "duplicate_id_attribute",
            DuplicateNotationAttribute { .. } => "duplicate_notation_attribute",
            DuplicateEnumerationToken { .. } => "duplicate_enumeration_token",
            InvalidDefaultValue { .. } => "invalid_default_value",
            IdAttributeWithDefault { .. } => "id_attribute_with_default",
            UndeclaredNotation { .. } => "undeclared_notation",
            NotationOnEmptyElement { .. } => "notation_on_empty_element",
            DuplicateMixedChild { .. } => "duplicate_mixed_child",
            UndeclaredElementInContentModel { .. } => "undeclared_element_in_content_model",
            UnknownAttributeType { .. } => "unknown_attribute_type",
            MalformedContentModel { .. } => "malformed_content_model",
            GrammarNotFound { .. } => "grammar_not_found",
            RootElementMismatch { .. } => "root_element_mismatch",
            ElementNotDeclared { .. } => "element_not_declared",
            ContentInvalid { .. } => "content_invalid",
            ContentIncomplete { .. } => "content_incomplete",
            EmptyElementHasContent { .. } => "empty_element_has_content",
            EmptyContentSpecified { .. } => "empty_content_specified",
            RequiredAttributeMissing { .. } => "required_attribute_missing",
            AttributeNotDeclared { .. } => "attribute_not_declared",
            FixedValueMismatch { .. } => "fixed_value_mismatch",
            ValueNotInEnumeration { .. } => "value_not_in_enumeration",
            InvalidAttributeValue { .. } => "invalid_attribute_value",
            EntityNotDeclared { .. } => "entity_not_declared",
            EntityNotUnparsed { .. } => "entity_not_unparsed",
            DuplicateId { .. } => "duplicate_id",
            UndeclaredIdRef { .. } => "undeclared_idref",
            StandaloneWhitespaceInExternalElement { .. } => "standalone_whitespace",
            StandaloneExternalDefault { .. } => "standalone_external_default",
            StandaloneNormalizationChanged { .. } => "standalone_normalization_changed",
            StandaloneExternalEntityReference { .. } => "standalone_external_entity",
        }
    }
}

impl fmt::Display for DtdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DtdError::*;
        match self {
            DuplicateElementDecl { element } => {
                write!(f, "element type \"{element}\" is declared more than once")
            }
            DuplicateAttributeDef { element, attribute } => write!(
                f,
                "attribute \"{attribute}\" of element type \"{element}\" is declared more than once; the first declaration is used"
            ),
            DuplicateIdAttribute { element, attribute } => write!(
                f,
                "element type \"{element}\" already has an ID attribute, \"{attribute}\" is a second one"
            ),
            DuplicateNotationAttribute { element, attribute } => write!(
                f,
                "element type \"{element}\" already has a NOTATION attribute, \"{attribute}\" is a second one"
            ),
            DuplicateEnumerationToken { element, attribute, token } => write!(
                f,
                "token \"{token}\" appears more than once in the type of attribute \"{attribute}\" of element \"{element}\""
            ),
            InvalidDefaultValue { element, attribute, value, reason } => write!(
                f,
                "default value \"{value}\" of attribute \"{attribute}\" on element \"{element}\" is invalid: {reason}"
            ),
            IdAttributeWithDefault { element, attribute } => write!(
                f,
                "ID attribute \"{attribute}\" of element \"{element}\" must be #IMPLIED or #REQUIRED"
            ),
            UndeclaredNotation { notation, referenced_by } => {
                write!(f, "notation \"{notation}\" referenced by {referenced_by} is not declared")
            }
            NotationOnEmptyElement { element, attribute } => write!(
                f,
                "NOTATION attribute \"{attribute}\" may not be declared on EMPTY element \"{element}\""
            ),
            DuplicateMixedChild { element, child } => write!(
                f,
                "element type \"{child}\" appears more than once in the mixed content of \"{element}\""
            ),
            UndeclaredElementInContentModel { element, child } => write!(
                f,
                "content model of \"{element}\" refers to undeclared element \"{child}\""
            ),
            UnknownAttributeType { type_name } => write!(f, "unknown attribute type \"{type_name}\""),
            MalformedContentModel { text, position, reason } => {
                write!(f, "malformed content model \"{text}\" at {position}: {reason}")
            }
            GrammarNotFound { root } => write!(
                f,
                "document is invalid: no grammar found for root element \"{root}\""
            ),
            RootElementMismatch { doctype_root, root } => write!(
                f,
                "document root element \"{root}\" must match DOCTYPE root \"{doctype_root}\""
            ),
            ElementNotDeclared { element } => write!(f, "element type \"{element}\" must be declared"),
            ContentInvalid { element, content_model, index } => write!(
                f,
                "content of element type \"{element}\" must match \"{content_model}\" (child {index} does not fit)"
            ),
            ContentIncomplete { element, content_model } => write!(
                f,
                "content of element type \"{element}\" is incomplete, it must match \"{content_model}\""
            ),
            EmptyElementHasContent { element } => {
                write!(f, "element type \"{element}\" is declared EMPTY but has content")
            }
            EmptyContentSpecified { element, what } => write!(
                f,
                "element type \"{element}\" is declared EMPTY, a {what} is not allowed"
            ),
            RequiredAttributeMissing { element, attribute } => write!(
                f,
                "attribute \"{attribute}\" is required and must be specified for element type \"{element}\""
            ),
            AttributeNotDeclared { element, attribute } => write!(
                f,
                "attribute \"{attribute}\" must be declared for element type \"{element}\""
            ),
            FixedValueMismatch { element, attribute, value, fixed } => write!(
                f,
                "attribute \"{attribute}\" of element \"{element}\" has value \"{value}\" but must be \"{fixed}\""
            ),
            ValueNotInEnumeration { element, attribute, value, allowed } => write!(
                f,
                "attribute \"{attribute}\" of element \"{element}\" has value \"{value}\" which is not in {allowed}"
            ),
            InvalidAttributeValue { element, attribute, value, type_name } => write!(
                f,
                "value \"{value}\" of attribute \"{attribute}\" on element \"{element}\" is not a valid {type_name}"
            ),
            EntityNotDeclared { attribute, entity } => write!(
                f,
                "attribute \"{attribute}\" refers to entity \"{entity}\" which is not declared"
            ),
            EntityNotUnparsed { attribute, entity } => write!(
                f,
                "attribute \"{attribute}\" refers to entity \"{entity}\" which is not an unparsed entity"
            ),
            DuplicateId { id, element } => {
                write!(f, "ID value \"{id}\" on element \"{element}\" is not unique")
            }
            UndeclaredIdRef { idref } => {
                write!(f, "there is no ID/IDREF binding for IDREF \"{idref}\"")
            }
            StandaloneWhitespaceInExternalElement { element } => write!(
                f,
                "white space in element content of externally declared \"{element}\" is not allowed in a standalone document"
            ),
            StandaloneExternalDefault { element, attribute } => write!(
                f,
                "attribute \"{attribute}\" of \"{element}\" has an externally declared default, which is not allowed in a standalone document"
            ),
            StandaloneNormalizationChanged { element, attribute } => write!(
                f,
                "value of externally declared attribute \"{attribute}\" of \"{element}\" changed during normalization in a standalone document"
            ),
            StandaloneExternalEntityReference { entity } => write!(
                f,
                "reference to externally declared entity \"{entity}\" is not allowed in a standalone document"
            ),
        }
    }
}

impl std::error::Error for DtdError {}

/// A reported problem with its severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: DtdError,
}

impl Diagnostic {
    pub fn new(error: DtdError) -> Self {
        Diagnostic { severity: error.severity(), error }
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.as_str(), self.error)
    }
}

/// Sink for diagnostics
///
/// Implementations must not abort processing; the engine keeps going after
/// every report.
pub trait ErrorReporter {
    fn report(&mut self, diagnostic: Diagnostic);

    /// Report an error with its default severity.
    fn error(&mut self, error: DtdError) {
        self.report(Diagnostic::new(error));
    }
}

impl ErrorReporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// In-memory reporter used by the NIF surface and the tests
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// True if anything at Error severity or above was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= Severity::Error)
    }

    /// Number of diagnostics carrying the given code.
    pub fn count(&self, code: &str) -> usize {
        self.diagnostics.iter().filter(|d| d.code() == code).count()
    }
}

impl ErrorReporter for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::trace!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severities() {
        let warn = DtdError::DuplicateElementDecl { element: "a".into() };
        let err = DtdError::ElementNotDeclared { element: "a".into() };
        let fatal = DtdError::GrammarNotFound { root: "a".into() };
        assert_eq!(warn.severity(), Severity::Warning);
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(fatal.severity(), Severity::Fatal);
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.error(DtdError::DuplicateElementDecl { element: "a".into() });
        assert!(!collector.has_errors());
        collector.error(DtdError::UndeclaredIdRef { idref: "x".into() });
        assert!(collector.has_errors());
        assert_eq!(collector.count("undeclared_idref"), 1);
        assert_eq!(collector.take().len(), 2);
        assert!(collector.diagnostics().is_empty());
    }

    #[test]
    fn test_display_mentions_names() {
        let d = Diagnostic::new(DtdError::UndeclaredNotation {
            notation: "foo".into(),
            referenced_by: "attribute \"n\" of \"e\"".into(),
        });
        let msg = d.to_string();
        assert!(msg.starts_with("[error]"));
        assert!(msg.contains("\"foo\""));
    }
}
