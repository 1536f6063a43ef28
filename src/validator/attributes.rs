//! Attribute defaulting, normalization and typed-value checks
//!
//! Runs once per start tag of a declared element:
//!
//! 1. Missing attributes: `#REQUIRED` ones are reported, defaulted ones are
//!    inserted with `specified = false`
//! 2. Every attribute: declared check, type name attached, non-CDATA values
//!    normalized, `#FIXED` value compared, then the type-specific check

use memchr::memchr;

use super::context::ValidationContext;
use super::datatype::{is_lexically_valid, tokens, type_label};
use super::events::{Attributes, XmlAttribute};
use crate::core::names::normalize_spaces;
use crate::core::QName;
use crate::error::{DtdError, ErrorReporter};
use crate::grammar::decl::{AttributeDecl, AttributeKind, DefaultType, ElementIndex};
use crate::grammar::DtdGrammar;

pub(crate) fn process_attributes<R: ErrorReporter>(
    grammar: &DtdGrammar,
    namespaces: bool,
    cx: &mut ValidationContext<R>,
    element_index: ElementIndex,
    element: &QName,
    attributes: &mut Attributes,
) {
    insert_defaults(grammar, namespaces, cx, element_index, element, attributes);

    for i in 0..attributes.len() {
        let Some(attr) = attributes.item_mut(i) else { continue };

        if cx.standalone {
            if let Some(entity) = external_entity_ref(grammar, &attr.non_normalized_value) {
                cx.report(DtdError::StandaloneExternalEntityReference { entity });
            }
        }

        let Some(attr_index) = grammar.attribute_decl_index(element_index, &attr.name.raw) else {
            cx.report(DtdError::AttributeNotDeclared {
                element: element.raw.clone(),
                attribute: attr.name.raw.clone(),
            });
            continue;
        };
        let Some(decl) = grammar.attribute_decl(attr_index) else { continue };
        let simple = &decl.simple_type;
        attr.type_name = simple.type_name().into_owned();

        if attr.specified && simple.kind != AttributeKind::CData {
            if let Some(normalized) = normalize_spaces(&attr.value) {
                attr.value = normalized;
                if cx.standalone && decl.is_external {
                    cx.report(DtdError::StandaloneNormalizationChanged {
                        element: element.raw.clone(),
                        attribute: attr.name.raw.clone(),
                    });
                }
            }
        }

        if simple.default_type == DefaultType::Fixed {
            let fixed = simple.default_value.as_deref().unwrap_or_default();
            if attr.value != fixed {
                cx.report(DtdError::FixedValueMismatch {
                    element: element.raw.clone(),
                    attribute: attr.name.raw.clone(),
                    value: attr.value.clone(),
                    fixed: fixed.to_string(),
                });
            }
        }

        check_typed_value(grammar, cx, element, decl, &attr.value);
    }
}

fn insert_defaults<R: ErrorReporter>(
    grammar: &DtdGrammar,
    namespaces: bool,
    cx: &mut ValidationContext<R>,
    element_index: ElementIndex,
    element: &QName,
    attributes: &mut Attributes,
) {
    for (_, decl) in grammar.attribute_decls(element_index) {
        if attributes.index_of(&decl.name.raw).is_some() {
            continue;
        }
        let simple = &decl.simple_type;
        if simple.default_type == DefaultType::Required {
            cx.report(DtdError::RequiredAttributeMissing {
                element: element.raw.clone(),
                attribute: decl.name.raw.clone(),
            });
            continue;
        }
        let Some(value) = simple.default_value.as_deref() else { continue };

        if cx.standalone && decl.is_external {
            cx.report(DtdError::StandaloneExternalDefault {
                element: element.raw.clone(),
                attribute: decl.name.raw.clone(),
            });
        }

        let name = if namespaces {
            QName::new(&decl.name.raw)
        } else {
            QName::unprefixed(&decl.name.raw)
        };
        log::trace!("defaulting {}@{} = {:?}", element, decl.name, value);
        attributes.push(XmlAttribute {
            name,
            value: value.to_string(),
            non_normalized_value: simple.non_normalized_default.clone().unwrap_or_else(|| value.to_string()),
            type_name: simple.type_name().into_owned(),
            specified: false,
        });
    }
}

fn check_typed_value<R: ErrorReporter>(
    grammar: &DtdGrammar,
    cx: &mut ValidationContext<R>,
    element: &QName,
    decl: &AttributeDecl,
    value: &str,
) {
    let simple = &decl.simple_type;
    let attribute = &decl.name.raw;
    match simple.kind {
        AttributeKind::CData => {}
        AttributeKind::Enumeration | AttributeKind::Notation => {
            if !simple.enumeration.iter().any(|t| t == value) {
                cx.report(DtdError::ValueNotInEnumeration {
                    element: element.raw.clone(),
                    attribute: attribute.clone(),
                    value: value.to_string(),
                    allowed: simple.enumeration_string(),
                });
            }
        }
        kind => {
            if !is_lexically_valid(kind, simple.list, value) {
                cx.report(DtdError::InvalidAttributeValue {
                    element: element.raw.clone(),
                    attribute: attribute.clone(),
                    value: value.to_string(),
                    type_name: type_label(kind, simple.list),
                });
                return;
            }
            match kind {
                AttributeKind::Id => {
                    if !cx.ids.insert(value.to_string()) {
                        cx.report(DtdError::DuplicateId { id: value.to_string(), element: element.raw.clone() });
                    }
                }
                AttributeKind::IdRef => {
                    for idref in tokens(value, simple.list) {
                        cx.add_idref(idref);
                    }
                }
                AttributeKind::Entity => {
                    for entity in tokens(value, simple.list) {
                        if !grammar.is_entity_declared(entity) {
                            cx.report(DtdError::EntityNotDeclared {
                                attribute: attribute.clone(),
                                entity: entity.to_string(),
                            });
                        } else if !grammar.is_entity_unparsed(entity) {
                            cx.report(DtdError::EntityNotUnparsed {
                                attribute: attribute.clone(),
                                entity: entity.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// First `&name;` in a raw attribute value that names an entity declared
/// in the external subset
fn external_entity_ref(grammar: &DtdGrammar, raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut pos = 0;
    while let Some(offset) = memchr(b'&', &bytes[pos..]) {
        let start = pos + offset + 1;
        // Character references are never external
        if bytes.get(start) == Some(&b'#') {
            pos = start;
            continue;
        }
        let end = start + memchr(b';', &bytes[start..])?;
        let name = &raw[start..end];
        if grammar.entity_by_name(name).is_some_and(|e| e.is_external) {
            return Some(name.to_string());
        }
        pos = end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticCollector;
    use crate::grammar::{AttributeDef, DtdHandler, DtdLoader, GrammarDescription, LoaderConfig, ResourceIdentifier};

    fn grammar() -> DtdGrammar {
        let mut l = DtdLoader::new(GrammarDescription::default(), LoaderConfig::default(), DiagnosticCollector::new());
        l.element_decl_text("e", "EMPTY").unwrap();
        l.attribute_decl(&AttributeDef::new("e", "d", "CDATA").with_default(None, Some("x"))).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "r", "CDATA").with_default(Some("#REQUIRED"), None)).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "i", "CDATA").with_default(Some("#IMPLIED"), None)).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "f", "CDATA").with_default(Some("#FIXED"), Some("1"))).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "t", "NMTOKENS")).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "c", "ENUMERATION").with_enumeration(&["r", "g"])).unwrap();
        l.attribute_decl(&AttributeDef::new("e", "x:l", "CDATA").with_default(None, Some("v"))).unwrap();
        l.internal_entity_decl("int", "i");
        l.start_external_subset();
        l.internal_entity_decl("ext", "e");
        l.end_external_subset();
        l.end_dtd().0
    }

    fn run(g: &DtdGrammar, pairs: &[(&str, &str)], standalone: bool) -> (Attributes, DiagnosticCollector) {
        let mut cx = ValidationContext::default();
        cx.standalone = standalone;
        let e = g.element_decl_index("e").unwrap();
        let mut attrs = Attributes::from_pairs(pairs.iter().copied());
        process_attributes(g, true, &mut cx, e, &QName::new("e"), &mut attrs);
        (attrs, cx.into_reporter())
    }

    #[test]
    fn test_defaults_inserted_unspecified() {
        let g = grammar();
        let (attrs, reporter) = run(&g, &[("r", "1")], false);
        let d = attrs.get("d").unwrap();
        assert_eq!(d.value, "x");
        assert!(!d.specified);
        assert_eq!(d.type_name, "CDATA");
        assert!(attrs.get("i").is_none());
        assert_eq!(attrs.get("f").unwrap().value, "1");
        let l = attrs.get("x:l").unwrap();
        assert_eq!(l.name.prefix.as_deref(), Some("x"));
        assert!(reporter.diagnostics().is_empty(), "{:?}", reporter.diagnostics());
    }

    #[test]
    fn test_required_missing_and_undeclared() {
        let g = grammar();
        let (_, reporter) = run(&g, &[("zzz", "1")], false);
        assert_eq!(reporter.count("required_attribute_missing"), 1);
        assert_eq!(reporter.count("attribute_not_declared"), 1);
    }

    #[test]
    fn test_normalization_and_types() {
        let g = grammar();
        let (attrs, reporter) = run(&g, &[("r", "1"), ("t", "  a   b "), ("c", "g")], false);
        assert_eq!(attrs.value("t"), Some("a b"));
        assert_eq!(attrs.get("t").unwrap().type_name, "NMTOKENS");
        assert_eq!(attrs.get("c").unwrap().type_name, "(r|g)");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_fixed_and_enumeration_violations() {
        let g = grammar();
        let (_, reporter) = run(&g, &[("r", "1"), ("f", "2"), ("c", "b"), ("t", "a,b")], false);
        assert_eq!(reporter.count("fixed_value_mismatch"), 1);
        assert_eq!(reporter.count("value_not_in_enumeration"), 1);
        assert_eq!(reporter.count("invalid_attribute_value"), 1);
    }

    #[test]
    fn test_standalone_external_entity_in_value() {
        let g = grammar();
        let mut cx = ValidationContext::default();
        cx.standalone = true;
        let e = g.element_decl_index("e").unwrap();
        let mut attrs = Attributes::new();
        attrs.push(XmlAttribute::new("r", "1"));
        let mut d = XmlAttribute::new("d", "e and i");
        d.non_normalized_value = "&ext; and &int; &#38;".into();
        attrs.push(d);
        process_attributes(&g, true, &mut cx, e, &QName::new("e"), &mut attrs);
        let reporter = cx.into_reporter();
        assert_eq!(reporter.count("standalone_external_entity"), 1);
    }
}
