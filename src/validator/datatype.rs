//! Lexical checks for typed attribute values
//!
//! ID, IDREF and ENTITY values are Names; NMTOKEN values are Nmtokens.
//! List types hold one or more space-separated tokens.

use crate::core::names::{is_name, is_nmtoken, split_tokens};
use crate::grammar::decl::AttributeKind;

/// Type name used in diagnostics
pub fn type_label(kind: AttributeKind, list: bool) -> &'static str {
    match (kind, list) {
        (AttributeKind::Id, _) => "ID",
        (AttributeKind::IdRef, false) => "IDREF",
        (AttributeKind::IdRef, true) => "IDREFS",
        (AttributeKind::Entity, false) => "ENTITY",
        (AttributeKind::Entity, true) => "ENTITIES",
        (AttributeKind::NmToken, false) => "NMTOKEN",
        (AttributeKind::NmToken, true) => "NMTOKENS",
        (AttributeKind::Notation, _) => "NOTATION",
        (AttributeKind::Enumeration, _) => "ENUMERATION",
        (AttributeKind::CData, _) => "CDATA",
    }
}

/// Tokens of a (normalized) value: the whole value, or each list item
pub fn tokens(value: &str, list: bool) -> Vec<&str> {
    if list {
        split_tokens(value).collect()
    } else {
        vec![value]
    }
}

/// Lexical validity of a value for its kind. Enumerations and CDATA are
/// not lexically constrained here.
pub fn is_lexically_valid(kind: AttributeKind, list: bool, value: &str) -> bool {
    let check: fn(&str) -> bool = match kind {
        AttributeKind::Id | AttributeKind::IdRef | AttributeKind::Entity => is_name,
        AttributeKind::NmToken => is_nmtoken,
        _ => return true,
    };
    let toks = tokens(value, list);
    !toks.is_empty() && toks.into_iter().all(check)
}
