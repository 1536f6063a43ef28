//! Elixir Term Conversion Utilities
//!
//! Decodes declaration and document-event tuples coming from Elixir and
//! encodes diagnostics going back.
//!
//! Declarations:
//!
//! ```text
//! {:element, name, content_model}
//! {:attribute, element, name, type, enumeration, default_type | nil, default_value | nil}
//! {:internal_entity, name, value}
//! {:external_entity, name, public_id | nil, system_id | nil}
//! {:unparsed_entity, name, public_id | nil, system_id | nil, notation}
//! {:notation, name, public_id | nil, system_id | nil}
//! {:start_parameter_entity, name} | {:end_parameter_entity, name}
//! :start_external_subset | :end_external_subset
//! ```
//!
//! Document events:
//!
//! ```text
//! {:xml_decl, standalone | nil}
//! {:doctype, root, public_id | nil, system_id | nil}
//! {:start_element, name, [{name, value} | {name, value, raw_value}]}
//! {:empty_element, name, attributes}
//! {:end_element, name}
//! {:characters, text} | {:comment, text} | {:processing_instruction, target, data}
//! {:start_entity, name} | {:end_entity, name}
//! ```

use rustler::types::tuple::get_tuple;
use rustler::{Atom, Encoder, Env, Error, NewBinary, NifResult, Term};

use crate::core::QName;
use crate::error::{Diagnostic, Severity};
use crate::grammar::{AttributeDef, DtdEvent, ResourceIdentifier};
use crate::validator::{Attributes, DocumentEvent, XmlAttribute};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    error,
    warning,
    fatal,
    element,
    attribute,
    internal_entity,
    external_entity,
    unparsed_entity,
    notation,
    start_external_subset,
    end_external_subset,
    start_parameter_entity,
    end_parameter_entity,
    xml_decl,
    doctype,
    start_element,
    empty_element,
    end_element,
    characters,
    comment,
    processing_instruction,
    start_entity,
    end_entity,
}

/// Split a tagged tuple (or bare atom) into its tag and fields
fn tagged<'a>(term: Term<'a>) -> NifResult<(Atom, Vec<Term<'a>>)> {
    if term.is_atom() {
        return Ok((term.decode()?, Vec::new()));
    }
    let mut fields = get_tuple(term)?;
    if fields.is_empty() {
        return Err(Error::BadArg);
    }
    let tag = fields.remove(0).decode()?;
    Ok((tag, fields))
}

fn field<'a, T: rustler::Decoder<'a>>(fields: &[Term<'a>], index: usize) -> NifResult<T> {
    fields.get(index).ok_or(Error::BadArg)?.decode()
}

fn identifier<'a>(fields: &[Term<'a>], public: usize, system: usize) -> NifResult<ResourceIdentifier> {
    Ok(ResourceIdentifier {
        public_id: field(fields, public)?,
        literal_system_id: field(fields, system)?,
        base_system_id: None,
    })
}

pub fn decode_declaration(term: Term) -> NifResult<DtdEvent> {
    let (tag, f) = tagged(term)?;
    let event = if tag == element() {
        DtdEvent::Element { name: field(&f, 0)?, content_model: field(&f, 1)? }
    } else if tag == attribute() {
        DtdEvent::Attribute(AttributeDef {
            element: field(&f, 0)?,
            name: field(&f, 1)?,
            type_name: field(&f, 2)?,
            enumeration: field(&f, 3)?,
            default_type: field(&f, 4)?,
            default_value: field(&f, 5)?,
        })
    } else if tag == internal_entity() {
        DtdEvent::InternalEntity { name: field(&f, 0)?, value: field(&f, 1)? }
    } else if tag == external_entity() {
        DtdEvent::ExternalEntity { name: field(&f, 0)?, id: identifier(&f, 1, 2)? }
    } else if tag == unparsed_entity() {
        DtdEvent::UnparsedEntity { name: field(&f, 0)?, id: identifier(&f, 1, 2)?, notation: field(&f, 3)? }
    } else if tag == notation() {
        DtdEvent::Notation { name: field(&f, 0)?, id: identifier(&f, 1, 2)? }
    } else if tag == start_external_subset() {
        DtdEvent::StartExternalSubset
    } else if tag == end_external_subset() {
        DtdEvent::EndExternalSubset
    } else if tag == start_parameter_entity() {
        DtdEvent::StartParameterEntity(field(&f, 0)?)
    } else if tag == end_parameter_entity() {
        DtdEvent::EndParameterEntity(field(&f, 0)?)
    } else {
        return Err(Error::BadArg);
    };
    Ok(event)
}

fn decode_attributes(term: Term) -> NifResult<Attributes> {
    let mut attributes = Attributes::new();
    for item in term.decode::<Vec<Term>>()? {
        let f = get_tuple(item)?;
        let name: String = field(&f, 0)?;
        let value: String = field(&f, 1)?;
        let mut attr = XmlAttribute::new(&name, &value);
        if f.len() > 2 {
            attr.non_normalized_value = field(&f, 2)?;
        }
        attributes.push(attr);
    }
    Ok(attributes)
}

pub fn decode_event(term: Term) -> NifResult<DocumentEvent> {
    let (tag, f) = tagged(term)?;
    let qname = |i: usize| -> NifResult<QName> { field::<String>(&f, i).map(|n| QName::new(&n)) };
    let event = if tag == start_element() {
        DocumentEvent::StartElement { name: qname(0)?, attributes: decode_attributes(*f.get(1).ok_or(Error::BadArg)?)? }
    } else if tag == empty_element() {
        DocumentEvent::EmptyElement { name: qname(0)?, attributes: decode_attributes(*f.get(1).ok_or(Error::BadArg)?)? }
    } else if tag == end_element() {
        DocumentEvent::EndElement { name: qname(0)? }
    } else if tag == characters() {
        DocumentEvent::Characters(field(&f, 0)?)
    } else if tag == comment() {
        DocumentEvent::Comment(field(&f, 0)?)
    } else if tag == processing_instruction() {
        DocumentEvent::ProcessingInstruction { target: field(&f, 0)?, data: field(&f, 1)? }
    } else if tag == start_entity() {
        DocumentEvent::StartEntity { name: field(&f, 0)? }
    } else if tag == end_entity() {
        DocumentEvent::EndEntity { name: field(&f, 0)? }
    } else if tag == xml_decl() {
        DocumentEvent::XmlDecl { standalone: field(&f, 0)? }
    } else if tag == doctype() {
        DocumentEvent::DoctypeDecl { root: field(&f, 0)?, public_id: field(&f, 1)?, system_id: field(&f, 2)? }
    } else {
        return Err(Error::BadArg);
    };
    Ok(event)
}

pub fn decode_events(terms: Vec<Term>) -> NifResult<Vec<DocumentEvent>> {
    terms.into_iter().map(decode_event).collect()
}

fn severity_atom(severity: Severity) -> Atom {
    match severity {
        Severity::Warning => warning(),
        Severity::Error => error(),
        Severity::Fatal => fatal(),
    }
}

/// `[{severity, code, message}]`, in report order
pub fn diagnostics_to_term<'a>(env: Env<'a>, diagnostics: &[Diagnostic]) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for d in diagnostics.iter().rev() {
        let code = Atom::from_str(env, d.code())?;
        let message = str_to_binary(env, &d.error.to_string());
        list = list.list_prepend((severity_atom(d.severity), code, message).encode(env));
    }
    Ok(list)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
