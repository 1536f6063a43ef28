//! RustyDTD - DTD grammars and validation
//!
//! Layers:
//! - grammar: declaration store, content-model builders, loader, sealed grammar, pool
//! - model: compiled content matchers (simple, mixed, DFA)
//! - validator: attribute defaulting and content checks over document events
//! - strategy: parallel validation of many documents against one grammar

use std::sync::{Arc, LazyLock};

use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

pub mod core;
pub mod error;
pub mod grammar;
pub mod model;
pub mod strategy;
pub mod validator;

mod resource;
mod term;

use error::{DiagnosticCollector, ErrorReporter};
use grammar::{DtdLoader, GrammarDescription, GrammarPool, LoaderConfig, ResourceIdentifier, TreeShape};
use resource::{GrammarRef, GrammarResource};
use term::{decode_declaration, decode_events, diagnostics_to_term};
use validator::{DtdValidator, ValidatorConfig};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Grammars compiled with a system or public id, shared across calls
static POOL: LazyLock<GrammarPool> = LazyLock::new(GrammarPool::default);

// ============================================================================
// Grammar Construction
// ============================================================================

/// Build a grammar from declaration tuples. Returns `{grammar_ref, diagnostics}`.
#[rustler::nif]
fn dtd_compile<'a>(
    env: Env<'a>,
    root: Option<String>,
    public_id: Option<String>,
    system_id: Option<String>,
    declarations: Vec<Term<'a>>,
    balanced: bool,
) -> NifResult<Term<'a>> {
    let id = ResourceIdentifier { public_id, literal_system_id: system_id, base_system_id: None };
    let shape = if balanced { TreeShape::Balanced } else { TreeShape::Minimal };
    let mut loader = DtdLoader::new(
        GrammarDescription::new(root.as_deref(), id),
        LoaderConfig::default().with_tree_shape(shape),
        DiagnosticCollector::new(),
    );

    // Malformed declarations are reported alongside validity problems
    let mut rejected = DiagnosticCollector::new();
    for decl in declarations {
        if let Err(e) = loader.apply(&decode_declaration(decl)?) {
            rejected.error(e);
        }
    }
    let (grammar, reporter) = loader.end_dtd();
    let mut diagnostics = reporter.into_diagnostics();
    diagnostics.extend(rejected.into_diagnostics());

    let grammar = Arc::new(grammar);
    POOL.put(Arc::clone(&grammar));
    let resource = ResourceArc::new(GrammarResource::new(grammar));
    Ok((resource, diagnostics_to_term(env, &diagnostics)?).encode(env))
}

/// Fetch a grammar compiled earlier under the same public/system id that
/// accepts `root` as its document element (any root when nil)
#[rustler::nif]
fn dtd_lookup(root: Option<String>, public_id: Option<String>, system_id: Option<String>) -> Option<GrammarRef> {
    let id = ResourceIdentifier { public_id, literal_system_id: system_id, base_system_id: None };
    POOL.retrieve(&GrammarDescription::new(root.as_deref(), id))
        .map(|grammar| ResourceArc::new(GrammarResource::new(grammar)))
}

// ============================================================================
// Grammar Queries
// ============================================================================

#[rustler::nif]
fn dtd_content_spec(grammar_ref: GrammarRef, element: &str) -> Option<String> {
    let grammar = &grammar_ref.grammar;
    grammar.element_decl_index(element).and_then(|i| grammar.content_spec_as_string(i))
}

/// Declared element names in declaration order
#[rustler::nif]
fn dtd_element_names(grammar_ref: GrammarRef) -> Vec<String> {
    grammar_ref
        .grammar
        .element_decls()
        .filter(|(_, decl)| decl.is_declared())
        .map(|(_, decl)| decl.name.raw.clone())
        .collect()
}

/// `[{name, type, default_value | nil}]` for one element
#[rustler::nif]
fn dtd_attributes(grammar_ref: GrammarRef, element: &str) -> Vec<(String, String, Option<String>)> {
    let grammar = &grammar_ref.grammar;
    let Some(index) = grammar.element_decl_index(element) else {
        return Vec::new();
    };
    grammar
        .attribute_decls(index)
        .map(|(_, decl)| {
            let simple = &decl.simple_type;
            (decl.name.raw.clone(), simple.type_name().into_owned(), simple.default_value.clone())
        })
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

/// Validate one document given as event tuples. Returns its diagnostics.
#[rustler::nif(schedule = "DirtyCpu")]
fn dtd_validate<'a>(
    env: Env<'a>,
    grammar_ref: GrammarRef,
    events: Vec<Term<'a>>,
    namespaces: bool,
) -> NifResult<Term<'a>> {
    let events = decode_events(events)?;
    let config = ValidatorConfig::default().with_namespaces(namespaces);
    let validator = DtdValidator::new(Arc::clone(&grammar_ref.grammar)).with_config(config);
    let reporter = validator.validate_events(events, DiagnosticCollector::new());
    diagnostics_to_term(env, reporter.diagnostics())
}

/// Validate many documents in parallel. Returns one diagnostics list per document.
#[rustler::nif(schedule = "DirtyCpu")]
fn dtd_validate_many<'a>(env: Env<'a>, grammar_ref: GrammarRef, documents: Vec<Vec<Term<'a>>>) -> NifResult<Term<'a>> {
    // Terms are bound to this env; decode on the calling thread
    let documents = documents.into_iter().map(decode_events).collect::<NifResult<Vec<_>>>()?;
    let results = strategy::validate_documents(&grammar_ref.grammar, &documents);

    let mut list = Term::list_new_empty(env);
    for diagnostics in results.iter().rev() {
        list = list.list_prepend(diagnostics_to_term(env, diagnostics)?);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyDTD.Native");
