//! Parallel document validation
//!
//! A sealed grammar is read-only, so one `Arc<DtdGrammar>` serves every
//! worker. Each document gets its own context and reporter.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Diagnostic, DiagnosticCollector};
use crate::grammar::DtdGrammar;
use crate::validator::{DocumentEvent, DtdValidator, ValidatorConfig};

/// Validate each recorded document in parallel, preserving input order
pub fn validate_documents(grammar: &Arc<DtdGrammar>, documents: &[Vec<DocumentEvent>]) -> Vec<Vec<Diagnostic>> {
    validate_documents_with(grammar, ValidatorConfig::default(), documents)
}

pub fn validate_documents_with(
    grammar: &Arc<DtdGrammar>,
    config: ValidatorConfig,
    documents: &[Vec<DocumentEvent>],
) -> Vec<Vec<Diagnostic>> {
    let validator = DtdValidator::new(Arc::clone(grammar)).with_config(config);
    documents
        .par_iter()
        .map(|events| {
            validator
                .validate_events(events.iter().cloned(), DiagnosticCollector::new())
                .into_diagnostics()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticCollector;
    use crate::grammar::{DtdLoader, GrammarDescription, LoaderConfig};

    fn grammar() -> Arc<DtdGrammar> {
        let mut l = DtdLoader::new(GrammarDescription::default(), LoaderConfig::balanced(), DiagnosticCollector::new());
        l.element_decl_text("list", "(item+)").unwrap();
        l.element_decl_text("item", "(#PCDATA)").unwrap();
        Arc::new(l.end_dtd().0)
    }

    fn list(items: usize) -> Vec<DocumentEvent> {
        let mut events = vec![DocumentEvent::start("list", &[])];
        for _ in 0..items {
            events.push(DocumentEvent::start("item", &[]));
            events.push(DocumentEvent::text("x"));
            events.push(DocumentEvent::end("item"));
        }
        events.push(DocumentEvent::end("list"));
        events
    }

    #[test]
    fn test_results_keep_document_order() {
        let g = grammar();
        let docs: Vec<_> = (0..64).map(|i| list(i % 3)).collect();
        let results = validate_documents(&g, &docs);
        assert_eq!(results.len(), 64);
        for (i, diags) in results.iter().enumerate() {
            if i % 3 == 0 {
                assert_eq!(diags.len(), 1);
                assert_eq!(diags[0].code(), "content_incomplete");
            } else {
                assert!(diags.is_empty(), "doc {i}: {diags:?}");
            }
        }
    }

    #[test]
    fn test_empty_batch() {
        assert!(validate_documents(&grammar(), &[]).is_empty());
    }
}
