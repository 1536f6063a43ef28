//! Validation strategies
//!
//! - Sequential: one [`DtdValidator`](crate::validator::DtdValidator) pass per document
//! - Parallel: many documents against one shared grammar, via Rayon

pub mod parallel;

pub use parallel::{validate_documents, validate_documents_with};
