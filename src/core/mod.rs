//! Core XML primitives
//!
//! - Names: XML Name / Nmtoken lexical checks and attribute-value space normalization
//! - QName: qualified names with prefix/local split (memchr-based)

pub mod names;
pub mod qname;

pub use qname::QName;
