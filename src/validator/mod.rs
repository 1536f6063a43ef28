//! Document validation against a sealed DTD grammar
//!
//! The validator consumes document events (start tags with their
//! attributes, character data, comments, entity boundaries) and reports
//! every validity problem it finds without stopping.

mod attributes;
pub mod context;
pub mod datatype;
pub mod dtd_validator;
pub mod events;

pub use context::ValidationContext;
pub use dtd_validator::{DtdValidator, ValidatorConfig};
pub use events::{Attributes, DocumentEvent, XmlAttribute};
