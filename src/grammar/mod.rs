//! DTD grammar
//!
//! - Store: arenas of element, attribute, content-spec, entity and notation records
//! - Builder: content-model events to binary trees (minimal or balanced)
//! - Loader: DTD event intake and declaration-time checks
//! - Dtd: the sealed, shareable grammar
//! - Pool: LRU cache of sealed grammars

pub mod builder;
pub mod content_model;
pub mod decl;
pub mod description;
pub mod dtd;
pub mod loader;
pub mod pool;
pub mod store;

pub use builder::{Occurrence, Separator, TreeShape};
pub use decl::{AttributeKind, ContentSpecKind, ContentSpecNode, ContentType, DefaultType};
pub use description::{GrammarDescription, GrammarKey, ResourceIdentifier};
pub use dtd::DtdGrammar;
pub use loader::{AttributeDef, DtdEvent, DtdHandler, DtdLoader, LoaderConfig};
pub use pool::GrammarPool;
