//! ResourceArc Wrappers
//!
//! A sealed grammar handed to the BEAM. Grammars are immutable, so the
//! resource holds a plain `Arc` with no lock.

use std::sync::Arc;

use rustler::ResourceArc;

use crate::grammar::DtdGrammar;

pub struct GrammarResource {
    pub grammar: Arc<DtdGrammar>,
}

impl GrammarResource {
    pub fn new(grammar: Arc<DtdGrammar>) -> Self {
        GrammarResource { grammar }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for GrammarResource {}

/// Type alias for the ResourceArc
pub type GrammarRef = ResourceArc<GrammarResource>;
