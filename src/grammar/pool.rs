//! Grammar Pool
//!
//! LRU cache of sealed grammars keyed by their description, so documents
//! naming the same external subset share one compiled grammar.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use log::debug;
use lru::LruCache;

use super::description::{GrammarDescription, GrammarKey};
use super::dtd::DtdGrammar;

const DEFAULT_CAPACITY: usize = 32;

pub struct GrammarPool {
    cache: Mutex<LruCache<GrammarKey, Arc<DtdGrammar>>>,
}

impl GrammarPool {
    pub fn new(capacity: NonZeroUsize) -> Self {
        GrammarPool {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a grammar for the description; a hit refreshes its recency.
    ///
    /// When the description names a root element, the cached grammar must
    /// accept it as its document element.
    pub fn retrieve(&self, description: &GrammarDescription) -> Option<Arc<DtdGrammar>> {
        let key = description.key()?;
        let mut cache = self.cache.lock().ok()?;
        let hit = cache.get(&key).filter(|cached| match description.root_name.as_deref() {
            Some(root) => cached.description().accepts_root(root),
            None => true,
        });
        debug!("grammar pool {} for {:?}", if hit.is_some() { "hit" } else { "miss" }, key);
        hit.cloned()
    }

    /// Cache a sealed grammar. Returns false when it has no identifying id.
    pub fn put(&self, grammar: Arc<DtdGrammar>) -> bool {
        let Some(key) = grammar.description().key() else {
            return false;
        };
        let Ok(mut cache) = self.cache.lock() else {
            return false;
        };
        cache.put(key, grammar);
        true
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Default for GrammarPool {
    fn default() -> Self {
        GrammarPool::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
