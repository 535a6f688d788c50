//! Process-wide cache of compiled expression trees.
//!
//! Entries map source text to a weak reference, so the cache never keeps a
//! tree alive on its own: a lookup succeeds only while some `Expression`
//! (or other owner) still holds the tree. Dead entries are swept on every
//! insertion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::RwLock;
use reckon_syntax::Node;
use tracing::{debug, trace};

use crate::error::CompileError;

struct ExpressionCache {
    enabled: AtomicBool,
    entries: RwLock<HashMap<String, Weak<Node>>>,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

static CACHE: LazyLock<ExpressionCache> = LazyLock::new(ExpressionCache::default);

impl ExpressionCache {
    fn get(&self, text: &str) -> Option<Arc<Node>> {
        let entries = self.entries.read();
        entries.get(text).and_then(Weak::upgrade)
    }

    fn insert(&self, text: &str, tree: &Arc<Node>) {
        let mut entries = self.entries.write();
        // Checked under the lock so a concurrent disable cannot be undone.
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        entries.insert(text.to_string(), Arc::downgrade(tree));
        trace!(expression = text, "added to cache");

        entries.retain(|key, entry| {
            let alive = entry.strong_count() > 0;
            if !alive {
                trace!(expression = key.as_str(), "removed from cache");
            }
            alive
        });
    }
}

/// Parse `text`, consulting the shared cache unless `no_cache` is set or
/// caching is disabled.
pub fn compile(text: &str, no_cache: bool) -> Result<Arc<Node>, CompileError> {
    let use_cache = !no_cache && is_enabled();

    if use_cache {
        if let Some(tree) = CACHE.get(text) {
            debug!(expression = text, "expression retrieved from cache");
            return Ok(tree);
        }
    }

    let (tree, diagnostics) = reckon_parser::parse(text);
    let tree = match tree {
        Some(tree) => Arc::new(tree),
        None => return Err(CompileError::syntax(text, diagnostics)),
    };

    if use_cache {
        CACHE.insert(text, &tree);
    }
    Ok(tree)
}

/// Turn the cache on or off. Turning it off drops every entry.
pub fn set_enabled(enabled: bool) {
    CACHE.enabled.store(enabled, Ordering::Release);
    if !enabled {
        clear();
    }
    debug!(enabled, "expression cache toggled");
}

pub fn is_enabled() -> bool {
    CACHE.enabled.load(Ordering::Acquire)
}

/// Number of entries, including ones whose tree has been dropped but not
/// yet swept.
pub fn len() -> usize {
    CACHE.entries.read().len()
}

/// Number of entries whose tree is still alive.
pub fn live_len() -> usize {
    CACHE
        .entries
        .read()
        .values()
        .filter(|entry| entry.strong_count() > 0)
        .count()
}

pub fn clear() {
    CACHE.entries.write().clear();
}
