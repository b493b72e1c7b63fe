//! Dotted-path lookups over a loaded document, memoized per path.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::format::{Format, FragmentCodec, ValueTree};
use super::ConfigError;

/// Parsed document plus its resolution cache.
///
/// Lookups take the lock exclusively for the tree walk and the cache write,
/// so a [`replace`](Self::replace) is never observed half-way.
#[derive(Debug)]
pub struct DocumentStore<C = Format> {
    inner: RwLock<Inner>,
    codec: C,
}

#[derive(Debug)]
struct Inner {
    tree: ValueTree,
    cache: HashMap<String, CacheEntry>,
}

/// What has been resolved for one literal path string.
#[derive(Debug, Default)]
struct CacheEntry {
    scalar: Option<String>,
    fragment: Option<String>,
}

impl<C: FragmentCodec> DocumentStore<C> {
    pub fn new(tree: ValueTree, codec: C) -> Self {
        Self {
            inner: RwLock::new(Inner {
                tree,
                cache: HashMap::new(),
            }),
            codec,
        }
    }

    /// Swaps in a new document and drops every memoized entry.
    pub fn replace(&self, tree: ValueTree) {
        let mut inner = self.lock();
        inner.tree = tree;
        inner.cache.clear();
        debug!("document replaced, resolution cache cleared");
    }

    /// A copy of the current document.
    pub fn tree(&self) -> ValueTree {
        self.lock().tree.clone()
    }

    /// Scalar retrieval: the value at `path` as text, or `default` when the
    /// path does not resolve. Never fails.
    pub fn get(&self, path: &str, default: &str) -> String {
        let mut inner = self.lock();

        if let Some(hit) = inner.cache.get(path).and_then(|e| e.scalar.as_ref()) {
            return hit.clone();
        }

        let rendered = resolve(&inner.tree, path).and_then(|node| self.render_scalar(path, node));
        match rendered {
            Ok(text) => {
                inner.cache.entry(path.to_string()).or_default().scalar = Some(text.clone());
                text
            }
            Err(err) => {
                debug!(path, error = %err, "scalar lookup fell back to default");
                default.to_string()
            }
        }
    }

    /// Structured retrieval: the subtree at `path`, serialized with the
    /// document's codec and decoded into `T` by that same codec.
    pub fn get_value<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        let fragment = self.fragment(path)?;
        self.codec
            .decode(&fragment)
            .map_err(|e| ConfigError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    /// The serialized fragment for `path`, from cache or freshly encoded.
    fn fragment(&self, path: &str) -> Result<String, ConfigError> {
        let mut inner = self.lock();

        if let Some(hit) = inner.cache.get(path).and_then(|e| e.fragment.as_ref()) {
            return Ok(hit.clone());
        }

        let node = resolve(&inner.tree, path)?;
        let fragment = self.codec.encode(node).map_err(|e| ConfigError::Encode {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        debug!(path, "cached structured fragment");
        inner.cache.entry(path.to_string()).or_default().fragment = Some(fragment.clone());
        Ok(fragment)
    }

    fn render_scalar(&self, path: &str, node: &ValueTree) -> Result<String, ConfigError> {
        match node {
            ValueTree::String(s) => Ok(s.clone()),
            ValueTree::Number(n) => Ok(n.to_string()),
            ValueTree::Bool(b) => Ok(b.to_string()),
            ValueTree::Null => Ok(String::new()),
            ValueTree::Array(_) | ValueTree::Object(_) => self
                .codec
                .encode(node)
                .map(|text| text.trim_end().to_string())
                .map_err(|e| ConfigError::Encode {
                    path: path.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    fn lock(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn mutate_tree_keeping_cache(&self, f: impl FnOnce(&mut ValueTree)) {
        f(&mut self.lock().tree);
    }
}

/// Walks `path` through mappings and sequences. The empty path is the root.
fn resolve<'a>(root: &'a ValueTree, path: &str) -> Result<&'a ValueTree, ConfigError> {
    if path.is_empty() {
        return Ok(root);
    }

    let not_found = || ConfigError::PathNotFound(path.to_string());
    let mut current = root;

    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        current = match current {
            ValueTree::Object(map) => map.get(segment).ok_or_else(not_found)?,
            ValueTree::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(not_found)?,
            _ => return Err(not_found()),
        };
    }

    Ok(current)
}
