//! Method table: a trie keyed by class name, one level per dispatch argument.
//!
//! ```text
//! depth 0 (x)      depth 1 (y)
//! "Dog"    ──►   { "Animal" ─► Leaf(m1) }
//! "Animal" ──►   { "Animal" ─► Leaf(m2), "Dog" ─► Leaf(m3) }
//! ```
//!
//! Every leaf sits at depth `len(dispatch_args) - 1`; the depth is fixed when
//! the table is created and checked on every insert.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use super::method::Method;
use crate::config::DEFAULT_DISPATCH_CACHE_CAPACITY;
use crate::error::{PolyError, PolyResult};

/// A node of the method trie.
#[derive(Debug, Clone)]
pub enum MethodNode {
    Leaf(Arc<Method>),
    Branch(IndexMap<String, MethodNode>),
}

/// Method trie for one generic.
#[derive(Debug)]
pub struct MethodTable {
    depth: usize,
    root: IndexMap<String, MethodNode>,
    /// Unskipped dispatch results keyed by per-argument ancestor chains.
    /// Cleared on every insert, and when it reaches `cache_capacity`.
    dispatch_cache: Mutex<HashMap<Vec<Vec<String>>, Arc<Method>>>,
    cache_enabled: bool,
    cache_capacity: usize,
}

impl MethodTable {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            root: IndexMap::new(),
            dispatch_cache: Mutex::new(HashMap::new()),
            cache_enabled: true,
            cache_capacity: DEFAULT_DISPATCH_CACHE_CAPACITY,
        }
    }

    pub(crate) fn with_cache(mut self, enabled: bool, capacity: usize) -> Self {
        self.cache_enabled = enabled;
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Number of dispatch arguments (path length of every leaf).
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn check_len(&self, got: usize) -> PolyResult<()> {
        if got != self.depth {
            return Err(PolyError::SignatureLengthMismatch {
                expected: self.depth,
                got,
            });
        }
        Ok(())
    }

    /// Store `method` at `signature`, creating intermediate nodes as needed.
    ///
    /// An existing leaf at the same path is replaced and returned.
    pub fn insert(
        &mut self,
        signature: &[String],
        method: Arc<Method>,
    ) -> PolyResult<Option<Arc<Method>>> {
        self.check_len(signature.len())?;
        let Some((last, prefix)) = signature.split_last() else {
            return Err(PolyError::SignatureLengthMismatch {
                expected: self.depth,
                got: 0,
            });
        };

        let mut node = &mut self.root;
        for name in prefix {
            let child = node
                .entry(name.clone())
                .or_insert_with(|| MethodNode::Branch(IndexMap::new()));
            node = match child {
                MethodNode::Branch(map) => map,
                MethodNode::Leaf(_) => {
                    return Err(PolyError::resolution(format!(
                        "method table has a leaf at interior class `{}`",
                        name
                    )))
                }
            };
        }

        let previous = match node.insert(last.clone(), MethodNode::Leaf(method)) {
            None => None,
            Some(MethodNode::Leaf(old)) => Some(old),
            Some(MethodNode::Branch(_)) => {
                return Err(PolyError::resolution(format!(
                    "method table has a branch at leaf class `{}`",
                    last
                )))
            }
        };

        self.dispatch_cache.lock().clear();
        Ok(previous)
    }

    /// Direct path walk, no ancestor expansion.
    pub fn lookup_exact<S: AsRef<str>>(&self, signature: &[S]) -> PolyResult<Option<Arc<Method>>> {
        self.check_len(signature.len())?;
        let mut level = &self.root;
        for (i, name) in signature.iter().enumerate() {
            match level.get(name.as_ref()) {
                Some(MethodNode::Leaf(method)) if i + 1 == signature.len() => {
                    return Ok(Some(method.clone()))
                }
                Some(MethodNode::Branch(next)) if i + 1 < signature.len() => level = next,
                _ => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Find the first leaf reachable by walking each argument's ancestor
    /// chain, leftmost argument most significant, skipping methods in `skip`.
    ///
    /// `chains[i]` lists the class names of argument `i` from most specific
    /// to the root.
    pub fn lookup_dispatch(
        &self,
        chains: &[Vec<String>],
        skip: &[Arc<Method>],
    ) -> PolyResult<Option<Arc<Method>>> {
        self.check_len(chains.len())?;

        let use_cache = self.cache_enabled && skip.is_empty();
        if use_cache {
            if let Some(hit) = self.dispatch_cache.lock().get(chains) {
                trace!(chains = ?chains, "dispatch cache hit");
                return Ok(Some(hit.clone()));
            }
        }

        let found = search(&self.root, chains, skip).cloned();
        if use_cache {
            if let Some(method) = &found {
                let mut cache = self.dispatch_cache.lock();
                if cache.len() >= self.cache_capacity {
                    trace!(entries = cache.len(), "dispatch cache full, clearing");
                    cache.clear();
                }
                cache.insert(chains.to_vec(), method.clone());
            }
        }
        Ok(found)
    }

    /// Every `(signature, method)` pair in insertion order.
    pub fn entries(&self) -> Vec<(Vec<String>, Arc<Method>)> {
        let mut out = Vec::new();
        let mut path = Vec::with_capacity(self.depth);
        flatten(&self.root, &mut path, &mut out);
        out
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn cached_entries(&self) -> usize {
        self.dispatch_cache.lock().len()
    }
}

/// Depth-first search: for each name of the current argument's chain, try
/// every remaining argument before moving to the next (less specific) name.
fn search<'a>(
    level: &'a IndexMap<String, MethodNode>,
    chains: &[Vec<String>],
    skip: &[Arc<Method>],
) -> Option<&'a Arc<Method>> {
    let (chain, rest) = chains.split_first()?;
    for name in chain {
        match level.get(name) {
            Some(MethodNode::Leaf(method)) if rest.is_empty() => {
                if !skip.iter().any(|s| Arc::ptr_eq(s, method)) {
                    return Some(method);
                }
            }
            Some(MethodNode::Branch(next)) if !rest.is_empty() => {
                if let Some(found) = search(next, rest, skip) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn flatten(
    level: &IndexMap<String, MethodNode>,
    path: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Arc<Method>)>,
) {
    for (name, node) in level {
        path.push(name.clone());
        match node {
            MethodNode::Leaf(method) => out.push((path.clone(), method.clone())),
            MethodNode::Branch(next) => flatten(next, path, out),
        }
        path.pop();
    }
}
