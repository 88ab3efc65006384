//! Secondary single-dispatch resolver, consulted when the method table has
//! no applicable method.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use super::method::Implementation;
use crate::config::DispatchConfig;

/// Lookup contract of a legacy single-dispatch mechanism.
pub trait LegacyResolver: Send + Sync + fmt::Debug {
    /// Implementation of `generic` for `class_name`, if one exists.
    fn lookup(&self, generic: &str, class_name: &str) -> Option<Implementation>;

    /// Catch-all implementation of `generic`, if one exists.
    fn lookup_default(&self, generic: &str) -> Option<Implementation>;
}

/// Resolver for environments without a legacy mechanism.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLegacy;

impl LegacyResolver for NoLegacy {
    fn lookup(&self, _generic: &str, _class_name: &str) -> Option<Implementation> {
        None
    }

    fn lookup_default(&self, _generic: &str) -> Option<Implementation> {
        None
    }
}

/// Map-backed resolver keyed by `(generic, class name)`.
///
/// The default implementation of a generic is stored under the configured
/// fallback class name.
pub struct LegacyTable {
    entries: RwLock<HashMap<(String, String), Implementation>>,
    default_name: String,
}

impl Default for LegacyTable {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl LegacyTable {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_name: default_name.into(),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.default_fallback_name.clone())
    }

    pub fn register(&self, generic: &str, class_name: &str, imp: Implementation) {
        self.entries
            .write()
            .insert((generic.to_string(), class_name.to_string()), imp);
    }

    pub fn register_default(&self, generic: &str, imp: Implementation) {
        let default_name = self.default_name.clone();
        self.register(generic, &default_name, imp);
    }
}

impl LegacyResolver for LegacyTable {
    fn lookup(&self, generic: &str, class_name: &str) -> Option<Implementation> {
        self.entries
            .read()
            .get(&(generic.to_string(), class_name.to_string()))
            .cloned()
    }

    fn lookup_default(&self, generic: &str) -> Option<Implementation> {
        self.lookup(generic, &self.default_name)
    }
}

impl fmt::Debug for LegacyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .keys()
            .map(|(g, c)| format!("{}.{}", g, c))
            .collect();
        keys.sort();
        f.debug_struct("LegacyTable")
            .field("entries", &keys)
            .field("default_name", &self.default_name)
            .finish()
    }
}
