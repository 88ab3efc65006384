//! Dispatch configuration.
//!
//! Configuration is plain data, deserialized from TOML:
//!
//! ```toml
//! duplicate_policy = "error"
//! default_fallback_name = "default"
//! max_ancestor_depth = 64
//! ```
//!
//! Every key is optional; missing keys take their [`Default`] value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PolyError, PolyResult};

/// Upper bound on ancestor walks when no configuration is supplied.
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 256;

/// Entries a generic's dispatch cache holds before it is cleared.
pub const DEFAULT_DISPATCH_CACHE_CAPACITY: usize = 4096;

/// What happens when a signature that already has a method is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last registration wins; the earlier method is dropped silently.
    #[default]
    Replace,
    /// Registration fails with `PolyError::DuplicateMethod`.
    Error,
}

/// Tunables shared by a generic's registration and dispatch paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    pub duplicate_policy: DuplicatePolicy,
    /// Class name handed to the legacy resolver when the concrete class misses.
    pub default_fallback_name: String,
    pub max_ancestor_depth: usize,
    /// Log non-fatal compatibility warnings at registration time.
    pub warn_incompatible: bool,
    /// Memoize dispatch results for repeated argument classes.
    pub dispatch_cache: bool,
    pub dispatch_cache_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Replace,
            default_fallback_name: "default".to_string(),
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
            warn_incompatible: true,
            dispatch_cache: true,
            dispatch_cache_capacity: DEFAULT_DISPATCH_CACHE_CAPACITY,
        }
    }
}

impl DispatchConfig {
    pub fn from_toml_str(src: &str) -> PolyResult<Self> {
        let config: DispatchConfig =
            toml::from_str(src).map_err(|e| PolyError::config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> PolyResult<Self> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)
            .map_err(|e| PolyError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&src)
    }

    fn check(&self) -> PolyResult<()> {
        if self.max_ancestor_depth == 0 {
            return Err(PolyError::config("max_ancestor_depth must be at least 1"));
        }
        if self.dispatch_cache_capacity == 0 {
            return Err(PolyError::config("dispatch_cache_capacity must be at least 1"));
        }
        if self.default_fallback_name.trim().is_empty() {
            return Err(PolyError::config("default_fallback_name must not be empty"));
        }
        Ok(())
    }
}
