//! Generic functions: definition, compatibility checks and registration.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::legacy::{LegacyResolver, NoLegacy};
use super::method::{Method, MethodImpl, Param, VARIADIC};
use super::table::MethodTable;
use crate::config::{DispatchConfig, DuplicatePolicy};
use crate::error::{
    CompatWarning, DispatchArgsRule, IncompatibleReason, PolyError, PolyResult,
};
use crate::types::{ClassLike, ClassRegistry, ClassSpec};

/// Construction options for a generic.
#[derive(Debug, Clone)]
pub struct GenericOptions {
    pub config: DispatchConfig,
    pub legacy: Arc<dyn LegacyResolver>,
}

impl Default for GenericOptions {
    fn default() -> Self {
        Self {
            config: DispatchConfig::default(),
            legacy: Arc::new(NoLegacy),
        }
    }
}

pub(crate) struct GenericInner {
    pub(crate) name: String,
    pub(crate) dispatch_args: Vec<String>,
    pub(crate) params: Vec<Param>,
    pub(crate) table: RwLock<MethodTable>,
    pub(crate) config: DispatchConfig,
    pub(crate) legacy: Arc<dyn LegacyResolver>,
}

/// A named operation with a fixed dispatch prefix and an open method table.
///
/// Cloning shares the same table.
#[derive(Clone)]
pub struct Generic(pub(crate) Arc<GenericInner>);

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub method: Arc<Method>,
    /// Concrete table paths the signature expanded to.
    pub paths: Vec<Vec<String>>,
    pub warnings: Vec<CompatWarning>,
}

impl Generic {
    /// Define a generic with default options (no legacy fallback).
    pub fn define(name: &str, dispatch_args: &[&str], params: Vec<Param>) -> PolyResult<Generic> {
        Self::define_with(name, dispatch_args, params, GenericOptions::default())
    }

    pub fn define_with(
        name: &str,
        dispatch_args: &[&str],
        params: Vec<Param>,
        options: GenericOptions,
    ) -> PolyResult<Generic> {
        validate_dispatch_args(dispatch_args, &params).map_err(PolyError::InvalidDispatchArgs)?;
        let table = MethodTable::new(dispatch_args.len()).with_cache(
            options.config.dispatch_cache,
            options.config.dispatch_cache_capacity,
        );
        debug!(generic = name, dispatch_args = ?dispatch_args, "defined generic");
        Ok(Generic(Arc::new(GenericInner {
            name: name.to_string(),
            dispatch_args: dispatch_args.iter().map(|s| s.to_string()).collect(),
            params,
            table: RwLock::new(table),
            config: options.config,
            legacy: options.legacy,
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn dispatch_args(&self) -> &[String] {
        &self.0.dispatch_args
    }

    pub fn params(&self) -> &[Param] {
        &self.0.params
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.0.config
    }

    pub fn ptr_eq(&self, other: &Generic) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Check that `params` can implement this generic.
    ///
    /// Fatal problems are returned as `IncompatibleMethod`; divergences in
    /// non-dispatch parameters come back as warnings.
    pub fn check_compatible(&self, params: &[Param]) -> PolyResult<Vec<CompatWarning>> {
        check_compatible(self, params)
    }

    /// Register `imp` for `signature`, one class specifier per dispatch argument.
    ///
    /// Union entries expand into one table path per member, all sharing the
    /// same method. An identical signature is replaced (or refused, under
    /// `DuplicatePolicy::Error`).
    pub fn register<I, S>(
        &self,
        registry: &ClassRegistry,
        signature: I,
        imp: MethodImpl,
    ) -> PolyResult<Registration>
    where
        I: IntoIterator<Item = S>,
        S: Into<ClassSpec>,
    {
        let specs: Vec<ClassSpec> = signature.into_iter().map(Into::into).collect();
        if specs.len() != self.0.dispatch_args.len() {
            return Err(PolyError::SignatureLengthMismatch {
                expected: self.0.dispatch_args.len(),
                got: specs.len(),
            });
        }
        let resolved = specs
            .into_iter()
            .map(|spec| registry.resolve(spec))
            .collect::<PolyResult<Vec<ClassLike>>>()?;
        if let Some(pos) = resolved
            .iter()
            .position(|entry| matches!(entry, ClassLike::Union(u) if u.is_empty()))
        {
            return Err(PolyError::invalid_signature(format!(
                "signature entry {} of `{}` is an empty union",
                pos + 1,
                self.0.name
            )));
        }

        let warnings = check_compatible(self, &imp.params)?;
        if self.0.config.warn_incompatible {
            for warning in &warnings {
                warn!(generic = %self.0.name, "{}", warning);
            }
        }

        let paths = expand_paths(&resolved);
        let method = Arc::new(Method::new(self.0.name.clone(), resolved, imp));

        let mut table = self.0.table.write();
        if self.0.config.duplicate_policy == DuplicatePolicy::Error {
            for path in &paths {
                if table.lookup_exact(path)?.is_some() {
                    return Err(PolyError::DuplicateMethod {
                        generic: self.0.name.clone(),
                        signature: path.clone(),
                    });
                }
            }
        }
        for path in &paths {
            if table.insert(path, method.clone())?.is_some() {
                debug!(generic = %self.0.name, signature = ?path, "replaced method");
            }
        }
        drop(table);

        debug!(
            generic = %self.0.name,
            signature = ?method.signature_names(),
            paths = paths.len(),
            "registered method"
        );
        Ok(Registration {
            method,
            paths,
            warnings,
        })
    }

    /// Every registered `(signature, method)` pair.
    pub fn methods(&self) -> Vec<(Vec<String>, Arc<Method>)> {
        self.0.table.read().entries()
    }

    /// The method registered for exactly this signature, if any.
    pub fn method<I, S>(&self, registry: &ClassRegistry, signature: I) -> PolyResult<Option<Arc<Method>>>
    where
        I: IntoIterator<Item = S>,
        S: Into<ClassSpec>,
    {
        let names = signature
            .into_iter()
            .map(|spec| registry.resolve_class(spec).map(|c| c.name().to_string()))
            .collect::<PolyResult<Vec<_>>>()?;
        self.method_by_names(&names)
    }

    /// Exact lookup by raw class names.
    pub fn method_by_names<S: AsRef<str>>(&self, names: &[S]) -> PolyResult<Option<Arc<Method>>> {
        self.0.table.read().lookup_exact(names)
    }

    /// `name(x, y, ...)`.
    pub fn signature(&self) -> String {
        let names: Vec<_> = self.0.params.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.0.name, names.join(", "))
    }
}

impl fmt::Debug for Generic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generic")
            .field("name", &self.0.name)
            .field("dispatch_args", &self.0.dispatch_args)
            .field("methods", &self.0.table.read().len())
            .finish()
    }
}

impl fmt::Display for Generic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<generic> {}", self.signature())
    }
}

/// Validate a generic's dispatch argument list against its full parameters.
pub fn validate_dispatch_args(dispatch_args: &[&str], params: &[Param]) -> Result<(), DispatchArgsRule> {
    if dispatch_args.is_empty() {
        return Err(DispatchArgsRule::Empty);
    }
    if dispatch_args.iter().any(|a| a.trim().is_empty()) {
        return Err(DispatchArgsRule::BlankEntry);
    }
    if dispatch_args.contains(&VARIADIC) {
        return Err(DispatchArgsRule::ContainsVariadic);
    }
    for (i, arg) in dispatch_args.iter().enumerate() {
        if dispatch_args[..i].contains(arg) {
            return Err(DispatchArgsRule::Duplicate(arg.to_string()));
        }
    }

    let is_prefix = params.len() >= dispatch_args.len()
        && params
            .iter()
            .zip(dispatch_args)
            .all(|(p, a)| p.name == *a);
    if !is_prefix {
        return Err(DispatchArgsRule::NotPrefix);
    }

    if let Some(pos) = params.iter().position(Param::is_variadic) {
        if pos != dispatch_args.len() {
            return Err(DispatchArgsRule::VariadicNotFollowing);
        }
    }
    Ok(())
}

fn check_compatible(generic: &Generic, params: &[Param]) -> PolyResult<Vec<CompatWarning>> {
    let dispatch = &generic.0.dispatch_args;
    let name = &generic.0.name;

    let has_prefix = params.len() >= dispatch.len()
        && params.iter().zip(dispatch).all(|(p, d)| &p.name == d);
    if !has_prefix {
        return Err(PolyError::incompatible(
            name.as_str(),
            IncompatibleReason::MissingDispatchPrefix {
                expected: dispatch.clone(),
                found: params
                    .iter()
                    .take(dispatch.len())
                    .map(|p| p.name.clone())
                    .collect(),
            },
        ));
    }
    if let Some(p) = params[..dispatch.len()].iter().find(|p| p.default.is_some()) {
        return Err(PolyError::incompatible(
            name.as_str(),
            IncompatibleReason::DispatchArgHasDefault(p.name.clone()),
        ));
    }
    if let Some(pos) = params.iter().position(Param::is_variadic) {
        if pos != dispatch.len() {
            return Err(PolyError::incompatible(
                name.as_str(),
                IncompatibleReason::VariadicNotFollowing,
            ));
        }
    }

    let mut warnings = Vec::new();
    for gp in generic.0.params.iter().skip(dispatch.len()) {
        if gp.is_variadic() {
            continue;
        }
        match params.iter().find(|p| p.name == gp.name) {
            None => warnings.push(CompatWarning::MissingParam(gp.name.clone())),
            Some(mp) if mp.default != gp.default => warnings.push(CompatWarning::DifferingDefault {
                param: gp.name.clone(),
                generic: gp.default.clone(),
                method: mp.default.clone(),
            }),
            Some(_) => {}
        }
    }
    Ok(warnings)
}

/// Cartesian product of each position's table keys, leftmost position
/// varying slowest.
fn expand_paths(signature: &[ClassLike]) -> Vec<Vec<String>> {
    let mut paths: Vec<Vec<String>> = vec![Vec::new()];
    for entry in signature {
        let names = entry.dispatch_names();
        paths = paths
            .into_iter()
            .flat_map(|prefix| {
                names.iter().map(move |name| {
                    let mut path = prefix.clone();
                    path.push(name.clone());
                    path
                })
            })
            .collect();
    }
    paths
}
