//! Method selection and invocation.
//!
//! ## Algorithm
//!
//! For each dispatch argument, compute its ancestor chain (most specific
//! first, root last). Walk the method table depth-first: at depth `d` try
//! each name of chain `d` in order, and for each one exhaust the deeper
//! positions before moving on. The first leaf reached that is not in the
//! skip set wins, so specificity on an earlier argument always dominates
//! specificity on a later one.
//!
//! When the table has nothing applicable, the legacy resolver is asked for
//! the first argument's class, then for its default. If that also fails the
//! call is a `NoApplicableMethod` error.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use super::generic::Generic;
use super::method::{Implementation, Method};
use crate::error::{PolyError, PolyResult};
use crate::types::Class;
use crate::value::{classes_of, Value};

/// What a dispatch resolved to.
#[derive(Clone)]
pub enum Target {
    Method(Arc<Method>),
    Legacy(Implementation),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Method(m) => f.debug_tuple("Method").field(m).finish(),
            Target::Legacy(_) => f.write_str("Legacy"),
        }
    }
}

/// Per-call dispatch state threaded into every method body.
///
/// Holds the generic, the runtime classes the call dispatched on, the
/// method currently running and the methods already tried by enclosing
/// frames of the same chain.
#[derive(Debug, Clone)]
pub struct CallContext {
    generic: Generic,
    classes: Vec<Class>,
    current: Option<Arc<Method>>,
    skip: Vec<Arc<Method>>,
    via_legacy: bool,
}

impl CallContext {
    pub fn generic(&self) -> &Generic {
        &self.generic
    }

    /// Runtime classes of the dispatch arguments.
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// The method being run, or `None` inside a legacy implementation.
    pub fn method(&self) -> Option<&Arc<Method>> {
        self.current.as_ref()
    }

    /// Methods already invoked along this chain, outermost first.
    pub fn tried(&self) -> &[Arc<Method>] {
        &self.skip
    }

    /// Invoke the next applicable method after the current one.
    ///
    /// Dispatch reuses the classes of the original call; `args` are passed
    /// through to the selected body.
    pub fn call_next(&self, args: &[Value]) -> PolyResult<Value> {
        if self.via_legacy {
            return Err(self.generic.no_applicable(&self.classes)?);
        }
        let mut skip = self.skip.clone();
        if let Some(current) = &self.current {
            skip.push(current.clone());
        }
        let target = self.generic.resolve_target(&self.classes, &skip)?;
        self.generic
            .invoke_target(target, self.classes.clone(), skip, args)
    }
}

/// One cell of [`Generic::explain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainEntry {
    pub signature: Vec<String>,
    /// A method is registered at exactly this signature.
    pub registered: bool,
    /// This is the method dispatch would select.
    pub selected: bool,
}

impl Generic {
    /// Ancestor chain of each runtime class.
    pub fn chains_for(&self, classes: &[Class]) -> PolyResult<Vec<Vec<String>>> {
        let depth = self.0.config.max_ancestor_depth;
        classes.iter().map(|c| c.ancestor_chain(depth)).collect()
    }

    fn check_arity(&self, classes: &[Class]) -> PolyResult<()> {
        if classes.len() != self.0.dispatch_args.len() {
            return Err(PolyError::SignatureLengthMismatch {
                expected: self.0.dispatch_args.len(),
                got: classes.len(),
            });
        }
        Ok(())
    }

    /// Most specific method for `classes`, without legacy fallback.
    pub fn dispatch(&self, classes: &[Class]) -> PolyResult<Option<Arc<Method>>> {
        self.dispatch_next(classes, &[])
    }

    /// Most specific method for `classes` that is not in `skip`.
    pub fn dispatch_next(
        &self,
        classes: &[Class],
        skip: &[Arc<Method>],
    ) -> PolyResult<Option<Arc<Method>>> {
        self.check_arity(classes)?;
        let chains = self.chains_for(classes)?;
        trace!(generic = %self.0.name, chains = ?chains, skipped = skip.len(), "dispatch");
        self.0.table.read().lookup_dispatch(&chains, skip)
    }

    /// Table dispatch, then the legacy resolver, then `NoApplicableMethod`.
    pub fn resolve_target(&self, classes: &[Class], skip: &[Arc<Method>]) -> PolyResult<Target> {
        if let Some(method) = self.dispatch_next(classes, skip)? {
            return Ok(Target::Method(method));
        }

        let first = classes
            .first()
            .map(|c| c.name().to_string())
            .unwrap_or_default();
        debug!(generic = %self.0.name, class = %first, "falling back to legacy dispatch");
        if let Some(imp) = self.0.legacy.lookup(&self.0.name, &first) {
            return Ok(Target::Legacy(imp));
        }
        if let Some(imp) = self.0.legacy.lookup_default(&self.0.name) {
            return Ok(Target::Legacy(imp));
        }
        Err(self.no_applicable(classes)?)
    }

    pub(crate) fn no_applicable(&self, classes: &[Class]) -> PolyResult<PolyError> {
        let mut tried = self.chains_for(classes)?;
        if let Some(first) = tried.first_mut() {
            first.push(self.0.config.default_fallback_name.clone());
        }
        Ok(PolyError::NoApplicableMethod {
            generic: self.0.name.clone(),
            dispatch_args: self.0.dispatch_args.clone(),
            classes: classes.iter().map(|c| c.name().to_string()).collect(),
            tried,
        })
    }

    /// Call the generic: derive runtime classes from the dispatch
    /// arguments, select a method and run it.
    pub fn call(&self, args: &[Value]) -> PolyResult<Value> {
        let classes = classes_of(args, self.0.dispatch_args.len());
        self.call_with_classes(classes, args)
    }

    /// Call with explicitly supplied dispatch classes.
    pub fn call_with_classes(&self, classes: Vec<Class>, args: &[Value]) -> PolyResult<Value> {
        let target = self.resolve_target(&classes, &[])?;
        self.invoke_target(target, classes, Vec::new(), args)
    }

    fn invoke_target(
        &self,
        target: Target,
        classes: Vec<Class>,
        skip: Vec<Arc<Method>>,
        args: &[Value],
    ) -> PolyResult<Value> {
        match target {
            Target::Method(method) => {
                let ctx = CallContext {
                    generic: self.clone(),
                    classes,
                    current: Some(method.clone()),
                    skip,
                    via_legacy: false,
                };
                method.invoke(&ctx, args)
            }
            Target::Legacy(imp) => {
                let ctx = CallContext {
                    generic: self.clone(),
                    classes,
                    current: None,
                    skip,
                    via_legacy: true,
                };
                imp(&ctx, args)
            }
        }
    }

    /// Every combination of ancestor names for `classes`, in search order,
    /// marking registered signatures and the one dispatch would pick.
    pub fn explain(&self, classes: &[Class]) -> PolyResult<Vec<ExplainEntry>> {
        self.check_arity(classes)?;
        let chains = self.chains_for(classes)?;
        let table = self.0.table.read();
        let selected = table.lookup_dispatch(&chains, &[])?;

        let mut combos: Vec<Vec<String>> = vec![Vec::new()];
        for chain in &chains {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    chain.iter().map(move |name| {
                        let mut next = prefix.clone();
                        next.push(name.clone());
                        next
                    })
                })
                .collect();
        }

        let mut picked = false;
        let mut entries = Vec::with_capacity(combos.len());
        for signature in combos {
            let found = table.lookup_exact(&signature)?;
            let is_selected = !picked
                && matches!((&found, &selected), (Some(f), Some(s)) if Arc::ptr_eq(f, s));
            picked |= is_selected;
            entries.push(ExplainEntry {
                registered: found.is_some(),
                selected: is_selected,
                signature,
            });
        }
        Ok(entries)
    }
}
