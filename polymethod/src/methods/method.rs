//! Method implementations and parameter lists.

use std::fmt;
use std::sync::Arc;

use super::dispatch::CallContext;
use crate::error::PolyResult;
use crate::types::ClassLike;
use crate::value::Value;

/// The variadic parameter marker.
pub const VARIADIC: &str = "...";

/// Callable body of a method or legacy implementation.
pub type Implementation = Arc<dyn Fn(&CallContext, &[Value]) -> PolyResult<Value> + Send + Sync>;

/// Wrap a closure as an [`Implementation`].
pub fn implementation<F>(f: F) -> Implementation
where
    F: Fn(&CallContext, &[Value]) -> PolyResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn variadic() -> Self {
        Self::required(VARIADIC)
    }

    pub fn is_variadic(&self) -> bool {
        self.name == VARIADIC
    }
}

/// Shorthand for a list of required parameters.
pub fn params(names: &[&str]) -> Vec<Param> {
    names.iter().map(|n| Param::required(*n)).collect()
}

/// A candidate method before registration: parameters plus body.
#[derive(Clone)]
pub struct MethodImpl {
    pub(crate) params: Vec<Param>,
    pub(crate) body: Implementation,
}

impl MethodImpl {
    pub fn new<F>(params: Vec<Param>, body: F) -> Self
    where
        F: Fn(&CallContext, &[Value]) -> PolyResult<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            body: Arc::new(body),
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

impl fmt::Debug for MethodImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.params.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("MethodImpl").field("params", &names).finish()
    }
}

/// A registered method. Shared (`Arc`) between every table path a union
/// signature expands to; identity is by pointer.
pub struct Method {
    generic: String,
    signature: Vec<ClassLike>,
    params: Vec<Param>,
    body: Implementation,
}

impl Method {
    pub(crate) fn new(generic: String, signature: Vec<ClassLike>, imp: MethodImpl) -> Self {
        Self {
            generic,
            signature,
            params: imp.params,
            body: imp.body,
        }
    }

    /// Name of the generic this method belongs to.
    pub fn generic_name(&self) -> &str {
        &self.generic
    }

    /// Signature as registered (unions unexpanded).
    pub fn signature(&self) -> &[ClassLike] {
        &self.signature
    }

    pub fn signature_names(&self) -> Vec<String> {
        self.signature.iter().map(|c| c.to_string()).collect()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn invoke(&self, ctx: &CallContext, args: &[Value]) -> PolyResult<Value> {
        (self.body)(ctx, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("generic", &self.generic)
            .field("signature", &self.signature_names())
            .finish()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method({}, ({}))", self.generic, self.signature_names().join(", "))
    }
}
