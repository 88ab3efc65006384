//! Property declarations.
//!
//! A property is a named slot on instances. It may be typed (value must
//! belong to a class or union), carry a default, or be computed through a
//! getter. A computed property without a setter is read-only.

use std::fmt;
use std::sync::Arc;

use super::{Instance, Value};
use crate::error::{PolyError, PolyResult};
use crate::types::{ClassLike, ClassSpec};

/// Computes a property value from the instance.
pub type Getter = Arc<dyn Fn(&Instance) -> PolyResult<Value> + Send + Sync>;

/// Receives the instance and the new value, returns the updated instance.
pub type Setter = Arc<dyn Fn(Instance, Value) -> PolyResult<Instance> + Send + Sync>;

/// Unresolved property declaration, as written in a class definition.
#[derive(Clone)]
pub struct PropertySpec {
    pub(crate) name: String,
    pub(crate) class: Option<ClassSpec>,
    pub(crate) default: Option<Value>,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            default: None,
            getter: None,
            setter: None,
        }
    }

    pub fn class(mut self, class: impl Into<ClassSpec>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance) -> PolyResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(f));
        self
    }

    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(Instance, Value) -> PolyResult<Instance> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("default", &self.default)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// Resolved property stored on a class.
#[derive(Clone)]
pub struct Property {
    name: String,
    class: Option<ClassLike>,
    default: Option<Value>,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Property {
    pub(crate) fn from_spec(spec: PropertySpec, class: Option<ClassLike>) -> Self {
        Self {
            name: spec.name,
            class,
            default: spec.default,
            getter: spec.getter,
            setter: spec.setter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared class or union, if the property is typed.
    pub fn class(&self) -> Option<&ClassLike> {
        self.class.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        self.getter.is_some() && self.setter.is_none()
    }

    pub(crate) fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub(crate) fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    /// Value used when construction does not supply one.
    pub(crate) fn initial_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        self.class
            .as_ref()
            .and_then(Value::prototype)
            .unwrap_or(Value::Null)
    }

    /// Check `value` against the declared class.
    pub(crate) fn check_value(&self, owner: &str, value: &Value) -> PolyResult<()> {
        match &self.class {
            Some(class) if !value.inherits(class) => Err(PolyError::InvalidPropertyValue {
                class: owner.to_string(),
                property: self.name.clone(),
                expected: class.to_string(),
                actual: value.type_name(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("class", &self.class.as_ref().map(|c| c.to_string()))
            .field("default", &self.default)
            .field("dynamic", &self.is_dynamic())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
