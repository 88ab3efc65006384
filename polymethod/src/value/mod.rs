//! Runtime values and instances.
//!
//! - `instance.rs`: Instance (class + property slots), construction, validation
//! - `property.rs`: Property declarations, typed/computed slots

mod instance;
mod property;

use std::fmt;

pub use instance::Instance;
pub use property::{Getter, Property, PropertySpec, Setter};

use crate::types::{Class, ClassLike, BASE};

/// A runtime value passed to generics and stored in properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// An absent argument; dispatches as `MISSING`.
    Missing,
    Logical(bool),
    Integer(i64),
    Double(f64),
    Character(String),
    List(Vec<Value>),
    Object(Instance),
}

impl Value {
    /// Most-derived class of this value.
    pub fn class(&self) -> Class {
        match self {
            Value::Null => BASE.null.clone(),
            Value::Missing => BASE.missing.clone(),
            Value::Logical(_) => BASE.logical.clone(),
            Value::Integer(_) => BASE.integer.clone(),
            Value::Double(_) => BASE.double.clone(),
            Value::Character(_) => BASE.character.clone(),
            Value::List(_) => BASE.list.clone(),
            Value::Object(instance) => instance.class().clone(),
        }
    }

    /// Whether this value belongs to `target` (by class identity).
    pub fn inherits(&self, target: &ClassLike) -> bool {
        target.admits(&self.class())
    }

    /// Short human-readable type description, e.g. `<integer>`.
    pub fn type_name(&self) -> String {
        format!("<{}>", self.class().name())
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(s) => Some(s),
            _ => None,
        }
    }

    /// Default value for a property typed with `class`, when one exists.
    pub(crate) fn prototype(class: &ClassLike) -> Option<Value> {
        let class = class.as_class()?;
        let base = &*BASE;
        if class.ptr_eq(&base.null) {
            Some(Value::Null)
        } else if class.ptr_eq(&base.logical) {
            Some(Value::Logical(false))
        } else if class.ptr_eq(&base.integer) {
            Some(Value::Integer(0))
        } else if class.ptr_eq(&base.double) {
            Some(Value::Double(0.0))
        } else if class.ptr_eq(&base.character) {
            Some(Value::Character(String::new()))
        } else if class.ptr_eq(&base.list) {
            Some(Value::List(Vec::new()))
        } else {
            None
        }
    }
}

/// Class of each value, with `MISSING` for positions past the end of `args`.
pub fn classes_of(args: &[Value], count: usize) -> Vec<Class> {
    (0..count)
        .map(|i| args.get(i).map_or_else(|| BASE.missing.clone(), Value::class))
        .collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Missing => write!(f, "<missing>"),
            Value::Logical(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Integer(i) => write!(f, "{}L", i),
            Value::Double(x) => write!(f, "{}", x),
            Value::Character(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                let parts: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "list({})", parts.join(", "))
            }
            Value::Object(instance) => write!(f, "<{}> object", instance.class().name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Character(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Character(s)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}
