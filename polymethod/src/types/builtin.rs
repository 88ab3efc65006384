//! Built-in classes for primitive values.
//!
//! ```text
//! ANY
//!  ├── NULL, logical, integer, double, complex, character,
//!  │   raw, list, function, environment        (primitive-backed)
//!  └── MISSING                                  (absent argument)
//!
//! numeric = integer | double
//! atomic  = logical | integer | double | complex | character | raw
//! ```
//!
//! The standard table is built once per process and shared; every value of
//! a primitive type maps to the same `Class` handle.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::class::{Class, MISSING_CLASS_NAME, ROOT_CLASS_NAME};
use super::registry::ClassLike;
use super::union::ClassUnion;
use crate::error::{PolyError, PolyResult};

/// Tag for a primitive value constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Null,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    Raw,
    List,
    Function,
    Environment,
    Symbol,
    Language,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Null => "NULL",
            PrimitiveType::Logical => "logical",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Double => "double",
            PrimitiveType::Complex => "complex",
            PrimitiveType::Character => "character",
            PrimitiveType::Raw => "raw",
            PrimitiveType::List => "list",
            PrimitiveType::Function => "function",
            PrimitiveType::Environment => "environment",
            PrimitiveType::Symbol => "symbol",
            PrimitiveType::Language => "language",
        };
        write!(f, "{}()", name)
    }
}

/// Handles to the standard built-in classes.
pub(crate) struct BaseClasses {
    pub any: Class,
    pub missing: Class,
    pub null: Class,
    pub logical: Class,
    pub integer: Class,
    pub double: Class,
    pub character: Class,
    pub list: Class,
}

pub(crate) static BASE: Lazy<BaseClasses> = Lazy::new(|| {
    let any = Class::root();
    BaseClasses {
        missing: Class::builtin(MISSING_CLASS_NAME, None, &any),
        null: Class::builtin("NULL", Some(PrimitiveType::Null), &any),
        logical: Class::builtin("logical", Some(PrimitiveType::Logical), &any),
        integer: Class::builtin("integer", Some(PrimitiveType::Integer), &any),
        double: Class::builtin("double", Some(PrimitiveType::Double), &any),
        character: Class::builtin("character", Some(PrimitiveType::Character), &any),
        list: Class::builtin("list", Some(PrimitiveType::List), &any),
        any,
    }
});

static STANDARD: Lazy<BuiltinTable> = Lazy::new(|| {
    let base = &*BASE;
    let mut table = BuiltinTable::new();
    for class in [
        &base.null,
        &base.logical,
        &base.integer,
        &base.double,
        &base.character,
        &base.list,
    ] {
        table.insert_existing(class.clone());
    }
    let complex = table.insert_class("complex", Some(PrimitiveType::Complex));
    let raw = table.insert_class("raw", Some(PrimitiveType::Raw));
    table.insert_class("function", Some(PrimitiveType::Function));
    table.insert_class("environment", Some(PrimitiveType::Environment));

    table.insert_union(
        "numeric",
        ClassUnion::from_members([
            ClassLike::Class(base.integer.clone()),
            ClassLike::Class(base.double.clone()),
        ]),
    );
    table.insert_union(
        "atomic",
        ClassUnion::from_members([
            ClassLike::Class(base.logical.clone()),
            ClassLike::Class(base.integer.clone()),
            ClassLike::Class(base.double.clone()),
            ClassLike::Class(complex),
            ClassLike::Class(base.character.clone()),
            ClassLike::Class(raw),
        ]),
    );
    table
});

/// The process-wide standard built-in table.
pub fn standard() -> &'static BuiltinTable {
    &STANDARD
}

/// The universal root class.
pub fn any_class() -> Class {
    BASE.any.clone()
}

/// The class of an absent argument.
pub fn missing_class() -> Class {
    BASE.missing.clone()
}

/// Name-indexed table of built-in classes and unions.
///
/// Every table contains `ANY` and `MISSING`.
#[derive(Debug, Clone)]
pub struct BuiltinTable {
    entries: IndexMap<String, ClassLike>,
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinTable {
    /// A table holding only `ANY` and `MISSING`.
    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(ROOT_CLASS_NAME.to_string(), ClassLike::Class(any_class()));
        entries.insert(
            MISSING_CLASS_NAME.to_string(),
            ClassLike::Class(missing_class()),
        );
        Self { entries }
    }

    /// Create a built-in class deriving from `ANY` and add it under `name`.
    pub fn insert_class(&mut self, name: &str, constructor: Option<PrimitiveType>) -> Class {
        let class = Class::builtin(name, constructor, &BASE.any);
        self.insert_existing(class.clone());
        class
    }

    pub fn insert_union(&mut self, name: &str, union: ClassUnion) {
        self.entries
            .insert(name.to_string(), ClassLike::Union(union));
    }

    fn insert_existing(&mut self, class: Class) {
        self.entries
            .insert(class.name().to_string(), ClassLike::Class(class));
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&ClassLike> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Reverse lookup from a primitive constructor to its built-in class.
    pub fn class_for_constructor(&self, constructor: PrimitiveType) -> PolyResult<Class> {
        let mut found: Vec<&Class> = self
            .entries
            .values()
            .filter_map(|entry| match entry {
                ClassLike::Class(class) if class.constructor() == Some(constructor) => Some(class),
                _ => None,
            })
            .collect();
        match found.len() {
            0 => Err(PolyError::UnknownConstructor(constructor)),
            1 => Ok(found.remove(0).clone()),
            _ => Err(PolyError::AmbiguousConstructor {
                constructor,
                candidates: found.iter().map(|c| c.name().to_string()).collect(),
            }),
        }
    }
}
