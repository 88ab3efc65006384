//! Class registry: resolves class specifiers to canonical classes.
//!
//! A registry owns an explicit name -> binding scope plus a table of
//! built-in classes. Resolution never scans anything else.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use super::builtin::{self, BuiltinTable, PrimitiveType};
use super::class::{Class, Parent, Validator};
use super::union::ClassUnion;
use crate::config::DEFAULT_MAX_ANCESTOR_DEPTH;
use crate::error::{PolyError, PolyResult};
use crate::value::{Instance, Property, PropertySpec, Value};

/// A resolved class or union.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassLike {
    Class(Class),
    Union(ClassUnion),
}

impl ClassLike {
    /// The concrete classes this stands for (one for a class, every member for a union).
    pub fn classes(&self) -> Vec<Class> {
        match self {
            ClassLike::Class(class) => vec![class.clone()],
            ClassLike::Union(union) => union.members().to_vec(),
        }
    }

    /// Method-table keys this expands to.
    pub fn dispatch_names(&self) -> Vec<String> {
        match self {
            ClassLike::Class(class) => vec![class.name().to_string()],
            ClassLike::Union(union) => union.member_names(),
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            ClassLike::Class(class) => Some(class),
            ClassLike::Union(_) => None,
        }
    }

    /// True if `class` is, or descends from, this class or any union member.
    pub fn admits(&self, class: &Class) -> bool {
        match self {
            ClassLike::Class(target) => class.inherits_from(target),
            ClassLike::Union(union) => union.members().iter().any(|m| class.inherits_from(m)),
        }
    }
}

impl fmt::Display for ClassLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLike::Class(class) => write!(f, "{}", class),
            ClassLike::Union(union) => write!(f, "{}", union),
        }
    }
}

/// Anything that can name a class.
#[derive(Debug, Clone)]
pub enum ClassSpec {
    Class(Class),
    Union(ClassUnion),
    Primitive(PrimitiveType),
    Name(String),
}

impl From<Class> for ClassSpec {
    fn from(class: Class) -> Self {
        ClassSpec::Class(class)
    }
}

impl From<&Class> for ClassSpec {
    fn from(class: &Class) -> Self {
        ClassSpec::Class(class.clone())
    }
}

impl From<ClassUnion> for ClassSpec {
    fn from(union: ClassUnion) -> Self {
        ClassSpec::Union(union)
    }
}

impl From<&ClassUnion> for ClassSpec {
    fn from(union: &ClassUnion) -> Self {
        ClassSpec::Union(union.clone())
    }
}

impl From<ClassLike> for ClassSpec {
    fn from(like: ClassLike) -> Self {
        match like {
            ClassLike::Class(class) => ClassSpec::Class(class),
            ClassLike::Union(union) => ClassSpec::Union(union),
        }
    }
}

impl From<PrimitiveType> for ClassSpec {
    fn from(ty: PrimitiveType) -> Self {
        ClassSpec::Primitive(ty)
    }
}

impl From<&str> for ClassSpec {
    fn from(name: &str) -> Self {
        ClassSpec::Name(name.to_string())
    }
}

impl From<String> for ClassSpec {
    fn from(name: String) -> Self {
        ClassSpec::Name(name)
    }
}

/// What a name is bound to in a registry scope.
#[derive(Debug, Clone)]
pub enum ScopeBinding {
    Class(Class),
    Union(ClassUnion),
    /// A non-class value; resolving its name as a class fails.
    Value(Value),
}

/// Explicit, owned name -> class scope.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    builtins: BuiltinTable,
    scope: IndexMap<String, ScopeBinding>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Registry over the standard built-in table.
    pub fn new() -> Self {
        Self::with_builtins(builtin::standard().clone())
    }

    pub fn with_builtins(builtins: BuiltinTable) -> Self {
        Self {
            builtins,
            scope: IndexMap::new(),
        }
    }

    pub fn builtins(&self) -> &BuiltinTable {
        &self.builtins
    }

    /// Bind `name` in this registry's scope, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, binding: ScopeBinding) {
        self.scope.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&ScopeBinding> {
        self.scope.get(name)
    }

    /// Resolve a specifier to its canonical class or union.
    ///
    /// Names are checked against the built-in table first, then the scope.
    pub fn resolve(&self, spec: impl Into<ClassSpec>) -> PolyResult<ClassLike> {
        match spec.into() {
            ClassSpec::Class(class) => Ok(ClassLike::Class(class)),
            ClassSpec::Union(union) => Ok(ClassLike::Union(union)),
            ClassSpec::Primitive(ty) => self
                .builtins
                .class_for_constructor(ty)
                .map(ClassLike::Class),
            ClassSpec::Name(name) => self.resolve_name(&name),
        }
    }

    fn resolve_name(&self, name: &str) -> PolyResult<ClassLike> {
        if let Some(found) = self.builtins.get(name) {
            return Ok(found.clone());
        }
        match self.scope.get(name) {
            Some(ScopeBinding::Class(class)) => Ok(ClassLike::Class(class.clone())),
            Some(ScopeBinding::Union(union)) => Ok(ClassLike::Union(union.clone())),
            Some(ScopeBinding::Value(value)) => Err(PolyError::invalid_signature(format!(
                "`{}` is bound to {}, not a class",
                name,
                value.type_name()
            ))),
            None => Err(PolyError::invalid_signature(format!(
                "can't find a class called `{}`",
                name
            ))),
        }
    }

    /// Resolve a specifier that must denote a single class.
    pub fn resolve_class(&self, spec: impl Into<ClassSpec>) -> PolyResult<Class> {
        match self.resolve(spec)? {
            ClassLike::Class(class) => Ok(class),
            ClassLike::Union(union) => Err(PolyError::invalid_signature(format!(
                "expected a single class, got union {}",
                union
            ))),
        }
    }

    /// Resolve every member and build a flat union.
    pub fn union<I, S>(&self, members: I) -> PolyResult<ClassUnion>
    where
        I: IntoIterator<Item = S>,
        S: Into<ClassSpec>,
    {
        let resolved = members
            .into_iter()
            .map(|m| self.resolve(m))
            .collect::<PolyResult<Vec<_>>>()?;
        Ok(ClassUnion::from_members(resolved))
    }

    /// Create a class from `builder` and bind it under its name.
    pub fn define_class(&mut self, builder: ClassBuilder) -> PolyResult<Class> {
        let ClassBuilder {
            name,
            parent,
            properties,
            validator,
            is_abstract,
        } = builder;

        if name.trim().is_empty() {
            return Err(PolyError::invalid_class("class name must not be empty"));
        }
        if self.builtins.get(&name).is_some() {
            return Err(PolyError::invalid_class(format!(
                "`{}` is a built-in class name",
                name
            )));
        }

        let parent = match parent {
            None => Parent::Class(builtin::any_class()),
            Some(spec) => match self.resolve(spec)? {
                ClassLike::Class(class) if class.ptr_eq(&builtin::missing_class()) => {
                    return Err(PolyError::invalid_class(format!(
                        "<{}> can't inherit from <MISSING>",
                        name
                    )));
                }
                ClassLike::Class(class) => Parent::Class(class),
                ClassLike::Union(union) => Parent::Union(union),
            },
        };

        let mut resolved = IndexMap::new();
        for spec in properties {
            let class = match &spec.class {
                Some(class_spec) => Some(self.resolve(class_spec.clone())?),
                None => None,
            };
            resolved.insert(spec.name.clone(), Property::from_spec(spec, class));
        }

        let class = Class::user(name.clone(), parent, resolved, validator, is_abstract);
        if let Err(err) = class.ancestor_chain(DEFAULT_MAX_ANCESTOR_DEPTH) {
            return Err(PolyError::invalid_class(format!("<{}>: {}", name, err)));
        }
        debug!(class = %name, "defined class");
        self.scope.insert(name, ScopeBinding::Class(class.clone()));
        Ok(class)
    }
}

/// Declarative description of a new class.
pub struct ClassBuilder {
    name: String,
    parent: Option<ClassSpec>,
    properties: Vec<PropertySpec>,
    validator: Option<Validator>,
    is_abstract: bool,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            validator: None,
            is_abstract: false,
        }
    }

    pub fn parent(mut self, parent: impl Into<ClassSpec>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance) -> Vec<String> + Send + Sync + 'static,
    {
        self.validator = Some(std::sync::Arc::new(f));
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("properties", &self.properties)
            .field("has_validator", &self.validator.is_some())
            .field("is_abstract", &self.is_abstract)
            .finish()
    }
}
