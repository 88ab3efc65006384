//! Class values: identity, parent link, properties and validator.
//!
//! A [`Class`] is a cheap handle (`Arc`) to immutable class data. Equality
//! and hashing are by identity: two classes that happen to share a name are
//! still different classes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use super::builtin::PrimitiveType;
use super::union::ClassUnion;
use crate::error::{PolyError, PolyResult};
use crate::value::{Instance, Property};

/// Name of the universal root class.
pub const ROOT_CLASS_NAME: &str = "ANY";

/// Name of the class given to absent arguments.
pub const MISSING_CLASS_NAME: &str = "MISSING";

/// Validation hook: returns a list of problems, empty when the instance is valid.
pub type Validator = Arc<dyn Fn(&Instance) -> Vec<String> + Send + Sync>;

/// Parent link of a class.
#[derive(Debug, Clone, PartialEq)]
pub enum Parent {
    Class(Class),
    Union(ClassUnion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    /// The universal root (`ANY`).
    Root,
    /// Built-in class, optionally tied to a primitive constructor.
    Builtin(Option<PrimitiveType>),
    /// Class created through a registry.
    User,
}

struct ClassData {
    name: String,
    kind: ClassKind,
    parent: Option<Parent>,
    properties: IndexMap<String, Property>,
    validator: Option<Validator>,
    is_abstract: bool,
}

/// A class, shared by reference.
#[derive(Clone)]
pub struct Class(Arc<ClassData>);

impl Class {
    pub(crate) fn root() -> Self {
        Class(Arc::new(ClassData {
            name: ROOT_CLASS_NAME.to_string(),
            kind: ClassKind::Root,
            parent: None,
            properties: IndexMap::new(),
            validator: None,
            is_abstract: true,
        }))
    }

    pub(crate) fn builtin(name: &str, constructor: Option<PrimitiveType>, root: &Class) -> Self {
        Class(Arc::new(ClassData {
            name: name.to_string(),
            kind: ClassKind::Builtin(constructor),
            parent: Some(Parent::Class(root.clone())),
            properties: IndexMap::new(),
            validator: None,
            is_abstract: false,
        }))
    }

    pub(crate) fn user(
        name: String,
        parent: Parent,
        properties: IndexMap<String, Property>,
        validator: Option<Validator>,
        is_abstract: bool,
    ) -> Self {
        Class(Arc::new(ClassData {
            name,
            kind: ClassKind::User,
            parent: Some(parent),
            properties,
            validator,
            is_abstract,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Parent> {
        self.0.parent.as_ref()
    }

    /// Properties declared directly on this class (inherited ones excluded).
    pub fn own_properties(&self) -> &IndexMap<String, Property> {
        &self.0.properties
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.0.validator.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.0.is_abstract
    }

    pub fn is_root(&self) -> bool {
        matches!(self.0.kind, ClassKind::Root)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.0.kind, ClassKind::Builtin(_) | ClassKind::Root)
    }

    /// The primitive constructor this built-in class stands for, if any.
    pub fn constructor(&self) -> Option<PrimitiveType> {
        match self.0.kind {
            ClassKind::Builtin(ctor) => ctor,
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Class names from most specific (this class) to the universal root.
    ///
    /// A union parent contributes each member's chain in member order; names
    /// already present are not repeated. The root name always comes last.
    /// Walking deeper than `max_depth` links is a `ResolutionError`.
    pub fn ancestor_chain(&self, max_depth: usize) -> PolyResult<Vec<String>> {
        let mut chain = Vec::new();
        self.collect_chain(&mut chain, 0, max_depth)?;
        chain.push(ROOT_CLASS_NAME.to_string());
        Ok(chain)
    }

    fn collect_chain(&self, out: &mut Vec<String>, depth: usize, max_depth: usize) -> PolyResult<()> {
        if depth > max_depth {
            return Err(PolyError::resolution(format!(
                "ancestor chain of <{}> exceeds {} links; the class graph is cyclic or malformed",
                self.name(),
                max_depth
            )));
        }
        if self.is_root() {
            return Ok(());
        }
        if !out.iter().any(|n| n == self.name()) {
            out.push(self.name().to_string());
        }
        match &self.0.parent {
            Some(Parent::Class(parent)) => parent.collect_chain(out, depth + 1, max_depth),
            Some(Parent::Union(union)) => {
                for member in union.members() {
                    member.collect_chain(out, depth + 1, max_depth)?;
                }
                Ok(())
            }
            None => Err(PolyError::resolution(format!(
                "<{}> has no parent but is not the root class",
                self.name()
            ))),
        }
    }

    /// Identity-based subclass test (`self` is `other` or descends from it).
    ///
    /// `ClassRegistry::define_class` refuses classes whose ancestor chain
    /// exceeds `DEFAULT_MAX_ANCESTOR_DEPTH`, so the depth bound in this walk
    /// (and in the property and validator walks) is never reached for
    /// registry-built classes.
    pub fn inherits_from(&self, other: &Class) -> bool {
        self.inherits_within(other, 0)
    }

    fn inherits_within(&self, other: &Class, depth: usize) -> bool {
        if self.ptr_eq(other) || other.is_root() {
            return true;
        }
        if depth > crate::config::DEFAULT_MAX_ANCESTOR_DEPTH {
            return false;
        }
        match &self.0.parent {
            Some(Parent::Class(parent)) => parent.inherits_within(other, depth + 1),
            Some(Parent::Union(union)) => union
                .members()
                .iter()
                .any(|m| m.inherits_within(other, depth + 1)),
            None => false,
        }
    }

    /// Every property visible on instances: ancestors first, then this class.
    /// A redeclared name keeps its original position but takes the newer spec.
    pub fn properties(&self) -> IndexMap<String, Property> {
        let mut all = IndexMap::new();
        self.collect_properties(&mut all, 0);
        all
    }

    fn collect_properties(&self, out: &mut IndexMap<String, Property>, depth: usize) {
        if depth > crate::config::DEFAULT_MAX_ANCESTOR_DEPTH {
            return;
        }
        match &self.0.parent {
            Some(Parent::Class(parent)) => parent.collect_properties(out, depth + 1),
            Some(Parent::Union(union)) => {
                for member in union.members() {
                    member.collect_properties(out, depth + 1);
                }
            }
            None => {}
        }
        for (name, prop) in &self.0.properties {
            out.insert(name.clone(), prop.clone());
        }
    }

    /// Validators from the root-most ancestor down to this class.
    ///
    /// Union parents contribute every member's lineage in member order; a
    /// class reachable through several members runs its validator once.
    pub(crate) fn validators(&self) -> Vec<(String, Validator)> {
        let mut lineage = Vec::new();
        self.collect_lineage(&mut lineage, 0);
        lineage
            .into_iter()
            .filter_map(|c| c.validator().map(|v| (c.name().to_string(), v.clone())))
            .collect()
    }

    fn collect_lineage(&self, out: &mut Vec<Class>, depth: usize) {
        if depth > crate::config::DEFAULT_MAX_ANCESTOR_DEPTH {
            return;
        }
        match &self.0.parent {
            Some(Parent::Class(parent)) => parent.collect_lineage(out, depth + 1),
            Some(Parent::Union(union)) => {
                for member in union.members() {
                    member.collect_lineage(out, depth + 1);
                }
            }
            None => {}
        }
        if !out.iter().any(|c| c.ptr_eq(self)) {
            out.push(self.clone());
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = match &self.0.parent {
            Some(Parent::Class(p)) => Some(p.name().to_string()),
            Some(Parent::Union(u)) => Some(u.to_string()),
            None => None,
        };
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("parent", &parent)
            .field("properties", &self.0.properties.keys().collect::<Vec<_>>())
            .field("is_abstract", &self.0.is_abstract)
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}
