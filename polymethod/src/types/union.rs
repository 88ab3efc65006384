//! Class unions: flat sets of alternative classes.

use std::fmt;
use std::sync::Arc;

use super::class::Class;
use super::registry::ClassLike;

/// A flattened set of alternative classes.
///
/// Members never include another union, and a class appears at most once
/// (compared by identity). Member order is stable but callers should treat
/// the union as a set; `==` compares membership, not order.
#[derive(Clone)]
pub struct ClassUnion {
    members: Arc<[Class]>,
}

impl ClassUnion {
    /// Build a union from already-resolved classes and unions, flattening
    /// nested unions and dropping duplicates.
    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = ClassLike>,
    {
        let mut flat: Vec<Class> = Vec::new();
        for member in members {
            match member {
                ClassLike::Class(class) => push_unique(&mut flat, class),
                ClassLike::Union(union) => {
                    for class in union.members.iter() {
                        push_unique(&mut flat, class.clone());
                    }
                }
            }
        }
        ClassUnion {
            members: flat.into(),
        }
    }

    pub fn members(&self) -> &[Class] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, class: &Class) -> bool {
        self.members.iter().any(|m| m.ptr_eq(class))
    }

    /// Member names, duplicates removed (distinct classes may share a name).
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.members.len());
        for member in self.members.iter() {
            if !names.iter().any(|n| n == member.name()) {
                names.push(member.name().to_string());
            }
        }
        names
    }
}

fn push_unique(out: &mut Vec<Class>, class: Class) {
    if !out.iter().any(|c| c.ptr_eq(&class)) {
        out.push(class);
    }
}

impl PartialEq for ClassUnion {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.members.iter().all(|m| other.contains(m))
    }
}

impl Eq for ClassUnion {}

impl fmt::Debug for ClassUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassUnion")
            .field(&self.members.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for ClassUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.members.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", names.join(" | "))
    }
}
