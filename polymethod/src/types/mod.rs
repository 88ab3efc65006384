//! Class model for multiple dispatch.
//!
//! # Module Organization
//!
//! - `class.rs`: Class handles, parent links, ancestor chains
//! - `union.rs`: ClassUnion, a flat set of alternative classes
//! - `builtin.rs`: primitive constructors and the built-in class table
//! - `registry.rs`: ClassRegistry, ClassSpec resolution, class definition

mod builtin;
mod class;
mod registry;
mod union;


pub use builtin::{any_class, missing_class, standard, BuiltinTable, PrimitiveType};
pub use class::{Class, Parent, Validator, MISSING_CLASS_NAME, ROOT_CLASS_NAME};
pub use registry::{ClassBuilder, ClassLike, ClassRegistry, ClassSpec, ScopeBinding};
pub use union::ClassUnion;

pub(crate) use builtin::BASE;
