//! Multiple-dispatch object model.
//!
//! Classes are first-class values with single inheritance (a parent may
//! also be a union of classes). Generic functions own a method table keyed
//! by the class names of their dispatch arguments, and calls select the
//! most specific method by walking each argument's ancestor chain.
//!
//! ```
//! use polymethod::prelude::*;
//!
//! let mut registry = ClassRegistry::new();
//! let animal = registry.define_class(ClassBuilder::new("Animal")).unwrap();
//! let dog = registry
//!     .define_class(ClassBuilder::new("Dog").parent(&animal))
//!     .unwrap();
//!
//! let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
//! speak
//!     .register(&registry, ["Animal"], MethodImpl::new(params(&["x"]), |_, _| Ok("...".into())))
//!     .unwrap();
//! speak
//!     .register(&registry, ["Dog"], MethodImpl::new(params(&["x"]), |_, _| Ok("Woof".into())))
//!     .unwrap();
//!
//! let rex = Value::Object(dog.construct(Vec::<(String, Value)>::new()).unwrap());
//! assert_eq!(speak.call(&[rex]).unwrap(), Value::from("Woof"));
//! ```

// Library code reports through `tracing`, never directly to stderr.
#![deny(clippy::print_stderr)]

pub mod config;
pub mod error;
pub mod methods;
pub mod types;
pub mod value;

pub use config::{DispatchConfig, DuplicatePolicy};
pub use error::{CompatWarning, DispatchArgsRule, IncompatibleReason, PolyError, PolyResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{DispatchConfig, DuplicatePolicy};
    pub use crate::error::{PolyError, PolyResult};
    pub use crate::methods::{
        implementation, params, CallContext, Generic, GenericOptions, LegacyResolver,
        LegacyTable, MethodImpl, NoLegacy, Param,
    };
    pub use crate::types::{
        Class, ClassBuilder, ClassLike, ClassRegistry, ClassSpec, ClassUnion, PrimitiveType,
    };
    pub use crate::value::{Instance, PropertySpec, Value};
}
