//! Generic functions, method tables and dispatch.
//!
//! # Module Organization
//!
//! - `method.rs`: Method, MethodImpl, Param, Implementation
//! - `table.rs`: MethodTable trie keyed by class name
//! - `generic.rs`: Generic definition, compatibility checks, registration
//! - `dispatch.rs`: method selection, legacy fallback, next-method context
//! - `legacy.rs`: LegacyResolver seam for the secondary dispatch mechanism

mod dispatch;
mod generic;
mod legacy;
mod method;
mod table;

#[cfg(test)]
mod tests;

pub use dispatch::{CallContext, ExplainEntry, Target};
pub use generic::{validate_dispatch_args, Generic, GenericOptions, Registration};
pub use legacy::{LegacyResolver, LegacyTable, NoLegacy};
pub use method::{implementation, params, Implementation, Method, MethodImpl, Param, VARIADIC};
pub use table::{MethodNode, MethodTable};
