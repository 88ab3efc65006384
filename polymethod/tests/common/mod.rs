//! Shared fixtures for integration tests.

#![allow(dead_code)]

use polymethod::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness; `RUST_LOG=polymethod=trace` to see dispatch.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `Animal <- Dog <- Puppy`, plus `Cat <- Animal`.
pub struct Zoo {
    pub registry: ClassRegistry,
    pub animal: Class,
    pub dog: Class,
    pub puppy: Class,
    pub cat: Class,
}

pub fn zoo() -> Zoo {
    init_tracing();
    let mut registry = ClassRegistry::new();
    let animal = registry.define_class(ClassBuilder::new("Animal")).unwrap();
    let dog = registry
        .define_class(ClassBuilder::new("Dog").parent(&animal))
        .unwrap();
    let puppy = registry
        .define_class(ClassBuilder::new("Puppy").parent(&dog))
        .unwrap();
    let cat = registry
        .define_class(ClassBuilder::new("Cat").parent(&animal))
        .unwrap();
    Zoo {
        registry,
        animal,
        dog,
        puppy,
        cat,
    }
}

/// A method body that returns `tag` as a character value.
pub fn tagged(names: &[&str], tag: &str) -> MethodImpl {
    let tag = tag.to_string();
    MethodImpl::new(params(names), move |_, _| Ok(Value::from(tag.as_str())))
}

/// A method body that prefixes `tag` to whatever the next method returns.
pub fn chained(names: &[&str], tag: &str) -> MethodImpl {
    let tag = tag.to_string();
    MethodImpl::new(params(names), move |ctx, args| {
        let rest = ctx.call_next(args)?;
        Ok(Value::from(format!("{} > {}", tag, rest.as_str().unwrap_or("?"))))
    })
}

pub fn object(class: &Class) -> Value {
    Value::Object(class.construct(Vec::<(String, Value)>::new()).unwrap())
}
