use std::sync::Arc;

use super::*;
use crate::error::{CompatWarning, IncompatibleReason, PolyError};
use crate::types::{ClassBuilder, ClassRegistry, ClassSpec};
use crate::value::Value;

fn method(tag: &str) -> Arc<Method> {
    let tag = tag.to_string();
    Arc::new(Method::new(
        "f".to_string(),
        Vec::new(),
        MethodImpl::new(params(&["x", "y"]), move |_, _| Ok(Value::from(tag.as_str()))),
    ))
}

fn sig(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn chain(names: &[&str]) -> Vec<String> {
    sig(names)
}

#[test]
fn test_insert_rejects_wrong_length() {
    let mut table = MethodTable::new(2);
    let err = table.insert(&sig(&["Dog"]), method("a")).unwrap_err();
    assert_eq!(
        err,
        PolyError::SignatureLengthMismatch {
            expected: 2,
            got: 1
        }
    );
}

#[test]
fn test_insert_replaces_identical_signature() {
    let mut table = MethodTable::new(2);
    let first = method("first");
    let second = method("second");
    assert!(table
        .insert(&sig(&["Dog", "Cat"]), first.clone())
        .unwrap()
        .is_none());
    let replaced = table
        .insert(&sig(&["Dog", "Cat"]), second.clone())
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&replaced, &first));
    let found = table.lookup_exact(&["Dog", "Cat"]).unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &second));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_lookup_exact_has_no_ancestor_expansion() {
    let mut table = MethodTable::new(1);
    table.insert(&sig(&["Animal"]), method("a")).unwrap();
    assert!(table.lookup_exact(&["Dog"]).unwrap().is_none());
    assert!(table.lookup_exact(&["Animal"]).unwrap().is_some());
}

#[test]
fn test_lookup_dispatch_leftmost_precedence() {
    let mut table = MethodTable::new(2);
    let any_any = method("Animal,Animal");
    let dog_any = method("Dog,Animal");
    let any_dog = method("Animal,Dog");
    table.insert(&sig(&["Animal", "Animal"]), any_any.clone()).unwrap();
    table.insert(&sig(&["Animal", "Dog"]), any_dog.clone()).unwrap();
    table.insert(&sig(&["Dog", "Animal"]), dog_any.clone()).unwrap();

    let chains = vec![
        chain(&["Dog", "Animal", "ANY"]),
        chain(&["Dog", "Animal", "ANY"]),
    ];
    let found = table.lookup_dispatch(&chains, &[]).unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &dog_any));

    // Skipping walks on from where the search left off.
    let next = table
        .lookup_dispatch(&chains, std::slice::from_ref(&dog_any))
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&next, &any_dog));
    let last = table
        .lookup_dispatch(&chains, &[dog_any.clone(), any_dog.clone()])
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&last, &any_any));
    assert!(table
        .lookup_dispatch(&chains, &[dog_any, any_dog, any_any])
        .unwrap()
        .is_none());
}

#[test]
fn test_lookup_dispatch_falls_through_to_any() {
    let mut table = MethodTable::new(1);
    let fallback = method("ANY");
    table.insert(&sig(&["ANY"]), fallback.clone()).unwrap();
    let found = table
        .lookup_dispatch(&[chain(&["integer", "ANY"])], &[])
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&found, &fallback));
}

#[test]
fn test_dispatch_cache_hit_and_invalidation() {
    let mut table = MethodTable::new(1);
    table.insert(&sig(&["ANY"]), method("ANY")).unwrap();
    let chains = vec![chain(&["integer", "ANY"])];

    table.lookup_dispatch(&chains, &[]).unwrap();
    assert_eq!(table.cached_entries(), 1);

    // Skip-set lookups never populate the cache.
    let other = vec![chain(&["double", "ANY"])];
    table.lookup_dispatch(&other, &[method("z")]).unwrap();
    assert_eq!(table.cached_entries(), 1);

    let specific = method("integer");
    table.insert(&sig(&["integer"]), specific.clone()).unwrap();
    assert_eq!(table.cached_entries(), 0, "cache should be cleared after insert");
    let found = table.lookup_dispatch(&chains, &[]).unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &specific));
}

#[test]
fn test_entries_flatten_in_insertion_order() {
    let mut table = MethodTable::new(2);
    table.insert(&sig(&["A", "B"]), method("1")).unwrap();
    table.insert(&sig(&["C", "D"]), method("2")).unwrap();
    table.insert(&sig(&["A", "E"]), method("3")).unwrap();
    let paths: Vec<_> = table.entries().into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        paths,
        vec![sig(&["A", "B"]), sig(&["A", "E"]), sig(&["C", "D"])]
    );
}

#[test]
fn test_check_compatible_fatal_cases() {
    let generic = Generic::define(
        "combine",
        &["x", "y"],
        vec![
            Param::required("x"),
            Param::required("y"),
            Param::variadic(),
            Param::with_default("sep", " "),
        ],
    )
    .unwrap();

    let err = generic.check_compatible(&params(&["y", "x"])).unwrap_err();
    assert!(matches!(
        err,
        PolyError::IncompatibleMethod {
            reason: IncompatibleReason::MissingDispatchPrefix { .. },
            ..
        }
    ));

    let err = generic
        .check_compatible(&[Param::required("x"), Param::with_default("y", 1i64)])
        .unwrap_err();
    assert!(matches!(
        err,
        PolyError::IncompatibleMethod {
            reason: IncompatibleReason::DispatchArgHasDefault(ref name),
            ..
        } if name == "y"
    ));

    let err = generic
        .check_compatible(&params(&["x", "y", "sep", "..."]))
        .unwrap_err();
    assert!(matches!(
        err,
        PolyError::IncompatibleMethod {
            reason: IncompatibleReason::VariadicNotFollowing,
            ..
        }
    ));
}

#[test]
fn test_check_compatible_warnings() {
    let generic = Generic::define(
        "combine",
        &["x"],
        vec![
            Param::required("x"),
            Param::variadic(),
            Param::with_default("sep", " "),
            Param::with_default("trim", false),
        ],
    )
    .unwrap();

    let warnings = generic
        .check_compatible(&[
            Param::required("x"),
            Param::variadic(),
            Param::with_default("sep", ","),
        ])
        .unwrap();
    assert_eq!(
        warnings,
        vec![
            CompatWarning::DifferingDefault {
                param: "sep".to_string(),
                generic: Some(Value::from(" ")),
                method: Some(Value::from(",")),
            },
            CompatWarning::MissingParam("trim".to_string()),
        ]
    );

    let clean = generic
        .check_compatible(&[
            Param::required("x"),
            Param::variadic(),
            Param::with_default("sep", " "),
            Param::with_default("trim", false),
        ])
        .unwrap();
    assert!(clean.is_empty());
}

#[test]
fn test_registration_reports_warnings_but_succeeds() {
    let registry = ClassRegistry::new();
    let generic = Generic::define(
        "show",
        &["x"],
        vec![Param::required("x"), Param::with_default("digits", 3i64)],
    )
    .unwrap();
    let reg = generic
        .register(
            &registry,
            ["integer"],
            MethodImpl::new(params(&["x"]), |_, _| Ok(Value::Null)),
        )
        .unwrap();
    assert_eq!(
        reg.warnings,
        vec![CompatWarning::MissingParam("digits".to_string())]
    );
    assert_eq!(generic.methods().len(), 1);
}

#[test]
fn test_union_registration_shares_one_method() {
    let mut registry = ClassRegistry::new();
    registry.define_class(ClassBuilder::new("B")).unwrap();
    registry.define_class(ClassBuilder::new("C")).unwrap();
    let bc = registry.union(["B", "C"]).unwrap();
    let generic = Generic::define("f", &["x"], params(&["x"])).unwrap();
    let reg = generic
        .register(
            &registry,
            [bc],
            MethodImpl::new(params(&["x"]), |_, _| Ok(Value::Null)),
        )
        .unwrap();
    assert_eq!(reg.paths.len(), 2);
    let entries = generic.methods();
    assert_eq!(entries.len(), 2);
    assert!(Arc::ptr_eq(&entries[0].1, &entries[1].1));
    assert_eq!(reg.method.signature_names(), vec!["<B> | <C>".to_string()]);
}

#[test]
fn test_explain_marks_selected() {
    let mut registry = ClassRegistry::new();
    let animal = registry.define_class(ClassBuilder::new("Animal")).unwrap();
    let dog = registry
        .define_class(ClassBuilder::new("Dog").parent(&animal))
        .unwrap();
    let generic = Generic::define("f", &["x"], params(&["x"])).unwrap();
    generic
        .register(
            &registry,
            ["Animal"],
            MethodImpl::new(params(&["x"]), |_, _| Ok(Value::Null)),
        )
        .unwrap();

    let entries = generic.explain(&[dog]).unwrap();
    let rows: Vec<_> = entries
        .iter()
        .map(|e| (e.signature[0].as_str(), e.registered, e.selected))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Dog", false, false),
            ("Animal", true, true),
            ("ANY", false, false)
        ]
    );
    let json = serde_json::to_value(&entries[1]).unwrap();
    assert_eq!(json["selected"], serde_json::Value::Bool(true));
}

#[test]
fn test_register_rejects_empty_union() {
    let registry = ClassRegistry::new();
    let nothing = registry.union(Vec::<&str>::new()).unwrap();
    assert!(nothing.is_empty());
    let generic = Generic::define("f", &["x", "y"], params(&["x", "y"])).unwrap();
    let err = generic
        .register(
            &registry,
            [ClassSpec::from("integer"), ClassSpec::from(nothing)],
            MethodImpl::new(params(&["x", "y"]), |_, _| Ok(Value::Null)),
        )
        .unwrap_err();
    assert!(matches!(err, PolyError::InvalidSignature(ref msg) if msg.contains("empty union")));
    assert!(generic.methods().is_empty());
}

#[test]
fn test_dispatch_cache_is_bounded() {
    let mut table = MethodTable::new(1).with_cache(true, 2);
    let fallback = method("ANY");
    table.insert(&sig(&["ANY"]), fallback.clone()).unwrap();

    for name in ["integer", "double"] {
        table.lookup_dispatch(&[chain(&[name, "ANY"])], &[]).unwrap();
    }
    assert_eq!(table.cached_entries(), 2);

    // A full cache is cleared before the next entry goes in.
    let found = table
        .lookup_dispatch(&[chain(&["character", "ANY"])], &[])
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&found, &fallback));
    assert_eq!(table.cached_entries(), 1);
}
