//! Dispatch ordering, next-method, unions and fallback behavior.

mod common;

use std::sync::Arc;
use std::thread;

use common::{chained, object, tagged, zoo};
use polymethod::prelude::*;
use pretty_assertions::assert_eq;

fn pair_generic() -> Generic {
    Generic::define("meet", &["x", "y"], params(&["x", "y"])).unwrap()
}

#[test]
fn test_first_argument_specificity_dominates() {
    let z = zoo();
    let meet = pair_generic();
    meet.register(&z.registry, ["Animal", "Animal"], tagged(&["x", "y"], "AA"))
        .unwrap();
    meet.register(&z.registry, ["Animal", "Dog"], tagged(&["x", "y"], "AD"))
        .unwrap();
    meet.register(&z.registry, ["Dog", "Animal"], tagged(&["x", "y"], "DA"))
        .unwrap();

    let result = meet.call(&[object(&z.dog), object(&z.dog)]).unwrap();
    assert_eq!(result, Value::from("DA"));

    let selected = meet.dispatch(&[z.dog.clone(), z.dog.clone()]).unwrap().unwrap();
    assert_eq!(selected.signature_names(), vec!["<Dog>", "<Animal>"]);
}

#[test]
fn test_next_method_walks_to_less_specific() {
    let z = zoo();
    let meet = pair_generic();
    meet.register(&z.registry, ["Animal", "Animal"], tagged(&["x", "y"], "AA"))
        .unwrap();
    meet.register(&z.registry, ["Dog", "Animal"], chained(&["x", "y"], "DA"))
        .unwrap();

    let result = meet.call(&[object(&z.dog), object(&z.dog)]).unwrap();
    assert_eq!(result, Value::from("DA > AA"));
}

#[test]
fn test_next_method_chain_through_three_levels() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    speak
        .register(&z.registry, ["ANY"], tagged(&["x"], "any"))
        .unwrap();
    speak
        .register(&z.registry, ["Animal"], chained(&["x"], "animal"))
        .unwrap();
    speak
        .register(&z.registry, ["Puppy"], chained(&["x"], "puppy"))
        .unwrap();

    let result = speak.call(&[object(&z.puppy)]).unwrap();
    assert_eq!(result, Value::from("puppy > animal > any"));
}

#[test]
fn test_next_method_exhausted_is_no_applicable() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    speak
        .register(&z.registry, ["Dog"], chained(&["x"], "dog"))
        .unwrap();
    let err = speak.call(&[object(&z.dog)]).unwrap_err();
    assert!(matches!(err, PolyError::NoApplicableMethod { .. }));
}

#[test]
fn test_call_context_exposes_tried_methods() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    speak
        .register(
            &z.registry,
            ["Animal"],
            MethodImpl::new(params(&["x"]), |ctx, _| {
                Ok(Value::from(ctx.tried().len().to_string()))
            }),
        )
        .unwrap();
    speak
        .register(&z.registry, ["Dog"], chained(&["x"], "dog"))
        .unwrap();

    assert_eq!(speak.call(&[object(&z.puppy)]).unwrap(), Value::from("dog > 1"));
    assert_eq!(speak.call(&[object(&z.cat)]).unwrap(), Value::from("0"));
}

#[test]
fn test_union_signature_reaches_every_member() {
    let z = zoo();
    let meet = pair_generic();
    let pets = z.registry.union(["Dog", "Cat"]).unwrap();
    let reg = meet
        .register(
            &z.registry,
            [ClassSpec::from("Animal"), ClassSpec::from(pets)],
            tagged(&["x", "y"], "pets"),
        )
        .unwrap();
    assert_eq!(reg.paths.len(), 2);

    let via_dog = meet
        .dispatch(&[z.animal.clone(), z.dog.clone()])
        .unwrap()
        .unwrap();
    let via_cat = meet
        .dispatch(&[z.animal.clone(), z.cat.clone()])
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&via_dog, &via_cat));
    assert!(Arc::ptr_eq(&via_dog, &reg.method));

    // Nothing registered for the union's parent.
    assert!(meet
        .dispatch(&[z.animal.clone(), z.animal.clone()])
        .unwrap()
        .is_none());
}

#[test]
fn test_builtin_union_dispatch() {
    let registry = ClassRegistry::new();
    let describe = Generic::define("describe", &["x"], params(&["x"])).unwrap();
    describe
        .register(&registry, ["numeric"], tagged(&["x"], "number"))
        .unwrap();
    describe
        .register(&registry, ["character"], tagged(&["x"], "text"))
        .unwrap();

    assert_eq!(describe.call(&[Value::from(2i64)]).unwrap(), Value::from("number"));
    assert_eq!(describe.call(&[Value::from(2.5)]).unwrap(), Value::from("number"));
    assert_eq!(describe.call(&[Value::from("a")]).unwrap(), Value::from("text"));
    assert!(describe.call(&[Value::from(true)]).is_err());
}

#[test]
fn test_missing_argument_dispatches_on_missing() {
    let registry = ClassRegistry::new();
    let f = Generic::define("f", &["x", "y"], params(&["x", "y"])).unwrap();
    f.register(&registry, ["integer", "MISSING"], tagged(&["x", "y"], "unary"))
        .unwrap();
    f.register(&registry, ["integer", "integer"], tagged(&["x", "y"], "binary"))
        .unwrap();

    assert_eq!(f.call(&[Value::from(1i64)]).unwrap(), Value::from("unary"));
    assert_eq!(
        f.call(&[Value::from(1i64), Value::from(2i64)]).unwrap(),
        Value::from("binary")
    );
}

#[test]
fn test_empty_generic_fails_with_full_chain() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    let err = speak.call(&[object(&z.puppy)]).unwrap_err();
    match &err {
        PolyError::NoApplicableMethod {
            generic,
            classes,
            tried,
            ..
        } => {
            assert_eq!(generic, "speak");
            assert_eq!(classes, &vec!["Puppy".to_string()]);
            assert_eq!(
                tried,
                &vec![vec![
                    "Puppy".to_string(),
                    "Dog".to_string(),
                    "Animal".to_string(),
                    "ANY".to_string(),
                    "default".to_string(),
                ]]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("speak"));
}

#[test]
fn test_reregistration_last_wins() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    speak
        .register(&z.registry, ["Dog"], tagged(&["x"], "first"))
        .unwrap();
    let second = speak
        .register(&z.registry, ["Dog"], tagged(&["x"], "second"))
        .unwrap();

    let exact = speak.method(&z.registry, ["Dog"]).unwrap().unwrap();
    assert!(Arc::ptr_eq(&exact, &second.method));
    let dispatched = speak.dispatch(&[z.dog.clone()]).unwrap().unwrap();
    assert!(Arc::ptr_eq(&dispatched, &second.method));
    assert_eq!(speak.methods().len(), 1);
    assert_eq!(speak.call(&[object(&z.dog)]).unwrap(), Value::from("second"));
}

#[test]
fn test_duplicate_policy_error_refuses_overwrite() {
    let z = zoo();
    let options = GenericOptions {
        config: DispatchConfig {
            duplicate_policy: DuplicatePolicy::Error,
            ..DispatchConfig::default()
        },
        ..GenericOptions::default()
    };
    let speak = Generic::define_with("speak", &["x"], params(&["x"]), options).unwrap();
    speak
        .register(&z.registry, ["Dog"], tagged(&["x"], "first"))
        .unwrap();

    // A union overlapping an existing path is refused as a whole.
    let pets = z.registry.union(["Cat", "Dog"]).unwrap();
    let err = speak
        .register(&z.registry, [pets], tagged(&["x"], "pets"))
        .unwrap_err();
    assert!(matches!(err, PolyError::DuplicateMethod { .. }));
    assert!(speak.method(&z.registry, ["Cat"]).unwrap().is_none());
    assert_eq!(speak.call(&[object(&z.dog)]).unwrap(), Value::from("first"));
}

#[test]
fn test_register_signature_length_mismatch() {
    let z = zoo();
    let meet = pair_generic();
    let err = meet
        .register(&z.registry, ["Dog"], tagged(&["x", "y"], "x"))
        .unwrap_err();
    assert_eq!(
        err,
        PolyError::SignatureLengthMismatch {
            expected: 2,
            got: 1
        }
    );
    assert!(meet.methods().is_empty());
}

#[test]
fn test_register_unknown_class_is_invalid_signature() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    let err = speak
        .register(&z.registry, ["Unicorn"], tagged(&["x"], "x"))
        .unwrap_err();
    assert!(matches!(err, PolyError::InvalidSignature(_)));
}

#[test]
fn test_incompatible_method_is_rejected() {
    let z = zoo();
    let meet = pair_generic();
    let err = meet
        .register(&z.registry, ["Dog", "Dog"], tagged(&["y", "x"], "swapped"))
        .unwrap_err();
    assert!(matches!(err, PolyError::IncompatibleMethod { .. }));
    assert!(meet.methods().is_empty());
}

#[test]
fn test_dispatch_args_must_prefix_params() {
    let err = Generic::define("f", &["x", "y"], params(&["y", "x", "z"])).unwrap_err();
    assert_eq!(
        err,
        PolyError::InvalidDispatchArgs(polymethod::DispatchArgsRule::NotPrefix)
    );
}

#[test]
fn test_legacy_fallback_by_class_then_default() {
    let legacy = Arc::new(LegacyTable::default());
    legacy.register(
        "format",
        "integer",
        implementation(|_, _| Ok(Value::from("legacy integer"))),
    );
    let options = GenericOptions {
        legacy: legacy.clone(),
        ..GenericOptions::default()
    };
    let registry = ClassRegistry::new();
    let format = Generic::define_with("format", &["x"], params(&["x"]), options).unwrap();
    format
        .register(&registry, ["character"], tagged(&["x"], "native"))
        .unwrap();

    assert_eq!(format.call(&[Value::from("a")]).unwrap(), Value::from("native"));
    assert_eq!(
        format.call(&[Value::from(1i64)]).unwrap(),
        Value::from("legacy integer")
    );
    assert!(matches!(
        format.call(&[Value::from(1.5)]),
        Err(PolyError::NoApplicableMethod { .. })
    ));

    legacy.register_default("format", implementation(|_, _| Ok(Value::from("legacy default"))));
    assert_eq!(
        format.call(&[Value::from(1.5)]).unwrap(),
        Value::from("legacy default")
    );
}

#[test]
fn test_next_method_inside_legacy_is_no_applicable() {
    let legacy = Arc::new(LegacyTable::default());
    legacy.register_default("f", implementation(|ctx, args| ctx.call_next(args)));
    let options = GenericOptions {
        legacy,
        ..GenericOptions::default()
    };
    let f = Generic::define_with("f", &["x"], params(&["x"]), options).unwrap();
    assert!(matches!(
        f.call(&[Value::from(1i64)]),
        Err(PolyError::NoApplicableMethod { .. })
    ));
}

#[test]
fn test_dispatch_is_shared_across_threads() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    speak
        .register(&z.registry, ["Animal"], tagged(&["x"], "animal"))
        .unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            let speak = speak.clone();
            let dog = object(&z.dog);
            s.spawn(move || {
                for _ in 0..100 {
                    assert_eq!(speak.call(&[dog.clone()]).unwrap(), Value::from("animal"));
                }
            });
        }
        s.spawn(|| {
            speak
                .register(&z.registry, ["Cat"], tagged(&["x"], "cat"))
                .unwrap();
        });
    });

    assert_eq!(speak.call(&[object(&z.cat)]).unwrap(), Value::from("cat"));
}

#[test]
fn test_method_body_can_register_on_same_generic() {
    let z = zoo();
    let speak = Generic::define("speak", &["x"], params(&["x"])).unwrap();
    let registry = z.registry.clone();
    speak
        .register(
            &z.registry,
            ["Animal"],
            MethodImpl::new(params(&["x"]), move |ctx, _| {
                ctx.generic()
                    .register(&registry, ["Cat"], tagged(&["x"], "late"))?;
                Ok(Value::from("animal"))
            }),
        )
        .unwrap();

    assert_eq!(speak.call(&[object(&z.cat)]).unwrap(), Value::from("animal"));
    assert_eq!(speak.call(&[object(&z.cat)]).unwrap(), Value::from("late"));
}
