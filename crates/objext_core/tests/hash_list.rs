use objext_core::{
    set, set_property, set_setter, wrap, CallArgs, Callable, Composable, ComposeError,
    ComposeOptions, ComposeResult, Extension, ExtensionCatalog, ExtensionRef, HostType,
    Interceptor, Member, Signature, Value, INIT,
};
use std::collections::BTreeMap;
use std::rc::Rc;

fn hash_list_type() -> Rc<HostType> {
    HostType::builder("HashList")
        .init(
            Signature::new().param_with_default("iterable", Value::List(vec![])),
            |host, args| {
                host.assign("values", Value::Map(BTreeMap::new()))?;
                host.assign("list", Value::List(vec![]))?;
                for item in args.get("iterable")?.as_list()?.to_vec() {
                    host.call("append", CallArgs::new().arg(item))?;
                }
                Ok(Value::Null)
            },
        )
        .method("append", Signature::new().param("item"), |host, args| {
            let item = args.get("item")?.clone();
            let list = host.value_mut("list")?.as_list_mut()?;
            list.push(item.clone());
            let position = Value::from(list.len() - 1);
            host.value_mut("values")?
                .as_map_mut()?
                .entry(item.key())
                .or_insert_with(|| Value::List(vec![]))
                .as_list_mut()?
                .push(position);
            Ok(Value::Null)
        })
        .method("index", Signature::new().param("item"), |host, args| {
            let key = args.get("item")?.key();
            host.get("values")?
                .as_map()?
                .get(&key)
                .cloned()
                .ok_or_else(|| ComposeError::failed(format!("{key} is not in hashlist")))
        })
        .build()
        .expect("valid HashList type")
}

struct Listener;

impl Extension for Listener {
    fn id(&self) -> &str {
        "listener"
    }

    fn can_extend(&self, target: &dyn Composable) -> bool {
        target.is_a("HashList")
    }

    fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
        set(
            target,
            "increment_append_count",
            Callable::method(Signature::new(), |host, _| {
                let count = host.value_mut("append_count")?;
                *count = Value::from(count.as_int()? + 1);
                Ok(Value::Null)
            }),
        )?;
        wrap(
            target,
            INIT,
            Interceptor::new().before(|record| {
                set(&mut *record.host, "append_count", Member::value(0))
            }),
        )?;
        wrap(
            target,
            "append",
            Interceptor::new().after(|record| {
                record
                    .host
                    .call("increment_append_count", CallArgs::new())
                    .map(|_| ())
            }),
        )
    }
}

struct AdditionalProperties;

impl Extension for AdditionalProperties {
    fn id(&self) -> &str {
        "additional-properties"
    }

    fn can_extend(&self, target: &dyn Composable) -> bool {
        target.is_a("HashList")
    }

    fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
        set_property(
            target,
            "unrelated_number",
            Callable::method(Signature::new(), |host, _| host.get("_unrelated_number")),
        )?;
        set_setter(
            target,
            "unrelated_number",
            Callable::method(Signature::new().param("value"), |host, args| {
                host.assign("_unrelated_number", args.get("value")?.clone())?;
                Ok(Value::Null)
            }),
        )?;
        wrap(
            target,
            INIT,
            Interceptor::new().before(|record| {
                set(&mut *record.host, "_unrelated_number", Member::value(0))
            }),
        )
    }
}

/// Extension with configurable applicability and no members.
struct Inert {
    id: &'static str,
    compatible: bool,
}

impl Extension for Inert {
    fn id(&self) -> &str {
        self.id
    }

    fn can_extend(&self, _target: &dyn Composable) -> bool {
        self.compatible
    }

    fn extend(&self, _target: &mut dyn Composable) -> ComposeResult<()> {
        Ok(())
    }
}

fn listener() -> ExtensionRef {
    Rc::new(Listener)
}

#[test]
fn base_type_records_items_without_extensions() {
    let mut host = hash_list_type()
        .instantiate(CallArgs::new())
        .expect("plain instance");

    host.call("append", CallArgs::new().arg(5)).expect("append 5");
    host.call("append", CallArgs::new().arg(3)).expect("append 3");

    assert_eq!(
        host.get("list").expect("list"),
        Value::List(vec![Value::from(5), Value::from(3)])
    );
    assert!(host.extensions().is_empty());
    assert!(!host.has_member("append_count"));
}

#[test]
fn init_arguments_flow_through_native_constructor() {
    let mut host = hash_list_type()
        .instantiate(CallArgs::new().arg(Value::List(vec![
            Value::from("a"),
            Value::from("b"),
            Value::from("a"),
        ])))
        .expect("instance from iterable");

    assert_eq!(
        host.call("index", CallArgs::new().arg("a")).expect("index a"),
        Value::List(vec![Value::from(0), Value::from(2)])
    );
    let err = host
        .call("index", CallArgs::new().arg("z"))
        .expect_err("missing item");
    assert_eq!(err, ComposeError::failed("z is not in hashlist"));
}

#[test]
fn incompatible_extension_fails_construction() {
    let refusing: ExtensionRef = Rc::new(Inert {
        id: "plus",
        compatible: false,
    });

    let err = hash_list_type()
        .with_extensions(&[refusing])
        .err()
        .expect("can_extend=false must fail");

    assert_eq!(
        err,
        ComposeError::IncompatibleExtension {
            extension: "plus".to_string(),
            target: "HashList".to_string(),
        }
    );
}

#[test]
fn applied_extensions_are_reported_as_a_set() {
    let props: ExtensionRef = Rc::new(AdditionalProperties);
    let derived = hash_list_type()
        .with_extensions(&[listener(), Rc::clone(&props), listener()])
        .expect("compatible extensions");
    let host = derived.instantiate(CallArgs::new()).expect("instance");

    assert_eq!(host.extensions().ids(), vec!["additional-properties", "listener"]);
    assert_eq!(host.extensions(), derived.extensions());
}

#[test]
fn duplicates_can_be_rejected_instead_of_coalesced() {
    let err = hash_list_type()
        .with_extensions_opts(
            &[listener(), listener()],
            &ComposeOptions::rejecting_duplicates(),
        )
        .err()
        .expect("reject policy");
    assert_eq!(err, ComposeError::DuplicateExtension("listener".to_string()));
}

#[test]
fn injected_method_is_bound_to_the_instance() {
    let derived = hash_list_type()
        .with_extensions(&[listener()])
        .expect("listener applies");
    let mut host = derived.instantiate(CallArgs::new()).expect("instance");

    assert_eq!(host.get("append_count").expect("count"), Value::from(0));
    host.call("increment_append_count", CallArgs::new())
        .expect("bound method");
    assert_eq!(host.get("append_count").expect("count"), Value::from(1));
}

#[test]
fn listener_counts_appends_but_not_queries() {
    let derived = hash_list_type()
        .with_extensions(&[listener()])
        .expect("listener applies");
    let mut host = derived.instantiate(CallArgs::new()).expect("instance");

    host.call("append", CallArgs::new().arg(5)).expect("append 5");
    host.call("append", CallArgs::new().arg(3)).expect("append 3");
    assert_eq!(host.get("append_count").expect("count"), Value::from(2));

    host.call("index", CallArgs::new().arg(5)).expect("index 5");
    assert_eq!(host.get("append_count").expect("count"), Value::from(2));

    for item in 0..10 {
        host.call("append", CallArgs::new().arg(item)).expect("append");
    }
    assert_eq!(host.get("append_count").expect("count"), Value::from(12));
}

#[test]
fn wrapped_init_observes_constructor_appends() {
    let derived = hash_list_type()
        .with_extensions(&[listener()])
        .expect("listener applies");
    let mut host = derived
        .instantiate(CallArgs::new().kwarg(
            "iterable",
            Value::List(vec![Value::from(1), Value::from(2)]),
        ))
        .expect("instance");

    assert_eq!(host.get("append_count").expect("count"), Value::from(2));
}

#[test]
fn wrap_preserves_method_signature() {
    fn dummy_signature() -> Signature {
        Signature::new()
            .param("arg_1")
            .param("arg_2")
            .param_with_default("kwarg_1", 1)
            .param_with_default("kwarg_2", 2)
    }

    struct Plus;

    impl Extension for Plus {
        fn id(&self) -> &str {
            "plus"
        }

        fn can_extend(&self, _target: &dyn Composable) -> bool {
            true
        }

        fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
            set(
                target,
                "method",
                Callable::method(dummy_signature(), |_, _| Ok(Value::Null)),
            )?;
            wrap(target, "method", Interceptor::new())
        }
    }

    let derived = hash_list_type()
        .with_extensions(&[Rc::new(Plus) as ExtensionRef])
        .expect("plus applies");
    let host = derived.instantiate(CallArgs::new()).expect("instance");

    let expected = Callable::method(dummy_signature(), |_, _| Ok(Value::Null));
    let actual = host.signature_of("method").expect("wrapped method");
    assert_eq!(actual, expected.signature());
    assert_eq!(
        actual.parameter_names(),
        vec!["self", "arg_1", "arg_2", "kwarg_1", "kwarg_2"]
    );
}

#[test]
fn duplicate_member_from_second_extension_fails_construction() {
    struct Conflict;

    impl Extension for Conflict {
        fn id(&self) -> &str {
            "conflict"
        }

        fn can_extend(&self, _target: &dyn Composable) -> bool {
            true
        }

        fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
            wrap(
                target,
                INIT,
                Interceptor::new().before(|record| {
                    set(&mut *record.host, "append_count", Member::value("0"))
                }),
            )
        }
    }

    let derived = hash_list_type()
        .with_extensions(&[listener(), Rc::new(Conflict) as ExtensionRef])
        .expect("extensions apply; the collision happens at instantiation");

    let err = derived
        .instantiate(CallArgs::new())
        .err()
        .expect("duplicate member");
    assert_eq!(
        err,
        ComposeError::DuplicateMember {
            name: "append_count".to_string(),
            target: "HashList".to_string(),
        }
    );
}

#[test]
fn derivation_leaves_the_base_type_untouched() {
    let base = hash_list_type();
    let derived = base.with_extensions(&[listener()]).expect("listener applies");

    assert!(base.extensions().is_empty());
    assert!(!base.has_member("increment_append_count"));
    assert_eq!(derived.extensions().ids(), vec!["listener"]);
    assert!(derived.has_member("increment_append_count"));

    let host = derived.instantiate(CallArgs::new()).expect("instance");
    assert_eq!(host.extensions().ids(), vec!["listener"]);
    assert!(host.scratch().is_empty());
}

#[test]
fn property_returns_and_sets_value() {
    let derived = hash_list_type()
        .with_extensions(&[Rc::new(AdditionalProperties) as ExtensionRef])
        .expect("properties apply");
    let mut host = derived.instantiate(CallArgs::new()).expect("instance");

    assert_eq!(host.get("unrelated_number").expect("getter"), Value::from(0));

    host.assign("unrelated_number", 2).expect("setter");

    assert_eq!(host.get("_unrelated_number").expect("backing"), Value::from(2));
    assert_eq!(host.get("unrelated_number").expect("getter"), Value::from(2));
}

#[test]
fn failing_before_hook_prevents_the_original_call() {
    struct Guard;

    impl Extension for Guard {
        fn id(&self) -> &str {
            "guard"
        }

        fn can_extend(&self, _target: &dyn Composable) -> bool {
            true
        }

        fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
            wrap(
                target,
                "append",
                Interceptor::new().before(|record| {
                    if record.args.first() == Some(&Value::Null) {
                        return Err(ComposeError::failed("null items are not allowed"));
                    }
                    Ok(())
                }),
            )
        }
    }

    let derived = hash_list_type()
        .with_extensions(&[Rc::new(Guard) as ExtensionRef])
        .expect("guard applies");
    let mut host = derived.instantiate(CallArgs::new()).expect("instance");

    host.call("append", CallArgs::new().arg(1)).expect("allowed");
    let err = host
        .call("append", CallArgs::new().arg(Value::Null))
        .expect_err("before hook rejects");

    assert_eq!(err, ComposeError::failed("null items are not allowed"));
    assert_eq!(host.get("list").expect("list"), Value::List(vec![Value::from(1)]));
}

#[test]
fn failing_after_hook_surfaces_after_the_original_ran() {
    struct Audit;

    impl Extension for Audit {
        fn id(&self) -> &str {
            "audit"
        }

        fn can_extend(&self, _target: &dyn Composable) -> bool {
            true
        }

        fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
            wrap(
                target,
                "append",
                Interceptor::new().after(|_| Err(ComposeError::failed("audit sink offline"))),
            )
        }
    }

    let derived = hash_list_type()
        .with_extensions(&[Rc::new(Audit) as ExtensionRef])
        .expect("audit applies");
    let mut host = derived.instantiate(CallArgs::new()).expect("instance");

    let err = host
        .call("append", CallArgs::new().arg(4))
        .expect_err("after hook fails");

    assert_eq!(err, ComposeError::failed("audit sink offline"));
    assert_eq!(host.get("list").expect("list"), Value::List(vec![Value::from(4)]));
}

#[test]
fn invalid_identity_is_not_an_extension() {
    let anonymous: ExtensionRef = Rc::new(Inert {
        id: "",
        compatible: true,
    });

    let err = hash_list_type()
        .with_extensions(&[anonymous])
        .err()
        .expect("empty id");
    assert!(matches!(err, ComposeError::NotAnExtension { .. }));
}

#[test]
fn catalog_names_select_extensions() {
    let mut catalog = ExtensionCatalog::new();
    catalog.register(listener()).expect("register listener");
    catalog
        .register(Rc::new(AdditionalProperties))
        .expect("register properties");

    let derived = hash_list_type()
        .with_named_extensions(&catalog, &["listener"])
        .expect("named extension");
    assert_eq!(derived.extensions().ids(), vec!["listener"]);

    let err = hash_list_type()
        .with_named_extensions(&catalog, &["listener", "missing"])
        .err()
        .expect("unknown name");
    assert_eq!(
        err,
        ComposeError::NotAnExtension {
            module: "missing".to_string()
        }
    );
}
