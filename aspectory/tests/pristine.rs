use aspectory::{
    AroundAdvice, BeforeAdvice, Block, Call, Callbacker, CallbackerOptions, Continuation, Object,
    Value, WeaveError,
};

mod common;
use common::{instance, push, results, syms, widget};

#[test]
fn test_pristine_skips_advice() {
    let class = widget();
    Callbacker::new(&class).before("foo", BeforeAdvice::from_fn(push("before")));

    let object = instance(&class);
    assert_eq!(object.pristine_invoke("foo", [], None).unwrap(), Value::sym("foo"));
    assert_eq!(results(&object), syms(&["foo"]));
}

#[test]
fn test_pristine_passes_arguments_and_block() {
    let class = widget();
    Callbacker::new(&class).before("foo", BeforeAdvice::from_fn(push("before")));

    let object = instance(&class);
    object.pristine_invoke("foo", [Value::sym("bar")], None).unwrap();
    object
        .pristine_invoke("foo", [], Some(Block::returning(Value::sym("block"))))
        .unwrap();
    assert_eq!(results(&object), syms(&["bar", "block"]));
}

#[test]
fn test_pristine_matches_unadvised_result() {
    let advised = widget();
    Callbacker::new(&advised).around(
        "foo",
        AroundAdvice::from_fn(|_: &Object, _: &Call, _: &Continuation| Value::sym("hijacked")),
    );
    let plain = widget();

    let advised_object = instance(&advised);
    let plain_object = instance(&plain);
    assert_eq!(advised_object.send("foo", []).unwrap(), Value::sym("hijacked"));
    assert_eq!(
        advised_object.pristine_invoke("foo", [Value::Int(7)], None).unwrap(),
        plain_object.send("foo", [Value::Int(7)]).unwrap()
    );
}

#[test]
fn test_pristine_unadvised_method_fails() {
    let class = widget();
    let object = instance(&class);

    let err = object.pristine_invoke("foo", [], None).unwrap_err();
    assert!(matches!(err, WeaveError::NotAdvised { ref method, .. } if method == "foo"));
    let err = object.pristine_invoke("whiz", [], None).unwrap_err();
    assert!(matches!(err, WeaveError::NotAdvised { .. }));
}

#[test]
fn test_alias_for_each_name() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    for name in ["foo", "bar!", "bar?", "bar="] {
        callbacker.before(name, BeforeAdvice::from_fn(push("before")));
    }

    let object = instance(&class);
    object.send("foo_without_advice", []).unwrap();
    object.send("bar!_without_advice", [Value::sym("bar")]).unwrap();
    object.send("bar?_without_advice", [Value::sym("bar")]).unwrap();
    object.send("bar=_without_advice", [Value::sym("bar")]).unwrap();
    assert_eq!(
        results(&object),
        vec![
            Value::sym("foo"),
            Value::sym("bar"),
            Value::Bool(true),
            Value::sym("bar"),
        ]
    );
}

#[test]
fn test_alias_only_for_advised_methods() {
    let class = widget();
    Callbacker::new(&class).before("foo", BeforeAdvice::from_fn(push("before")));

    let object = instance(&class);
    assert!(object.responds_to("foo_without_advice"));
    assert!(!object.responds_to("bar_without_advice"));
    let err = object.send("bar_without_advice", []).unwrap_err();
    assert!(matches!(err, WeaveError::NoMethod { .. }));
}

#[test]
fn test_custom_alias_suffix() {
    let class = widget();
    let options = CallbackerOptions::new().with_alias_suffix("_unadvised");
    Callbacker::with_options(&class, options).before("foo", BeforeAdvice::from_fn(push("before")));

    let object = instance(&class);
    object.send("foo_unadvised", []).unwrap();
    assert!(!object.responds_to("foo_without_advice"));
    assert_eq!(results(&object), syms(&["foo"]));
}

#[test]
fn test_redefinition_keeps_captured_original() {
    let class = widget();
    Callbacker::new(&class).before("foo", BeforeAdvice::from_fn(push("before")));
    class.define_method("foo", |_: &Object, _: &Call| Value::sym("redefined"));

    let object = instance(&class);
    assert_eq!(object.send("foo", []).unwrap(), Value::sym("foo"));
    assert_eq!(object.pristine_invoke("foo", [], None).unwrap(), Value::sym("foo"));
    assert_eq!(results(&object), syms(&["before", "foo", "foo"]));
}
