use aspectory::{
    AfterAdvice, Block, Call, Callbacker, CallbackerOptions, Flow, Object, ResultPolicy, Value,
};

mod common;
use common::{instance, push_after, results, syms, widget};

#[test]
fn test_after_runs_behind_original() {
    let class = widget();
    Callbacker::new(&class).after("foo", AfterAdvice::from_fn(push_after("after")));

    let object = instance(&class);
    object.send("foo", [Value::sym("arg")]).unwrap();
    object
        .send_with_block("foo", [], Block::returning(Value::sym("block")))
        .unwrap();
    assert_eq!(results(&object), syms(&["arg", "after", "block", "after"]));
}

#[test]
fn test_after_order() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    callbacker.after("foo", AfterAdvice::from_fn(push_after("a")));
    callbacker.after("foo", AfterAdvice::from_fn(push_after("b")));

    let object = instance(&class);
    object.send("foo", []).unwrap();
    assert_eq!(results(&object), syms(&["foo", "a", "b"]));
}

#[test]
fn test_false_after_does_not_halt() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    callbacker.after("foo", AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| false));
    callbacker.after("foo", "no");

    let object = instance(&class);
    assert_eq!(object.send("foo", []).unwrap(), Value::sym("foo"));
    assert_eq!(results(&object), syms(&["foo"]));
}

#[test]
fn test_after_runs_when_original_is_falsy() {
    let class = widget();
    Callbacker::new(&class).after("bar?", AfterAdvice::from_fn(push_after("called")));

    let object = instance(&class);
    object.send("bar?", [Value::sym("foo")]).unwrap();
    assert_eq!(results(&object), vec![Value::Bool(false), Value::sym("called")]);
}

#[test]
fn test_after_sees_result() {
    let class = widget();
    Callbacker::new(&class).after(
        "foo",
        AfterAdvice::from_fn(|this: &Object, _: &Call, result: &Value| {
            this.push_ivar("results", result.clone());
        }),
    );

    let object = instance(&class);
    object.send("foo", []).unwrap();
    assert_eq!(results(&object), syms(&["foo", "foo"]));
}

#[test]
fn test_named_after_receives_result() {
    let class = widget();
    Callbacker::new(&class).after("foo", "bar");

    let object = instance(&class);
    object.send("foo", [Value::sym("arg")]).unwrap();
    assert_eq!(results(&object), syms(&["arg", "arg"]));
}

#[test]
fn test_named_after_with_block() {
    let class = widget();
    Callbacker::new(&class).after("foo", "bar");

    let object = instance(&class);
    object
        .send_with_block("foo", [], Block::returning(Value::sym("block")))
        .unwrap();
    assert_eq!(results(&object), syms(&["block", "foo"]));
}

#[test]
fn test_named_predicate_after() {
    let class = widget();
    Callbacker::new(&class).after("foo", "bar?");

    let object = instance(&class);
    object.send("foo", []).unwrap();
    object.send("foo", [Value::sym("bar")]).unwrap();
    assert_eq!(
        results(&object),
        vec![
            Value::sym("foo"),
            Value::Bool(false),
            Value::sym("bar"),
            Value::Bool(true),
        ]
    );
}

#[test]
fn test_same_named_after_fires_once() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    callbacker.after("foo", "ping!");
    callbacker.after("foo", "ping!");

    let object = instance(&class);
    object.send("foo", []).unwrap();
    assert_eq!(results(&object), syms(&["foo", "ping!"]));
}

#[test]
fn test_after_short_circuit() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    callbacker.after(
        "foo",
        AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| {
            Flow::short_circuit("foo", Value::sym("result"))
        }),
    );
    callbacker.after("foo", AfterAdvice::from_fn(push_after("skipped")));

    let object = instance(&class);
    assert_eq!(object.send("foo", []).unwrap(), Value::sym("result"));
    assert_eq!(results(&object), syms(&["foo"]));
}

#[test]
fn test_named_after_short_circuit() {
    let class = widget();
    Callbacker::new(&class).after("foo", "pitch");

    let object = instance(&class);
    assert_eq!(object.send("foo", []).unwrap(), Value::sym("result"));
}

#[test]
fn test_last_after_policy() {
    let class = widget();
    let options = CallbackerOptions::new().with_result_policy(ResultPolicy::LastAfter);
    let callbacker = Callbacker::with_options(&class, options);
    callbacker.after("foo", AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| Value::Int(1)));
    callbacker.after("foo", AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| Value::Int(2)));

    let object = instance(&class);
    assert_eq!(object.send("foo", []).unwrap(), Value::Int(2));
    assert_eq!(results(&object), syms(&["foo"]));
}

#[test]
fn test_install_happens_once() {
    let class = widget();
    let callbacker = Callbacker::new(&class);
    callbacker.after("bar", AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| true));
    callbacker.after("bar", AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| false));
    assert_eq!(callbacker.installations(), 1);
}
