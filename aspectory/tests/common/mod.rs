#![allow(dead_code)]

use aspectory::{Call, Class, Flow, Object, Symbol, Value, WeaveError};

// ============================================================================
// Fixture Class
// ============================================================================

/// A class whose methods log into the `results` instance variable.
///
/// - `foo(arg = :foo)` logs the block's value (or `arg`) and returns `arg`
/// - `bar(arg = :bar)` returns a falsy `arg` untouched, otherwise logs like `foo`
/// - `bar!`, `bar=` log their argument; `bar?` logs whether it is `:bar`
/// - `wrapify` logs `:before`, yields, logs `:after`
/// - `pitch` short-circuits `foo` with `:result`
/// - `ping!`, `pong!` log their own name
pub fn widget() -> Class {
    let class = Class::new("Widget");
    class
        .define_method("initialize", |this: &Object, _: &Call| {
            this.set_ivar("results", Value::List(Vec::new()));
        })
        .define_method("results", |this: &Object, _: &Call| this.ivar("results"))
        .define_method("no", |_: &Object, _: &Call| false)
        .define_method("foo", |this: &Object, call: &Call| {
            let arg = call.arg_or(0, Value::sym("foo"));
            let entry = match block_or(call, "foo", &arg)? {
                Flow::Continue(value) => value,
                signal => return Ok(signal),
            };
            this.push_ivar("results", entry);
            Ok::<_, WeaveError>(Flow::Continue(arg))
        })
        .define_method("bar", |this: &Object, call: &Call| {
            let arg = call.arg_or(0, Value::sym("bar"));
            if !arg.is_truthy() {
                return Ok(Flow::Continue(arg));
            }
            let entry = match block_or(call, "bar", &arg)? {
                Flow::Continue(value) => value,
                signal => return Ok(signal),
            };
            this.push_ivar("results", entry);
            Ok::<_, WeaveError>(Flow::Continue(this.ivar("results")))
        })
        .define_method("bar!", |this: &Object, call: &Call| {
            this.push_ivar("results", call.arg(0));
            this.ivar("results")
        })
        .define_method("bar=", |this: &Object, call: &Call| {
            this.push_ivar("results", call.arg(0));
            call.arg(0)
        })
        .define_method("bar?", |this: &Object, call: &Call| {
            let is_bar = call.arg(0) == Value::sym("bar");
            this.push_ivar("results", is_bar);
            this.ivar("results")
        })
        .define_method("wrapify", |this: &Object, call: &Call| {
            this.push_ivar("results", Value::sym("before"));
            let flow = call.yield_block(&Symbol::new("wrapify"), &[])?;
            if flow.is_short_circuit() {
                return Ok(flow);
            }
            this.push_ivar("results", Value::sym("after"));
            Ok::<_, WeaveError>(Flow::Continue(this.ivar("results")))
        })
        .define_method("pitch", |_: &Object, _: &Call| {
            Flow::short_circuit("foo", Value::sym("result"))
        })
        .define_method("ping!", |this: &Object, _: &Call| {
            this.push_ivar("results", Value::sym("ping!"));
        })
        .define_method("pong!", |this: &Object, _: &Call| {
            this.push_ivar("results", Value::sym("pong!"));
        });
    class
}

fn block_or(call: &Call, method: &str, arg: &Value) -> Result<Flow, WeaveError> {
    if call.has_block() {
        call.yield_block(&Symbol::new(method), &[])
    } else {
        Ok(Flow::Continue(arg.clone()))
    }
}

/// A fresh, initialized instance of `class`.
pub fn instance(class: &Class) -> Object {
    class.instantiate([]).unwrap()
}

// ============================================================================
// Assertions
// ============================================================================

/// The `results` log of `object`.
pub fn results(object: &Object) -> Vec<Value> {
    object
        .ivar("results")
        .as_list()
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// Symbol values for `names`.
pub fn syms(names: &[&str]) -> Vec<Value> {
    names.iter().map(Value::sym).collect()
}

/// Before-advice body pushing `label` onto `results`.
pub fn push(label: &'static str) -> impl Fn(&Object, &Call) + Send + Sync + 'static {
    move |this: &Object, _: &Call| this.push_ivar("results", Value::sym(label))
}

/// After-advice body pushing `label` onto `results`.
pub fn push_after(label: &'static str) -> impl Fn(&Object, &Call, &Value) + Send + Sync + 'static {
    move |this: &Object, _: &Call, _: &Value| this.push_ivar("results", Value::sym(label))
}
