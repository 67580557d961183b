//! Instances and the dispatch entry point.

use crate::{
    call::{Block, Call},
    class::{Class, Resolution},
    error::WeaveError,
    flow::Flow,
    value::{Symbol, Value},
};
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc};

struct ObjectInner {
    class: Class,
    ivars: Mutex<HashMap<Symbol, Value>>,
}

/// A shared handle to an instance of a [`Class`].
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    pub(crate) fn new(class: Class) -> Self {
        Self(Arc::new(ObjectInner {
            class,
            ivars: Mutex::new(HashMap::new()),
        }))
    }

    /// The instance's class.
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// Read an instance variable; unset variables are `Nil`.
    pub fn ivar(&self, name: &str) -> Value {
        self.0.ivars.lock().get(name).cloned().unwrap_or_default()
    }

    /// Set an instance variable.
    pub fn set_ivar(&self, name: impl Into<Symbol>, value: impl Into<Value>) {
        self.0.ivars.lock().insert(name.into(), value.into());
    }

    /// Append to a list-valued instance variable, creating the list if unset.
    pub fn push_ivar(&self, name: impl Into<Symbol>, value: impl Into<Value>) {
        let mut ivars = self.0.ivars.lock();
        let slot = ivars.entry(name.into()).or_insert(Value::List(Vec::new()));
        match slot {
            Value::List(items) => items.push(value.into()),
            other => *other = Value::List(vec![value.into()]),
        }
    }

    /// Whether a call to `name` would find a method or an alias.
    pub fn responds_to(&self, name: &str) -> bool {
        self.class().find_method(name).is_some() || self.class().alias_target(name).is_some()
    }

    /// Dispatch `name`, returning the raw [`Flow`].
    ///
    /// This is the single indirection point every call goes through: an
    /// installed advice chain runs the advised path, anything else runs the
    /// method body. Short-circuit signals not tagged with `name` are handed
    /// back to the caller, so advice calling other methods should use this
    /// and pass such signals on.
    pub fn dispatch(&self, name: &Symbol, call: &Call) -> Result<Flow, WeaveError> {
        match self.class().resolve(name) {
            Resolution::Advised(plan) => plan.invoke(self, call),
            Resolution::Plain(method) => method.invoke(self, call),
            Resolution::Missing => match self.class().alias_target(name) {
                Some(target) => self.pristine_flow(&target, call),
                None => Err(self.no_method(name)),
            },
        }
    }

    /// Call `name` from outside any advice.
    pub fn call(&self, name: impl Into<Symbol>, call: Call) -> Result<Value, WeaveError> {
        self.dispatch(&name.into(), &call)?.into_value()
    }

    /// Call `name` with positional arguments.
    pub fn send(
        &self,
        name: impl Into<Symbol>,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value, WeaveError> {
        self.call(name, Call::new(args))
    }

    /// Call `name` with positional arguments and a trailing block.
    pub fn send_with_block(
        &self,
        name: impl Into<Symbol>,
        args: impl IntoIterator<Item = Value>,
        block: Block,
    ) -> Result<Value, WeaveError> {
        self.call(name, Call::new(args).with_block(block))
    }

    /// Call the original of an advised method with no advice applied.
    ///
    /// Fails with [`WeaveError::NotAdvised`] when no class in the receiver's
    /// ancestry holds an advice chain for `name`.
    pub fn pristine_invoke(
        &self,
        name: impl Into<Symbol>,
        args: impl IntoIterator<Item = Value>,
        block: Option<Block>,
    ) -> Result<Value, WeaveError> {
        let call = Call::new(args).with_optional_block(block);
        self.pristine_flow(&name.into(), &call)?.into_value()
    }

    fn pristine_flow(&self, name: &Symbol, call: &Call) -> Result<Flow, WeaveError> {
        if !self.class().ancestors().any(|class| class.chain(name).is_some()) {
            return Err(WeaveError::NotAdvised {
                class: self.class().name().clone(),
                method: name.clone(),
            });
        }
        match self.class().unadvised_method(name) {
            Some(method) => method.invoke(self, call),
            None => Err(self.no_method(name)),
        }
    }

    fn no_method(&self, name: &Symbol) -> WeaveError {
        WeaveError::NoMethod {
            class: self.class().name().clone(),
            method: name.clone(),
        }
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", self.class().name())
            .field("ivars", &*self.0.ivars.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        advice::{AfterAdvice, AroundAdvice, BeforeAdvice},
        chain::{Continuation, ResultPolicy},
    };

    fn install(class: &Class, name: &str) -> crate::chain::ChainHandle {
        let (chain, _) = class.chain_or_insert(name, ResultPolicy::Original);
        let original = class.find_method(name).unwrap();
        chain.lock().install(original);
        chain
    }

    fn widget() -> Class {
        let class = Class::new("Widget");
        class.define_method("foo", |this: &Object, call: &Call| {
            let arg = call.arg_or(0, Value::sym("foo"));
            this.push_ivar("results", arg.clone());
            arg
        });
        class
    }

    #[test]
    fn test_push_ivar_builds_list() {
        let object = Class::new("Widget").allocate();
        object.push_ivar("log", Value::sym("a"));
        object.push_ivar("log", Value::sym("b"));
        assert_eq!(
            object.ivar("log"),
            Value::List(vec![Value::sym("a"), Value::sym("b")])
        );
    }

    #[test]
    fn test_missing_method() {
        let object = Class::new("Widget").allocate();
        let err = object.send("whiz", []).unwrap_err();
        assert!(matches!(err, WeaveError::NoMethod { .. }));
        assert!(!object.responds_to("whiz"));
        assert!(object.responds_to("inspect"));
    }

    #[test]
    fn test_plain_dispatch() {
        let object = widget().allocate();
        assert_eq!(object.send("foo", [Value::sym("x")]).unwrap(), Value::sym("x"));
    }

    #[test]
    fn test_before_advice_runs_first() {
        let class = widget();
        let chain = install(&class, "foo");
        chain.lock().add_before(BeforeAdvice::from_fn(|this: &Object, _: &Call| {
            this.push_ivar("results", Value::sym("before"));
        }));

        let object = class.allocate();
        object.send("foo", []).unwrap();
        assert_eq!(
            object.ivar("results"),
            Value::List(vec![Value::sym("before"), Value::sym("foo")])
        );
    }

    #[test]
    fn test_signal_for_other_method_escapes() {
        let class = widget();
        let chain = install(&class, "foo");
        chain
            .lock()
            .add_after(AfterAdvice::from_fn(|_: &Object, _: &Call, _: &Value| {
                Flow::short_circuit("elsewhere", Value::Nil)
            }));

        let err = class.allocate().send("foo", []).unwrap_err();
        assert!(matches!(err, WeaveError::UncaughtShortCircuit { ref tag } if tag == "elsewhere"));
    }

    #[test]
    fn test_signal_passes_through_discarding_around() {
        let class = widget();
        let chain = install(&class, "foo");
        chain
            .lock()
            .add_around(AroundAdvice::from_fn(|_: &Object, _: &Call, next: &Continuation| {
                // Drops the signal on the floor; it still unwinds.
                let _ = next.proceed();
                Value::sym("ignored")
            }));
        chain.lock().add_around(AroundAdvice::from_fn(
            |_: &Object, _: &Call, _: &Continuation| {
                Flow::short_circuit("foo", Value::sym("pitched"))
            },
        ));

        let object = class.allocate();
        assert_eq!(object.send("foo", []).unwrap(), Value::sym("pitched"));
        assert_eq!(object.ivar("results"), Value::Nil);
    }

    #[test]
    fn test_pristine_requires_chain() {
        let class = widget();
        let object = class.allocate();
        let err = object.pristine_invoke("foo", [], None).unwrap_err();
        assert!(matches!(err, WeaveError::NotAdvised { .. }));

        install(&class, "foo");
        assert_eq!(
            object.pristine_invoke("foo", [Value::sym("bar")], None).unwrap(),
            Value::sym("bar")
        );
    }
}
