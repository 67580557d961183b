//! Advice callables.
//!
//! Advice is either a closure or the name of a method resolved against the
//! receiver at call time. The three positions take different closure shapes:
//!
//! | position | closure                                   | named method called with      |
//! |----------|-------------------------------------------|-------------------------------|
//! | before   | `Fn(&Object, &Call)`                      | no arguments                  |
//! | after    | `Fn(&Object, &Call, &Value)`              | the stage result              |
//! | around   | `Fn(&Object, &Call, &Continuation)`       | no arguments, continuation as block |

use crate::{
    call::Call,
    chain::Continuation,
    error::WeaveError,
    flow::{Flow, IntoFlow},
    object::Object,
    value::{Symbol, Value},
};
use bitflags::bitflags;
use std::{fmt, sync::Arc};

/// Where advice runs relative to the original method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Before the original; a falsy result halts the call.
    Before,
    /// After the original; observes the result.
    After,
    /// Around the original; decides whether to continue.
    Around,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Before => "before",
            Position::After => "after",
            Position::Around => "around",
        })
    }
}

bitflags! {
    /// The set of positions a chain has advice in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Positions: u8 {
        /// At least one before-advice.
        const BEFORE = 1;
        /// At least one after-advice.
        const AFTER = 1 << 1;
        /// At least one around-advice.
        const AROUND = 1 << 2;
    }
}

impl From<Position> for Positions {
    fn from(position: Position) -> Self {
        match position {
            Position::Before => Positions::BEFORE,
            Position::After => Positions::AFTER,
            Position::Around => Positions::AROUND,
        }
    }
}

/// Closure shape of before-advice.
pub type BeforeFn = dyn Fn(&Object, &Call) -> Result<Flow, WeaveError> + Send + Sync;
/// Closure shape of after-advice; the third argument is the stage result.
pub type AfterFn = dyn Fn(&Object, &Call, &Value) -> Result<Flow, WeaveError> + Send + Sync;
/// Closure shape of around-advice.
pub type AroundFn =
    dyn Fn(&Object, &Call, &Continuation) -> Result<Flow, WeaveError> + Send + Sync;

/// A piece of advice: a callable or a method name.
pub enum Advice<F: ?Sized> {
    /// A closure.
    Callable(Arc<F>),
    /// A method invoked on the receiver.
    Named(Symbol),
}

/// Advice run before the original.
pub type BeforeAdvice = Advice<BeforeFn>;
/// Advice run after the original.
pub type AfterAdvice = Advice<AfterFn>;
/// Advice wrapped around the original.
pub type AroundAdvice = Advice<AroundFn>;

impl<F: ?Sized> Advice<F> {
    /// Advice that calls the receiver's method `name`.
    pub fn named(name: impl Into<Symbol>) -> Self {
        Advice::Named(name.into())
    }

    /// Identity comparison: same closure allocation, or same method name.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Advice::Callable(a), Advice::Callable(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Advice::Named(a), Advice::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl<F: ?Sized> Clone for Advice<F> {
    fn clone(&self) -> Self {
        match self {
            Advice::Callable(f) => Advice::Callable(Arc::clone(f)),
            Advice::Named(name) => Advice::Named(name.clone()),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Advice<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Callable(callable) => f
                .debug_tuple("Callable")
                .field(&Arc::as_ptr(callable).cast::<()>())
                .finish(),
            Advice::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl<F: ?Sized> From<&str> for Advice<F> {
    fn from(name: &str) -> Self {
        Advice::named(name)
    }
}

impl<F: ?Sized> From<Symbol> for Advice<F> {
    fn from(name: Symbol) -> Self {
        Advice::Named(name)
    }
}

impl BeforeAdvice {
    /// Before-advice from a closure.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&Object, &Call) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        let callable: Arc<BeforeFn> =
            Arc::new(move |this: &Object, call: &Call| f(this, call).into_flow());
        Advice::Callable(callable)
    }

    pub(crate) fn run(&self, this: &Object, call: &Call) -> Result<Flow, WeaveError> {
        match self {
            Advice::Callable(f) => f(this, call),
            Advice::Named(name) => this.dispatch(name, &Call::empty()),
        }
    }
}

impl AfterAdvice {
    /// After-advice from a closure.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&Object, &Call, &Value) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        let callable: Arc<AfterFn> = Arc::new(move |this: &Object, call: &Call, result: &Value| {
            f(this, call, result).into_flow()
        });
        Advice::Callable(callable)
    }

    pub(crate) fn run(
        &self,
        this: &Object,
        call: &Call,
        result: &Value,
    ) -> Result<Flow, WeaveError> {
        match self {
            Advice::Callable(f) => f(this, call, result),
            Advice::Named(name) => this.dispatch(name, &Call::new([result.clone()])),
        }
    }
}

impl AroundAdvice {
    /// Around-advice from a closure.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&Object, &Call, &Continuation) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        let callable: Arc<AroundFn> =
            Arc::new(move |this: &Object, call: &Call, next: &Continuation| {
                f(this, call, next).into_flow()
            });
        Advice::Callable(callable)
    }

    pub(crate) fn run(
        &self,
        this: &Object,
        call: &Call,
        next: &Continuation,
    ) -> Result<Flow, WeaveError> {
        match self {
            Advice::Callable(f) => f(this, call, next),
            Advice::Named(name) => {
                this.dispatch(name, &Call::empty().with_block(next.as_block()))
            }
        }
    }
}

/// Append `advice` unless an identical one is already present.
///
/// Returns whether the list changed.
pub(crate) fn push_unique<F: ?Sized>(list: &mut Vec<Advice<F>>, advice: Advice<F>) -> bool {
    if list.iter().any(|existing| existing.same_as(&advice)) {
        return false;
    }
    list.push(advice);
    true
}
