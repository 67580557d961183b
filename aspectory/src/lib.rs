//! # aspectory - Method Advice Weaving
//!
//! `aspectory` attaches before, after and around advice to the methods of
//! live classes, including methods that are only defined later. Advised
//! calls run through an advice chain; the original stays reachable through
//! [`Object::pristine_invoke`] and the `<name>_without_advice` alias.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aspectory::prelude::*;
//!
//! let class = Class::new("Account");
//! let aspects = Aspects::attach(&class);
//!
//! // Halts the call when the account is frozen.
//! aspects.before("withdraw", BeforeAdvice::from_fn(|this: &Object, _: &Call| {
//!     !this.ivar("frozen").is_truthy()
//! }));
//!
//! class.define_method("withdraw", |this: &Object, call: &Call| call.arg(0));
//! let account = class.instantiate([])?;
//! account.send("withdraw", [Value::Int(10)])?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod aspects;

pub use aspects::{Aspects, Registration};

pub use aspectory_core::{
    // Advice
    Advice,
    AdviceChain,
    AdvicePlan,
    AfterAdvice,
    AroundAdvice,
    BeforeAdvice,
    // Calls
    Block,
    // Error types
    BoxError,
    Call,
    ChainHandle,
    // Object model
    Class,
    ClassId,
    Continuation,
    DefinitionListener,
    // Outcomes
    Flow,
    IntoFlow,
    Method,
    Object,
    Position,
    Positions,
    ReactionError,
    ResultPolicy,
    Symbol,
    Value,
    WeaveError,
};

pub use aspectory_std::{
    Callbacker, CallbackerOptions, DEFAULT_ALIAS_SUFFIX, Introspector, Reaction,
};

/// Standard advice implementations.
pub mod advice {
    #![allow(clippy::wildcard_imports)]
    pub use aspectory_std::advice::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use aspectory_std::testing::*;
}

/// Prelude module - common imports for Aspectory.
///
/// # Usage
///
/// ```rust,ignore
/// use aspectory::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AfterAdvice, AroundAdvice, Aspects, BeforeAdvice, Block, Call, Callbacker,
        CallbackerOptions, Class, Continuation, Flow, Introspector, Object, Reaction,
        ResultPolicy, Symbol, Value, WeaveError,
    };
}
