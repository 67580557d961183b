//! # aspectory-core
//!
//! Object model and advice-chain primitives for the Aspectory weaving engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions that only need the object model and chain execution, not the
//! registry and watcher in `aspectory-std`.
//!
//! # Layers
//!
//! ## Object model ([`Class`], [`Object`], [`Value`])
//!
//! Classes are live, shared handles with a single-inheritance chain and a
//! method table that may grow at any time. Each definition is published to
//! the class's [`DefinitionListener`]s.
//!
//! ## Dispatch ([`Object::dispatch`])
//!
//! Every call goes through one indirection point that consults the class's
//! advice chains before the method table. Installing advice never rewrites a
//! method.
//!
//! ## Advice ([`Advice`], [`AdviceChain`], [`Continuation`])
//!
//! Before, after and around advice, given either as closures or as names of
//! methods on the receiver, composed per call into an [`AdvicePlan`].
//!
//! ## Outcomes ([`Flow`])
//!
//! Callables return a [`Flow`]: a normal value or a tagged short-circuit that
//! unwinds to the dispatcher of the method named by its tag.
//!
//! # Error Types
//!
//! - [`WeaveError`] - Everything a call can fail with
//! - [`ReactionError`] - Deferred reaction failures, reported but not propagated

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod advice;
mod call;
mod chain;
mod class;
mod error;
mod flow;
mod object;
mod value;

// Re-exports
pub use advice::{
    Advice, AfterAdvice, AfterFn, AroundAdvice, AroundFn, BeforeAdvice, BeforeFn, Position,
    Positions,
};
pub use call::{Block, Call};
pub use chain::{AdviceChain, AdvicePlan, ChainHandle, Continuation, ResultPolicy};
pub use class::{Class, ClassId, DefinitionListener, Method, MethodBody};
pub use error::{BoxError, ReactionError, WeaveError};
pub use flow::{Flow, IntoFlow};
pub use object::Object;
pub use value::{Symbol, Value};
