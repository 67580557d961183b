//! # aspectory-std
//!
//! Standard implementations for the Aspectory weaving engine.
//!
//! This crate provides:
//! - **Advice registry**: [`Callbacker`], configured by [`CallbackerOptions`]
//! - **Definition watcher**: [`Introspector`] and its [`Reaction`]s
//! - **Standard advice**: Logging
//! - **Testing utilities**: [`testing::Recorder`], [`testing::CountingAdvice`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use aspectory_core;

// Modules
pub mod advice;
pub mod callbacker;
pub mod introspector;
pub mod options;
pub mod testing;

pub use callbacker::Callbacker;
pub use introspector::{Introspector, Reaction};
pub use options::{CallbackerOptions, DEFAULT_ALIAS_SUFFIX};
