//! Error types for Aspectory.
//!
//! - [`WeaveError`] - Every failure observable while invoking a method
//! - [`ReactionError`] - Failures of deferred reactions (logged, never propagated)
//!
//! A short-circuit is not an error: it travels as [`Flow::ShortCircuit`].
//!
//! [`Flow::ShortCircuit`]: crate::Flow::ShortCircuit

use crate::{advice::Position, value::Symbol};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while dispatching a call.
#[derive(Error, Debug)]
pub enum WeaveError {
    /// The receiver's class has no method with this name.
    #[error("undefined method `{method}` for {class}")]
    NoMethod {
        /// Name of the receiver's class.
        class: Symbol,
        /// The missing method.
        method: Symbol,
    },

    /// Pristine access was requested for a method that was never advised.
    #[error("method `{method}` of {class} has no advice to bypass")]
    NotAdvised {
        /// Name of the receiver's class.
        class: Symbol,
        /// The unadvised method.
        method: Symbol,
    },

    /// An advice callable failed.
    #[error("{position} advice for `{method}` failed")]
    Advice {
        /// The advised method.
        method: Symbol,
        /// Which kind of advice failed.
        position: Position,
        /// The underlying failure.
        #[source]
        source: Box<WeaveError>,
    },

    /// A short-circuit signal escaped every dispatcher.
    #[error("uncaught short-circuit tagged `{tag}`")]
    UncaughtShortCircuit {
        /// The tag nobody caught.
        tag: Symbol,
    },

    /// A method yielded but was called without a block.
    #[error("no block given to `{method}`")]
    NoBlock {
        /// The yielding method.
        method: Symbol,
    },

    /// A custom error raised by user code.
    #[error(transparent)]
    Custom(BoxError),
}

impl WeaveError {
    /// Build a custom error from a message.
    pub fn custom(message: impl Into<String>) -> Self {
        WeaveError::Custom(message.into().into())
    }

    /// Label this error as a failure of `position` advice on `method`.
    ///
    /// Errors already labelled keep their original label.
    pub fn in_advice(self, method: &Symbol, position: Position) -> Self {
        match self {
            err @ WeaveError::Advice { .. } => err,
            err => WeaveError::Advice {
                method: method.clone(),
                position,
                source: Box::new(err),
            },
        }
    }

    /// The innermost error beneath any advice labels.
    pub fn root(&self) -> &WeaveError {
        match self {
            WeaveError::Advice { source, .. } => source.root(),
            err => err,
        }
    }
}

impl From<BoxError> for WeaveError {
    fn from(err: BoxError) -> Self {
        WeaveError::Custom(err)
    }
}

/// Failure of a deferred reaction fired on method definition.
#[derive(Error, Debug)]
pub enum ReactionError {
    /// The reaction returned an error.
    #[error("reaction for `{method}` failed")]
    Failed {
        /// The newly defined method.
        method: Symbol,
        /// The error the reaction returned.
        #[source]
        source: BoxError,
    },

    /// The reaction panicked.
    #[error("reaction for `{method}` panicked: {message}")]
    Panicked {
        /// The newly defined method.
        method: Symbol,
        /// The panic payload, when it was a string.
        message: String,
    },
}
