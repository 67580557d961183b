//! Call outcomes.
//!
//! Every method body, block and advice callable produces a [`Flow`]. The
//! ordinary case carries the returned value; the short-circuit case carries a
//! tagged payload that unwinds to the dispatcher of the method named by the
//! tag.

use crate::{
    error::WeaveError,
    value::{Symbol, Value},
};

/// The outcome of running a callable.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    /// The callable returned normally.
    Continue(Value),
    /// Abort the rest of the chain for the method named `tag` and return
    /// `payload` from it.
    ShortCircuit {
        /// Name of the method whose dispatcher catches this signal.
        tag: Symbol,
        /// The substitute result.
        payload: Value,
    },
}

impl Flow {
    /// A short-circuit signal for the method `tag`.
    pub fn short_circuit(tag: impl Into<Symbol>, payload: impl Into<Value>) -> Self {
        Flow::ShortCircuit {
            tag: tag.into(),
            payload: payload.into(),
        }
    }

    /// Whether this is a short-circuit signal.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Flow::ShortCircuit { .. })
    }

    /// The continued value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Flow::Continue(value) => Some(value),
            Flow::ShortCircuit { .. } => None,
        }
    }

    /// Convert a signal tagged `method` into a normal return.
    pub fn catch(self, method: &Symbol) -> Flow {
        match self {
            Flow::ShortCircuit { tag, payload } if &tag == method => Flow::Continue(payload),
            other => other,
        }
    }

    /// Unwrap at the outermost call site: signals still in flight are errors.
    pub fn into_value(self) -> Result<Value, WeaveError> {
        match self {
            Flow::Continue(value) => Ok(value),
            Flow::ShortCircuit { tag, .. } => Err(WeaveError::UncaughtShortCircuit { tag }),
        }
    }
}

impl From<Value> for Flow {
    fn from(value: Value) -> Self {
        Flow::Continue(value)
    }
}

/// Conversion of callable results into a [`Flow`].
///
/// # Default Implementations
///
/// - `()` → `Continue(true)`, so side-effect-only advice never halts a call
/// - `Value` / `bool` / `i64` / `Symbol` → `Continue(value)`
/// - `Flow` → As is
/// - `Result<T, E>` → Delegates to inner `T` or propagates the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be converted into a `Flow`",
    label = "missing `IntoFlow` implementation",
    note = "Method bodies and advice must return a `Value`, a `Flow`, `()` or a `Result` of those."
)]
pub trait IntoFlow {
    /// Convert into a flow, or the error the callable raised.
    fn into_flow(self) -> Result<Flow, WeaveError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(self)
    }
}

impl IntoFlow for Value {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(Flow::Continue(self))
    }
}

impl IntoFlow for () {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(Flow::Continue(Value::Bool(true)))
    }
}

impl IntoFlow for bool {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(Flow::Continue(Value::Bool(self)))
    }
}

impl IntoFlow for i64 {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(Flow::Continue(Value::Int(self)))
    }
}

impl IntoFlow for Symbol {
    fn into_flow(self) -> Result<Flow, WeaveError> {
        Ok(Flow::Continue(Value::Sym(self)))
    }
}

impl<T, E> IntoFlow for Result<T, E>
where
    T: IntoFlow,
    E: Into<WeaveError>,
{
    fn into_flow(self) -> Result<Flow, WeaveError> {
        match self {
            Ok(t) => t.into_flow(),
            Err(e) => Err(e.into()),
        }
    }
}
