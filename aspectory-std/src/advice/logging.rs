//! Logging advice for call observation.

use aspectory_core::{AfterAdvice, AroundAdvice, BeforeAdvice, Call, Continuation, Object, Value};

/// Advice that logs calls for debugging/observation. Never halts.
#[derive(Debug, Clone, Copy)]
pub struct LoggingAdvice {
    label: &'static str,
}

impl Default for LoggingAdvice {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingAdvice {
    /// Logging advice labelled `advice`.
    pub fn new() -> Self {
        Self::labelled("advice")
    }

    /// Logging advice with a custom label.
    pub fn labelled(label: &'static str) -> Self {
        Self { label }
    }

    /// Logs the receiver's class and the arguments.
    pub fn before(self) -> BeforeAdvice {
        BeforeAdvice::from_fn(move |this: &Object, call: &Call| {
            #[cfg(feature = "tracing")]
            {
                tracing::debug!(
                    label = self.label,
                    class = %this.class().name(),
                    args = ?call.args(),
                    "calling"
                );
            }
            #[cfg(not(feature = "tracing"))]
            {
                let _ = (this, call, self.label);
            }
        })
    }

    /// Logs the result.
    pub fn after(self) -> AfterAdvice {
        AfterAdvice::from_fn(move |this: &Object, _: &Call, result: &Value| {
            #[cfg(feature = "tracing")]
            {
                tracing::debug!(
                    label = self.label,
                    class = %this.class().name(),
                    ?result,
                    "returned"
                );
            }
            #[cfg(not(feature = "tracing"))]
            {
                let _ = (this, result, self.label);
            }
        })
    }

    /// Logs entry and exit around the rest of the chain.
    pub fn around(self) -> AroundAdvice {
        AroundAdvice::from_fn(move |this: &Object, _: &Call, next: &Continuation| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                label = self.label,
                class = %this.class().name(),
                method = %next.method(),
                "entering"
            );

            let flow = next.proceed();

            #[cfg(feature = "tracing")]
            tracing::debug!(
                label = self.label,
                method = %next.method(),
                ok = flow.is_ok(),
                "leaving"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = (this, self.label);
            flow
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacker::Callbacker;
    use aspectory_core::Class;

    #[test]
    fn test_logging_advice_is_transparent() {
        let class = Class::new("Widget");
        class.define_method("foo", |_: &Object, call: &Call| call.arg_or(0, Value::sym("foo")));
        let callbacker = Callbacker::new(&class);
        let logging = LoggingAdvice::labelled("widget");
        callbacker.before("foo", logging.before());
        callbacker.after("foo", logging.after());
        callbacker.around("foo", logging.around());

        let object = class.allocate();
        assert_eq!(object.send("foo", [Value::Int(3)]).unwrap(), Value::Int(3));
    }
}
