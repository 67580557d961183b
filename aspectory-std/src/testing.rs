//! Testing utilities for Aspectory.
//!
//! This module provides advice that records what it sees, to make testing
//! chain ordering and halting easier.
//!
//! # Features
//!
//! - [`Recorder`]: A shared log that hands out labelled recording advice
//! - [`CountingAdvice`]: Advice that counts invocations

use aspectory_core::{AfterAdvice, AroundAdvice, BeforeAdvice, Call, Continuation, Object, Value};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recorder
// ============================================================================

/// A shared log of labels pushed by the advice it creates.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = Recorder::new();
/// callbacker.before("foo", recorder.before("a"));
/// callbacker.after("foo", recorder.after("b"));
///
/// object.send("foo", [])?;
/// assert_eq!(recorder.labels(), ["a", "b"]);
/// ```
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<Value>) {
        self.entries.lock().push(entry.into());
    }

    /// Get a clone of the recorded entries.
    pub fn entries(&self) -> Vec<Value> {
        self.entries.lock().clone()
    }

    /// The recorded entries rendered as strings.
    pub fn labels(&self) -> Vec<String> {
        self.entries.lock().iter().map(ToString::to_string).collect()
    }

    /// Get the number of recorded entries.
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Before-advice recording `label` and letting the call continue.
    pub fn before(&self, label: &str) -> BeforeAdvice {
        let recorder = self.clone();
        let label = Value::sym(label);
        BeforeAdvice::from_fn(move |_: &Object, _: &Call| recorder.record(label.clone()))
    }

    /// Before-advice recording `label` and halting the call.
    pub fn halting(&self, label: &str) -> BeforeAdvice {
        let recorder = self.clone();
        let label = Value::sym(label);
        BeforeAdvice::from_fn(move |_: &Object, _: &Call| {
            recorder.record(label.clone());
            false
        })
    }

    /// After-advice recording `label`.
    pub fn after(&self, label: &str) -> AfterAdvice {
        let recorder = self.clone();
        let label = Value::sym(label);
        AfterAdvice::from_fn(move |_: &Object, _: &Call, _: &Value| recorder.record(label.clone()))
    }

    /// After-advice recording the result it receives.
    pub fn results(&self) -> AfterAdvice {
        let recorder = self.clone();
        AfterAdvice::from_fn(move |_: &Object, _: &Call, result: &Value| {
            recorder.record(result.clone())
        })
    }

    /// Around-advice recording `{label}:pre`, proceeding, then `{label}:post`.
    pub fn around(&self, label: &str) -> AroundAdvice {
        let recorder = self.clone();
        let pre = Value::sym(format!("{label}:pre"));
        let post = Value::sym(format!("{label}:post"));
        AroundAdvice::from_fn(move |_: &Object, _: &Call, next: &Continuation| {
            recorder.record(pre.clone());
            let flow = next.proceed()?;
            recorder.record(post.clone());
            Ok::<_, aspectory_core::WeaveError>(flow)
        })
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Recorder").field(&*self.entries.lock()).finish()
    }
}

// ============================================================================
// Counting Advice
// ============================================================================

/// Advice that counts invocations.
///
/// Every advice value it hands out shares one counter.
#[derive(Clone, Default)]
pub struct CountingAdvice {
    count: Arc<AtomicUsize>,
}

impl CountingAdvice {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Counting before-advice.
    pub fn before(&self) -> BeforeAdvice {
        let count = self.count.clone();
        BeforeAdvice::from_fn(move |_: &Object, _: &Call| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Counting after-advice.
    pub fn after(&self) -> AfterAdvice {
        let count = self.count.clone();
        AfterAdvice::from_fn(move |_: &Object, _: &Call, _: &Value| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Counting around-advice.
    pub fn around(&self) -> AroundAdvice {
        let count = self.count.clone();
        AroundAdvice::from_fn(move |_: &Object, _: &Call, next: &Continuation| {
            count.fetch_add(1, Ordering::SeqCst);
            next.proceed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacker::Callbacker;
    use aspectory_core::Class;

    fn widget() -> Class {
        let class = Class::new("Widget");
        class.define_method("foo", |_: &Object, _: &Call| Value::sym("foo"));
        class
    }

    #[test]
    fn test_recorder_orders_positions() {
        let class = widget();
        let callbacker = Callbacker::new(&class);
        let recorder = Recorder::new();
        callbacker.before("foo", recorder.before("a"));
        callbacker.around("foo", recorder.around("w"));
        callbacker.after("foo", recorder.after("b"));
        callbacker.after("foo", recorder.results());

        class.allocate().send("foo", []).unwrap();
        assert_eq!(recorder.labels(), [":a", ":w:pre", ":w:post", ":b", ":foo"]);

        recorder.clear();
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_halting_stops_everything() {
        let class = widget();
        let callbacker = Callbacker::new(&class);
        let recorder = Recorder::new();
        let counter = CountingAdvice::new();
        callbacker.before("foo", recorder.halting("stop"));
        callbacker.around("foo", counter.around());
        callbacker.after("foo", counter.after());

        assert_eq!(class.allocate().send("foo", []).unwrap(), Value::Bool(false));
        assert_eq!(recorder.count(), 1);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_counting_shares_counter() {
        let class = widget();
        let callbacker = Callbacker::new(&class);
        let counter = CountingAdvice::new();
        callbacker.before("foo", counter.before());
        callbacker.after("foo", counter.after());

        let object = class.allocate();
        object.send("foo", []).unwrap();
        object.send("foo", []).unwrap();
        assert_eq!(counter.count(), 4);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
