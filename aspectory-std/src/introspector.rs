//! # Definition Watcher
//!
//! An [`Introspector`] watches one class for method definitions. Callers
//! register [`Reaction`]s for a method name that may not exist yet; the first
//! time that name is defined, its reactions fire once, in registration
//! order, and are discarded. Registering the same name again afterwards
//! starts a fresh set.
//!
//! Once subscribed, the watcher lives as long as its class: dropping every
//! [`Introspector`] handle does not discard pending reactions.
//!
//! Reactions are best-effort: an error or panic in one is logged and the
//! rest still fire. Defining a method never fails because of a reaction.

use aspectory_core::{BoxError, Class, ReactionError, Symbol};
use parking_lot::Mutex;
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

type ReactionFn = dyn Fn() -> Result<(), BoxError> + Send + Sync;

/// A zero-argument callback fired when a watched method is defined.
#[derive(Clone)]
pub struct Reaction(Arc<ReactionFn>);

impl Reaction {
    /// A fallible reaction.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A reaction that cannot fail.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(move || {
            f();
            Ok(())
        }))
    }

    /// Whether both handles refer to the same reaction.
    pub fn ptr_eq(&self, other: &Reaction) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    fn fire(&self, method: &Symbol) -> Result<(), ReactionError> {
        match catch_unwind(AssertUnwindSafe(|| (self.0)())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ReactionError::Failed {
                method: method.clone(),
                source,
            }),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                Err(ReactionError::Panicked {
                    method: method.clone(),
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reaction")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

struct IntrospectorInner {
    class: Class,
    pending: Mutex<HashMap<Symbol, Vec<Reaction>>>,
    subscribed: AtomicBool,
}

/// Watches a class for method definitions.
#[derive(Clone)]
pub struct Introspector {
    inner: Arc<IntrospectorInner>,
}

impl Introspector {
    /// A watcher for `class`. Subscription happens on first [`observe`](Self::observe).
    pub fn new(class: &Class) -> Self {
        Self {
            inner: Arc::new(IntrospectorInner {
                class: class.clone(),
                pending: Mutex::new(HashMap::new()),
                subscribed: AtomicBool::new(false),
            }),
        }
    }

    /// The watched class.
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// Watch `method`, queueing `reaction` for its definition.
    ///
    /// A reaction already queued for the name is not added twice. Returns
    /// the number of reactions now pending for `method`.
    pub fn observe(&self, method: impl Into<Symbol>, reaction: Option<Reaction>) -> usize {
        self.observe_class();

        let mut pending = self.inner.pending.lock();
        let set = pending.entry(method.into()).or_default();
        if let Some(reaction) = reaction {
            if !set.iter().any(|queued| queued.ptr_eq(&reaction)) {
                set.push(reaction);
            }
        }
        set.len()
    }

    /// Whether a pending set exists for `method`.
    pub fn observing(&self, method: &str) -> bool {
        self.inner.pending.lock().contains_key(method)
    }

    /// Number of reactions pending for `method`.
    pub fn pending(&self, method: &str) -> usize {
        self.inner.pending.lock().get(method).map_or(0, Vec::len)
    }

    /// Whether this watcher has subscribed to its class.
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscribed.load(Ordering::SeqCst)
    }

    /// Fire and discard the reactions pending for `method`.
    ///
    /// Called by the class's definition event; returns the number of
    /// reactions fired.
    pub fn check_method(&self, method: &Symbol) -> usize {
        let Some(reactions) = self.inner.pending.lock().remove(method) else {
            return 0;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            class = %self.class().name(),
            %method,
            count = reactions.len(),
            "firing deferred reactions"
        );

        for reaction in &reactions {
            if let Err(err) = reaction.fire(method) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    class = %self.class().name(),
                    error = %err,
                    "deferred reaction failed"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = err;
            }
        }
        reactions.len()
    }

    /// Methods an instance of the class responds to, excluding those it
    /// inherits from the universal base class.
    pub fn defined_methods(&self) -> BTreeSet<Symbol> {
        self.class()
            .ancestors()
            .filter(|class| !class.is_object())
            .flat_map(|class| class.own_method_names())
            .collect()
    }

    fn observe_class(&self) -> bool {
        if self.inner.subscribed.swap(true, Ordering::SeqCst) {
            return false;
        }
        // The subscription keeps the pending reactions alive for as long as
        // the class can still be defined on.
        let watcher = self.clone();
        self.class()
            .subscribe(Arc::new(move |_: &Class, method: &Symbol| {
                watcher.check_method(method);
            }));

        #[cfg(feature = "tracing")]
        tracing::debug!(class = %self.class().name(), "watching method definitions");
        true
    }
}

impl fmt::Debug for Introspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Introspector")
            .field("class", self.class().name())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
