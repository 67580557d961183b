//! Per-class declarative advice.
//!
//! [`Aspects`] pairs a [`Callbacker`] with an [`Introspector`] for one class.
//! Advice for a method that already exists is registered right away; advice
//! for a method that does not exist yet is parked with the watcher and
//! registered the moment the method is defined.

use aspectory_core::{AfterAdvice, AroundAdvice, BeforeAdvice, Class, Symbol};
use aspectory_std::{Callbacker, CallbackerOptions, Introspector, Reaction};

/// Outcome of an [`Aspects`] registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The method existed; the advice went straight to the registry.
    Applied {
        /// `false` when identical advice was already registered.
        added: bool,
    },
    /// The method does not exist yet; registration waits for its definition.
    Deferred {
        /// Reactions now pending for the method.
        pending: usize,
    },
}

impl Registration {
    /// Whether the registration waits for a definition.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Registration::Deferred { .. })
    }
}

/// Advice registration for one class, deferred until methods exist.
///
/// Attach once per class and clone the handle to share it; each attachment
/// owns its own watcher subscription.
///
/// # Example
///
/// ```rust,ignore
/// let aspects = Aspects::attach(&class);
/// aspects.before("save", "validate");
/// aspects.around("save", AroundAdvice::from_fn(|_, _, next: &Continuation| next.proceed()));
///
/// // Defined later: the advice above is wired on definition.
/// class.define_method("save", |this: &Object, _: &Call| true);
/// ```
#[derive(Clone, Debug)]
pub struct Aspects {
    callbacker: Callbacker,
    introspector: Introspector,
}

impl Aspects {
    /// Attach to `class` with default options.
    pub fn attach(class: &Class) -> Self {
        Self::with_options(class, CallbackerOptions::new())
    }

    /// Attach to `class` with the given registry options.
    pub fn with_options(class: &Class, options: CallbackerOptions) -> Self {
        Self {
            callbacker: Callbacker::with_options(class, options),
            introspector: Introspector::new(class),
        }
    }

    /// The advised class.
    pub fn class(&self) -> &Class {
        self.callbacker.class()
    }

    /// The underlying registry.
    pub fn callbacker(&self) -> &Callbacker {
        &self.callbacker
    }

    /// The underlying definition watcher.
    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    /// Run `advice` before `method`, now or once it is defined.
    pub fn before(
        &self,
        method: impl Into<Symbol>,
        advice: impl Into<BeforeAdvice>,
    ) -> Registration {
        let (method, advice) = (method.into(), advice.into());
        let target = method.clone();
        self.weave(method, move |callbacker| callbacker.before(target.clone(), advice.clone()))
    }

    /// Run `advice` after `method`, now or once it is defined.
    pub fn after(&self, method: impl Into<Symbol>, advice: impl Into<AfterAdvice>) -> Registration {
        let (method, advice) = (method.into(), advice.into());
        let target = method.clone();
        self.weave(method, move |callbacker| callbacker.after(target.clone(), advice.clone()))
    }

    /// Wrap `advice` around `method`, now or once it is defined.
    pub fn around(
        &self,
        method: impl Into<Symbol>,
        advice: impl Into<AroundAdvice>,
    ) -> Registration {
        let (method, advice) = (method.into(), advice.into());
        let target = method.clone();
        self.weave(method, move |callbacker| callbacker.around(target.clone(), advice.clone()))
    }

    /// Fire `reaction` once `method` is defined.
    pub fn observe(&self, method: impl Into<Symbol>, reaction: Reaction) -> usize {
        self.introspector.observe(method, Some(reaction))
    }

    fn weave<F>(&self, method: Symbol, register: F) -> Registration
    where
        F: Fn(&Callbacker) -> bool + Send + Sync + 'static,
    {
        if self.introspector.defined_methods().contains(&method) {
            return Registration::Applied {
                added: register(&self.callbacker),
            };
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(class = %self.class().name(), %method, "advice waiting for definition");

        let callbacker = self.callbacker.clone();
        let reaction = Reaction::from_fn(move || {
            register(&callbacker);
        });
        Registration::Deferred {
            pending: self.introspector.observe(method, Some(reaction)),
        }
    }
}
