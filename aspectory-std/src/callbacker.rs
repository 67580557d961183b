//! # Advice Registry
//!
//! A [`Callbacker`] attaches before/after/around advice to the methods of one
//! class. The first registration for a method whose definition resolves
//! installs the class's chain for it: the original is captured, the
//! "without advice" alias is registered, and the install counter is bumped.
//! Later registrations only append advice.
//!
//! Registering for a name that does not resolve yet is not an error. The
//! chain collects the advice and is installed by the next registration made
//! once the method exists; the `aspectory` facade uses the definition
//! watcher to make that registration automatically.
//!
//! Registration is expected to happen during setup. Concurrent registration
//! on the same (class, method) pair must be serialized by the caller.

use crate::options::CallbackerOptions;
use aspectory_core::{
    AdviceChain, AfterAdvice, AroundAdvice, BeforeAdvice, ChainHandle, Class, Positions, Symbol,
};
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

struct CallbackerInner {
    class: Class,
    options: CallbackerOptions,
    installs: AtomicUsize,
}

/// The advice registry for one class.
#[derive(Clone)]
pub struct Callbacker {
    inner: Arc<CallbackerInner>,
}

impl Callbacker {
    /// A registry for `class` with default options.
    pub fn new(class: &Class) -> Self {
        Self::with_options(class, CallbackerOptions::new())
    }

    /// A registry for `class` with the given options.
    pub fn with_options(class: &Class, options: CallbackerOptions) -> Self {
        Self {
            inner: Arc::new(CallbackerInner {
                class: class.clone(),
                options,
                installs: AtomicUsize::new(0),
            }),
        }
    }

    /// The class this registry advises.
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// The registry options.
    pub fn options(&self) -> &CallbackerOptions {
        &self.inner.options
    }

    /// Run `advice` before `method`. Returns `false` for a duplicate.
    pub fn before(&self, method: impl Into<Symbol>, advice: impl Into<BeforeAdvice>) -> bool {
        let advice = advice.into();
        self.register(method.into(), |chain| chain.add_before(advice))
    }

    /// Run `advice` after `method`. Returns `false` for a duplicate.
    pub fn after(&self, method: impl Into<Symbol>, advice: impl Into<AfterAdvice>) -> bool {
        let advice = advice.into();
        self.register(method.into(), |chain| chain.add_after(advice))
    }

    /// Wrap `advice` around `method`. Returns `false` for a duplicate.
    pub fn around(&self, method: impl Into<Symbol>, advice: impl Into<AroundAdvice>) -> bool {
        let advice = advice.into();
        self.register(method.into(), |chain| chain.add_around(advice))
    }

    /// Install the chain for `method` without adding advice.
    ///
    /// Returns whether this call performed the install.
    pub fn install(&self, method: impl Into<Symbol>) -> bool {
        let method = method.into();
        let chain = self.chain(&method);
        self.ensure_installed(&method, &chain)
    }

    /// Number of installs this registry has performed.
    pub fn installations(&self) -> usize {
        self.inner.installs.load(Ordering::SeqCst)
    }

    /// Whether dispatch of `method` routes through this class's chain.
    pub fn is_installed(&self, method: &str) -> bool {
        self.class()
            .chain(method)
            .is_some_and(|chain| chain.lock().is_installed())
    }

    /// The positions holding advice for `method` on this class.
    pub fn positions(&self, method: &str) -> Positions {
        self.class()
            .chain(method)
            .map(|chain| chain.lock().positions())
            .unwrap_or_default()
    }

    /// Methods of this class with an installed chain.
    pub fn advised_methods(&self) -> BTreeSet<Symbol> {
        self.class()
            .chain_names()
            .into_iter()
            .filter(|name| self.is_installed(name))
            .collect()
    }

    /// The alias under which `method`'s original stays reachable.
    pub fn alias_for(&self, method: &str) -> Symbol {
        self.options().alias_for(method)
    }

    fn chain(&self, method: &Symbol) -> ChainHandle {
        let (chain, created) = self
            .class()
            .chain_or_insert(method.clone(), self.options().result_policy());
        if created {
            #[cfg(feature = "tracing")]
            tracing::trace!(class = %self.class().name(), %method, "created advice chain");
        }
        chain
    }

    fn register(&self, method: Symbol, add: impl FnOnce(&mut AdviceChain) -> bool) -> bool {
        let chain = self.chain(&method);
        let added = add(&mut chain.lock());
        self.ensure_installed(&method, &chain);
        added
    }

    fn ensure_installed(&self, method: &Symbol, chain: &ChainHandle) -> bool {
        if chain.lock().is_installed() {
            return false;
        }
        let Some(original) = self.class().find_method(method) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                class = %self.class().name(),
                %method,
                "method not defined yet, install deferred"
            );
            return false;
        };
        if !chain.lock().install(original) {
            return false;
        }

        self.class().register_alias(self.alias_for(method), method.clone());
        self.inner.installs.fetch_add(1, Ordering::SeqCst);

        #[cfg(feature = "tracing")]
        tracing::debug!(class = %self.class().name(), %method, "installed advice chain");
        true
    }
}

impl std::fmt::Debug for Callbacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacker")
            .field("class", self.class().name())
            .field("installations", &self.installations())
            .finish()
    }
}
