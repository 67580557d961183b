//! Registry configuration.

use aspectory_core::{ResultPolicy, Symbol};
use std::borrow::Cow;

/// Suffix appended to a method name to form its "without advice" alias.
pub const DEFAULT_ALIAS_SUFFIX: &str = "_without_advice";

/// Options for a [`Callbacker`](crate::Callbacker).
///
/// # Example
/// ```ignore
/// let options = CallbackerOptions::new()
///     .with_result_policy(ResultPolicy::LastAfter)
///     .with_alias_suffix("_unadvised");
/// let callbacker = Callbacker::with_options(&class, options);
/// ```
#[derive(Debug, Clone)]
pub struct CallbackerOptions {
    result_policy: ResultPolicy,
    alias_suffix: Cow<'static, str>,
}

impl Default for CallbackerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackerOptions {
    /// Default options: original result wins, `_without_advice` aliases.
    pub fn new() -> Self {
        Self {
            result_policy: ResultPolicy::default(),
            alias_suffix: Cow::Borrowed(DEFAULT_ALIAS_SUFFIX),
        }
    }

    /// Set the policy for chains created from now on.
    pub fn with_result_policy(mut self, policy: ResultPolicy) -> Self {
        self.result_policy = policy;
        self
    }

    /// Set the alias suffix.
    pub fn with_alias_suffix(mut self, suffix: impl Into<Cow<'static, str>>) -> Self {
        self.alias_suffix = suffix.into();
        self
    }

    /// The result policy.
    pub fn result_policy(&self) -> ResultPolicy {
        self.result_policy
    }

    /// The alias suffix.
    pub fn alias_suffix(&self) -> &str {
        &self.alias_suffix
    }

    /// The alias under which `method`'s original stays reachable.
    pub fn alias_for(&self, method: &str) -> Symbol {
        Symbol::new(format!("{method}{}", self.alias_suffix))
    }
}
