//! # Advice Chain
//!
//! An [`AdviceChain`] records, for one (class, method name) pair, the
//! original method and the ordered before/after/around advice attached to
//! it. When a call is dispatched, the chains that apply to the receiver are
//! merged into an [`AdvicePlan`] snapshot, so no lock is held while advice
//! runs and advice may register further advice re-entrantly.
//!
//! # Execution Order
//!
//! 1. Before-advice in registration order. A falsy result halts the call and
//!    becomes its result.
//! 2. Around-advice, first registered outermost. Each receives a
//!    [`Continuation`]; one that never proceeds halts the call.
//! 3. The original method (directly, when no around-advice exists).
//! 4. After-advice in registration order, each given the stage result.
//!
//! A [`Flow::ShortCircuit`] tagged with the method name ends the call at any
//! point, and its payload becomes the result.

use crate::{
    advice::{AfterAdvice, AroundAdvice, BeforeAdvice, Position, Positions, push_unique},
    call::{Block, Call},
    class::Method,
    error::WeaveError,
    flow::Flow,
    object::Object,
    value::{Symbol, Value},
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Which value a fully run chain returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultPolicy {
    /// Return the around/original stage result; after-advice only observes.
    ///
    /// This is the default because after-advice is commonly written for its
    /// side effects (logging, notification) and must not change what callers
    /// see. Use [`LastAfter`](Self::LastAfter) to let the final after-advice
    /// replace the result instead.
    #[default]
    Original,
    /// Return the value of the last after-advice when any ran.
    LastAfter,
}

/// Shared handle to a chain, owned by its class.
pub type ChainHandle = Arc<Mutex<AdviceChain>>;

/// Advice attached to one method of one class.
#[derive(Debug)]
pub struct AdviceChain {
    method: Symbol,
    original: Option<Method>,
    before: Vec<BeforeAdvice>,
    after: Vec<AfterAdvice>,
    around: Vec<AroundAdvice>,
    installed: bool,
    policy: ResultPolicy,
}

impl AdviceChain {
    /// An empty, uninstalled chain for `method`.
    pub fn new(method: Symbol, policy: ResultPolicy) -> Self {
        Self {
            method,
            original: None,
            before: Vec::new(),
            after: Vec::new(),
            around: Vec::new(),
            installed: false,
            policy,
        }
    }

    /// The advised method name.
    pub fn method(&self) -> &Symbol {
        &self.method
    }

    /// The captured original, once installed.
    pub fn original(&self) -> Option<&Method> {
        self.original.as_ref()
    }

    /// Whether dispatch routes through this chain.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// The result policy of this chain.
    pub fn policy(&self) -> ResultPolicy {
        self.policy
    }

    /// Append before-advice. Returns `false` for a duplicate.
    pub fn add_before(&mut self, advice: BeforeAdvice) -> bool {
        push_unique(&mut self.before, advice)
    }

    /// Append after-advice. Returns `false` for a duplicate.
    pub fn add_after(&mut self, advice: AfterAdvice) -> bool {
        push_unique(&mut self.after, advice)
    }

    /// Append around-advice. Returns `false` for a duplicate.
    pub fn add_around(&mut self, advice: AroundAdvice) -> bool {
        push_unique(&mut self.around, advice)
    }

    /// Registered before-advice.
    pub fn before(&self) -> &[BeforeAdvice] {
        &self.before
    }

    /// Registered after-advice.
    pub fn after(&self) -> &[AfterAdvice] {
        &self.after
    }

    /// Registered around-advice.
    pub fn around(&self) -> &[AroundAdvice] {
        &self.around
    }

    /// The positions that hold at least one advice.
    pub fn positions(&self) -> Positions {
        let mut positions = Positions::empty();
        positions.set(Positions::BEFORE, !self.before.is_empty());
        positions.set(Positions::AFTER, !self.after.is_empty());
        positions.set(Positions::AROUND, !self.around.is_empty());
        positions
    }

    /// Route dispatch through this chain, capturing `original`.
    ///
    /// Returns `false` when already installed; the captured original never
    /// changes after the first install.
    pub fn install(&mut self, original: Method) -> bool {
        if self.installed {
            return false;
        }
        self.original.get_or_insert(original);
        self.installed = true;
        true
    }
}

/// A snapshot of the advice that applies to one dispatched call.
pub struct AdvicePlan {
    method: Symbol,
    original: Method,
    before: Vec<BeforeAdvice>,
    after: Vec<AfterAdvice>,
    around: Vec<AroundAdvice>,
    policy: ResultPolicy,
}

impl AdvicePlan {
    /// Merge installed chains, ordered ancestor-first.
    ///
    /// The last chain is the anchor: it supplies the original and the result
    /// policy. Advice present in several chains runs once, at its first
    /// (most ancestral) position.
    pub fn merge(chains: &[ChainHandle]) -> Option<Self> {
        let anchor = chains.last()?.lock();
        let mut plan = Self {
            method: anchor.method.clone(),
            original: anchor.original.clone()?,
            before: Vec::new(),
            after: Vec::new(),
            around: Vec::new(),
            policy: anchor.policy,
        };
        drop(anchor);

        for chain in chains {
            let chain = chain.lock();
            for advice in &chain.before {
                push_unique(&mut plan.before, advice.clone());
            }
            for advice in &chain.after {
                push_unique(&mut plan.after, advice.clone());
            }
            for advice in &chain.around {
                push_unique(&mut plan.around, advice.clone());
            }
        }
        Some(plan)
    }

    /// The advised method name.
    pub fn method(&self) -> &Symbol {
        &self.method
    }

    /// Number of advice callables in the plan.
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len() + self.around.len()
    }

    /// Whether the plan holds no advice at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the plan for `this`, catching signals tagged with this method.
    pub fn invoke(self: &Arc<Self>, this: &Object, call: &Call) -> Result<Flow, WeaveError> {
        Ok(self.run(this, call)?.catch(&self.method))
    }

    fn run(self: &Arc<Self>, this: &Object, call: &Call) -> Result<Flow, WeaveError> {
        for advice in &self.before {
            let flow = advice
                .run(this, call)
                .map_err(|e| e.in_advice(&self.method, Position::Before))?;
            match flow {
                Flow::Continue(value) if !value.is_truthy() => return Ok(Flow::Continue(value)),
                Flow::Continue(_) => {}
                signal => return Ok(signal),
            }
        }

        let result = match self.run_around(0, this, call)? {
            Stage::Completed(value) => value,
            Stage::Halted(value) => return Ok(Flow::Continue(value)),
            Stage::Signal(signal) => return Ok(signal),
        };

        let mut last = None;
        for advice in &self.after {
            let flow = advice
                .run(this, call, &result)
                .map_err(|e| e.in_advice(&self.method, Position::After))?;
            match flow {
                Flow::Continue(value) => last = Some(value),
                signal => return Ok(signal),
            }
        }

        Ok(Flow::Continue(match (self.policy, last) {
            (ResultPolicy::LastAfter, Some(value)) => value,
            _ => result,
        }))
    }

    fn run_around(
        self: &Arc<Self>,
        index: usize,
        this: &Object,
        call: &Call,
    ) -> Result<Stage, WeaveError> {
        let Some(advice) = self.around.get(index) else {
            return Ok(match self.original.invoke(this, call)? {
                Flow::Continue(value) => Stage::Completed(value),
                signal => Stage::Signal(signal),
            });
        };

        let next = Continuation::new(Arc::clone(self), index + 1, this.clone(), call.clone());
        let outcome = advice.run(this, call, &next);
        let state = next.take_state();

        let flow = match outcome {
            Ok(flow) => flow,
            // Failures raised further down are not this advice's own.
            Err(err) if state.failed => return Err(err),
            Err(err) => return Err(err.in_advice(&self.method, Position::Around)),
        };
        if let Some(signal) = state.signal {
            return Ok(Stage::Signal(signal));
        }
        Ok(match flow {
            signal @ Flow::ShortCircuit { .. } => Stage::Signal(signal),
            Flow::Continue(value) => match (state.completed, state.halted) {
                (Some(inner), _) => Stage::Completed(inner),
                (None, Some(inner)) => Stage::Halted(inner),
                (None, None) => Stage::Halted(value),
            },
        })
    }
}

enum Stage {
    /// The original ran to completion.
    Completed(Value),
    /// An around-advice returned without proceeding; the value is its own
    /// result, carried out through every enclosing advice.
    Halted(Value),
    /// A short-circuit signal is unwinding.
    Signal(Flow),
}

#[derive(Default)]
struct ContinuationState {
    completed: Option<Value>,
    halted: Option<Value>,
    signal: Option<Flow>,
    failed: bool,
    calls: usize,
}

/// The rest of an advised call, handed to around-advice.
///
/// Calling [`proceed`](Continuation::proceed) runs the next around-advice,
/// or the original when this is the innermost one. Short-circuit signals
/// seen by the continuation keep unwinding even if the around-advice drops
/// the returned flow.
#[derive(Clone)]
pub struct Continuation {
    inner: Arc<ContinuationInner>,
}

struct ContinuationInner {
    plan: Arc<AdvicePlan>,
    index: usize,
    this: Object,
    call: Call,
    state: Mutex<ContinuationState>,
}

impl Continuation {
    fn new(plan: Arc<AdvicePlan>, index: usize, this: Object, call: Call) -> Self {
        Self {
            inner: Arc::new(ContinuationInner {
                plan,
                index,
                this,
                call,
                state: Mutex::new(ContinuationState::default()),
            }),
        }
    }

    /// Run the rest of the chain.
    pub fn proceed(&self) -> Result<Flow, WeaveError> {
        let inner = &self.inner;
        let stage = inner.plan.run_around(inner.index, &inner.this, &inner.call);

        let mut state = inner.state.lock();
        state.calls += 1;
        match stage {
            Ok(Stage::Completed(value)) => {
                state.completed = Some(value.clone());
                Ok(Flow::Continue(value))
            }
            Ok(Stage::Halted(value)) => {
                state.halted = Some(value.clone());
                Ok(Flow::Continue(value))
            }
            Ok(Stage::Signal(signal)) => {
                state.signal = Some(signal.clone());
                Ok(signal)
            }
            Err(err) => {
                state.failed = true;
                Err(err)
            }
        }
    }

    /// Whether [`proceed`](Continuation::proceed) has been called.
    pub fn invoked(&self) -> bool {
        self.inner.state.lock().calls > 0
    }

    /// The advised method name.
    pub fn method(&self) -> &Symbol {
        &self.inner.plan.method
    }

    /// This continuation as a block, for methods that `yield` to proceed.
    pub fn as_block(&self) -> Block {
        let next = self.clone();
        Block::new(move |_| next.proceed())
    }

    fn take_state(&self) -> ContinuationState {
        std::mem::take(&mut *self.inner.state.lock())
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("method", &self.inner.plan.method)
            .field("index", &self.inner.index)
            .finish()
    }
}
