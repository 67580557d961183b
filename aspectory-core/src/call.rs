//! Invocation context: arguments and the trailing block.

use crate::{
    error::WeaveError,
    flow::{Flow, IntoFlow},
    value::{Symbol, Value},
};
use std::{fmt, sync::Arc};

type BlockFn = dyn Fn(&[Value]) -> Result<Flow, WeaveError> + Send + Sync;

/// A callable passed along with a call, which the method may yield to.
#[derive(Clone)]
pub struct Block(Arc<BlockFn>);

impl Block {
    /// Wrap a closure as a block.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        Self(Arc::new(move |args| f(args).into_flow()))
    }

    /// A block that ignores its arguments and returns `value`.
    pub fn returning(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |_| value.clone())
    }

    /// Invoke the block.
    pub fn call(&self, args: &[Value]) -> Result<Flow, WeaveError> {
        (self.0)(args)
    }

    /// Whether two handles refer to the same block.
    pub fn ptr_eq(&self, other: &Block) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Block").field(&Arc::as_ptr(&self.0)).finish()
    }
}

/// Arguments and optional block for one invocation.
#[derive(Clone, Debug, Default)]
pub struct Call {
    args: Vec<Value>,
    block: Option<Block>,
}

impl Call {
    /// A call with the given positional arguments and no block.
    pub fn new(args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
            block: None,
        }
    }

    /// A call with no arguments and no block.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a trailing block.
    pub fn with_block(mut self, block: Block) -> Self {
        self.block = Some(block);
        self
    }

    /// Attach a trailing block if one is given.
    pub fn with_optional_block(mut self, block: Option<Block>) -> Self {
        self.block = block;
        self
    }

    /// The positional arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The positional argument at `index`, or `Nil`.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// The positional argument at `index`, or `default` when absent.
    pub fn arg_or(&self, index: usize, default: impl Into<Value>) -> Value {
        self.args.get(index).cloned().unwrap_or_else(|| default.into())
    }

    /// The trailing block.
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    /// Whether a block was given.
    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Yield to the trailing block on behalf of `method`.
    pub fn yield_block(&self, method: &Symbol, args: &[Value]) -> Result<Flow, WeaveError> {
        match &self.block {
            Some(block) => block.call(args),
            None => Err(WeaveError::NoBlock {
                method: method.clone(),
            }),
        }
    }
}
