//! # Classes
//!
//! A [`Class`] is a shared, mutable handle: methods can be defined at any
//! time, and every definition is published to the class's subscribers (see
//! [`DefinitionListener`]). Besides its method table, each class owns:
//!
//! - its advice chains, keyed by method name (the dispatcher registry
//!   consulted by [`Object::dispatch`]);
//! - the alias table mapping "without advice" names to advised methods.
//!
//! Installing advice never touches the method table.
//!
//! Every class made with [`Class::new`] descends from [`Class::object`], the
//! universal base class.

use crate::{
    call::Call,
    chain::{AdviceChain, AdvicePlan, ChainHandle, ResultPolicy},
    error::WeaveError,
    flow::{Flow, IntoFlow},
    object::Object,
    value::{Symbol, Value},
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Unique identity of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Closure shape of a method body.
pub type MethodBody = dyn Fn(&Object, &Call) -> Result<Flow, WeaveError> + Send + Sync;

/// A method as stored in a class's method table.
#[derive(Clone)]
pub struct Method {
    name: Symbol,
    owner: ClassId,
    body: Arc<MethodBody>,
}

impl Method {
    /// The method's name.
    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// The class that defined this method.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// Run the body directly, with no advice.
    pub fn invoke(&self, this: &Object, call: &Call) -> Result<Flow, WeaveError> {
        (self.body)(this, call)
    }

    /// Whether both handles refer to the same definition.
    pub fn ptr_eq(&self, other: &Method) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.body), Arc::as_ptr(&other.body))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Subscriber to a class's "method defined" events.
pub trait DefinitionListener: Send + Sync {
    /// Called after `method` has been defined on `class`.
    fn method_defined(&self, class: &Class, method: &Symbol);
}

impl<F> DefinitionListener for F
where
    F: Fn(&Class, &Symbol) + Send + Sync,
{
    fn method_defined(&self, class: &Class, method: &Symbol) {
        self(class, method)
    }
}

/// How a method name resolves for dispatch.
pub(crate) enum Resolution {
    Advised(Arc<AdvicePlan>),
    Plain(Method),
    Missing,
}

struct ClassInner {
    id: ClassId,
    name: Symbol,
    superclass: Option<Class>,
    methods: RwLock<HashMap<Symbol, Method>>,
    chains: RwLock<HashMap<Symbol, ChainHandle>>,
    aliases: RwLock<HashMap<Symbol, Symbol>>,
    listeners: Mutex<Vec<Arc<dyn DefinitionListener>>>,
}

/// A shared handle to a class.
#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

static OBJECT: LazyLock<Class> = LazyLock::new(|| {
    let object = Class::with_superclass("Object", None);
    object.define_method("inspect", |this: &Object, _: &Call| {
        Value::str(format!("#<{}>", this.class().name()))
    });
    object.define_method("class_name", |this: &Object, _: &Call| {
        Value::Sym(this.class().name().clone())
    });
    object
});

impl Class {
    /// A new class inheriting from [`Class::object`].
    pub fn new(name: impl Into<Symbol>) -> Self {
        Self::with_superclass(name, Some(Self::object()))
    }

    /// The universal base class.
    pub fn object() -> Class {
        OBJECT.clone()
    }

    fn with_superclass(name: impl Into<Symbol>, superclass: Option<Class>) -> Self {
        Self(Arc::new(ClassInner {
            id: ClassId::next(),
            name: name.into(),
            superclass,
            methods: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
        }))
    }

    /// A new class inheriting from this one.
    pub fn subclass(&self, name: impl Into<Symbol>) -> Class {
        Self::with_superclass(name, Some(self.clone()))
    }

    /// This class's identity.
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    /// This class's name.
    pub fn name(&self) -> &Symbol {
        &self.0.name
    }

    /// The direct superclass; `None` only for [`Class::object`].
    pub fn superclass(&self) -> Option<&Class> {
        self.0.superclass.as_ref()
    }

    /// This class followed by its ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Class> + use<> {
        std::iter::successors(Some(self.clone()), |class| class.superclass().cloned())
    }

    /// Whether this class is `other` or descends from it.
    pub fn inherits(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class == *other)
    }

    /// Whether this is the universal base class.
    pub fn is_object(&self) -> bool {
        self.0.superclass.is_none()
    }

    /// Define (or redefine) a method, then notify subscribers.
    ///
    /// Redefining an advised method leaves the advice chain's captured
    /// original in place.
    pub fn define_method<F, R>(&self, name: impl Into<Symbol>, body: F) -> &Self
    where
        F: Fn(&Object, &Call) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        let name = name.into();
        let body: Arc<MethodBody> =
            Arc::new(move |this: &Object, call: &Call| body(this, call).into_flow());
        let method = Method {
            name: name.clone(),
            owner: self.id(),
            body,
        };
        self.0.methods.write().insert(name.clone(), method);

        let listeners = self.0.listeners.lock().clone();
        for listener in listeners {
            listener.method_defined(self, &name);
        }
        self
    }

    /// Subscribe to this class's method definitions.
    pub fn subscribe(&self, listener: Arc<dyn DefinitionListener>) {
        self.0.listeners.lock().push(listener);
    }

    /// Number of definition subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.0.listeners.lock().len()
    }

    /// The method defined directly on this class.
    pub fn own_method(&self, name: &str) -> Option<Method> {
        self.0.methods.read().get(name).cloned()
    }

    /// Whether this class itself defines `name`.
    pub fn defines(&self, name: &str) -> bool {
        self.0.methods.read().contains_key(name)
    }

    /// The nearest definition of `name`, ignoring advice.
    pub fn find_method(&self, name: &str) -> Option<Method> {
        self.ancestors().find_map(|class| class.own_method(name))
    }

    /// Names defined directly on this class.
    pub fn own_method_names(&self) -> BTreeSet<Symbol> {
        self.0.methods.read().keys().cloned().collect()
    }

    /// Every name an instance responds to, including inherited ones.
    pub fn method_names(&self) -> BTreeSet<Symbol> {
        self.ancestors()
            .flat_map(|class| class.own_method_names())
            .collect()
    }

    /// The advice chain for `name` owned by this class.
    pub fn chain(&self, name: &str) -> Option<ChainHandle> {
        self.0.chains.read().get(name).cloned()
    }

    /// The chain for `name`, created on first request.
    ///
    /// Returns the handle and whether this call created it. `policy` only
    /// applies to a newly created chain.
    pub fn chain_or_insert(
        &self,
        name: impl Into<Symbol>,
        policy: ResultPolicy,
    ) -> (ChainHandle, bool) {
        let name = name.into();
        let mut chains = self.0.chains.write();
        if let Some(chain) = chains.get(&name) {
            return (Arc::clone(chain), false);
        }
        let chain = Arc::new(Mutex::new(AdviceChain::new(name.clone(), policy)));
        chains.insert(name, Arc::clone(&chain));
        (chain, true)
    }

    /// Names with a chain owned by this class.
    pub fn chain_names(&self) -> BTreeSet<Symbol> {
        self.0.chains.read().keys().cloned().collect()
    }

    /// Make `alias` dispatch to the pristine original of `target`.
    pub fn register_alias(&self, alias: impl Into<Symbol>, target: impl Into<Symbol>) {
        self.0.aliases.write().insert(alias.into(), target.into());
    }

    /// The advised method `alias` stands for, searching ancestors.
    pub fn alias_target(&self, alias: &str) -> Option<Symbol> {
        self.ancestors()
            .find_map(|class| class.0.aliases.read().get(alias).cloned())
    }

    /// A bare instance; `initialize` is not run.
    pub fn allocate(&self) -> Object {
        Object::new(self.clone())
    }

    /// A new instance, with `initialize` run on `args` when it resolves.
    pub fn instantiate(
        &self,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Object, WeaveError> {
        let object = self.allocate();
        if object.responds_to("initialize") {
            object.call("initialize", Call::new(args))?;
        }
        Ok(object)
    }

    fn installed_chain(&self, name: &str) -> Option<ChainHandle> {
        self.chain(name).filter(|chain| chain.lock().is_installed())
    }

    /// The method a call to `name` runs once advice is stripped away.
    ///
    /// Resolved like dispatch: the nearest class holding either an installed
    /// chain or its own definition wins, and a chain stands for its original.
    pub(crate) fn unadvised_method(&self, name: &str) -> Option<Method> {
        self.ancestors().find_map(|class| match class.installed_chain(name) {
            Some(chain) => {
                let original = chain.lock().original().cloned();
                original
            }
            None => class.own_method(name),
        })
    }

    /// Find what a call to `name` on an instance of this class runs.
    ///
    /// The nearest class holding either an installed chain or its own
    /// definition wins. An installed chain on class K is merged with the
    /// installed chains of K's ancestors that wrap the same original,
    /// ancestor advice first.
    pub(crate) fn resolve(&self, name: &Symbol) -> Resolution {
        let mut classes = self.ancestors();
        while let Some(class) = classes.next() {
            if let Some(anchor) = class.installed_chain(name) {
                let owner = anchor.lock().original().map(Method::owner);
                let mut chains = vec![anchor];
                if owner != Some(class.id()) {
                    for ancestor in classes.by_ref() {
                        if let Some(chain) = ancestor.installed_chain(name) {
                            if chain.lock().original().map(Method::owner) == owner {
                                chains.push(chain);
                            }
                        }
                        if Some(ancestor.id()) == owner {
                            break;
                        }
                    }
                }
                chains.reverse();
                if let Some(plan) = AdvicePlan::merge(&chains) {
                    return Resolution::Advised(Arc::new(plan));
                }
                continue;
            }
            if let Some(method) = class.own_method(name) {
                return Resolution::Plain(method);
            }
        }
        Resolution::Missing
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("id", &self.0.id)
            .finish()
    }
}
