use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::container::component::{BeanRef, Component};
use crate::container::scope::BeanScope;
use crate::errors::CoreError;

/// Factory producing a fresh, unwired instance of a component type
pub type InstanceFactory = Arc<dyn Fn() -> Result<BeanRef, CoreError> + Send + Sync>;

/// Injection point declared by a component type.
///
/// Resolution is by name: `target` is the bean identifier looked up and
/// defaults to the slot name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub slot: String,
    pub target: String,
    pub required: bool,
}

impl Dependency {
    /// A required dependency on the bean named like the slot
    pub fn required(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self {
            target: slot.clone(),
            slot,
            required: true,
        }
    }

    /// An optional dependency; an undefined target leaves the slot unset
    pub fn optional(slot: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(slot)
        }
    }

    /// Resolve the slot from a differently named bean
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

/// Lifecycle capabilities a component declares in its catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Capability {
    NameAware,
    Initializer,
    PostProcessor,
    Disposable,
}

/// How to create and wire instances of one component type
#[derive(Clone)]
pub struct TypeDescriptor {
    pub type_name: &'static str,
    pub dependencies: Vec<Dependency>,
    pub capabilities: BTreeSet<Capability>,
    factory: InstanceFactory,
}

impl TypeDescriptor {
    /// Describe a component instantiated through `Default`
    pub fn of<T: Component + Default>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            dependencies: Vec::new(),
            capabilities: BTreeSet::new(),
            factory: Arc::new(|| -> Result<BeanRef, CoreError> { Ok(Arc::new(T::default())) }),
        }
    }

    /// Describe a component instantiated by a fallible factory
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Component,
        F: Fn() -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            dependencies: Vec::new(),
            capabilities: BTreeSet::new(),
            factory: Arc::new(move || factory().map(|instance| Arc::new(instance) as BeanRef)),
        }
    }

    /// Create a raw, unwired instance
    pub fn instantiate(&self) -> Result<BeanRef, CoreError> {
        (self.factory)()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("dependencies", &self.dependencies)
            .field("capabilities", &self.capabilities)
            .field("factory", &"<factory_fn>")
            .finish()
    }
}

/// Registered definition of a bean: identifier, type and scope
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    pub name: String,
    pub type_descriptor: TypeDescriptor,
    pub scope: BeanScope,
}

impl BeanDefinition {
    pub fn new(name: impl Into<String>, type_descriptor: TypeDescriptor, scope: BeanScope) -> Self {
        Self {
            name: name.into(),
            type_descriptor,
            scope,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.type_descriptor.dependencies
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.type_descriptor.has_capability(capability)
    }

    /// Serializable summary used in container reports
    pub fn summary(&self) -> BeanSummary {
        BeanSummary {
            name: self.name.clone(),
            type_name: self.type_descriptor.type_name,
            scope: self.scope,
            dependencies: self.type_descriptor.dependencies.clone(),
            capabilities: self.type_descriptor.capabilities.iter().copied().collect(),
        }
    }
}

/// Snapshot of a bean definition for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct BeanSummary {
    pub name: String,
    pub type_name: &'static str,
    pub scope: BeanScope,
    pub dependencies: Vec<Dependency>,
    pub capabilities: Vec<Capability>,
}
