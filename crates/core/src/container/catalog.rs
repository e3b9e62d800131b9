use crate::aop::advice::{AdviceDescriptor, JoinPoint};
use crate::container::component::Component;
use crate::container::descriptor::{BeanDefinition, Capability, Dependency, TypeDescriptor};
use crate::container::scope::BeanScope;
use crate::errors::CoreError;

/// Catalog entry for one component: its definition plus any advice it owns
#[derive(Debug)]
pub struct ComponentDefinition {
    name: String,
    type_descriptor: TypeDescriptor,
    scope: BeanScope,
    advice: Vec<Result<AdviceDescriptor, CoreError>>,
}

impl ComponentDefinition {
    fn from_descriptor(name: impl Into<String>, type_descriptor: TypeDescriptor, scope: BeanScope) -> Self {
        Self {
            name: name.into(),
            type_descriptor,
            scope,
            advice: Vec::new(),
        }
    }

    /// Singleton component built through `Default`
    pub fn singleton<T: Component + Default>(name: impl Into<String>) -> Self {
        Self::from_descriptor(name, TypeDescriptor::of::<T>(), BeanScope::Singleton)
    }

    /// Prototype component built through `Default`
    pub fn prototype<T: Component + Default>(name: impl Into<String>) -> Self {
        Self::from_descriptor(name, TypeDescriptor::of::<T>(), BeanScope::Prototype)
    }

    /// Singleton component built by a fallible factory
    pub fn from_factory<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Component,
        F: Fn() -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self::from_descriptor(name, TypeDescriptor::with_factory(factory), BeanScope::Singleton)
    }

    pub fn with_scope(mut self, scope: BeanScope) -> Self {
        self.scope = scope;
        self
    }

    /// Required dependency on the bean named like `slot`
    pub fn depends_on(self, slot: impl Into<String>) -> Self {
        self.with_dependency(Dependency::required(slot))
    }

    /// Optional dependency on the bean named like `slot`
    pub fn optional(self, slot: impl Into<String>) -> Self {
        self.with_dependency(Dependency::optional(slot))
    }

    /// Required dependency on `target`, delivered to `slot`
    pub fn inject_as(self, slot: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_dependency(Dependency::required(slot).with_target(target))
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.type_descriptor.dependencies.push(dependency);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.type_descriptor.capabilities.insert(capability);
        self
    }

    pub fn name_aware(self) -> Self {
        self.with_capability(Capability::NameAware)
    }

    pub fn initializer(self) -> Self {
        self.with_capability(Capability::Initializer)
    }

    pub fn post_processor(self) -> Self {
        self.with_capability(Capability::PostProcessor)
    }

    pub fn disposable(self) -> Self {
        self.with_capability(Capability::Disposable)
    }

    /// Declare a before-advice owned by this component, making it an aspect.
    ///
    /// `T` must be the component's own type; the container resolves this
    /// bean and hands it to `advice` on every matched call.
    pub fn before<T, F>(mut self, pointcut: &str, advice_method: &str, advice: F) -> Self
    where
        T: Component,
        F: Fn(&T, &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let descriptor =
            AdviceDescriptor::before::<T, F>(self.name.clone(), pointcut, advice_method, advice);
        self.advice.push(descriptor);
        self
    }

    /// Declare an after-advice owned by this component
    pub fn after<T, F>(mut self, pointcut: &str, advice_method: &str, advice: F) -> Self
    where
        T: Component,
        F: Fn(&T, &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let descriptor =
            AdviceDescriptor::after::<T, F>(self.name.clone(), pointcut, advice_method, advice);
        self.advice.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    /// Whether this component owns advice
    pub fn is_aspect(&self) -> bool {
        !self.advice.is_empty()
    }

    /// Split into the registry definition and the advice it owns.
    ///
    /// Fails on the first malformed pointcut.
    pub fn into_parts(self) -> Result<(BeanDefinition, Vec<AdviceDescriptor>), CoreError> {
        let advice = self.advice.into_iter().collect::<Result<Vec<_>, _>>()?;
        let definition = BeanDefinition::new(self.name, self.type_descriptor, self.scope);
        Ok((definition, advice))
    }
}

/// Ordered collection of component entries a container is bootstrapped from
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    components: Vec<ComponentDefinition>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, component: ComponentDefinition) -> Self {
        self.add(component);
        self
    }

    pub fn add(&mut self, component: ComponentDefinition) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.components.iter()
    }
}

impl IntoIterator for ComponentCatalog {
    type Item = ComponentDefinition;
    type IntoIter = std::vec::IntoIter<ComponentDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

impl FromIterator<ComponentDefinition> for ComponentCatalog {
    fn from_iter<I: IntoIterator<Item = ComponentDefinition>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}
