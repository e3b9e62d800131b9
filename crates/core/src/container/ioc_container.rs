use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::aop::{AdviceIndex, AspectAutoProxyCreator};
use crate::config::{ConfigTrait, ContainerConfig};
use crate::container::cache::{Lookup, SingletonCache};
use crate::container::catalog::ComponentCatalog;
use crate::container::component::{view, AsAny, BeanRef, Component};
use crate::container::descriptor::{BeanDefinition, BeanSummary, Capability};
use crate::container::lifecycle::ContainerState;
use crate::container::post_processor::{BeanPostProcessor, PostProcessorChain};
use crate::container::registry::BeanDefinitionRegistry;
use crate::container::scope::BeanScope;
use crate::errors::CoreError;

/// Mutable resolution state, guarded by the container's reentrant lock
#[derive(Debug)]
struct ResolutionState {
    lifecycle: ContainerState,
    cache: SingletonCache,
    /// Beans currently in construction, outermost first
    in_creation: Vec<String>,
    post_processors: PostProcessorChain,
    /// Initialized singletons with a destroy callback, in creation order
    disposables: Vec<(String, BeanRef)>,
}

impl ResolutionState {
    fn new() -> Self {
        Self {
            lifecycle: ContainerState::Bootstrapping,
            cache: SingletonCache::new(),
            in_creation: Vec::new(),
            post_processors: PostProcessorChain::new(),
            disposables: Vec::new(),
        }
    }

    fn is_in_creation(&self, name: &str) -> bool {
        self.in_creation.iter().any(|n| n == name)
    }

    fn leave_creation(&mut self, name: &str) {
        if let Some(pos) = self.in_creation.iter().rposition(|n| n == name) {
            self.in_creation.remove(pos);
        }
    }

    fn cycle_error(&self, name: &str) -> CoreError {
        let mut path = self.in_creation.clone();
        path.push(name.to_string());
        CoreError::CircularDependency {
            path: path.join(" -> "),
            cycle_bean: name.to_string(),
        }
    }
}

/// Snapshot of a container for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub id: Uuid,
    pub name: String,
    pub state: ContainerState,
    pub aspect_auto_proxy: bool,
    pub allow_circular_references: bool,
    pub singletons_created: usize,
    pub post_processors: Vec<String>,
    pub beans: Vec<BeanSummary>,
}

/// Inversion-of-control container.
///
/// Bootstrapping registers every catalog entry, resolves post-processor
/// components, installs the proxy weaver when aspect auto-proxying is on,
/// and eagerly creates every singleton. Singletons that depend on each other
/// in a cycle are resolved by exposing early references; prototype cycles
/// fail with [`CoreError::CircularDependency`].
///
/// Resolution is serialized by a reentrant lock, so a container can be shared
/// across threads once bootstrapped.
pub struct Container {
    id: Uuid,
    config: ContainerConfig,
    registry: BeanDefinitionRegistry,
    advice: Arc<AdviceIndex>,
    post_processor_names: Vec<String>,
    state: ReentrantMutex<RefCell<ResolutionState>>,
}

impl Container {
    /// Bootstrap a container with the default configuration
    pub fn new(catalog: ComponentCatalog) -> Result<Self, CoreError> {
        Self::bootstrap(catalog, ContainerConfig::default())
    }

    /// Register the catalog, set up the post-processor chain and eagerly
    /// create every singleton.
    ///
    /// The proxy weaver is installed first, then post-processor components
    /// are appended in catalog order, then aspect beans are created and bound
    /// to the weaver. No container is returned if any step fails; singletons
    /// created before the failure get their destroy callbacks.
    pub fn bootstrap(catalog: ComponentCatalog, config: ContainerConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let mut registry = BeanDefinitionRegistry::new();
        let mut advice = AdviceIndex::new();
        for component in catalog {
            let (definition, descriptors) = component.into_parts()?;
            registry.register(definition)?;
            for descriptor in descriptors {
                advice.add(descriptor);
            }
        }

        let post_processor_names = registry
            .iter()
            .filter(|(_, definition)| definition.has_capability(Capability::PostProcessor))
            .map(|(name, _)| name.to_string())
            .collect();

        let container = Self {
            id: Uuid::new_v4(),
            config,
            registry,
            advice: Arc::new(advice),
            post_processor_names,
            state: ReentrantMutex::new(RefCell::new(ResolutionState::new())),
        };

        info!(
            container = %container.id,
            name = %container.config.name,
            beans = container.registry.len(),
            "bootstrapping container"
        );

        let started = container
            .install_post_processors()
            .and_then(|()| container.refresh());
        if let Err(err) = started {
            error!(container = %container.id, error = %err, "bootstrap failed");
            container.destroy_singletons();
            return Err(err);
        }

        container.with_state(|state| state.lifecycle = ContainerState::Running);
        info!(
            container = %container.id,
            singletons = container.singleton_count(),
            post_processors = container.post_processor_count(),
            "container running"
        );
        Ok(container)
    }

    /// Create every singleton not created yet, in definition order.
    ///
    /// Singletons already cached are left as they are and the post-processor
    /// chain is not touched, so calling this again is cheap.
    pub fn refresh(&self) -> Result<(), CoreError> {
        for (name, _) in self.registry.all_singletons() {
            self.get_bean(name)?;
        }
        Ok(())
    }

    /// Build the post-processor chain; runs once, during bootstrap
    fn install_post_processors(&self) -> Result<(), CoreError> {
        let weaver = self.install_weaver();
        self.register_post_processors()?;
        if let Some(weaver) = weaver {
            self.bind_aspects(&weaver)?;
        }
        Ok(())
    }

    fn register_post_processors(&self) -> Result<(), CoreError> {
        for name in &self.post_processor_names {
            let bean = self.get_bean(name)?;
            let type_name = bean.component_type();
            let processor = Arc::clone(&bean).as_post_processor().ok_or_else(|| {
                missing_capability(name, type_name, Capability::PostProcessor)
            })?;
            self.with_state(|state| state.post_processors.push(processor));
        }
        Ok(())
    }

    /// Append the proxy weaver ahead of every other post-processor, so any
    /// advised bean is woven no matter what pulls it into existence
    fn install_weaver(&self) -> Option<Arc<AspectAutoProxyCreator>> {
        if self.advice.is_empty() {
            return None;
        }
        if !self.config.aspect_auto_proxy {
            warn!(
                container = %self.id,
                aspects = self.advice.aspect_names().len(),
                "advice is declared but aspect auto-proxy is disabled; it will not run"
            );
            return None;
        }

        let weaver = Arc::new(AspectAutoProxyCreator::new(Arc::clone(&self.advice)));
        debug!(container = %self.id, aspects = weaver.aspect_count(), "installing proxy weaver");
        let processor: Arc<dyn BeanPostProcessor> = weaver.clone();
        self.with_state(|state| state.post_processors.push(processor));
        Some(weaver)
    }

    /// Create each aspect bean and hand it to the weaver
    fn bind_aspects(&self, weaver: &AspectAutoProxyCreator) -> Result<(), CoreError> {
        for name in self.advice.aspect_names() {
            let aspect = self.get_bean(name)?;
            weaver.bind_aspect(name, aspect)?;
        }
        Ok(())
    }

    /// Resolve a bean by identifier, creating it if needed
    pub fn get_bean(&self, name: &str) -> Result<BeanRef, CoreError> {
        let _guard = self.state.lock();
        let definition = self.registry.get(name)?;

        if self.state() == ContainerState::Closed {
            return Err(CoreError::ContainerClosed {
                name: self.config.name.clone(),
            });
        }

        match definition.scope {
            BeanScope::Singleton => self.get_singleton(name, definition),
            BeanScope::Prototype => self.get_prototype(name, definition),
        }
    }

    fn get_singleton(&self, name: &str, definition: &BeanDefinition) -> Result<BeanRef, CoreError> {
        let allow_early = self.config.allow_circular_references;
        let (lookup, in_construction) = self.with_state(|state| -> Result<_, CoreError> {
            let in_construction = state.is_in_creation(name);
            if in_construction && !allow_early {
                return Err(state.cycle_error(name));
            }
            let lookup = state.cache.lookup(name, in_construction)?;
            Ok((lookup, in_construction))
        })?;

        match lookup {
            Lookup::Finished(bean) => Ok(bean),
            Lookup::EarlyExposed(bean) | Lookup::FromFactory(bean) => {
                debug!(
                    container = %self.id,
                    bean = name,
                    "returning early reference to singleton in construction"
                );
                Ok(bean)
            }
            // past the point where early exposure is possible
            Lookup::Absent if in_construction => Err(self.with_state(|state| state.cycle_error(name))),
            Lookup::Absent => self.construct(name, definition),
        }
    }

    fn get_prototype(&self, name: &str, definition: &BeanDefinition) -> Result<BeanRef, CoreError> {
        self.with_state(|state| -> Result<(), CoreError> {
            if state.is_in_creation(name) {
                Err(state.cycle_error(name))
            } else {
                Ok(())
            }
        })?;
        self.construct(name, definition)
    }

    fn construct(&self, name: &str, definition: &BeanDefinition) -> Result<BeanRef, CoreError> {
        let span = tracing::debug_span!(
            "construct",
            container = %self.id,
            bean = name,
            scope = %definition.scope
        );
        let _enter = span.enter();

        let raw = match definition.type_descriptor.instantiate() {
            Ok(raw) => raw,
            Err(err) => return Err(self.abort_construction(name, CoreError::construction(name, err))),
        };

        self.with_state(|state| {
            state.in_creation.push(name.to_string());
            if definition.is_singleton() {
                let chain = state.post_processors.clone();
                let early = Arc::clone(&raw);
                let bean_name = name.to_string();
                state.cache.put_factory(
                    name,
                    Box::new(move || chain.early_reference(early, &bean_name)),
                );
            }
        });

        match self.populate_and_initialize(name, definition, raw) {
            Ok((bean, disposable)) => Ok(self.finish_construction(name, definition, bean, disposable)),
            Err(err) => Err(self.abort_construction(name, err)),
        }
    }

    /// Inject dependencies and run lifecycle callbacks and post-processor hooks.
    ///
    /// Returns the processed bean and, for disposable beans, the initialized
    /// object whose destroy callback runs on close.
    fn populate_and_initialize(
        &self,
        name: &str,
        definition: &BeanDefinition,
        raw: BeanRef,
    ) -> Result<(BeanRef, Option<BeanRef>), CoreError> {
        for dependency in definition.dependencies() {
            if !self.registry.contains(&dependency.target) {
                if dependency.required {
                    return Err(CoreError::RequiredDependencyMissing {
                        bean: name.to_string(),
                        slot: dependency.slot.clone(),
                        target: dependency.target.clone(),
                    });
                }
                debug!(
                    bean = name,
                    slot = %dependency.slot,
                    target = %dependency.target,
                    "optional dependency not defined; slot left unset"
                );
                continue;
            }

            let resolved = self.get_bean(&dependency.target)?;
            raw.inject(&dependency.slot, resolved)
                .map_err(|err| CoreError::construction(name, err))?;
        }

        if definition.is_singleton() {
            self.with_state(|state| state.cache.remove_factory(name));
        }

        let type_name = raw.component_type();
        if definition.has_capability(Capability::NameAware) {
            raw.as_name_aware()
                .ok_or_else(|| missing_capability(name, type_name, Capability::NameAware))?
                .set_bean_name(name);
        }

        let chain = self.with_state(|state| state.post_processors.clone());
        let bean = chain
            .apply_before_initialization(raw, name)
            .map_err(|err| CoreError::initialization(name, err))?;

        if definition.has_capability(Capability::Initializer) {
            bean.as_initializing()
                .ok_or_else(|| missing_capability(name, type_name, Capability::Initializer))?
                .after_properties_set()
                .map_err(|err| CoreError::initialization(name, err))?;
        }

        let disposable = if definition.has_capability(Capability::Disposable) {
            if bean.as_disposable().is_none() {
                return Err(missing_capability(name, type_name, Capability::Disposable));
            }
            Some(Arc::clone(&bean))
        } else {
            None
        };

        let bean = chain
            .apply_after_initialization(bean, name)
            .map_err(|err| CoreError::initialization(name, err))?;
        Ok((bean, disposable))
    }

    fn finish_construction(
        &self,
        name: &str,
        definition: &BeanDefinition,
        bean: BeanRef,
        disposable: Option<BeanRef>,
    ) -> BeanRef {
        self.with_state(|state| {
            state.leave_creation(name);
            if !definition.is_singleton() {
                return bean;
            }

            // a dependent already holds the early reference, so it stays authoritative
            let published = match state.cache.early_reference(name) {
                Some(early) => {
                    debug!(bean = name, "publishing early reference");
                    early
                }
                None => bean,
            };
            state.cache.put_finished(name, Arc::clone(&published));
            if let Some(disposable) = disposable {
                state.disposables.push((name.to_string(), disposable));
            }
            debug!(bean = name, "singleton created");
            published
        })
    }

    fn abort_construction(&self, name: &str, err: CoreError) -> CoreError {
        self.with_state(|state| {
            state.cache.evict(name);
            state.leave_creation(name);
        });
        error!(container = %self.id, bean = name, error = %err, "bean construction failed");
        err
    }

    /// Resolve a bean and view it through the interface it exposes
    pub fn get_bean_as<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, CoreError> {
        let bean = self.get_bean(name)?;
        view::<T>(&bean).ok_or_else(|| CoreError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
    }

    /// Resolve a bean as its concrete type
    pub fn get_bean_of<T: Component>(&self, name: &str) -> Result<Arc<T>, CoreError> {
        let bean = self.get_bean(name)?;
        AsAny::into_any_arc(bean)
            .downcast::<T>()
            .map_err(|_| CoreError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn is_singleton(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.registry.get(name)?.is_singleton())
    }

    pub fn is_prototype(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.registry.get(name)?.scope.is_prototype())
    }

    pub fn definition(&self, name: &str) -> Result<&BeanDefinition, CoreError> {
        self.registry.get(name)
    }

    /// Registered identifiers, in catalog order
    pub fn bean_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Number of finished singletons
    pub fn singleton_count(&self) -> usize {
        self.with_state(|state| state.cache.finished_count())
    }

    pub fn post_processor_count(&self) -> usize {
        self.with_state(|state| state.post_processors.len())
    }

    pub fn state(&self) -> ContainerState {
        self.with_state(|state| state.lifecycle)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn describe(&self) -> ContainerReport {
        let (singletons_created, post_processors) = self.with_state(|state| {
            (state.cache.finished_count(), state.post_processors.names())
        });
        ContainerReport {
            id: self.id,
            name: self.config.name.clone(),
            state: self.state(),
            aspect_auto_proxy: self.config.aspect_auto_proxy,
            allow_circular_references: self.config.allow_circular_references,
            singletons_created,
            post_processors,
            beans: self.registry.iter().map(|(_, d)| d.summary()).collect(),
        }
    }

    /// [`describe`](Self::describe) rendered as pretty-printed JSON
    pub fn describe_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.describe()).map_err(|err| {
            CoreError::system_error_with_source("failed to serialize container report", Box::new(err))
        })
    }

    /// Run destroy callbacks in reverse creation order and drop all singletons.
    ///
    /// Failing callbacks are logged and skipped. Closing twice is a no-op.
    ///
    /// Only the container's own handles are dropped. Singletons injected into
    /// each other in a cycle still hold one another through their slots, so
    /// they are not freed while the cycle stands.
    pub fn close(&self) -> Result<(), CoreError> {
        let _guard = self.state.lock();
        let already_closed = self.with_state(|state| {
            let closed = state.lifecycle == ContainerState::Closed;
            state.lifecycle = ContainerState::Closed;
            closed
        });
        if already_closed {
            return Ok(());
        }

        let destroyed = self.destroy_singletons();
        info!(container = %self.id, destroyed, "container closed");
        Ok(())
    }

    fn destroy_singletons(&self) -> usize {
        let disposables = self.with_state(|state| {
            state.cache.drain();
            std::mem::take(&mut state.disposables)
        });

        for (name, bean) in disposables.iter().rev() {
            if let Some(disposable) = bean.as_disposable() {
                match disposable.destroy() {
                    Ok(()) => debug!(bean = %name, "destroyed"),
                    Err(err) => warn!(bean = %name, error = %err, "destroy callback failed"),
                }
            }
        }
        disposables.len()
    }

    /// Run `f` against the resolution state.
    ///
    /// `f` must not call back into the container.
    fn with_state<R>(&self, f: impl FnOnce(&mut ResolutionState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

fn missing_capability(name: &str, type_name: &str, capability: Capability) -> CoreError {
    CoreError::construction(
        name,
        format!("{} declares {:?} but does not implement it", type_name, capability),
    )
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("beans", &self.registry.len())
            .field("singletons", &self.singleton_count())
            .field("state", &self.state())
            .finish()
    }
}
