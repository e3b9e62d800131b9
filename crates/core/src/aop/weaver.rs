use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::aop::advice::{AdviceIndex, AdviceKind};
use crate::aop::interceptor::{AspectHandle, BoundAdvice, MethodInterceptor};
use crate::container::component::BeanRef;
use crate::container::post_processor::BeanPostProcessor;
use crate::errors::CoreError;

/// Post-processor that replaces advised beans with proxies.
///
/// A bean is advised when some pointcut names it as its target. Proxies are
/// created after initialization, or earlier when a circular dependent forces
/// an early reference; in that case the early proxy is the one the bean ends
/// up published as and the after-initialization hook leaves it alone.
///
/// The weaver is installed before any aspect bean exists. Proxies refer to
/// their aspects through handles that [`bind_aspect`](Self::bind_aspect)
/// fills once the container has created each aspect.
pub struct AspectAutoProxyCreator {
    index: Arc<AdviceIndex>,
    aspects: HashMap<String, AspectHandle>,
    early_proxy_references: Mutex<HashSet<String>>,
}

impl AspectAutoProxyCreator {
    pub fn new(index: Arc<AdviceIndex>) -> Self {
        let aspects = index
            .aspect_names()
            .iter()
            .map(|name| (name.clone(), Arc::new(OnceLock::new())))
            .collect();
        Self {
            index,
            aspects,
            early_proxy_references: Mutex::new(HashSet::new()),
        }
    }

    /// Attach the created aspect bean to every proxy that runs its advice
    pub fn bind_aspect(&self, name: &str, bean: BeanRef) -> Result<(), CoreError> {
        let handle = self
            .aspects
            .get(name)
            .ok_or_else(|| CoreError::definition_not_found(name))?;
        if handle.set(bean).is_err() {
            tracing::debug!(aspect = name, "aspect already bound");
        }
        Ok(())
    }

    /// Build the interceptor carrying every advice that targets `name`
    fn interceptor_for(&self, name: &str) -> Result<MethodInterceptor, CoreError> {
        let mut interceptor = MethodInterceptor::new(name);
        for kind in [AdviceKind::Before, AdviceKind::After] {
            for (method, descriptors) in self.index.advice_for_target(name, kind) {
                for descriptor in descriptors {
                    let aspect = self
                        .aspects
                        .get(&descriptor.aspect)
                        .cloned()
                        .ok_or_else(|| CoreError::definition_not_found(&descriptor.aspect))?;
                    let bound = BoundAdvice { descriptor, aspect };
                    match kind {
                        AdviceKind::Before => interceptor.add_before(method.clone(), bound),
                        AdviceKind::After => interceptor.add_after(method.clone(), bound),
                    }
                }
            }
        }
        Ok(interceptor)
    }

    fn wrap_if_necessary(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        if !self.index.has_advice_for(name) {
            return Ok(bean);
        }

        let interceptor = Arc::new(self.interceptor_for(name)?);
        let methods = interceptor.advised_methods().join(",");
        match bean.proxy(interceptor) {
            Some(proxy) => {
                tracing::debug!(bean = name, methods = %methods, "created proxy");
                Ok(proxy)
            }
            None => Err(CoreError::ProxyUnsupported {
                bean: name.to_string(),
            }),
        }
    }

    pub fn aspect_count(&self) -> usize {
        self.aspects.len()
    }

    /// Names of aspects whose bean has been bound
    pub fn bound_aspects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .aspects
            .iter()
            .filter(|(_, handle)| handle.get().is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl BeanPostProcessor for AspectAutoProxyCreator {
    fn after_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        if self.early_proxy_references.lock().remove(name) {
            // the early reference already carries the proxy
            return Ok(bean);
        }
        self.wrap_if_necessary(bean, name)
    }

    fn early_reference(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        self.early_proxy_references.lock().insert(name.to_string());
        self.wrap_if_necessary(bean, name)
    }

    fn processor_name(&self) -> &str {
        "aspect-auto-proxy"
    }
}

impl std::fmt::Debug for AspectAutoProxyCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspectAutoProxyCreator")
            .field("aspects", &self.aspects.keys().collect::<Vec<_>>())
            .field("bound", &self.bound_aspects())
            .finish()
    }
}
