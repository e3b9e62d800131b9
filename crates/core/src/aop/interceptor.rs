use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::aop::advice::{AdviceDescriptor, JoinPoint};
use crate::container::component::BeanRef;
use crate::errors::CoreError;

/// Cell holding an aspect bean; filled by the container once the aspect
/// exists, which may be after proxies referring to it were created
pub type AspectHandle = Arc<OnceLock<BeanRef>>;

/// An advice paired with the aspect bean it runs on
#[derive(Clone)]
pub struct BoundAdvice {
    pub descriptor: Arc<AdviceDescriptor>,
    pub aspect: AspectHandle,
}

impl BoundAdvice {
    /// Bind to an aspect bean that already exists
    pub fn new(descriptor: Arc<AdviceDescriptor>, aspect: BeanRef) -> Self {
        Self {
            descriptor,
            aspect: Arc::new(OnceLock::from(aspect)),
        }
    }

    fn run(&self, join_point: &JoinPoint<'_>) -> Result<(), CoreError> {
        let aspect = self.aspect.get().ok_or_else(|| CoreError::AspectNotReady {
            aspect: self.descriptor.aspect.clone(),
        })?;
        tracing::trace!(
            aspect = %self.descriptor.aspect,
            advice = %self.descriptor.advice_method,
            bean = join_point.target,
            method = join_point.method,
            "running advice"
        );
        self.descriptor.invoke(&**aspect, join_point)
    }
}

/// Per-target advice chains consulted by a proxy on every method call.
///
/// Proxy types hold an `Arc<MethodInterceptor>` next to the wrapped target
/// and route each interface method through [`invoke`](Self::invoke) or
/// [`invoke_fallible`](Self::invoke_fallible).
pub struct MethodInterceptor {
    target: String,
    before: HashMap<String, Vec<BoundAdvice>>,
    after: HashMap<String, Vec<BoundAdvice>>,
}

impl MethodInterceptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            before: HashMap::new(),
            after: HashMap::new(),
        }
    }

    pub fn add_before(&mut self, method: impl Into<String>, advice: BoundAdvice) {
        self.before.entry(method.into()).or_default().push(advice);
    }

    pub fn add_after(&mut self, method: impl Into<String>, advice: BoundAdvice) {
        self.after.entry(method.into()).or_default().push(advice);
    }

    /// Bean identifier of the advised target
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_advised(&self, method: &str) -> bool {
        self.before.contains_key(method) || self.after.contains_key(method)
    }

    /// Methods carrying at least one advice, sorted
    pub fn advised_methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self
            .before
            .keys()
            .chain(self.after.keys())
            .map(String::as_str)
            .collect();
        methods.sort_unstable();
        methods.dedup();
        methods
    }

    /// Run before-advice, the call, then after-advice.
    ///
    /// A failing before-advice aborts the call.
    pub fn invoke<R>(&self, method: &str, call: impl FnOnce() -> R) -> Result<R, CoreError> {
        self.invoke_fallible(method, || Ok(call()))
    }

    /// Like [`invoke`](Self::invoke) for methods that return a `Result`;
    /// after-advice is skipped when the call fails.
    pub fn invoke_fallible<R>(
        &self,
        method: &str,
        call: impl FnOnce() -> Result<R, CoreError>,
    ) -> Result<R, CoreError> {
        let join_point = JoinPoint {
            target: &self.target,
            method,
        };

        for advice in self.before.get(method).into_iter().flatten() {
            advice.run(&join_point)?;
        }
        let value = call()?;
        for advice in self.after.get(method).into_iter().flatten() {
            advice.run(&join_point)?;
        }
        Ok(value)
    }
}

impl fmt::Debug for MethodInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInterceptor")
            .field("target", &self.target)
            .field("methods", &self.advised_methods())
            .finish()
    }
}
