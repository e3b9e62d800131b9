use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::container::component::{AsAny, Component};
use crate::errors::CoreError;

/// When an advice runs relative to the advised method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceKind {
    Before,
    After,
}

/// Parsed `"<bean>.<method>"` expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointcut {
    target: String,
    method: String,
}

impl Pointcut {
    /// Split on the first `.`; both halves must be non-empty and contain no
    /// whitespace
    pub fn parse(expression: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidPointcut {
            pointcut: expression.to_string(),
        };
        let (target, method) = expression.split_once('.').ok_or_else(invalid)?;
        if target.is_empty() || method.is_empty() || expression.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self {
            target: target.to_string(),
            method: method.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.method)
    }
}

/// The intercepted call an advice is running for
#[derive(Debug, Clone, Copy)]
pub struct JoinPoint<'a> {
    pub target: &'a str,
    pub method: &'a str,
}

type AdviceFn =
    Arc<dyn Fn(&(dyn Component + 'static), &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync>;

/// One advice method of an aspect component, bound to a pointcut
#[derive(Clone)]
pub struct AdviceDescriptor {
    pub pointcut: Pointcut,
    pub kind: AdviceKind,
    /// Bean identifier of the aspect owning this advice
    pub aspect: String,
    /// Name of the advice method, for diagnostics
    pub advice_method: String,
    aspect_type: &'static str,
    handle: AdviceFn,
}

impl AdviceDescriptor {
    /// Advice run before the matched method
    pub fn before<A, F>(
        aspect: impl Into<String>,
        pointcut: &str,
        advice_method: impl Into<String>,
        advice: F,
    ) -> Result<Self, CoreError>
    where
        A: Component,
        F: Fn(&A, &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        Self::new::<A, F>(AdviceKind::Before, aspect, pointcut, advice_method, advice)
    }

    /// Advice run after the matched method returns
    pub fn after<A, F>(
        aspect: impl Into<String>,
        pointcut: &str,
        advice_method: impl Into<String>,
        advice: F,
    ) -> Result<Self, CoreError>
    where
        A: Component,
        F: Fn(&A, &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        Self::new::<A, F>(AdviceKind::After, aspect, pointcut, advice_method, advice)
    }

    fn new<A, F>(
        kind: AdviceKind,
        aspect: impl Into<String>,
        pointcut: &str,
        advice_method: impl Into<String>,
        advice: F,
    ) -> Result<Self, CoreError>
    where
        A: Component,
        F: Fn(&A, &JoinPoint<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let aspect = aspect.into();
        let pointcut = Pointcut::parse(pointcut)?;
        let owner = aspect.clone();
        let handle: AdviceFn = Arc::new(move |bean: &(dyn Component + 'static), join_point: &JoinPoint<'_>| {
            let instance = AsAny::as_any(bean).downcast_ref::<A>().ok_or_else(|| {
                CoreError::AdviceTypeMismatch {
                    aspect: owner.clone(),
                    expected: std::any::type_name::<A>().to_string(),
                }
            })?;
            advice(instance, join_point)
        });

        Ok(Self {
            pointcut,
            kind,
            aspect,
            advice_method: advice_method.into(),
            aspect_type: std::any::type_name::<A>(),
            handle,
        })
    }

    /// Run the advice against the resolved aspect bean
    pub fn invoke(
        &self,
        aspect: &(dyn Component + 'static),
        join_point: &JoinPoint<'_>,
    ) -> Result<(), CoreError> {
        (self.handle)(aspect, join_point)
    }

    pub fn aspect_type(&self) -> &'static str {
        self.aspect_type
    }
}

impl fmt::Debug for AdviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceDescriptor")
            .field("pointcut", &self.pointcut.to_string())
            .field("kind", &self.kind)
            .field("aspect", &self.aspect)
            .field("advice_method", &self.advice_method)
            .finish()
    }
}

/// Advice grouped by pointcut, in discovery order
#[derive(Debug, Default, Clone)]
pub struct AdviceIndex {
    before: HashMap<String, Vec<Arc<AdviceDescriptor>>>,
    after: HashMap<String, Vec<Arc<AdviceDescriptor>>>,
    targets: HashSet<String>,
    aspects: Vec<String>,
}

impl AdviceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advice under its pointcut
    pub fn add(&mut self, descriptor: AdviceDescriptor) {
        let key = descriptor.pointcut.to_string();
        self.targets.insert(descriptor.pointcut.target().to_string());
        if !self.aspects.contains(&descriptor.aspect) {
            self.aspects.push(descriptor.aspect.clone());
        }
        let bucket = match descriptor.kind {
            AdviceKind::Before => &mut self.before,
            AdviceKind::After => &mut self.after,
        };
        bucket.entry(key).or_default().push(Arc::new(descriptor));
    }

    /// Whether any pointcut names `target` as its bean
    pub fn has_advice_for(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    pub fn before(&self, pointcut: &str) -> &[Arc<AdviceDescriptor>] {
        self.before.get(pointcut).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn after(&self, pointcut: &str) -> &[Arc<AdviceDescriptor>] {
        self.after.get(pointcut).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every advice whose pointcut targets `target`, keyed by method
    pub fn advice_for_target(
        &self,
        target: &str,
        kind: AdviceKind,
    ) -> HashMap<String, Vec<Arc<AdviceDescriptor>>> {
        let bucket = match kind {
            AdviceKind::Before => &self.before,
            AdviceKind::After => &self.after,
        };
        bucket
            .values()
            .filter_map(|descriptors| {
                let first = descriptors.first()?;
                (first.pointcut.target() == target)
                    .then(|| (first.pointcut.method().to_string(), descriptors.clone()))
            })
            .collect()
    }

    /// Aspect bean identifiers, in discovery order
    pub fn aspect_names(&self) -> &[String] {
        &self.aspects
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
