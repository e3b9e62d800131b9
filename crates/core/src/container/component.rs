use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::aop::MethodInterceptor;
use crate::container::lifecycle::{BeanNameAware, DisposableBean, InitializingBean};
use crate::container::post_processor::BeanPostProcessor;
use crate::errors::CoreError;

/// Shared handle to a container-managed object
pub type BeanRef = Arc<dyn Component>;

/// Upcasting helpers, implemented for every sized `Send + Sync` type
pub trait AsAny: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An object the container can build, wire and hand out.
///
/// Every method has a default, so a plain component only implements the
/// parts it participates in:
///
/// - [`inject`](Component::inject) receives the beans named by the
///   component's dependency descriptors. Components hold their dependencies
///   in [`Slot`]s so injection works through a shared reference; an
///   early-exposed proxy keeps seeing the same instance while it is wired.
/// - the `as_*` queries surface lifecycle capabilities declared in the
///   component's catalog entry.
/// - [`proxy`](Component::proxy) builds the decorator used when advice is
///   bound to the bean.
/// - [`expose`](Component::expose) publishes the interface callers resolve
///   with `Container::get_bean_as`.
pub trait Component: AsAny {
    /// Store `bean` into the slot named `slot`
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        let _ = bean;
        Err(CoreError::UnknownInjectionSlot {
            bean_type: std::any::type_name::<Self>().to_string(),
            slot: slot.to_string(),
        })
    }

    fn as_name_aware(&self) -> Option<&dyn BeanNameAware> {
        None
    }

    fn as_initializing(&self) -> Option<&dyn InitializingBean> {
        None
    }

    fn as_disposable(&self) -> Option<&dyn DisposableBean> {
        None
    }

    fn as_post_processor(self: Arc<Self>) -> Option<Arc<dyn BeanPostProcessor>> {
        None
    }

    /// Wrap this component in a decorator that routes calls through `interceptor`
    fn proxy(self: Arc<Self>, interceptor: Arc<MethodInterceptor>) -> Option<BeanRef> {
        let _ = interceptor;
        None
    }

    /// Publish the handle callers see; the component itself unless overridden
    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self)
    }

    /// Type name used in diagnostics
    fn component_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.component_type())
            .finish()
    }
}

/// Type-erased `Arc<T>` a component publishes, usually `Arc<dyn SomeTrait>`
pub struct Exposed(Box<dyn Any + Send + Sync>);

impl Exposed {
    pub fn new<T: ?Sized + Send + Sync + 'static>(handle: Arc<T>) -> Self {
        Self(Box::new(handle))
    }

    /// Recover the published handle if it has type `Arc<T>`
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(self) -> Option<Arc<T>> {
        self.0.downcast::<Arc<T>>().ok().map(|handle| *handle)
    }
}

impl fmt::Debug for Exposed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Exposed").field(&"<handle>").finish()
    }
}

/// View a bean through the interface it exposes
pub fn view<T: ?Sized + Send + Sync + 'static>(bean: &BeanRef) -> Option<Arc<T>> {
    Arc::clone(bean).expose().downcast::<T>()
}

/// Borrow a bean as its concrete type
pub fn downcast_ref<T: Component>(bean: &BeanRef) -> Option<&T> {
    (**bean).as_any().downcast_ref::<T>()
}

/// Identity comparison of two bean handles
pub fn same_bean(a: &BeanRef, b: &BeanRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Injection point holding a dependency of interface type `T`
pub struct Slot<T: ?Sized> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// Fill the slot from a bean handle, viewing it through its exposed interface
    pub fn inject(&self, bean: BeanRef) -> Result<(), CoreError> {
        let bean_type = bean.component_type();
        let handle = view::<T>(&bean).ok_or_else(|| CoreError::TypeMismatch {
            name: bean_type.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })?;
        *self.value.write() = Some(handle);
        Ok(())
    }

    pub fn set(&self, handle: Arc<T>) {
        *self.value.write() = Some(handle);
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.value.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.value.read().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.value.read().is_some() {
            "set"
        } else {
            "unset"
        };
        f.debug_tuple("Slot").field(&state).finish()
    }
}
