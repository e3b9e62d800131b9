//! Components shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use sprig_core::aop::{JoinPoint, MethodInterceptor};
use sprig_core::{BeanRef, Component, CoreError, Exposed, Slot};

/// Append-only record of observable effects, shared as a bean
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Component for EventLog {}

pub trait UserApi: Send + Sync {
    fn method_with_orders(&self) -> Result<String, CoreError>;
    fn order_service(&self) -> Option<Arc<dyn OrderApi>>;
}

pub trait OrderApi: Send + Sync {
    fn place_order(&self, item: &str) -> String;
    fn user_service(&self) -> Option<Arc<dyn UserApi>>;
}

#[derive(Default)]
pub struct UserService {
    pub order_service: Slot<dyn OrderApi>,
    pub event_log: Slot<EventLog>,
}

impl UserApi for UserService {
    fn method_with_orders(&self) -> Result<String, CoreError> {
        if let Some(log) = self.event_log.get() {
            log.push("userService.methodWithOrders");
        }
        let orders = self
            .order_service
            .get()
            .ok_or_else(|| CoreError::system_error("orderService not injected"))?;
        Ok(orders.place_order("book"))
    }

    fn order_service(&self) -> Option<Arc<dyn OrderApi>> {
        self.order_service.get()
    }
}

impl Component for UserService {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "orderService" => self.order_service.inject(bean),
            "eventLog" => self.event_log.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }

    fn proxy(self: Arc<Self>, interceptor: Arc<MethodInterceptor>) -> Option<BeanRef> {
        Some(Arc::new(UserServiceProxy {
            target: self,
            interceptor,
        }))
    }

    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn UserApi>)
    }
}

/// Decorator routing `UserApi` calls through the bound advice
pub struct UserServiceProxy {
    pub target: Arc<UserService>,
    interceptor: Arc<MethodInterceptor>,
}

impl UserApi for UserServiceProxy {
    fn method_with_orders(&self) -> Result<String, CoreError> {
        self.interceptor
            .invoke_fallible("methodWithOrders", || self.target.method_with_orders())
    }

    fn order_service(&self) -> Option<Arc<dyn OrderApi>> {
        self.target.order_service()
    }
}

impl Component for UserServiceProxy {
    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn UserApi>)
    }
}

#[derive(Default)]
pub struct OrderService {
    pub user_service: Slot<dyn UserApi>,
}

impl OrderApi for OrderService {
    fn place_order(&self, item: &str) -> String {
        format!("order:{}", item)
    }

    fn user_service(&self) -> Option<Arc<dyn UserApi>> {
        self.user_service.get()
    }
}

impl Component for OrderService {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "userService" => self.user_service.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }

    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn OrderApi>)
    }
}

/// Aspect recording advice runs into the shared event log
#[derive(Default)]
pub struct LoggingAspect {
    pub event_log: Slot<EventLog>,
}

impl LoggingAspect {
    pub fn log_before(&self, join_point: &JoinPoint<'_>) -> Result<(), CoreError> {
        self.record("before", join_point);
        Ok(())
    }

    pub fn log_after(&self, join_point: &JoinPoint<'_>) -> Result<(), CoreError> {
        self.record("after", join_point);
        Ok(())
    }

    fn record(&self, phase: &str, join_point: &JoinPoint<'_>) {
        if let Some(log) = self.event_log.get() {
            log.push(format!("{}:{}.{}", phase, join_point.target, join_point.method));
        }
    }
}

impl Component for LoggingAspect {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "eventLog" => self.event_log.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }
}

/// Generic node for dependency-graph tests; every slot points at another node
#[derive(Default)]
pub struct Node {
    links: Mutex<Vec<(String, BeanRef)>>,
}

impl Node {
    pub fn link(&self, slot: &str) -> Option<BeanRef> {
        self.links
            .lock()
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, bean)| bean.clone())
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().len()
    }
}

impl Component for Node {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        self.links.lock().push((slot.to_string(), bean));
        Ok(())
    }
}

/// Identity check across trait-object views
pub fn same_target<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
