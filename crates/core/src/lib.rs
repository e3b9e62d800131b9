//! A small inversion-of-control container.
//!
//! Components are declared in a [`ComponentCatalog`] and bootstrapped into a
//! [`Container`], which eagerly builds every singleton, resolves circular
//! singleton dependencies through a three-tier cache, runs lifecycle
//! callbacks and post-processor hooks, and replaces advised beans with
//! method-intercepting proxies.

pub mod aop;
pub mod config;
pub mod container;
pub mod errors;

pub use aop::{AdviceDescriptor, AdviceKind, JoinPoint, MethodInterceptor, Pointcut};
pub use config::{ConfigError, ConfigSource, ConfigTrait, ContainerConfig};
pub use container::{
    BeanDefinition, BeanNameAware, BeanPostProcessor, BeanRef, BeanScope, Capability, Component,
    ComponentCatalog, ComponentDefinition, Container, ContainerReport, ContainerState, Dependency,
    DisposableBean, Exposed, InitializingBean, Slot,
};
pub use errors::CoreError;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
