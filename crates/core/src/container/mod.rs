pub mod cache;
pub mod catalog;
pub mod component;
pub mod descriptor;
pub mod ioc_container;
pub mod lifecycle;
pub mod post_processor;
pub mod registry;
pub mod scope;

pub use cache::{EarlyReferenceFactory, Lookup, SingletonCache};
pub use catalog::{ComponentCatalog, ComponentDefinition};
pub use component::{downcast_ref, same_bean, view, AsAny, BeanRef, Component, Exposed, Slot};
pub use descriptor::{BeanDefinition, BeanSummary, Capability, Dependency, InstanceFactory, TypeDescriptor};
pub use ioc_container::{Container, ContainerReport};
pub use lifecycle::{BeanNameAware, ContainerState, DisposableBean, InitializingBean};
pub use post_processor::{BeanPostProcessor, PostProcessorChain};
pub use registry::BeanDefinitionRegistry;
pub use scope::BeanScope;
