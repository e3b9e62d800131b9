use serde::Serialize;

use crate::errors::CoreError;

/// Callback receiving the identifier a bean was registered under
pub trait BeanNameAware: Send + Sync {
    fn set_bean_name(&self, name: &str);
}

/// Callback run once dependencies are injected and pre-initialization hooks have run
pub trait InitializingBean: Send + Sync {
    fn after_properties_set(&self) -> Result<(), CoreError>;
}

/// Callback run when the container closes
pub trait DisposableBean: Send + Sync {
    fn destroy(&self) -> Result<(), CoreError>;
}

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Post-processors, aspects and eager singletons being created
    Bootstrapping,
    /// All singletons created and ready for use
    Running,
    /// Disposal callbacks have run and caches are cleared
    Closed,
}

impl ContainerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Bootstrapping => "bootstrapping",
            ContainerState::Running => "running",
            ContainerState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
