use thiserror::Error;

use crate::config::ConfigError;

/// Boxed error carried as the cause of construction and initialization failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for the sprig container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No bean definition named '{name}'")]
    DefinitionNotFound { name: String },

    #[error("Bean definition '{name}' is already registered")]
    DuplicateDefinition { name: String },

    #[error("Bean '{bean}' requires '{target}' for slot '{slot}', but no such bean is defined")]
    RequiredDependencyMissing {
        bean: String,
        slot: String,
        target: String,
    },

    #[error("Failed to construct bean '{bean}': {source}")]
    ConstructionFailure { bean: String, source: BoxError },

    #[error("Failed to initialize bean '{bean}': {source}")]
    InitializationFailure { bean: String, source: BoxError },

    #[error("Circular dependency detected: {path} (cycle at: {cycle_bean})")]
    CircularDependency { path: String, cycle_bean: String },

    #[error("Component {bean_type} has no injection slot named '{slot}'")]
    UnknownInjectionSlot { bean_type: String, slot: String },

    #[error("Bean '{bean}' has advice bound to it but its type cannot be proxied")]
    ProxyUnsupported { bean: String },

    #[error("Invalid pointcut '{pointcut}': expected '<bean>.<method>'")]
    InvalidPointcut { pointcut: String },

    #[error("Advice of aspect '{aspect}' ran before the aspect bean was created")]
    AspectNotReady { aspect: String },

    #[error("Aspect bean '{aspect}' is not of the advice owner type {expected}")]
    AdviceTypeMismatch { aspect: String, expected: String },

    #[error("Bean '{name}' cannot be viewed as {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("Container '{name}' is closed")]
    ContainerClosed { name: String },

    #[error("Invalid bean scope: {scope}")]
    InvalidBeanScope { scope: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("System error: {message}")]
    SystemError {
        message: String,
        source: Option<BoxError>,
    },
}

impl CoreError {
    /// Create a definition-not-found error
    pub fn definition_not_found(name: impl Into<String>) -> Self {
        Self::DefinitionNotFound { name: name.into() }
    }

    /// Wrap a failure raised while instantiating a bean
    pub fn construction(bean: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ConstructionFailure {
            bean: bean.into(),
            source: source.into(),
        }
    }

    /// Wrap a failure raised by an initializer or a post-processor hook
    pub fn initialization(bean: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InitializationFailure {
            bean: bean.into(),
            source: source.into(),
        }
    }

    /// Create a new system error
    pub fn system_error(message: impl Into<String>) -> Self {
        Self::SystemError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new system error with source
    pub fn system_error_with_source(message: impl Into<String>, source: BoxError) -> Self {
        Self::SystemError {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Check if the error reports an unknown bean identifier
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DefinitionNotFound { .. })
    }

    /// Check if the error reports a missing required dependency
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::RequiredDependencyMissing { .. })
    }

    /// Check if the error reports a dependency cycle
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// Name of the bean the error is attributed to, when there is one
    pub fn bean_name(&self) -> Option<&str> {
        match self {
            Self::DefinitionNotFound { name }
            | Self::DuplicateDefinition { name }
            | Self::TypeMismatch { name, .. } => Some(name),
            Self::RequiredDependencyMissing { bean, .. }
            | Self::ConstructionFailure { bean, .. }
            | Self::InitializationFailure { bean, .. }
            | Self::ProxyUnsupported { bean } => Some(bean),
            Self::CircularDependency { cycle_bean, .. } => Some(cycle_bean),
            _ => None,
        }
    }
}
