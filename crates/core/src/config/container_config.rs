use crate::config::{parse_flag, ConfigError, ConfigSource, ConfigValidator, NonEmptyValidator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Environment variable holding the container name
pub const ENV_CONTAINER_NAME: &str = "SPRIG_CONTAINER_NAME";
/// Environment variable switching aspect auto-proxying on or off
pub const ENV_ASPECT_AUTO_PROXY: &str = "SPRIG_ASPECT_AUTO_PROXY";
/// Environment variable switching early exposure of in-construction singletons
pub const ENV_ALLOW_CIRCULAR_REFERENCES: &str = "SPRIG_ALLOW_CIRCULAR_REFERENCES";

const FIELDS: [(&str, &str, &str); 3] = [
    ("name", ENV_CONTAINER_NAME, "application"),
    ("aspect_auto_proxy", ENV_ASPECT_AUTO_PROXY, "false"),
    (
        "allow_circular_references",
        ENV_ALLOW_CIRCULAR_REFERENCES,
        "true",
    ),
];

/// Configuration trait for container configuration
pub trait ConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Settings that shape how a container bootstraps its beans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name reported in log records
    pub name: String,
    /// Install the proxy weaver so advice bound to beans takes effect
    pub aspect_auto_proxy: bool,
    /// Resolve singleton cycles through early exposure instead of failing
    pub allow_circular_references: bool,
    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl ContainerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            name: "application".to_string(),
            aspect_auto_proxy: false,
            allow_circular_references: true,
            sources: HashMap::new(),
        }
    }

    /// Set the container name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.mark("name", ConfigSource::Programmatic);
        self
    }

    /// Enable or disable aspect auto-proxying
    pub fn with_aspect_auto_proxy(mut self, enabled: bool) -> Self {
        self.aspect_auto_proxy = enabled;
        self.mark("aspect_auto_proxy", ConfigSource::Programmatic);
        self
    }

    /// Allow or forbid circular references between singletons
    pub fn with_circular_references(mut self, allowed: bool) -> Self {
        self.allow_circular_references = allowed;
        self.mark("allow_circular_references", ConfigSource::Programmatic);
        self
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Self::parse_yaml(source, ConfigSource::Programmatic)
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Self::parse_json(source, ConfigSource::Programmatic)
    }

    /// Load configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let origin = ConfigSource::File(path.display().to_string());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&contents, origin),
            Some("json") => Self::parse_json(&contents, origin),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    fn parse_yaml(source: &str, origin: ConfigSource) -> Result<Self, ConfigError> {
        let keys: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(source)?;
        let mut config: Self = serde_yaml::from_str(source)?;
        config.mark_present(keys.into_keys(), origin);
        config.validate()?;
        Ok(config)
    }

    fn parse_json(source: &str, origin: ConfigSource) -> Result<Self, ConfigError> {
        let keys: HashMap<String, serde_json::Value> = serde_json::from_str(source)?;
        let mut config: Self = serde_json::from_str(source)?;
        config.mark_present(keys.into_keys(), origin);
        config.validate()?;
        Ok(config)
    }

    fn mark(&mut self, field: &str, source: ConfigSource) {
        self.sources.insert(field.to_string(), source);
    }

    fn mark_present(&mut self, keys: impl IntoIterator<Item = String>, source: ConfigSource) {
        for key in keys {
            if FIELDS.iter().any(|(field, _, _)| *field == key) {
                self.sources.insert(key, source.clone());
            }
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTrait for ContainerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(name) = env::var(ENV_CONTAINER_NAME) {
            config.name = name;
            config.mark("name", ConfigSource::EnvVar(ENV_CONTAINER_NAME.to_string()));
        }

        if let Ok(value) = env::var(ENV_ASPECT_AUTO_PROXY) {
            config.aspect_auto_proxy = parse_flag("aspect_auto_proxy", &value)?;
            config.mark(
                "aspect_auto_proxy",
                ConfigSource::EnvVar(ENV_ASPECT_AUTO_PROXY.to_string()),
            );
        }

        if let Ok(value) = env::var(ENV_ALLOW_CIRCULAR_REFERENCES) {
            config.allow_circular_references =
                parse_flag("allow_circular_references", &value)?;
            config.mark(
                "allow_circular_references",
                ConfigSource::EnvVar(ENV_ALLOW_CIRCULAR_REFERENCES.to_string()),
            );
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        NonEmptyValidator { field: "name" }.validate(self.name.as_str())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        FIELDS
            .iter()
            .map(|(field, _, default)| {
                let source = self
                    .sources
                    .get(*field)
                    .cloned()
                    .unwrap_or_else(|| ConfigSource::Default(default.to_string()));
                (field.to_string(), source)
            })
            .collect()
    }
}
