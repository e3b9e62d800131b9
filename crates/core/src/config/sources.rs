use std::fmt;

/// Provenance of one container setting, as reported by
/// [`ConfigTrait::config_sources`](super::ConfigTrait::config_sources)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the named `SPRIG_*` variable
    EnvVar(String),
    /// Not set anywhere; carries the built-in value
    Default(String),
    /// Present in the YAML or JSON file at this path
    File(String),
    /// Set through a builder method or an in-memory document
    Programmatic,
}

impl ConfigSource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "env {}", var),
            ConfigSource::Default(value) => write!(f, "default ({})", value),
            ConfigSource::File(path) => write!(f, "file {}", path),
            ConfigSource::Programmatic => f.write_str("set in code"),
        }
    }
}
