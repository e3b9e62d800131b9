use serde::{Deserialize, Serialize};

/// Bean lifecycle scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanScope {
    /// Single instance shared across the container
    #[default]
    Singleton,
    /// New instance created for each request
    Prototype,
}

impl BeanScope {
    /// Check if the scope is singleton
    pub fn is_singleton(&self) -> bool {
        matches!(self, BeanScope::Singleton)
    }

    /// Check if the scope is prototype
    pub fn is_prototype(&self) -> bool {
        matches!(self, BeanScope::Prototype)
    }

    /// Get the scope name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            BeanScope::Singleton => "singleton",
            BeanScope::Prototype => "prototype",
        }
    }
}

impl std::fmt::Display for BeanScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BeanScope {
    type Err = crate::errors::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(BeanScope::Singleton),
            "prototype" => Ok(BeanScope::Prototype),
            _ => Err(crate::errors::CoreError::InvalidBeanScope {
                scope: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_scope_from_str() {
        assert_eq!("singleton".parse::<BeanScope>().unwrap(), BeanScope::Singleton);
        assert_eq!("Prototype".parse::<BeanScope>().unwrap(), BeanScope::Prototype);

        assert!("transient".parse::<BeanScope>().is_err());
    }

    #[test]
    fn test_bean_scope_display() {
        assert_eq!(format!("{}", BeanScope::Singleton), "singleton");
        assert_eq!(format!("{}", BeanScope::Prototype), "prototype");
        assert_eq!(BeanScope::default(), BeanScope::Singleton);
    }
}
