use std::collections::HashMap;

use crate::container::descriptor::BeanDefinition;
use crate::errors::CoreError;

/// Registry of bean definitions keyed by identifier
#[derive(Debug, Default)]
pub struct BeanDefinitionRegistry {
    definitions: HashMap<String, BeanDefinition>,
    /// Registration order, used for deterministic iteration
    order: Vec<String>,
}

impl BeanDefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its identifier
    pub fn register(&mut self, definition: BeanDefinition) -> Result<(), CoreError> {
        if self.definitions.contains_key(&definition.name) {
            return Err(CoreError::DuplicateDefinition {
                name: definition.name,
            });
        }

        self.order.push(definition.name.clone());
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Look up a definition
    pub fn get(&self, name: &str) -> Result<&BeanDefinition, CoreError> {
        self.definitions
            .get(name)
            .ok_or_else(|| CoreError::definition_not_found(name))
    }

    /// Check if an identifier is registered
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All definitions, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BeanDefinition)> + '_ {
        self.order
            .iter()
            .filter_map(move |name| self.definitions.get(name).map(|d| (name.as_str(), d)))
    }

    /// Singleton-scoped definitions, lazily, in registration order
    pub fn all_singletons(&self) -> impl Iterator<Item = (&str, &BeanDefinition)> + '_ {
        self.iter().filter(|(_, definition)| definition.is_singleton())
    }

    /// Registered identifiers, in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Get the number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
