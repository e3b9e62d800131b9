use std::fmt;
use std::sync::Arc;

use crate::container::component::BeanRef;
use crate::errors::CoreError;

/// Hook invoked around bean initialization.
///
/// Each hook receives the current bean handle and returns the handle later
/// stages continue with, which may be a different object.
pub trait BeanPostProcessor: Send + Sync {
    /// Runs after injection and name-awareness, before the initializer
    fn before_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        let _ = name;
        Ok(bean)
    }

    /// Runs after the initializer
    fn after_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        let _ = name;
        Ok(bean)
    }

    /// Produces the handle a circular dependent sees before the bean is finished
    fn early_reference(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        let _ = name;
        Ok(bean)
    }

    fn processor_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Ordered list of post-processors
#[derive(Clone, Default)]
pub struct PostProcessorChain {
    processors: Vec<Arc<dyn BeanPostProcessor>>,
}

impl PostProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processor; processors run in registration order
    pub fn push(&mut self, processor: Arc<dyn BeanPostProcessor>) {
        tracing::debug!(processor = processor.processor_name(), "registered post-processor");
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.processors
            .iter()
            .map(|p| p.processor_name().to_string())
            .collect()
    }

    pub fn apply_before_initialization(
        &self,
        mut bean: BeanRef,
        name: &str,
    ) -> Result<BeanRef, CoreError> {
        for processor in &self.processors {
            bean = processor.before_initialization(bean, name)?;
        }
        Ok(bean)
    }

    pub fn apply_after_initialization(
        &self,
        mut bean: BeanRef,
        name: &str,
    ) -> Result<BeanRef, CoreError> {
        for processor in &self.processors {
            bean = processor.after_initialization(bean, name)?;
        }
        Ok(bean)
    }

    pub fn early_reference(&self, mut bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        for processor in &self.processors {
            bean = processor.early_reference(bean, name)?;
        }
        Ok(bean)
    }
}

impl fmt::Debug for PostProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.processors.iter().map(|p| p.processor_name()))
            .finish()
    }
}
