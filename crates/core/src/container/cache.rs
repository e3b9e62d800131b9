//! Three-tier singleton cache.
//!
//! Tier 1 holds finished singletons. Tier 2 holds early references: objects
//! still under construction that a circular dependent has already observed.
//! Tier 3 holds factories that compute such an early reference on first
//! demand. For any identifier at most one tier is populated.

use std::collections::HashMap;
use std::fmt;

use crate::container::component::BeanRef;
use crate::errors::CoreError;

/// Deferred computation of the handle an early dependent observes
pub type EarlyReferenceFactory = Box<dyn FnOnce() -> Result<BeanRef, CoreError> + Send>;

/// Outcome of a cache lookup
#[derive(Debug)]
pub enum Lookup {
    /// Fully constructed singleton
    Finished(BeanRef),
    /// Early reference already handed to another dependent
    EarlyExposed(BeanRef),
    /// Early reference produced just now by the tier-3 factory
    FromFactory(BeanRef),
    Absent,
}

impl Lookup {
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }
}

#[derive(Default)]
pub struct SingletonCache {
    finished: HashMap<String, BeanRef>,
    early: HashMap<String, BeanRef>,
    factories: HashMap<String, EarlyReferenceFactory>,
    /// Creation order of finished singletons
    creation_order: Vec<String>,
}

impl SingletonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `name`, consulting tiers 2 and 3 only while it is in construction.
    ///
    /// A tier-3 hit invokes the factory once and promotes its result to tier 2.
    pub fn lookup(&mut self, name: &str, in_construction: bool) -> Result<Lookup, CoreError> {
        if let Some(bean) = self.finished.get(name) {
            return Ok(Lookup::Finished(bean.clone()));
        }
        if !in_construction {
            return Ok(Lookup::Absent);
        }
        if let Some(bean) = self.early.get(name) {
            return Ok(Lookup::EarlyExposed(bean.clone()));
        }
        match self.promote_factory_to_early(name)? {
            Some(bean) => Ok(Lookup::FromFactory(bean)),
            None => Ok(Lookup::Absent),
        }
    }

    /// Install the early-reference factory for a bean entering construction
    pub fn put_factory(&mut self, name: &str, factory: EarlyReferenceFactory) {
        if self.finished.contains_key(name) || self.early.contains_key(name) {
            return;
        }
        self.factories.insert(name.to_string(), factory);
    }

    /// Discard the factory without invoking it
    pub fn remove_factory(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Invoke the factory for `name`, store its result in tier 2 and drop the factory
    pub fn promote_factory_to_early(&mut self, name: &str) -> Result<Option<BeanRef>, CoreError> {
        let Some(factory) = self.factories.remove(name) else {
            return Ok(None);
        };
        let bean = factory()?;
        tracing::debug!(bean = name, "promoted early reference");
        self.early.insert(name.to_string(), bean.clone());
        Ok(Some(bean))
    }

    /// Early reference recorded for `name`, if any dependent forced one
    pub fn early_reference(&self, name: &str) -> Option<BeanRef> {
        self.early.get(name).cloned()
    }

    /// Store a finished singleton, clearing tiers 2 and 3
    pub fn put_finished(&mut self, name: &str, bean: BeanRef) {
        self.early.remove(name);
        self.factories.remove(name);
        if self.finished.insert(name.to_string(), bean).is_none() {
            self.creation_order.push(name.to_string());
        }
    }

    /// Drop every tier's entry for `name`
    pub fn evict(&mut self, name: &str) {
        self.early.remove(name);
        self.factories.remove(name);
        if self.finished.remove(name).is_some() {
            self.creation_order.retain(|n| n != name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.finished.contains_key(name)
            || self.early.contains_key(name)
            || self.factories.contains_key(name)
    }

    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    /// Identifiers of finished singletons, oldest first
    pub fn creation_order(&self) -> &[String] {
        &self.creation_order
    }

    /// Remove everything, returning finished singletons oldest first
    pub fn drain(&mut self) -> Vec<(String, BeanRef)> {
        self.early.clear();
        self.factories.clear();
        let order = std::mem::take(&mut self.creation_order);
        order
            .into_iter()
            .filter_map(|name| self.finished.remove(&name).map(|bean| (name, bean)))
            .collect()
    }
}

impl fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonCache")
            .field("finished", &self.finished.len())
            .field("early", &self.early.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}
