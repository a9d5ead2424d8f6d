//! Memoized models keyed by what they were built for.
//!
//! Nothing here tracks the data a model was built from. Callers invalidate
//! entries when that data changes.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use log::debug;

/// Identifies a cached model: the data it covers (`"info"`, `"kerning"` or a
/// glyph name) and whether glyph components were decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identifier: String,
    pub decompose: bool,
}

impl CacheKey {
    pub fn new(identifier: impl Into<String>, decompose: bool) -> Self {
        Self { identifier: identifier.into(), decompose }
    }
}

/// Single-threaded model cache.
#[derive(Debug)]
pub struct MutatorCache<M> {
    models: HashMap<CacheKey, Arc<M>>,
}

impl<M> Default for MutatorCache<M> {
    fn default() -> Self {
        Self { models: HashMap::new() }
    }
}

impl<M> MutatorCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached model for `key`, building and storing it first if
    /// needed. A failed build stores nothing.
    pub fn get_or_build<E>(&mut self, key: CacheKey, build: impl FnOnce() -> Result<M, E>) -> Result<Arc<M>, E> {
        if let Some(model) = self.models.get(&key) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(build()?);
        debug!("cached model for {key:?}");
        self.models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<M>> {
        self.models.get(key).cloned()
    }

    /// Drops the model for `key`; returns whether one was cached.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.models.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

type Slot<M> = Arc<Mutex<Option<Arc<M>>>>;

/// Model cache shared between threads.
///
/// Each key has its own slot lock: builds for one key run one at a time and
/// the first successful build is reused, while different keys build in
/// parallel.
#[derive(Debug)]
pub struct SharedMutatorCache<M> {
    slots: Mutex<HashMap<CacheKey, Slot<M>>>,
}

impl<M> Default for SharedMutatorCache<M> {
    fn default() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }
}

impl<M> SharedMutatorCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &CacheKey) -> Slot<M> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    pub fn get_or_build<E>(&self, key: CacheKey, build: impl FnOnce() -> Result<M, E>) -> Result<Arc<M>, E> {
        let slot = self.slot(&key);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = guard.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(build()?);
        debug!("cached model for {key:?}");
        *guard = Some(Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<M>> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.get(key)?)
        };
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Drops the model for `key`; returns whether one was cached.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.slots.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        removed.is_some_and(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
    }

    pub fn clear(&self) {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of keys holding a built model.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
