//! Strategy registry
//!
//! Provides [`StrategyRegistry`] for resolving similarity strategies by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SimilarityError;
use crate::strategies::{TfIdfCosine, WeightedJaccard};
use crate::strategy::SimilarityStrategy;

/// Registry of similarity strategies keyed by name
#[derive(Debug, Default, Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Arc<dyn SimilarityStrategy>>,
}

impl StrategyRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Create registry with built-in strategies
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WeightedJaccard::new()));
        registry.register(Arc::new(TfIdfCosine::new()));
        registry
    }

    /// Register a strategy under its own name, replacing any previous one
    pub fn register(&mut self, strategy: Arc<dyn SimilarityStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    /// Resolve a strategy
    ///
    /// # Errors
    /// Returns [`SimilarityError::UnknownStrategy`] listing the registered names
    pub fn get(&self, name: &str) -> Result<Arc<dyn SimilarityStrategy>, SimilarityError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| SimilarityError::UnknownStrategy {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Check if strategy exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names, sorted
    #[inline]
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }

    /// Get number of registered strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
