//! Algorithm registry.
//!
//! An immutable name → implementation lookup table, built once at startup
//! from the configured algorithm set and shared read-only (via `Arc`) with
//! every worker. No locking is required after construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use baler_core::ServiceError;

use crate::algorithms::{Algorithm, Gzip, Lz4, Zstd};

/// Immutable lookup table of registered compression algorithms.
#[derive(Debug)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<&'static str, Arc<dyn Algorithm>>,
}

impl AlgorithmRegistry {
    /// Registry containing every built-in algorithm (gzip, zstd, lz4).
    pub fn builtin() -> Self {
        let mut registry = Self {
            algorithms: BTreeMap::new(),
        };
        registry.register(Arc::new(Gzip));
        registry.register(Arc::new(Zstd));
        registry.register(Arc::new(Lz4));
        registry
    }

    /// Add (or replace) an implementation under its own name.
    ///
    /// Registration happens at startup, before the registry is wrapped in
    /// an `Arc` and shared; dispatch never needs to change to pick up a
    /// new algorithm.
    pub fn register(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.algorithms.insert(algorithm.name(), algorithm);
    }

    /// Registry restricted to the named subset of built-ins.
    ///
    /// Used by the `--algorithms` startup flag. A name that is not a
    /// built-in is a startup error, surfaced as `UnsupportedAlgorithm`.
    pub fn with_algorithms(names: &[String]) -> Result<Self, ServiceError> {
        let all = Self::builtin();
        let mut algorithms = BTreeMap::new();
        for name in names {
            let algo = all.get(name)?;
            algorithms.insert(algo.name(), Arc::clone(algo));
        }
        Ok(Self { algorithms })
    }

    /// Look up an algorithm by its registry key.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Algorithm>, ServiceError> {
        self.algorithms
            .get(name)
            .ok_or_else(|| ServiceError::UnsupportedAlgorithm(name.to_string()))
    }

    /// Registered algorithm names, in stable order.
    pub fn names(&self) -> Vec<&'static str> {
        self.algorithms.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }
}
