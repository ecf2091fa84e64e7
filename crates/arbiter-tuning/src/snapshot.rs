//! Shared threshold snapshot
//!
//! Readers clone an `Arc` of the current set and keep using it for the
//! rest of their request; the tuner swaps the whole `Arc` atomically, so
//! no reader ever observes a half-updated set.

use std::sync::{Arc, PoisonError, RwLock};

use arbiter_core::ThresholdSet;

/// Atomically swappable threshold set
#[derive(Debug)]
pub struct ThresholdSnapshot {
    inner: RwLock<Arc<ThresholdSet>>,
}

impl ThresholdSnapshot {
    pub fn new(set: ThresholdSet) -> Self {
        Self {
            inner: RwLock::new(Arc::new(set)),
        }
    }

    /// Current set; the returned `Arc` stays valid across swaps
    pub fn load(&self) -> Arc<ThresholdSet> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the current set
    pub fn store(&self, set: ThresholdSet) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_survives_a_swap() {
        let snapshot = ThresholdSnapshot::new(ThresholdSet::default());
        let before = snapshot.load();

        let updated = ThresholdSet {
            complexity_simple: 0.35,
            ..ThresholdSet::default()
        };
        snapshot.store(updated);

        assert!((before.complexity_simple - 0.3).abs() < f64::EPSILON);
        assert!((snapshot.load().complexity_simple - 0.35).abs() < f64::EPSILON);
    }
}
