//! Injectable random source shared by the identity rotator and the backoff
//! scheduler. Production code seeds from the OS; tests seed explicitly so
//! identity and delay sequences are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Random number generator shared between pipeline components
#[derive(Debug, Clone)]
pub struct SharedRng(Arc<Mutex<StdRng>>);

impl SharedRng {
    /// Creates a generator seeded from operating system entropy
    pub fn from_entropy() -> Self {
        Self(Arc::new(Mutex::new(StdRng::from_os_rng())))
    }

    /// Creates a deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    /// Locks the generator for one draw
    ///
    /// A poisoned lock still holds a usable generator, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
