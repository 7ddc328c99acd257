//! Pool of independently seeded cryptographic generators.
//!
//! Concurrent workers that each need fresh randomness check a generator out
//! round-robin instead of contending on a single one. A checked-out generator
//! stays locked until the guard is dropped, so no two callers ever draw from
//! the same generator at the same time.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

pub struct RngBank {
    rngs: Vec<Mutex<StdRng>>,
    cursor: AtomicUsize,
}

impl RngBank {
    /// Creates a bank of `size` generators (at least one), each seeded from
    /// the operating system.
    pub fn new(size: usize) -> RngBank {
        let rngs = (0..size.max(1))
            .map(|_| Mutex::new(StdRng::from_entropy()))
            .collect();
        RngBank {
            rngs,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.rngs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rngs.is_empty()
    }

    /// Checks out the next generator in round-robin order.
    pub fn next_rng(&self) -> MutexGuard<'_, StdRng> {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.rngs.len();
        trace!(slot, "checking out generator");
        // a panic while holding a generator cannot leave it in a weaker state
        self.rngs[slot].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RngBank {
    fn default() -> Self {
        RngBank::new(1)
    }
}
