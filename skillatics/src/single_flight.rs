//! At-most-one outstanding request per owner, with generation-based staleness.
//!
//! A [`SingleFlight`] hands out one [`Flight`] at a time. Calling
//! [`SingleFlight::invalidate`] starts a new generation: flights from the
//! previous generation stop being current (their responses must be
//! discarded) and no longer block new flights.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SingleFlight {
    generation: AtomicU64,
    /// `generation + 1` of the flight holding the slot, 0 when free
    owner: AtomicU64,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            owner: AtomicU64::new(0),
        }
    }

    /// Claim the slot, or `None` while another current flight holds it
    pub fn try_begin(&self) -> Option<Flight<'_>> {
        let generation = self.generation.load(Ordering::Acquire);
        let token = generation + 1;
        self.owner
            .compare_exchange(0, token, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Flight {
            owner: self,
            generation,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.owner.load(Ordering::Acquire) != 0
    }

    /// Orphan the current flight (if any) and free the slot
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.owner.store(0, Ordering::Release);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// RAII claim on a [`SingleFlight`]; dropping it frees the slot
#[derive(Debug)]
pub struct Flight<'a> {
    owner: &'a SingleFlight,
    generation: u64,
}

impl Flight<'_> {
    /// False once the owner was invalidated after this flight began
    pub fn is_current(&self) -> bool {
        self.owner.generation() == self.generation
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        // Only release a slot this flight still owns
        let _ = self.owner.owner.compare_exchange(
            self.generation + 1,
            0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
