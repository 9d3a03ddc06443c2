//! Shared bus arbitration
//!
//! Several PT6964 chips can hang off one clock/data pair, each with its own
//! chip-select line. The wires are a single physical resource, so only one
//! bit-banging sequence may be in flight at a time no matter how many
//! drivers exist. [`BusArbiter`] provides that lock and a registry that
//! refuses a second driver for the same chip select.
//!
//! ```ignore
//! let arbiter = Arc::new(BusArbiter::new());
//! let claim = arbiter.claim(ChipSelectId(25))?;
//! let display = Pt6964::new(bus, claim, DriverConfig::default())?;
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies a chip-select line (e.g. its GPIO number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChipSelectId(pub u8);

impl core::fmt::Display for ChipSelectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CS{}", self.0)
    }
}

/// Chip-select registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    /// Another live driver already owns this chip select
    AlreadyClaimed(ChipSelectId),
}

impl core::fmt::Display for ClaimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClaimError::AlreadyClaimed(cs) => write!(f, "{cs} is already claimed"),
        }
    }
}

impl std::error::Error for ClaimError {}

/// Bus lock and chip-select registry shared by every driver on one bus
#[derive(Debug, Default)]
pub struct BusArbiter {
    /// Held for the duration of every bus transaction
    bus: Mutex<()>,
    /// Chip selects owned by live drivers
    claimed: Mutex<BTreeSet<ChipSelectId>>,
}

impl BusArbiter {
    /// Create an arbiter with no claimed chip selects
    pub fn new() -> Self {
        Self::default()
    }

    /// Register exclusive use of a chip-select line
    ///
    /// The claim is released when the returned [`ChipSelectClaim`] (or the
    /// driver holding it) is dropped.
    pub fn claim(self: &Arc<Self>, cs: ChipSelectId) -> Result<ChipSelectClaim, ClaimError> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if !claimed.insert(cs) {
            log::warn!("refusing second claim on {cs}");
            return Err(ClaimError::AlreadyClaimed(cs));
        }
        log::debug!("{cs} claimed");
        Ok(ChipSelectClaim {
            arbiter: Arc::clone(self),
            cs,
        })
    }

    /// Check whether a chip select is currently owned
    pub fn is_claimed(&self, cs: ChipSelectId) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&cs)
    }

    /// Acquire the bus for one transaction
    pub(crate) fn lock_bus(&self) -> MutexGuard<'_, ()> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, cs: ChipSelectId) {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&cs);
        log::debug!("{cs} released");
    }
}

/// Exclusive registration of one chip select on a [`BusArbiter`]
#[derive(Debug)]
pub struct ChipSelectClaim {
    arbiter: Arc<BusArbiter>,
    cs: ChipSelectId,
}

impl ChipSelectClaim {
    /// The claimed chip select
    pub fn chip_select(&self) -> ChipSelectId {
        self.cs
    }

    /// The arbiter this claim belongs to
    pub fn arbiter(&self) -> &Arc<BusArbiter> {
        &self.arbiter
    }
}

impl Drop for ChipSelectClaim {
    fn drop(&mut self) {
        self.arbiter.release(self.cs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_second_claim_rejected() {
        let arbiter = Arc::new(BusArbiter::new());
        let first = arbiter.claim(ChipSelectId(25)).unwrap();
        assert_eq!(first.chip_select(), ChipSelectId(25));

        assert_eq!(
            arbiter.claim(ChipSelectId(25)).unwrap_err(),
            ClaimError::AlreadyClaimed(ChipSelectId(25))
        );
        assert!(arbiter.claim(ChipSelectId(26)).is_ok());
    }

    #[test]
    fn test_drop_releases_claim() {
        let arbiter = Arc::new(BusArbiter::new());
        let claim = arbiter.claim(ChipSelectId(3)).unwrap();
        assert!(arbiter.is_claimed(ChipSelectId(3)));

        drop(claim);
        assert!(!arbiter.is_claimed(ChipSelectId(3)));
        assert!(arbiter.claim(ChipSelectId(3)).is_ok());
    }

    #[test]
    fn test_independent_arbiters_do_not_share_claims() {
        let a = Arc::new(BusArbiter::new());
        let b = Arc::new(BusArbiter::new());
        let _claim = a.claim(ChipSelectId(1)).unwrap();
        assert!(b.claim(ChipSelectId(1)).is_ok());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let arbiter = Arc::new(BusArbiter::new());
        let winners: Vec<_> = (0..8)
            .map(|_| {
                let arbiter = Arc::clone(&arbiter);
                thread::spawn(move || arbiter.claim(ChipSelectId(7)).ok())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        // Claims stay alive in `winners`, so exactly one thread got through
        assert_eq!(winners.iter().filter(|c| c.is_some()).count(), 1);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(ChipSelectId(25).to_string(), "CS25");
        assert_eq!(
            ClaimError::AlreadyClaimed(ChipSelectId(4)).to_string(),
            "CS4 is already claimed"
        );
    }
}
