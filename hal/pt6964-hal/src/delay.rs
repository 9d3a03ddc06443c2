//! Host delay provider
//!
//! The PT6964 needs ~500 ns clock phases, far below what an OS sleep can
//! resolve. Short waits spin on a monotonic clock; anything of a
//! microsecond or more yields to the scheduler.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

/// Waits at or above this length are slept instead of spun
pub const SLEEP_THRESHOLD_NS: u32 = 1_000;

/// Hybrid spin/sleep delay
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl StdDelay {
    /// Create a new delay provider
    pub fn new() -> Self {
        Self
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        let wait = Duration::from_nanos(u64::from(ns));
        if ns < SLEEP_THRESHOLD_NS {
            let start = Instant::now();
            while start.elapsed() < wait {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(wait);
        }
    }
}
