//! Diff writer
//!
//! Turns a target memory image into the bus traffic that brings the chip
//! from its cached state to the target: an optional display-control
//! command followed by one addressed run per block of changed bytes.
//! Everything that can fail validation is computed in [`WritePlan::new`],
//! before the bus is touched.

use heapless::Vec;
use pt6964_hal::ThreeWireBus;
use pt6964_protocol::{
    build_address_byte, build_power_byte, changed_runs, Run, Runs, ValidationError, MAX_RUNS,
};

use crate::cache::{CachedState, Target};
use crate::encoder::Encoder;

/// Run with its address-set command already built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AddressedRun {
    pub address_byte: u8,
    pub run: Run,
}

/// Bus traffic for one display write
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WritePlan {
    target: Target,
    /// Display-control byte, if brightness or power must be (re)sent
    power_byte: Option<u8>,
    runs: Vec<AddressedRun, MAX_RUNS>,
}

impl WritePlan {
    /// Plan the write of `target` over `cached`
    ///
    /// `force` rewrites the whole image from address 0 and resends the
    /// display-control byte regardless of the cache.
    pub fn new(cached: &CachedState, target: Target, force: bool) -> Result<Self, ValidationError> {
        let power_byte = if force || !cached.brightness_matches(target.power, target.brightness) {
            Some(build_power_byte(target.power, target.brightness.level())?)
        } else {
            None
        };

        let planned = if force {
            let mut full = Runs::new();
            push_capped(&mut full, Run::FULL);
            full
        } else {
            changed_runs(&cached.memory, &target.memory)
        };

        // Same capacity as the run list it is built from
        let mut runs = Vec::new();
        for run in planned {
            let addressed = AddressedRun {
                address_byte: build_address_byte(run.start)?,
                run,
            };
            push_capped(&mut runs, addressed);
        }

        Ok(Self {
            target,
            power_byte,
            runs,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn runs(&self) -> &[AddressedRun] {
        &self.runs
    }

    pub fn sends_power(&self) -> bool {
        self.power_byte.is_some()
    }

    /// Emit the display-control command and every run
    ///
    /// Each run is CS low, address byte (LSB first), changed bytes (MSB
    /// first, relying on auto-increment), then back to bus idle.
    pub fn execute<B: ThreeWireBus>(&self, enc: &mut Encoder<'_, B>) -> Result<(), B::Error> {
        if let Some(byte) = self.power_byte {
            enc.send_raw_command(byte)?;
        }
        for addressed in &self.runs {
            enc.select()?;
            enc.send_byte(addressed.address_byte)?;
            for &byte in addressed.run.bytes(&self.target.memory) {
                enc.send_data_byte(byte)?;
            }
            enc.release()?;
        }
        Ok(())
    }
}

fn push_capped<T>(runs: &mut Vec<T, MAX_RUNS>, item: T) {
    let pushed = runs.push(item);
    debug_assert!(pushed.is_ok(), "more than {MAX_RUNS} runs");
}
