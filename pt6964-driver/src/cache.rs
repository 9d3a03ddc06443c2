//! Cached chip state
//!
//! The driver remembers what it last wrote so that repeated identical
//! updates cost one comparison instead of a bus transaction.

use pt6964_protocol::{Brightness, DisplayMemory, ValidationError, MEMORY_SIZE};

/// Display power used when neither the caller nor the cache provides one
pub const DEFAULT_POWER: bool = true;

/// Kind of the last data-mode operation that reached the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastOp {
    /// Nothing has been sent yet
    #[default]
    Unset,
    /// Display memory write; the chip is in write mode
    Write,
    /// Key scan; the chip's action register was left in read mode
    Read,
}

/// Last-known chip state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedState {
    /// Last display memory written
    pub memory: DisplayMemory,
    /// `memory` reflects a completed write
    pub valid: bool,
    /// Last brightness sent
    pub brightness: Option<Brightness>,
    /// Last power state sent
    pub power: Option<bool>,
    /// Last data-mode operation on the bus
    pub last_op: LastOp,
    /// Action and mode commands have been issued at least once
    pub initialized: bool,
}

impl Default for CachedState {
    fn default() -> Self {
        Self {
            memory: [0; MEMORY_SIZE],
            valid: false,
            brightness: None,
            power: None,
            last_op: LastOp::Unset,
            initialized: false,
        }
    }
}

/// Fully resolved state a write wants the chip to end up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Target {
    pub memory: DisplayMemory,
    pub power: bool,
    pub brightness: Brightness,
}

impl CachedState {
    /// Effective power and brightness: explicit argument, else cache, else default
    pub fn resolve(
        &self,
        power: Option<bool>,
        brightness: Option<u8>,
    ) -> Result<(bool, Brightness), ValidationError> {
        let power = power.or(self.power).unwrap_or(DEFAULT_POWER);
        let brightness = match brightness {
            Some(level) => Brightness::new(level)?,
            None => self.brightness.unwrap_or_default(),
        };
        Ok((power, brightness))
    }

    /// Power and brightness already match what the chip was last told
    pub fn brightness_matches(&self, power: bool, brightness: Brightness) -> bool {
        self.power == Some(power) && self.brightness == Some(brightness)
    }

    /// A write of `target` would change nothing on the chip
    ///
    /// A key scan in between always forces a write, since the chip's mode
    /// register has to be switched back.
    pub(crate) fn is_unchanged(&self, target: &Target) -> bool {
        self.valid
            && self.last_op != LastOp::Read
            && self.memory == target.memory
            && self.brightness_matches(target.power, target.brightness)
    }

    /// Action and mode commands must be reissued before touching memory
    pub fn needs_mode_restore(&self) -> bool {
        !self.initialized || self.last_op == LastOp::Read
    }

    pub(crate) fn commit_write(&mut self, target: &Target) {
        self.memory = target.memory;
        self.valid = true;
        self.commit_brightness(target.power, target.brightness);
    }

    /// Forget the memory image after a write that may have been cut short
    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(crate) fn commit_brightness(&mut self, power: bool, brightness: Brightness) {
        self.power = Some(power);
        self.brightness = Some(brightness);
    }

    pub(crate) fn mark_mode_restored(&mut self) {
        self.last_op = LastOp::Write;
        self.initialized = true;
    }
}
