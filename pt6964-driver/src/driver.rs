//! PT6964 driver
//!
//! # Locking
//!
//! Two independent locks guard a driver:
//!
//! - the cache lock (`RwLock`, per driver) protects [`CachedState`]; the
//!   "is there anything to do" check takes it shared, commits take it
//!   exclusive
//! - the bus lock (owned by the [`BusArbiter`](crate::BusArbiter), shared
//!   by every driver on the same wires) is held for each bit-banged
//!   sequence
//!
//! A write checks the cache, releases it, runs its transaction under the
//! bus lock, then commits. Two writers racing on the same driver can both
//! pass the check and both hit the bus; their transactions never
//! interleave, and the later commit wins in the cache.
//!
//! The one piece of cached state that mirrors a chip register, the
//! last-operation kind, is only ever updated while the bus lock is held,
//! so the decision to restore write mode after a key scan always matches
//! the real order of transactions on the wire.
//!
//! Lock order is bus, then cache. Nothing takes the bus lock while holding
//! the cache lock.

use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pt6964_hal::ThreeWireBus;
use pt6964_protocol::{
    build_action_byte, build_command, build_mode_byte, build_power_byte, Brightness, Command,
    DisplayMemory, DisplayMode, MEMORY_SIZE,
};

use crate::arbiter::{ChipSelectClaim, ChipSelectId};
use crate::cache::{CachedState, LastOp, Target};
use crate::config::DriverConfig;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::keys;
use crate::writer::WritePlan;

/// PT6964 LED controller / key scanner
///
/// Safe to share between threads (`&self` methods); wrap in an `Arc` or
/// use scoped threads.
pub struct Pt6964<B> {
    bus: Mutex<B>,
    claim: ChipSelectClaim,
    cache: RwLock<CachedState>,
    config: DriverConfig,
}

impl<B: ThreeWireBus> Pt6964<B> {
    /// Create a driver and put the bus into its idle state
    ///
    /// `claim` ties the driver to its chip-select line on a shared
    /// [`BusArbiter`](crate::BusArbiter); a second driver for the same line
    /// cannot be created while this one lives.
    pub fn new(
        mut bus: B,
        claim: ChipSelectClaim,
        config: DriverConfig,
    ) -> Result<Self, Error<B::Error>> {
        config.validate()?;
        {
            let _bus_lock = claim.arbiter().lock_bus();
            bus.idle().map_err(Error::Bus)?;
        }
        log::debug!(
            "{}: driver ready, mode {:?}",
            claim.chip_select(),
            config.mode
        );

        Ok(Self {
            bus: Mutex::new(bus),
            claim,
            cache: RwLock::new(CachedState::default()),
            config,
        })
    }

    /// Display layout this driver was configured with
    pub fn mode(&self) -> DisplayMode {
        self.config.mode
    }

    /// Driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Chip select this driver owns
    pub fn chip_select(&self) -> ChipSelectId {
        self.claim.chip_select()
    }

    /// Snapshot of the cached chip state
    pub fn cached_state(&self) -> CachedState {
        *self.read_cache()
    }

    /// Write a full display memory image
    ///
    /// `power` and `brightness` default to the cached values, then to
    /// display on at brightness 4. Only bytes that differ from the cache
    /// are sent unless `force` is set, in which case the whole image,
    /// the mode setup and the display-control command are resent. The
    /// first write after construction is always a full one.
    ///
    /// Returns `Ok(false)` without touching the bus when the chip already
    /// shows exactly this state.
    pub fn write_display(
        &self,
        memory: &DisplayMemory,
        power: Option<bool>,
        brightness: Option<u8>,
        force: bool,
    ) -> Result<bool, Error<B::Error>> {
        let cached = self.cached_state();
        let (power, brightness) = cached.resolve(power, brightness)?;
        let target = Target {
            memory: *memory,
            power,
            brightness,
        };

        if !force && cached.is_unchanged(&target) {
            log::trace!("{}: display unchanged, skipping write", self.chip_select());
            return Ok(false);
        }

        // Chip RAM content is unknown until the first write lands
        let full = force || !cached.valid;
        let plan = WritePlan::new(&cached, target, full)?;
        let write_action = build_action_byte(true, true, self.config.test_mode);
        let mode = build_mode_byte(self.config.mode);

        let result = self.transact(|enc| {
            let restore = full || self.read_cache().needs_mode_restore();
            if restore {
                enc.send_raw_command(write_action)?;
                enc.send_raw_command(mode)?;
                self.write_cache().mark_mode_restored();
            }
            plan.execute(enc)?;
            Ok(restore)
        });
        let restored = match result {
            Ok(restored) => restored,
            Err(e) => {
                // Part of the image may already be in chip RAM
                self.write_cache().invalidate();
                log::warn!("{}: write interrupted, next write is full", self.chip_select());
                return Err(e);
            }
        };

        self.write_cache().commit_write(plan.target());
        log::debug!(
            "{}: wrote {} run(s){}{}",
            self.chip_select(),
            plan.runs().len(),
            if restored { ", mode restored" } else { "" },
            if plan.sends_power() {
                ", display control sent"
            } else {
                ""
            },
        );
        Ok(true)
    }

    /// Set display power and brightness
    ///
    /// Skips the bus when the chip already has this setting, unless
    /// `force` is set. Brightness is kept by the chip while the display is
    /// off.
    pub fn set_brightness(
        &self,
        power: bool,
        brightness: u8,
        force: bool,
    ) -> Result<(), Error<B::Error>> {
        let brightness = Brightness::new(brightness)?;
        let byte = build_power_byte(power, brightness.level())?;

        if !force && self.read_cache().brightness_matches(power, brightness) {
            log::trace!("{}: brightness unchanged", self.chip_select());
            return Ok(());
        }

        self.transact(|enc| enc.send_raw_command(byte))?;
        self.write_cache().commit_brightness(power, brightness);
        log::debug!(
            "{}: display {} at brightness {}",
            self.chip_select(),
            if power { "on" } else { "off" },
            brightness.level()
        );
        Ok(())
    }

    /// Scan the key matrix
    ///
    /// Returns 16 bits of key data, first bit clocked out as bit 0. The
    /// chip is left in read mode; the next display write switches it back.
    pub fn read_keys(&self) -> Result<u16, Error<B::Error>> {
        let read_action = build_action_byte(false, true, self.config.test_mode);
        let keys = self.transact(|enc| {
            self.write_cache().last_op = LastOp::Read;
            keys::scan(enc, read_action)
        })?;
        log::trace!("{}: keys {:#018b}", self.chip_select(), keys);
        Ok(keys)
    }

    /// Send a raw single-byte command: `command` opcode OR'd with `payload`
    ///
    /// Low-level escape hatch; bypasses and does not update the cache.
    pub fn send_command(&self, command: Command, payload: u8) -> Result<(), Error<B::Error>> {
        let byte = build_command(command, payload)?;
        self.transact(|enc| enc.send_raw_command(byte))
    }

    /// Blank the display, switch it off and hand the bus back
    ///
    /// Releases the chip-select claim.
    pub fn shutdown(self) -> Result<B, Error<B::Error>> {
        self.write_display(&[0; MEMORY_SIZE], Some(false), None, false)?;
        log::debug!("{}: shut down", self.chip_select());

        let Self { bus, claim, .. } = self;
        drop(claim);
        Ok(bus.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run one bus transaction under the shared bus lock
    fn transact<R>(
        &self,
        f: impl FnOnce(&mut Encoder<'_, B>) -> Result<R, B::Error>,
    ) -> Result<R, Error<B::Error>> {
        let _bus_lock = self.claim.arbiter().lock_bus();
        let mut bus = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        let mut enc = Encoder::new(&mut *bus, self.config.timing());
        f(&mut enc).map_err(Error::Bus)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, CachedState> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, CachedState> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B> core::fmt::Debug for Pt6964<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pt6964")
            .field("chip_select", &self.claim.chip_select())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
