//! PT6964 LED controller / key scanner driver
//!
//! This crate drives a PT6964-family chip over a bit-banged three-wire bus
//! (chip select, clock, data) provided by any [`ThreeWireBus`]
//! implementation:
//!
//! - Display memory writes with a state cache: identical writes cost no
//!   bus traffic, partial changes only resend the changed address runs
//! - Brightness and power control
//! - 16-bit key matrix scanning
//! - Safe concurrent use from several threads, and several chips sharing
//!   one clock/data pair through a [`BusArbiter`]
//!
//! # Usage
//!
//! ```ignore
//! let arbiter = Arc::new(BusArbiter::new());
//! let bus = EmbeddedHalBus::new(cs, clk, dio, StdDelay::new());
//! let display = Pt6964::new(bus, arbiter.claim(ChipSelectId(25))?, DriverConfig::default())?;
//!
//! let mut memory = [0u8; MEMORY_SIZE];
//! memory[0] = 0b0111_1110;
//! display.write_display(&memory, Some(true), Some(4), false)?;
//!
//! let keys = display.read_keys()?;
//! ```
//!
//! Encoding characters into segment patterns is left to the application;
//! the driver only deals in raw 14-byte memory images.

#![deny(unsafe_code)]

pub mod arbiter;
pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod keys;

mod encoder;
mod writer;

pub use arbiter::{BusArbiter, ChipSelectClaim, ChipSelectId, ClaimError};
pub use cache::{CachedState, LastOp};
pub use config::{ConfigError, DriverConfig, Timing};
pub use driver::Pt6964;
pub use error::Error;

pub use pt6964_hal::{EmbeddedHalBus, PinError, StdDelay, ThreeWireBus};
pub use pt6964_protocol::{Brightness, Command, DisplayMemory, DisplayMode, MEMORY_SIZE};
