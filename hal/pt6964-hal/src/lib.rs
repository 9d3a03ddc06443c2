//! PT6964 Hardware Abstraction Layer
//!
//! This crate defines the bus primitive the PT6964 driver bit-bangs its
//! protocol over, plus a few ready-made backends. Chip-specific GPIO code
//! only has to implement [`bus::ThreeWireBus`] (or provide `embedded-hal`
//! pins) to drive a display.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pt6964-driver (cache, diff, key scan)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pt6964-hal (this crate - ThreeWireBus) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ EmbeddedHalBus│       │    MockBus    │
//! │ (real pins)   │       │ (test record) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Features
//!
//! - `std`: [`delay::StdDelay`], spinning for short waits and sleeping for long ones
//! - `mock`: [`mock::MockBus`], a deterministic line-state recorder
//! - `defmt`: `defmt::Format` derives

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod embedded;

#[cfg(feature = "std")]
pub mod delay;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use bus::ThreeWireBus;
pub use embedded::{EmbeddedHalBus, PinError};

#[cfg(feature = "std")]
pub use delay::StdDelay;
