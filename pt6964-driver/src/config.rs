//! Driver configuration
//!
//! Timing defaults follow the PT6964 datasheet: clock phases of at least
//! 500 ns and at least 1 µs between a read command and the first key-data
//! clock. Boards with long wires or slow level shifters can stretch them.
//!
//! With the `toml` feature a configuration can be loaded from a document
//! such as:
//!
//! ```toml
//! mode = "D6S11"
//! clock_delay_ns = 800
//! test_mode = false
//! ```
//!
//! Keys that are left out take their default values.

use pt6964_protocol::DisplayMode;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Minimum clock high/low time from the datasheet, in nanoseconds
pub const MIN_CLOCK_DELAY_NS: u32 = 500;

/// Minimum wait between a read command and the first data clock, in nanoseconds
pub const MIN_COMMAND_WAIT_NS: u32 = 1_000;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Clock high/low time below the datasheet minimum
    ClockDelayTooShort(u32),
    /// Command-to-clock wait below the datasheet minimum
    CommandWaitTooShort(u32),
    /// TOML document could not be parsed
    #[cfg(feature = "toml")]
    Parse(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ClockDelayTooShort(ns) => write!(
                f,
                "clock delay of {ns} ns is below the {MIN_CLOCK_DELAY_NS} ns minimum"
            ),
            ConfigError::CommandWaitTooShort(ns) => write!(
                f,
                "command wait of {ns} ns is below the {MIN_COMMAND_WAIT_NS} ns minimum"
            ),
            #[cfg(feature = "toml")]
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Bus timing, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Clock high time and clock low time
    pub clock_delay_ns: u32,
    /// Wait after a read command before clocking key data
    pub command_wait_ns: u32,
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default))]
pub struct DriverConfig {
    /// Digit/segment layout of the attached display
    pub mode: DisplayMode,
    /// Clock high and low time in ns
    pub clock_delay_ns: u32,
    /// Wait between a read command and the first key-data clock in ns
    pub command_wait_ns: u32,
    /// Set the test-mode bit in every action command
    pub test_mode: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::D8S10,
            clock_delay_ns: MIN_CLOCK_DELAY_NS,
            command_wait_ns: MIN_COMMAND_WAIT_NS,
            test_mode: false,
        }
    }
}

impl DriverConfig {
    /// Default timing with the given display mode
    pub fn with_mode(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check the timing against the chip's limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_delay_ns < MIN_CLOCK_DELAY_NS {
            return Err(ConfigError::ClockDelayTooShort(self.clock_delay_ns));
        }
        if self.command_wait_ns < MIN_COMMAND_WAIT_NS {
            return Err(ConfigError::CommandWaitTooShort(self.command_wait_ns));
        }
        Ok(())
    }

    /// Bus timing derived from this configuration
    pub fn timing(&self) -> Timing {
        Timing {
            clock_delay_ns: self.clock_delay_ns,
            command_wait_ns: self.command_wait_ns,
        }
    }

    /// Parse and validate a TOML configuration document
    #[cfg(feature = "toml")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
