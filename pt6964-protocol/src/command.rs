//! Command byte construction
//!
//! Pure functions turning symbolic parameters into PT6964 command bytes.
//! Every range check happens here, before anything reaches the bus.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest addressable display RAM location
pub const MAX_ADDRESS: u8 = 13;

/// Largest payload that can be OR'd into a command opcode
pub const MAX_COMMAND_PAYLOAD: u8 = 63;

/// Brightest display setting
pub const MAX_BRIGHTNESS: u8 = 7;

/// Brightness used when neither the caller nor the cache provides one
pub const DEFAULT_BRIGHTNESS: u8 = 4;

/// Parameter outside its documented range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// RAM address above 13
    AddressOutOfRange(u8),
    /// Command payload above 63
    PayloadOutOfRange(u8),
    /// Brightness outside 0..=7
    BrightnessOutOfRange(i32),
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationError::AddressOutOfRange(a) => {
                write!(f, "address {a} out of range (0-{MAX_ADDRESS})")
            }
            ValidationError::PayloadOutOfRange(p) => {
                write!(f, "command payload {p} out of range (0-{MAX_COMMAND_PAYLOAD})")
            }
            ValidationError::BrightnessOutOfRange(b) => {
                write!(f, "brightness {b} out of range (0-{MAX_BRIGHTNESS})")
            }
        }
    }
}

/// Command opcodes
///
/// The low bits of each opcode are left clear for parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Display on; low 3 bits are brightness
    DisplayOn = 0b1000_1000,
    /// Display off; brightness bits are kept by the chip for the next "on"
    DisplayOff = 0b1000_0000,
    /// Display mode; low 2 bits select the digit/segment layout
    Mode = 0b0000_0000,
    /// Set RAM address; low 4 bits are the address (0-13)
    Address = 0b1100_0000,
    /// Data action, see [`build_action_byte`]
    Action = 0b0100_0000,
}

impl Command {
    /// Opcode bits of this command
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

/// Digit/segment layout of the attached display
///
/// Fixed for the lifetime of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DisplayMode {
    /// 4 digits, 13 segments
    D4S13 = 0b00,
    /// 5 digits, 12 segments
    D5S12 = 0b01,
    /// 6 digits, 11 segments
    D6S11 = 0b10,
    /// 8 digits, 10 segments
    #[default]
    D8S10 = 0b11,
}

impl DisplayMode {
    /// 2-bit mode code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Number of digit grids driven in this mode
    pub const fn digits(self) -> u8 {
        match self {
            DisplayMode::D4S13 => 4,
            DisplayMode::D5S12 => 5,
            DisplayMode::D6S11 => 6,
            DisplayMode::D8S10 => 8,
        }
    }

    /// Number of segment lines driven in this mode
    pub const fn segments(self) -> u8 {
        match self {
            DisplayMode::D4S13 => 13,
            DisplayMode::D5S12 => 12,
            DisplayMode::D6S11 => 11,
            DisplayMode::D8S10 => 10,
        }
    }
}

/// Display brightness (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness(u8);

impl Brightness {
    /// Dimmest setting
    pub const MIN: Self = Self(0);
    /// Brightest setting
    pub const MAX: Self = Self(MAX_BRIGHTNESS);

    /// Validate a brightness level
    pub const fn new(level: u8) -> Result<Self, ValidationError> {
        if level > MAX_BRIGHTNESS {
            return Err(ValidationError::BrightnessOutOfRange(level as i32));
        }
        Ok(Self(level))
    }

    /// Raw level
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(DEFAULT_BRIGHTNESS)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, ValidationError> {
        Self::new(level)
    }
}

impl TryFrom<i32> for Brightness {
    type Error = ValidationError;

    fn try_from(level: i32) -> Result<Self, ValidationError> {
        u8::try_from(level)
            .ok()
            .filter(|&l| l <= MAX_BRIGHTNESS)
            .map(Self)
            .ok_or(ValidationError::BrightnessOutOfRange(level))
    }
}

impl From<Brightness> for u8 {
    fn from(b: Brightness) -> u8 {
        b.0
    }
}

/// Build an action (data setting) byte
///
/// ```text
/// 0b0100_abc0
///        |||
///        ||+-- 0: write display data, 1: read key data
///        |+--- 0: auto-increment address, 1: fixed address
///        +---- 0: normal operation, 1: test mode
/// ```
pub const fn build_action_byte(write: bool, auto_increment: bool, test: bool) -> u8 {
    let mut action = Command::Action.opcode();
    if !write {
        action |= 0b0000_0010;
    }
    if !auto_increment {
        action |= 0b0000_0100;
    }
    if test {
        action |= 0b0000_1000;
    }
    action
}

/// Build a display mode byte
pub const fn build_mode_byte(mode: DisplayMode) -> u8 {
    Command::Mode.opcode() | mode.code()
}

/// Build an address-set byte for RAM location `addr` (0-13)
pub const fn build_address_byte(addr: u8) -> Result<u8, ValidationError> {
    if addr > MAX_ADDRESS {
        return Err(ValidationError::AddressOutOfRange(addr));
    }
    Ok(Command::Address.opcode() | addr)
}

/// Build a display control byte
///
/// The brightness is sent even when switching off; the chip keeps it for
/// the next "on".
pub const fn build_power_byte(on: bool, brightness: u8) -> Result<u8, ValidationError> {
    if brightness > MAX_BRIGHTNESS {
        return Err(ValidationError::BrightnessOutOfRange(brightness as i32));
    }
    let opcode = if on {
        Command::DisplayOn.opcode()
    } else {
        Command::DisplayOff.opcode()
    };
    Ok(opcode | brightness)
}

/// OR a raw payload (0-63) into a command opcode
pub const fn build_command(command: Command, payload: u8) -> Result<u8, ValidationError> {
    if payload > MAX_COMMAND_PAYLOAD {
        return Err(ValidationError::PayloadOutOfRange(payload));
    }
    Ok(command.opcode() | payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_action_byte_write_auto() {
        assert_eq!(build_action_byte(true, true, false), 0b0100_0000);
    }

    #[test]
    fn test_action_byte_read() {
        assert_eq!(build_action_byte(false, true, false), 0b0100_0010);
    }

    #[test]
    fn test_action_byte_fixed_and_test() {
        assert_eq!(build_action_byte(true, false, false), 0b0100_0100);
        assert_eq!(build_action_byte(true, true, true), 0b0100_1000);
        assert_eq!(build_action_byte(false, false, true), 0b0100_1110);
    }

    #[test]
    fn test_mode_bytes() {
        assert_eq!(build_mode_byte(DisplayMode::D4S13), 0b0000_0000);
        assert_eq!(build_mode_byte(DisplayMode::D5S12), 0b0000_0001);
        assert_eq!(build_mode_byte(DisplayMode::D6S11), 0b0000_0010);
        assert_eq!(build_mode_byte(DisplayMode::D8S10), 0b0000_0011);
    }

    #[test]
    fn test_mode_geometry() {
        assert_eq!(DisplayMode::default(), DisplayMode::D8S10);
        assert_eq!(DisplayMode::D4S13.digits(), 4);
        assert_eq!(DisplayMode::D4S13.segments(), 13);
        assert_eq!(DisplayMode::D6S11.digits(), 6);
    }

    #[test]
    fn test_address_byte() {
        assert_eq!(build_address_byte(0), Ok(0b1100_0000));
        assert_eq!(build_address_byte(13), Ok(0b1100_1101));
        assert_eq!(
            build_address_byte(14),
            Err(ValidationError::AddressOutOfRange(14))
        );
    }

    #[test]
    fn test_power_byte() {
        assert_eq!(build_power_byte(true, 4), Ok(0b1000_1100));
        assert_eq!(build_power_byte(false, 4), Ok(0b1000_0100));
        assert_eq!(build_power_byte(true, 7), Ok(0b1000_1111));
        assert_eq!(
            build_power_byte(true, 8),
            Err(ValidationError::BrightnessOutOfRange(8))
        );
    }

    #[test]
    fn test_command_payload_limit() {
        assert_eq!(build_command(Command::Action, 2), Ok(0b0100_0010));
        assert_eq!(build_command(Command::Mode, 63), Ok(63));
        assert_eq!(
            build_command(Command::Mode, 64),
            Err(ValidationError::PayloadOutOfRange(64))
        );
    }

    #[test]
    fn test_brightness_conversions() {
        assert_eq!(Brightness::default().level(), DEFAULT_BRIGHTNESS);
        assert_eq!(Brightness::try_from(7i32), Ok(Brightness::MAX));
        assert_eq!(
            Brightness::try_from(-1i32),
            Err(ValidationError::BrightnessOutOfRange(-1))
        );
        assert_eq!(
            Brightness::try_from(8u8),
            Err(ValidationError::BrightnessOutOfRange(8))
        );
        assert_eq!(u8::from(Brightness::MIN), 0);
    }

    proptest! {
        #[test]
        fn prop_power_byte_keeps_opcode(on: bool, level in 0u8..=7) {
            let byte = build_power_byte(on, level).unwrap();
            prop_assert_eq!(byte & 0b0000_0111, level);
            prop_assert_eq!(byte & 0b1000_0000, 0b1000_0000);
            prop_assert_eq!(byte & 0b0000_1000 != 0, on);
        }

        #[test]
        fn prop_brightness_accepts_exactly_0_to_7(level: i32) {
            prop_assert_eq!(Brightness::try_from(level).is_ok(), (0..=7).contains(&level));
        }

        #[test]
        fn prop_command_payload_checked(payload: u8) {
            let result = build_command(Command::Address, payload);
            prop_assert_eq!(result.is_ok(), payload <= MAX_COMMAND_PAYLOAD);
        }
    }
}
