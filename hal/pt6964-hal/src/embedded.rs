//! `embedded-hal` backend
//!
//! Wraps three `embedded-hal` 1.0 pins and a [`DelayNs`] provider into a
//! [`ThreeWireBus`]. The data pin must be both an output and an input,
//! typically an open-drain pin with a pull-up so the chip can drive it
//! during key scans.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::bus::ThreeWireBus;

/// Pin failure while driving the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Chip-select pin could not be driven
    ChipSelect,
    /// Clock pin could not be driven
    Clock,
    /// Data pin could not be driven or read
    Data,
}

impl core::fmt::Display for PinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PinError::ChipSelect => f.write_str("chip-select pin error"),
            PinError::Clock => f.write_str("clock pin error"),
            PinError::Data => f.write_str("data pin error"),
        }
    }
}

/// Three-wire bus over `embedded-hal` pins
pub struct EmbeddedHalBus<CS, CLK, DIO, D> {
    /// Chip select (active low)
    cs: CS,
    /// Clock
    clk: CLK,
    /// Bidirectional data
    dio: DIO,
    /// Delay provider
    delay: D,
}

impl<CS, CLK, DIO, D> EmbeddedHalBus<CS, CLK, DIO, D> {
    /// Create a bus from its pins and a delay provider
    ///
    /// The lines are left untouched; the driver puts the bus into its idle
    /// state when it is constructed.
    pub fn new(cs: CS, clk: CLK, dio: DIO, delay: D) -> Self {
        Self {
            cs,
            clk,
            dio,
            delay,
        }
    }

    /// Give the pins and delay provider back
    pub fn release(self) -> (CS, CLK, DIO, D) {
        (self.cs, self.clk, self.dio, self.delay)
    }
}

impl<CS, CLK, DIO, D> ThreeWireBus for EmbeddedHalBus<CS, CLK, DIO, D>
where
    CS: OutputPin,
    CLK: OutputPin,
    DIO: OutputPin + InputPin,
    D: DelayNs,
{
    type Error = PinError;

    fn set_cs(&mut self, high: bool) -> Result<(), PinError> {
        self.cs
            .set_state(high.into())
            .map_err(|_| PinError::ChipSelect)
    }

    fn set_clk(&mut self, high: bool) -> Result<(), PinError> {
        self.clk.set_state(high.into()).map_err(|_| PinError::Clock)
    }

    fn set_data(&mut self, high: bool) -> Result<(), PinError> {
        self.dio.set_state(high.into()).map_err(|_| PinError::Data)
    }

    fn read_data(&mut self) -> Result<bool, PinError> {
        self.dio.is_high().map_err(|_| PinError::Data)
    }

    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock pin for testing
    struct MockPin {
        high: bool,
        broken: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                broken: false,
            }
        }

        fn broken() -> Self {
            Self {
                high: false,
                broken: true,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = ErrorKind;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = true;
            Ok(())
        }
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, ErrorKind> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, ErrorKind> {
            Ok(!self.high)
        }
    }

    /// Delay that only counts
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_idle_drives_pins() {
        let mut bus = EmbeddedHalBus::new(
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            CountingDelay { total_ns: 0 },
        );
        bus.set_clk(true).unwrap();
        bus.set_data(true).unwrap();
        bus.idle().unwrap();

        let (cs, clk, dio, _) = bus.release();
        assert!(cs.high);
        assert!(!clk.high);
        assert!(!dio.high);
    }

    #[test]
    fn test_data_reads_back() {
        let mut bus = EmbeddedHalBus::new(
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            CountingDelay { total_ns: 0 },
        );
        bus.set_data(true).unwrap();
        assert!(bus.read_data().unwrap());
        bus.set_data(false).unwrap();
        assert!(!bus.read_data().unwrap());
    }

    #[test]
    fn test_pin_errors_are_mapped() {
        let mut bus = EmbeddedHalBus::new(
            MockPin::broken(),
            MockPin::new(),
            MockPin::new(),
            CountingDelay { total_ns: 0 },
        );
        assert_eq!(bus.set_cs(false), Err(PinError::ChipSelect));
        assert_eq!(bus.set_clk(true), Ok(()));
    }

    #[test]
    fn test_delay_forwarded() {
        let mut bus = EmbeddedHalBus::new(
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            CountingDelay { total_ns: 0 },
        );
        bus.delay_ns(500);
        bus.delay_ns(1_000);

        let (_, _, _, delay) = bus.release();
        assert_eq!(delay.total_ns, 1_500);
    }
}
