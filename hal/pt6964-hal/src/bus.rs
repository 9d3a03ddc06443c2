//! Three-wire bus abstraction
//!
//! The PT6964 talks over chip-select, clock and a bidirectional data line.
//! The driver toggles these lines itself, so the backend only needs to
//! expose the raw line operations and a nanosecond delay.

/// Bit-banged chip-select / clock / data bus
///
/// Implementations own the GPIO lines. Reading the data line may require
/// the backend to switch the pin to input and let it settle first; the
/// driver assumes [`read_data`](ThreeWireBus::read_data) returns a settled
/// level.
pub trait ThreeWireBus {
    /// Error type for line operations (a pin could not be driven or read)
    type Error;

    /// Drive the chip-select line (active low)
    fn set_cs(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the clock line
    fn set_clk(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the data line
    fn set_data(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Sample the data line
    fn read_data(&mut self) -> Result<bool, Self::Error>;

    /// Block for at least `ns` nanoseconds
    ///
    /// Sub-microsecond waits are expected to busy-wait.
    fn delay_ns(&mut self, ns: u32);

    /// Put the bus into its idle state: CS high, CLK low, DATA low
    fn idle(&mut self) -> Result<(), Self::Error> {
        self.set_cs(true)?;
        self.set_data(false)?;
        self.set_clk(false)
    }
}

// Lets a driver borrow a bus whose lifetime the caller manages
impl<T: ThreeWireBus + ?Sized> ThreeWireBus for &mut T {
    type Error = T::Error;

    fn set_cs(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_cs(high)
    }

    fn set_clk(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_clk(high)
    }

    fn set_data(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_data(high)
    }

    fn read_data(&mut self) -> Result<bool, Self::Error> {
        (**self).read_data()
    }

    fn delay_ns(&mut self, ns: u32) {
        (**self).delay_ns(ns);
    }

    fn idle(&mut self) -> Result<(), Self::Error> {
        (**self).idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal line-state bus for testing the provided methods
    #[derive(Default)]
    struct LineBus {
        cs: bool,
        clk: bool,
        data: bool,
        waited_ns: u64,
    }

    impl ThreeWireBus for LineBus {
        type Error = ();

        fn set_cs(&mut self, high: bool) -> Result<(), ()> {
            self.cs = high;
            Ok(())
        }

        fn set_clk(&mut self, high: bool) -> Result<(), ()> {
            self.clk = high;
            Ok(())
        }

        fn set_data(&mut self, high: bool) -> Result<(), ()> {
            self.data = high;
            Ok(())
        }

        fn read_data(&mut self) -> Result<bool, ()> {
            Ok(self.data)
        }

        fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_idle_state() {
        let mut bus = LineBus {
            cs: false,
            clk: true,
            data: true,
            waited_ns: 0,
        };
        bus.idle().unwrap();

        assert!(bus.cs);
        assert!(!bus.clk);
        assert!(!bus.data);
    }

    #[test]
    fn test_borrowed_bus_forwards() {
        let mut bus = LineBus::default();

        fn drive<B: ThreeWireBus<Error = ()>>(mut b: B) {
            b.set_data(true).unwrap();
            b.set_clk(true).unwrap();
            b.delay_ns(500);
        }

        drive(&mut bus);
        assert!(bus.data);
        assert!(bus.clk);
        assert_eq!(bus.waited_ns, 500);
        assert!(bus.read_data().unwrap());
    }
}
