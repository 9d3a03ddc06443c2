//! Bit/byte encoder
//!
//! Serializes bytes onto the three-wire bus. Two bit orders coexist on the
//! PT6964 wire and both are deliberate:
//!
//! - command bytes go out least-significant bit first ([`Encoder::send_byte`])
//! - display data bytes inside a memory write go out most-significant bit
//!   first ([`Encoder::send_data_byte`])
//!
//! The encoder never takes locks; callers hold the bus for the whole
//! sequence they emit.

use pt6964_hal::ThreeWireBus;

use crate::config::Timing;

/// Drives one bus for the duration of a transaction
pub(crate) struct Encoder<'a, B> {
    bus: &'a mut B,
    timing: Timing,
}

impl<'a, B: ThreeWireBus> Encoder<'a, B> {
    pub(crate) fn new(bus: &'a mut B, timing: Timing) -> Self {
        Self { bus, timing }
    }

    /// Put one bit on the data line and pulse the clock
    pub(crate) fn send_bit(&mut self, bit: bool) -> Result<(), B::Error> {
        self.bus.set_data(bit)?;
        self.bus.set_clk(true)?;
        self.bus.delay_ns(self.timing.clock_delay_ns);
        self.bus.set_clk(false)?;
        self.bus.delay_ns(self.timing.clock_delay_ns);
        Ok(())
    }

    /// Send a command byte, LSB first
    pub(crate) fn send_byte(&mut self, byte: u8) -> Result<(), B::Error> {
        for i in 0..8 {
            self.send_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Send a display data byte, MSB first
    pub(crate) fn send_data_byte(&mut self, byte: u8) -> Result<(), B::Error> {
        for i in (0..8).rev() {
            self.send_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Complete single-byte transaction: CS low, byte, CS high
    pub(crate) fn send_raw_command(&mut self, byte: u8) -> Result<(), B::Error> {
        self.bus.set_cs(false)?;
        self.send_byte(byte)?;
        self.bus.set_cs(true)
    }

    /// Lower chip select to open a transaction
    pub(crate) fn select(&mut self) -> Result<(), B::Error> {
        self.bus.set_cs(false)
    }

    /// Return to bus idle: CS high, DATA low, CLK low
    pub(crate) fn release(&mut self) -> Result<(), B::Error> {
        self.bus.idle()
    }

    /// Wait out the read-command-to-clock delay
    pub(crate) fn command_wait(&mut self) {
        self.bus.delay_ns(self.timing.command_wait_ns);
    }

    /// Raise the clock, let the chip drive DATA, sample it, lower the clock
    pub(crate) fn clock_in_bit(&mut self) -> Result<bool, B::Error> {
        self.bus.set_clk(true)?;
        self.bus.delay_ns(self.timing.clock_delay_ns);
        let bit = self.bus.read_data()?;
        self.bus.set_clk(false)?;
        Ok(bit)
    }
}
