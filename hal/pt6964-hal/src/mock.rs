//! Deterministic mock bus
//!
//! [`MockBus`] records every line operation into a [`BusLog`] instead of
//! touching hardware, and plays back a fixed key pattern on the data line.
//! Several mock buses can share one log (e.g. two drivers on a shared
//! clock/data pair); each entry is tagged with the id of the bus that
//! produced it.
//!
//! [`BusLog::frames`] turns the raw event stream back into chip-select
//! framed transactions so tests can assert on bytes instead of edges.

use std::sync::{Arc, Mutex, PoisonError};

use crate::bus::ThreeWireBus;

/// One recorded bus operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip-select driven to the given level
    ChipSelect(bool),
    /// Clock driven to the given level
    Clock(bool),
    /// Data driven to the given level
    Data(bool),
    /// Data line sampled, with the level returned
    Read(bool),
    /// Delay requested, in nanoseconds
    Delay(u32),
}

/// Log entry: originating bus id and event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// Id of the mock bus that produced the event
    pub bus: u8,
    /// The event itself
    pub event: BusEvent,
}

/// Injected failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Fault injection threshold reached
    Injected,
}

impl core::fmt::Display for MockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("injected bus fault")
    }
}

impl std::error::Error for MockError {}

/// Shared, cloneable event log
#[derive(Debug, Clone, Default)]
pub struct BusLog {
    entries: Arc<Mutex<Vec<Recorded>>>,
}

impl BusLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, bus: u8, event: BusEvent) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded { bus, event });
    }

    /// Snapshot of every recorded entry
    pub fn entries(&self) -> Vec<Recorded> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the events, without bus ids
    pub fn events(&self) -> Vec<BusEvent> {
        self.entries().into_iter().map(|r| r.event).collect()
    }

    /// Number of recorded operations
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Decode the log into chip-select framed transactions
    ///
    /// A frame opens on a chip-select falling edge and closes on the next
    /// rising edge of the same bus. Activity outside any frame is ignored.
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut open: Vec<Frame> = Vec::new();
        let mut data_level = [false; 256];

        for Recorded { bus, event } in self.entries() {
            let slot = open.iter().position(|f| f.bus == bus);
            match event {
                BusEvent::ChipSelect(false) => {
                    if slot.is_none() {
                        open.push(Frame {
                            bus,
                            clocked: Vec::new(),
                            sampled: Vec::new(),
                        });
                    }
                }
                BusEvent::ChipSelect(true) => {
                    if let Some(i) = slot {
                        frames.push(open.remove(i));
                    }
                }
                BusEvent::Data(level) => data_level[usize::from(bus)] = level,
                BusEvent::Clock(true) => {
                    if let Some(i) = slot {
                        open[i].clocked.push(data_level[usize::from(bus)]);
                    }
                }
                BusEvent::Read(level) => {
                    if let Some(i) = slot {
                        open[i].sampled.push(level);
                    }
                }
                BusEvent::Clock(false) | BusEvent::Delay(_) => {}
            }
        }
        frames
    }
}

/// One chip-select framed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bus the frame was seen on
    pub bus: u8,
    /// Data level at every rising clock edge
    pub clocked: Vec<bool>,
    /// Levels returned by data-line reads
    pub sampled: Vec<bool>,
}

impl Frame {
    /// Number of whole bytes clocked out
    pub fn byte_len(&self) -> usize {
        self.clocked.len() / 8
    }

    /// Byte `index` decoded least-significant bit first
    pub fn byte_lsb(&self, index: usize) -> Option<u8> {
        let bits = self.clocked.get(index * 8..index * 8 + 8)?;
        Some(
            bits.iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i)),
        )
    }

    /// Byte `index` decoded most-significant bit first
    pub fn byte_msb(&self, index: usize) -> Option<u8> {
        let bits = self.clocked.get(index * 8..index * 8 + 8)?;
        Some(bits.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
    }

    /// Sampled bits assembled with the first sample as bit 0
    pub fn sampled_word(&self) -> u16 {
        self.sampled
            .iter()
            .take(16)
            .enumerate()
            .fold(0u16, |acc, (i, &b)| acc | (u16::from(b) << i))
    }
}

/// Recording three-wire bus
#[derive(Debug)]
pub struct MockBus {
    id: u8,
    log: BusLog,
    /// 16-bit pattern served on reads, bit 0 first
    key_pattern: u16,
    /// Reads served since the last chip-select falling edge
    read_index: u32,
    /// Fail every call once this many calls have been made
    fail_after: Option<usize>,
    /// Clear `fail_after` once a line operation has failed
    fail_once: bool,
    calls: usize,
}

impl MockBus {
    /// Create a mock bus with its own log
    pub fn new() -> Self {
        Self::with_log(0, BusLog::new())
    }

    /// Create a mock bus recording into a shared log under `id`
    pub fn with_log(id: u8, log: BusLog) -> Self {
        Self {
            id,
            log,
            key_pattern: 0,
            read_index: 0,
            fail_after: None,
            fail_once: false,
            calls: 0,
        }
    }

    /// Serve `pattern` on data-line reads, bit 0 first
    pub fn with_key_pattern(mut self, pattern: u16) -> Self {
        self.key_pattern = pattern;
        self
    }

    /// Fail every line operation after `calls` successful ones
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Fail the first line operation after `calls` successful ones, then
    /// behave normally again
    pub fn fail_once_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self.fail_once = true;
        self
    }

    /// Change the key pattern served on reads
    pub fn set_key_pattern(&mut self, pattern: u16) {
        self.key_pattern = pattern;
    }

    /// Handle to the log this bus records into
    pub fn log(&self) -> BusLog {
        self.log.clone()
    }

    fn record(&mut self, event: BusEvent) -> Result<(), MockError> {
        if self.fail_after.is_some_and(|limit| self.calls >= limit) {
            if self.fail_once && !matches!(event, BusEvent::Delay(_)) {
                self.fail_after = None;
            }
            return Err(MockError::Injected);
        }
        self.calls += 1;
        self.log.push(self.id, event);
        Ok(())
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreeWireBus for MockBus {
    type Error = MockError;

    fn set_cs(&mut self, high: bool) -> Result<(), MockError> {
        self.record(BusEvent::ChipSelect(high))?;
        if !high {
            self.read_index = 0;
        }
        Ok(())
    }

    fn set_clk(&mut self, high: bool) -> Result<(), MockError> {
        self.record(BusEvent::Clock(high))
    }

    fn set_data(&mut self, high: bool) -> Result<(), MockError> {
        self.record(BusEvent::Data(high))
    }

    fn read_data(&mut self) -> Result<bool, MockError> {
        let level = self.read_index < 16 && (self.key_pattern >> self.read_index) & 1 == 1;
        self.record(BusEvent::Read(level))?;
        self.read_index += 1;
        Ok(level)
    }

    fn delay_ns(&mut self, ns: u32) {
        // Delays cannot fail; they are only recorded while the bus is healthy
        let _ = self.record(BusEvent::Delay(ns));
    }
}
