//! Mock latch bus for shadow-register tests.
//!
//! Records bus writes and strobes, and mirrors what each latch would end
//! up holding (the last bus value present when its strobe fired), so
//! tests can compare hardware state against the session's shadow cache.

use async_trait::async_trait;

use synthlib_core::error::{Error, Result};
use synthlib_core::session::LATCH_COUNT;
use synthlib_core::transport::LatchBus;

/// One recorded bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Data(u8),
    Strobe(usize),
}

/// A [`LatchBus`] implementation that records operations and tracks the
/// value each latch has captured.
#[derive(Debug)]
pub struct MockLatchBus {
    events: Vec<BusEvent>,
    bus: u8,
    latched: [u8; LATCH_COUNT],
}

impl Default for MockLatchBus {
    fn default() -> Self {
        MockLatchBus {
            events: Vec::new(),
            bus: 0,
            latched: [0; LATCH_COUNT],
        }
    }
}

impl MockLatchBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every bus operation recorded so far, in order.
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// The value a latch captured at its last strobe.
    pub fn latched(&self, latch: usize) -> u8 {
        self.latched[latch]
    }
}

#[async_trait]
impl LatchBus for MockLatchBus {
    async fn write_data(&mut self, value: u8) -> Result<()> {
        self.bus = value;
        self.events.push(BusEvent::Data(value));
        Ok(())
    }

    async fn strobe(&mut self, latch: usize) -> Result<()> {
        if latch >= LATCH_COUNT {
            return Err(Error::InvalidParameter(format!(
                "latch {latch} out of range"
            )));
        }
        self.latched[latch] = self.bus;
        self.events.push(BusEvent::Strobe(latch));
        Ok(())
    }

    async fn settle(&mut self) {}
}
