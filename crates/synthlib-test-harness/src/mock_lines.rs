//! Mock control lines for bit-bang waveform assertions.
//!
//! Records every clock/data/strobe transition so tests can assert the
//! exact waveform a register write produces, bit by bit.

use async_trait::async_trait;

use synthlib_core::error::Result;
use synthlib_core::transport::ControlLines;

/// One recorded line transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Clock(bool),
    Data(bool),
    Strobe(bool),
}

/// A [`ControlLines`] implementation that records transitions instead of
/// driving hardware. `settle` is a no-op (and counted), keeping tests
/// fast.
#[derive(Debug, Default)]
pub struct MockControlLines {
    events: Vec<LineEvent>,
    settle_count: usize,
}

impl MockControlLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transition recorded so far, in order.
    pub fn events(&self) -> &[LineEvent] {
        &self.events
    }

    /// How many settle delays the writer inserted.
    pub fn settle_count(&self) -> usize {
        self.settle_count
    }

    /// The sequence of data-line states sampled at each rising clock
    /// edge -- i.e. the bits the chip would have shifted in.
    pub fn clocked_bits(&self) -> Vec<bool> {
        let mut bits = Vec::new();
        let mut data = false;
        for event in &self.events {
            match event {
                LineEvent::Data(d) => data = *d,
                LineEvent::Clock(true) => bits.push(data),
                _ => {}
            }
        }
        bits
    }
}

#[async_trait]
impl ControlLines for MockControlLines {
    async fn set_clock(&mut self, high: bool) -> Result<()> {
        self.events.push(LineEvent::Clock(high));
        Ok(())
    }

    async fn set_data(&mut self, high: bool) -> Result<()> {
        self.events.push(LineEvent::Data(high));
        Ok(())
    }

    async fn set_strobe(&mut self, high: bool) -> Result<()> {
        self.events.push(LineEvent::Strobe(high));
        Ok(())
    }

    async fn settle(&mut self) {
        self.settle_count += 1;
    }
}
