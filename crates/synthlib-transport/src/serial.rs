//! Serial port transport.
//!
//! The kit-class devices either speak a real byte protocol over the port
//! (Ten-Tec, Yaesu) or ignore the data pins entirely and are wired to the
//! port's control lines (Elektor 3/04 and friends). [`SerialTransport`]
//! serves both: byte I/O through the [`Transport`] trait, and
//! DTR/RTS/break control through its line methods.
//!
//! [`SerialControlLines`] maps the generic clock/data/strobe roles of the
//! bit-banged protocols onto those control lines, with a configurable
//! monotonic settling delay between transitions.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace};

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::{ControlLines, Transport};

/// Serial port transport.
///
/// Ports open 8N1 with no flow control, which is what every device in
/// this family uses; several of them ignore the data pins entirely and
/// only care that the port exists so its control lines can be driven.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate.
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        debug!(port = %port, baud_rate, "opening serial port");

        let mut stream = tokio_serial::new(port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| Error::Transport(format!("failed to open {port}: {e}")))?;

        // De-assert DTR and RTS immediately after opening. The OS asserts
        // DTR on open by default, and on these boards the control lines
        // reach chip-enable pins; a spurious assertion would glitch the
        // synthesizer before the first real command.
        if let Err(e) = stream.write_data_terminal_ready(false) {
            debug!(port = %port, error = %e, "could not de-assert DTR");
        }
        if let Err(e) = stream.write_request_to_send(false) {
            debug!(port = %port, error = %e, "could not de-assert RTS");
        }

        Ok(SerialTransport {
            port: Some(stream),
            port_name: port.to_string(),
        })
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        trace!(port = %self.port_name, bytes = data.len(), data = ?data, "send");

        port.write_all(data).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                Error::ConnectionLost
            } else {
                Error::Io(e)
            }
        })?;
        port.flush().await.map_err(Error::Io)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                trace!(port = %self.port_name, bytes = n, data = ?&buf[..n], "receive");
                Ok(n)
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn set_dtr(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_data_terminal_ready(on)
            .map_err(|e| Error::Transport(format!("DTR: {e}")))
    }

    async fn set_rts(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_request_to_send(on)
            .map_err(|e| Error::Transport(format!("RTS: {e}")))
    }

    async fn set_break(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        let result = if on { port.set_break() } else { port.clear_break() };
        result.map_err(|e| Error::Transport(format!("break: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            debug!(port = %self.port_name, "closing serial port");
            let _ = port.flush().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

/// Which serial control line a bit-bang role is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Dtr,
    Rts,
    Break,
}

/// Adapter exposing a serial port's control lines as [`ControlLines`].
///
/// The stock wiring (clock on the TX line via break, data on RTS, strobe
/// on DTR) matches the Elektor receiver boards; other boards can remap.
/// Every transition is followed by `settle`, slept on the monotonic
/// clock -- the per-chip constant replaces the old calibrated busy-loops,
/// which were never reliable across CPU generations.
pub struct SerialControlLines<T: Transport> {
    transport: T,
    clock: LineRole,
    data: LineRole,
    strobe: LineRole,
    settle: Duration,
}

impl<T: Transport> SerialControlLines<T> {
    /// Wrap a transport with the stock Elektor wiring and the given
    /// settle time.
    pub fn new(transport: T, settle: Duration) -> Self {
        SerialControlLines {
            transport,
            clock: LineRole::Break,
            data: LineRole::Rts,
            strobe: LineRole::Dtr,
            settle,
        }
    }

    /// Remap the three roles onto different control lines.
    pub fn with_mapping(mut self, clock: LineRole, data: LineRole, strobe: LineRole) -> Self {
        self.clock = clock;
        self.data = data;
        self.strobe = strobe;
        self
    }

    /// Access the wrapped transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    async fn drive(&mut self, role: LineRole, high: bool) -> Result<()> {
        match role {
            LineRole::Dtr => self.transport.set_dtr(high).await,
            LineRole::Rts => self.transport.set_rts(high).await,
            LineRole::Break => self.transport.set_break(high).await,
        }
    }
}

#[async_trait]
impl<T: Transport> ControlLines for SerialControlLines<T> {
    async fn set_clock(&mut self, high: bool) -> Result<()> {
        let role = self.clock;
        self.drive(role, high).await
    }

    async fn set_data(&mut self, high: bool) -> Result<()> {
        let role = self.data;
        self.drive(role, high).await
    }

    async fn set_strobe(&mut self, high: bool) -> Result<()> {
        let role = self.strobe;
        self.drive(role, high).await
    }

    async fn settle(&mut self) {
        tokio::time::sleep(self.settle).await;
    }
}
