//! Error types for synthlib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! solver-layer errors are all captured here.

/// The error type for all synthlib operations.
///
/// Variants cover the full range of failure modes encountered when
/// programming synthesizer chips and talking to command-language rigs:
/// physical transport failures, response validation errors, timeouts,
/// and divider searches that come up empty.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, USB control transfer).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed response, bad echo, wrong length).
    ///
    /// Distinct from [`Error::Timeout`] so callers can tell "device silent"
    /// apart from "device confused".
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response from the device.
    ///
    /// This typically indicates the device is powered off, the baud rate is
    /// wrong, or the cable is unplugged.
    #[error("timeout waiting for response")]
    Timeout,

    /// The frequency solver found no divider combination that keeps the
    /// synthesizer's VCO inside its documented operating range.
    ///
    /// This is a pure-computation failure; no register write is attempted.
    #[error("no divider solution: {0}")]
    NoSolution(String),

    /// The requested operation is not supported by this device or transport.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a device command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
