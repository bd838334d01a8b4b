//! The transaction engine: write, read, validate, retry.
//!
//! One transaction moves through `Idle -> Sent -> AwaitingResponse` and
//! ends `Validated`, `Retrying` (back to `Sent`), or `TimedOut`. The
//! engine owns none of the transport; callers pass a mutable reference
//! for the duration of the exchange, which also guarantees transactions
//! on one session cannot interleave.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::Transport;

use crate::shape::ResponseShape;

/// What went wrong on the last failed attempt; decides the final error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// The bounded read never completed.
    TimedOut,
    /// A complete response arrived but failed shape validation.
    Invalid,
}

/// Generic command/response transaction executor.
///
/// `retry_budget` counts *retries*: a budget of 3 allows four attempts in
/// total. Commands whose prefix appears in the forced-response set are
/// rejected outright when called with [`ResponseShape::None`] -- a read
/// query with no response expectation would otherwise report success
/// without ever looking at the wire.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    timeout: Duration,
    retry_budget: u32,
    forced_response_prefixes: Vec<Vec<u8>>,
}

impl TransactionEngine {
    /// Create an engine with the given per-read timeout and retry budget.
    pub fn new(timeout: Duration, retry_budget: u32) -> Self {
        TransactionEngine {
            timeout,
            retry_budget,
            forced_response_prefixes: Vec::new(),
        }
    }

    /// Register a command prefix that always expects a response.
    pub fn with_forced_response_prefix(mut self, prefix: &[u8]) -> Self {
        self.forced_response_prefixes.push(prefix.to_vec());
        self
    }

    /// The configured per-read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured retry budget.
    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    /// Execute one transaction: flush, write, read, validate, retry.
    ///
    /// Returns the raw validated response bytes (empty for
    /// [`ResponseShape::None`]). Transport I/O errors abort immediately;
    /// timeouts and validation failures consume the retry budget first.
    pub async fn transact(
        &self,
        transport: &mut dyn Transport,
        cmd: &[u8],
        shape: &ResponseShape,
    ) -> Result<Vec<u8>> {
        if *shape == ResponseShape::None && self.requires_response(cmd) {
            return Err(Error::InvalidParameter(format!(
                "command {cmd:02X?} always produces a response; caller passed no response shape"
            )));
        }

        let mut last_failure = FailureKind::TimedOut;
        let mut last_reason = String::new();

        for attempt in 0..=self.retry_budget {
            if attempt > 0 {
                debug!(attempt, "transaction retry");
                tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
            }

            // Stale bytes from a previous exchange (or from the failed
            // attempt we are recovering from) must not be mistaken for
            // the new response.
            transport.flush_input().await?;
            transport.send(cmd).await?;
            trace!(attempt, cmd = ?cmd, "command sent");

            if *shape == ResponseShape::None {
                return Ok(Vec::new());
            }

            match self.read_response(transport, cmd, shape).await {
                Ok(response) => match shape.validate(cmd, &response) {
                    Ok(()) => {
                        trace!(attempt, len = response.len(), "response validated");
                        return Ok(response);
                    }
                    Err(reason) => {
                        debug!(attempt, %reason, "response failed validation");
                        last_failure = FailureKind::Invalid;
                        last_reason = reason;
                    }
                },
                Err(Error::Timeout) => {
                    debug!(attempt, "response timed out");
                    last_failure = FailureKind::TimedOut;
                }
                Err(e) => return Err(e),
            }
        }

        match last_failure {
            FailureKind::TimedOut => Err(Error::Timeout),
            FailureKind::Invalid => Err(Error::Protocol(format!(
                "retry budget exhausted: {last_reason}"
            ))),
        }
    }

    /// Accumulate one response per the shape, bounded by the timeout.
    async fn read_response(
        &self,
        transport: &mut dyn Transport,
        cmd: &[u8],
        shape: &ResponseShape,
    ) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;
        let mut response = Vec::new();
        let mut buf = [0u8; 256];

        loop {
            if let Some(complete) = self.take_complete(&response, cmd, shape) {
                return Ok(complete);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }

            let n = transport.receive(&mut buf, remaining).await?;
            response.extend_from_slice(&buf[..n]);
        }
    }

    /// If `accumulated` already holds a complete response for the shape,
    /// split it out.
    fn take_complete(
        &self,
        accumulated: &[u8],
        cmd: &[u8],
        shape: &ResponseShape,
    ) -> Option<Vec<u8>> {
        match shape {
            ResponseShape::Line { terminator, .. } => accumulated
                .iter()
                .position(|b| b == terminator)
                .map(|pos| accumulated[..=pos].to_vec()),
            _ => {
                let want = shape.fixed_read_len(cmd)?;
                (accumulated.len() >= want).then(|| accumulated[..want].to_vec())
            }
        }
    }

    fn requires_response(&self, cmd: &[u8]) -> bool {
        self.forced_response_prefixes
            .iter()
            .any(|p| cmd.starts_with(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthlib_test_harness::MockTransport;

    fn engine() -> TransactionEngine {
        TransactionEngine::new(Duration::from_millis(50), 3)
    }

    // -------------------------------------------------------------------
    // Success paths
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn write_only_command_returns_immediately() {
        let mut mock = MockTransport::new();
        mock.expect(b"*W\r", b"");

        let response = engine()
            .transact(&mut mock, b"*W\r", &ResponseShape::None)
            .await
            .unwrap();
        assert!(response.is_empty());
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn line_response_first_try() {
        let mut mock = MockTransport::new();
        mock.expect(b"?A\r", b"A1234\r");

        let response = engine()
            .transact(&mut mock, b"?A\r", &ResponseShape::line_exact(b'\r', 6))
            .await
            .unwrap();
        assert_eq!(response, b"A1234\r");
    }

    #[tokio::test]
    async fn fixed_response_first_try() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01, 0x02], &[0xAA, 0xBB, 0xCC]);

        let response = engine()
            .transact(&mut mock, &[0x01, 0x02], &ResponseShape::fixed(3))
            .await
            .unwrap();
        assert_eq!(response, [0xAA, 0xBB, 0xCC]);
    }

    #[tokio::test]
    async fn echo_response_validated() {
        let cmd = [0x00, 0x00, 0x00, 0x01, 0x05];
        let mut mock = MockTransport::new();
        mock.expect(&cmd, &cmd);

        let response = engine()
            .transact(&mut mock, &cmd, &ResponseShape::Echo)
            .await
            .unwrap();
        assert_eq!(response, cmd);
    }

    // -------------------------------------------------------------------
    // Retry behavior
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn bad_response_then_good_succeeds() {
        let mut mock = MockTransport::new();
        // Two malformed (short) lines, then a valid one: still a success,
        // and the final state is indistinguishable from a first-try pass.
        mock.expect(b"?A\r", b"A1\r");
        mock.expect(b"?A\r", b"A\r");
        mock.expect(b"?A\r", b"A1234\r");

        let response = engine()
            .transact(&mut mock, b"?A\r", &ResponseShape::line_exact(b'\r', 6))
            .await
            .unwrap();
        assert_eq!(response, b"A1234\r");
        assert_eq!(mock.sent_data().len(), 3);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn wrong_length_exhausts_budget_as_protocol_error() {
        let mut mock = MockTransport::new();
        // Budget 3 = four attempts, all answered with the wrong length.
        for _ in 0..4 {
            mock.expect(b"?A\r", b"A1\r");
        }

        let err = engine()
            .transact(&mut mock, b"?A\r", &ResponseShape::line_exact(b'\r', 6))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
        assert_eq!(mock.sent_data().len(), 4);
    }

    #[tokio::test]
    async fn silence_exhausts_budget_as_timeout() {
        let mut mock = MockTransport::new();
        for _ in 0..4 {
            mock.expect(b"?A\r", b"");
        }

        let err = engine()
            .transact(&mut mock, b"?A\r", &ResponseShape::line(b'\r'))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout), "got {err:?}");
        assert_eq!(mock.sent_data().len(), 4);
    }

    #[tokio::test]
    async fn echo_mismatch_is_protocol_error() {
        let cmd = [0x00, 0x00, 0x00, 0x01, 0x05];
        let wrong = [0x00, 0x00, 0x00, 0x02, 0x05];
        let mut mock = MockTransport::new();
        for _ in 0..4 {
            mock.expect(&cmd, &wrong);
        }

        let err = engine()
            .transact(&mut mock, &cmd, &ResponseShape::Echo)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn stale_input_is_flushed_before_sending() {
        let mut mock = MockTransport::new();
        // A prior exchange left trailing bytes queued on the link.
        mock.prime_input(b"JUNK\r");
        mock.expect(b"?A\r", b"A1234\r");

        let response = engine()
            .transact(&mut mock, b"?A\r", &ResponseShape::line_exact(b'\r', 6))
            .await
            .unwrap();
        assert_eq!(response, b"A1234\r");
    }

    // -------------------------------------------------------------------
    // Forced-response guard
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn read_query_without_shape_is_rejected() {
        let mut mock = MockTransport::new();
        let engine = engine().with_forced_response_prefix(b"?");

        let err = engine
            .transact(&mut mock, b"?A\r", &ResponseShape::None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        // Nothing may reach the wire.
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn non_query_without_shape_is_fine() {
        let mut mock = MockTransport::new();
        mock.expect(b"*W\r", b"");
        let engine = engine().with_forced_response_prefix(b"?");

        engine
            .transact(&mut mock, b"*W\r", &ResponseShape::None)
            .await
            .unwrap();
    }
}
