//! Mock USB control transport for dongle-tuner tests.
//!
//! Scripted vendor control transfers: each expected exchange pins the
//! request/value/index triple and, for IN transfers, supplies the payload
//! the device would return.

use async_trait::async_trait;
use std::collections::VecDeque;

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::ControlTransport;

/// One scripted control transfer.
#[derive(Debug, Clone)]
pub struct ControlExchange {
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// For OUT transfers: the exact payload the host must send.
    /// For IN transfers: the payload the device returns.
    pub data: Vec<u8>,
    /// Direction flag: true for IN (device-to-host).
    pub is_in: bool,
}

/// A [`ControlTransport`] implementation replaying scripted exchanges in
/// order. Any deviation (wrong request, wrong direction, wrong payload)
/// is a [`Error::Protocol`].
#[derive(Debug, Default)]
pub struct MockControlTransport {
    script: VecDeque<ControlExchange>,
    log: Vec<ControlExchange>,
}

impl MockControlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an OUT transfer carrying `data`.
    pub fn expect_out(&mut self, request: u8, value: u16, index: u16, data: &[u8]) {
        self.script.push_back(ControlExchange {
            request,
            value,
            index,
            data: data.to_vec(),
            is_in: false,
        });
    }

    /// Script an IN transfer returning `data`.
    pub fn expect_in(&mut self, request: u8, value: u16, index: u16, data: &[u8]) {
        self.script.push_back(ControlExchange {
            request,
            value,
            index,
            data: data.to_vec(),
            is_in: true,
        });
    }

    /// Every transfer the code under test performed, in order.
    pub fn log(&self) -> &[ControlExchange] {
        &self.log
    }

    /// Number of scripted exchanges not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next_exchange(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        is_in: bool,
    ) -> Result<ControlExchange> {
        let expected = self.script.pop_front().ok_or_else(|| {
            Error::Protocol(format!(
                "unscripted control transfer: request {request:#04x} value {value:#06x}"
            ))
        })?;
        if expected.request != request
            || expected.value != value
            || expected.index != index
            || expected.is_in != is_in
        {
            return Err(Error::Protocol(format!(
                "control transfer mismatch: expected {:#04x}/{:#06x}/{:#06x} (in={}), \
                 got {request:#04x}/{value:#06x}/{index:#06x} (in={is_in})",
                expected.request, expected.value, expected.index, expected.is_in
            )));
        }
        Ok(expected)
    }
}

#[async_trait]
impl ControlTransport for MockControlTransport {
    async fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize> {
        let expected = self.next_exchange(request, value, index, false)?;
        if expected.data != data {
            return Err(Error::Protocol(format!(
                "control OUT payload mismatch: expected {:02X?}, got {data:02X?}",
                expected.data
            )));
        }
        self.log.push(ControlExchange {
            request,
            value,
            index,
            data: data.to_vec(),
            is_in: false,
        });
        Ok(data.len())
    }

    async fn control_in(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize> {
        let expected = self.next_exchange(request, value, index, true)?;
        let n = expected.data.len().min(buf.len());
        buf[..n].copy_from_slice(&expected.data[..n]);
        self.log.push(ControlExchange {
            request,
            value,
            index,
            data: expected.data.clone(),
            is_in: true,
        });
        Ok(n)
    }
}
