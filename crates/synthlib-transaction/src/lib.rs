//! synthlib-transaction: one command, one validated response, bounded retries.
//!
//! Command-language rigs are talked to through exchanges of the form
//! "write a command, maybe read a response, check that the response has
//! the right shape". Real hardware occasionally answers late, short, or
//! with a stale response left over from an earlier confused exchange; a
//! single-shot write/read is not enough. The [`TransactionEngine`] adds
//! the recovery discipline every backend needs:
//!
//! 1. flush stale input,
//! 2. write the command in full,
//! 3. read up to a terminator or a fixed length, bounded by a timeout,
//! 4. validate the response shape,
//! 5. on a bad response, purge and re-issue, up to the retry budget.
//!
//! Exhausting the budget yields [`Error::Timeout`] when the device went
//! silent and [`Error::Protocol`] when it kept answering wrongly, so
//! callers can tell the two apart.
//!
//! [`Error::Timeout`]: synthlib_core::Error::Timeout
//! [`Error::Protocol`]: synthlib_core::Error::Protocol

pub mod engine;
pub mod shape;

pub use engine::TransactionEngine;
pub use shape::ResponseShape;
