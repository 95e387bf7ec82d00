//! Utilities for testing stress runs.
//!
//! - [`config`] builds small driver configurations backed by the in-memory store.
//! - [`outcome`] records unit outcomes and waits for them.
//! - [`store`] wraps store clients to slow them down and measure their concurrency.
//! - [`command`] fakes the migration command.

pub mod command;
pub mod config;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod outcome;
pub mod store;
