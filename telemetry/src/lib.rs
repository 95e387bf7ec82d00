//! Tracing setup shared by the driver binary and the test suites.

pub mod tracing;

pub use crate::tracing::{LogFlusher, TracingError, init_test_tracing, init_tracing};
