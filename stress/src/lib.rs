//! Stress workload driver for distributed stores.
//!
//! A run provisions a fresh schema, floods the store with generated writes through a bounded
//! [`workers::pool::WorkerPool`], submits a single administrative migration command at a fixed
//! position of the submission sequence and finally waits, bounded by a timeout, for outstanding
//! work to finish. Failures of individual units are recorded and never stop the run.

pub mod coordinator;
pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
mod macros;
pub mod migration;
pub mod provision;
pub mod run;
pub mod shutdown;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
pub mod workload;
