//! Units of work and the bounded pool executing them.

pub mod base;
pub mod migration;
pub mod outcome;
pub mod pool;
pub mod write;
