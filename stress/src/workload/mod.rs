//! Generation of the write workload and of the submission sequence.

pub mod generator;
pub mod sequence;
