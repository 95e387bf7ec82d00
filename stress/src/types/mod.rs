//! Data types flowing through a stress run.
//!
//! Includes the values of generated rows, the write tasks carrying them and the request
//! describing the migration command.

mod migration;
mod task;
mod value;

pub use migration::*;
pub use task::*;
pub use value::*;

pub use config::shared::ColumnType;
