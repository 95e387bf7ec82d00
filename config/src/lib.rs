//! Configuration for the repartition stress driver.
//!
//! Holds the configuration types shared by the driver binary and the core library, together
//! with the layered loader that reads them from `configuration/` files and `APP_` environment
//! variables.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
