mod base;
mod driver;
mod migration;
mod schema;
mod store;
mod workload;

pub use base::*;
pub use driver::*;
pub use migration::*;
pub use schema::*;
pub use store::*;
pub use workload::*;
