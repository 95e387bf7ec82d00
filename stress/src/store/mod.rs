//! Clients executing statements against the store.

pub mod base;
pub mod memory;
pub mod postgres;
pub mod statement;

pub use base::StoreClient;
pub use statement::Statement;
