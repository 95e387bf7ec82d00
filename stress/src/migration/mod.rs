//! The administrative command that repartitions the table during the run.

pub mod command;
pub mod trigger;
