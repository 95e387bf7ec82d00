use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, StressResult};

pub const WRITE_UNIT__BEFORE_EXECUTE: &str = "write_unit.before_execute";

/// Fails with the error kind named by the failpoint parameter when the failpoint is enabled.
///
/// Recognized parameters are `query`, `connection` and `data`; anything else fails with
/// [`ErrorKind::InjectedFault`].
pub fn stress_fail_point(name: &str) -> StressResult<()> {
    fail_point!(name, |parameter| {
        let mut error_kind = ErrorKind::InjectedFault;
        if let Some(parameter) = parameter {
            error_kind = match parameter.as_str() {
                "query" => ErrorKind::StoreQueryFailed,
                "connection" => ErrorKind::StoreConnectionFailed,
                "data" => ErrorKind::InvalidData,
                _ => ErrorKind::InjectedFault,
            }
        }

        bail!(
            error_kind,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
