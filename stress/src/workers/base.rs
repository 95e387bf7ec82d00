use std::fmt;
use std::future::Future;

use crate::error::StressResult;

/// Classification of the units of work executed by the pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Insertion of the row generated at `index`.
    Write { index: u64 },
    /// Execution of the migration command.
    Migration,
}

impl UnitKind {
    pub fn is_write(&self) -> bool {
        matches!(self, UnitKind::Write { .. })
    }

    pub fn is_migration(&self) -> bool {
        matches!(self, UnitKind::Migration)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Write { index } => write!(f, "write {index}"),
            UnitKind::Migration => f.write_str("migration"),
        }
    }
}

/// A self-contained piece of work submitted to the [`crate::workers::pool::WorkerPool`].
///
/// Units are consumed when they run. Errors returned by [`UnitOfWork::run`], as well as panics,
/// are caught by the pool and reported as outcomes; they never reach the submitter.
pub trait UnitOfWork: Send + 'static {
    /// Returns what kind of work the unit performs.
    fn kind(&self) -> UnitKind;

    /// Returns the future performing the work.
    ///
    /// Called at submission time, so no work may happen before the future is first polled.
    fn run(self) -> impl Future<Output = StressResult<()>> + Send + 'static;
}
