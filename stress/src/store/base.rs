use std::future::Future;

use crate::error::StressResult;
use crate::store::statement::Statement;

/// Client able to execute [`Statement`]s against a store.
///
/// A single client is shared by every worker slot of a run, so implementations must be cheap to
/// clone and safe to use concurrently. Clones share the same underlying connection.
pub trait StoreClient: Clone + Send + Sync + 'static {
    /// Returns the name of the store implementation.
    fn name() -> &'static str;

    /// Executes a single statement.
    ///
    /// Executing an insert with malformed values must fail with an error rather than panic, since
    /// a failed write is an expected outcome of a stress run.
    fn execute(&self, statement: &Statement) -> impl Future<Output = StressResult<()>> + Send;
}
