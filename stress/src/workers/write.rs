use std::future::Future;
use tracing::debug;

use config::shared::SchemaConfig;

use crate::error::StressResult;
#[cfg(feature = "failpoints")]
use crate::failpoints::{WRITE_UNIT__BEFORE_EXECUTE, stress_fail_point};
use crate::store::{Statement, StoreClient};
use crate::types::WriteTask;
use crate::workers::base::{UnitKind, UnitOfWork};

/// Inserts one generated row.
#[derive(Debug)]
pub struct WriteUnit<C> {
    index: u64,
    statement: Statement,
    client: C,
}

impl<C> WriteUnit<C>
where
    C: StoreClient,
{
    pub fn new(client: C, schema: &SchemaConfig, task: WriteTask) -> Self {
        Self {
            index: task.index(),
            statement: Statement::insert(schema, task),
            client,
        }
    }
}

impl<C> UnitOfWork for WriteUnit<C>
where
    C: StoreClient,
{
    fn kind(&self) -> UnitKind {
        UnitKind::Write { index: self.index }
    }

    fn run(self) -> impl Future<Output = StressResult<()>> + Send + 'static {
        async move {
            #[cfg(feature = "failpoints")]
            stress_fail_point(WRITE_UNIT__BEFORE_EXECUTE)?;

            debug!(index = self.index, statement = %self.statement, "executing write");
            self.client.execute(&self.statement).await
        }
    }
}
