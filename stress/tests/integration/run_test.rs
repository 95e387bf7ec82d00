use std::sync::Arc;
use std::time::Duration;

use stress::error::{ErrorKind, StressResult};
use stress::run::{RunPhase, StressRun};
use stress::stress_error;
use stress::store::memory::MemoryStoreClient;
use stress::store::{Statement, StoreClient};
use stress::test_utils::command::FakeCommandRunner;
use stress::test_utils::config::TestDriverConfigBuilder;
use stress::test_utils::outcome::MemoryOutcomeSink;
use stress::types::Value;
use stress::workers::base::UnitKind;
use telemetry::init_test_tracing;

const MALFORMED_ROWS: [u64; 2] = [2, 7];

fn synthesize_with_malformed_rows(index: u64) -> Vec<Value> {
    let first = index as i64;
    let third = if MALFORMED_ROWS.contains(&index) {
        // Wrong type for the varchar column.
        Value::BigInt(first)
    } else {
        Value::Text(format!("testcf-{index:05}"))
    };

    vec![
        Value::BigInt(first),
        Value::BigInt(first + 1_000_000),
        third,
        Value::Int(index as i32),
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn run_completes_despite_failing_trigger_and_malformed_writes() {
    init_test_tracing();

    let timeout = Duration::from_secs(10);
    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(10)
            .workers(2)
            .migration_position(5)
            .drain_timeout(timeout)
            .build(),
    );
    let store = MemoryStoreClient::new();
    let runner = FakeCommandRunner::failing_to_start();
    let sink = MemoryOutcomeSink::new();

    let run = StressRun::new(config, store.clone(), runner.clone()).with_outcome_sink(sink.clone());
    let phases = run.subscribe();
    let summary = run.run_with(synthesize_with_malformed_rows).await.unwrap();

    let mut expected: Vec<UnitKind> = (0..=5).map(|index| UnitKind::Write { index }).collect();
    expected.push(UnitKind::Migration);
    expected.extend((6..10).map(|index| UnitKind::Write { index }));
    assert_eq!(summary.submission.submitted, expected);
    assert_eq!(summary.submission.write_before_migration(), Some(5));

    let drain = summary.drain;
    assert!(!drain.timed_out);
    assert!(drain.elapsed < timeout);
    assert_eq!(drain.outstanding, 0);
    assert_eq!(drain.stats.submitted, 11);
    assert_eq!(drain.stats.completed(), 11);
    assert_eq!(drain.stats.writes_failed, 2);
    assert_eq!(drain.stats.migrations_failed, 1);

    assert_eq!(sink.len(), 11);
    assert_eq!(sink.failed_writes(), MALFORMED_ROWS.to_vec());
    let migrations = sink.migration_outcomes();
    assert_eq!(migrations.len(), 1);
    assert_eq!(
        migrations[0].result.as_ref().unwrap_err().kind(),
        ErrorKind::CommandSpawnFailed
    );
    assert_eq!(runner.invocations().len(), 1);

    let rows = store.rows("testkeyspace", "testcf").await.unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(*phases.borrow(), RunPhase::Terminated);
}

#[tokio::test(flavor = "multi_thread")]
async fn default_rows_follow_the_column_types() {
    init_test_tracing();

    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(50)
            .workers(4)
            .migration_position(50)
            .build(),
    );
    let store = MemoryStoreClient::new();
    let runner = FakeCommandRunner::succeeding(&["repartitioning done"]);
    let sink = MemoryOutcomeSink::new();

    let summary = StressRun::new(config, store.clone(), runner)
        .with_outcome_sink(sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.submission.submitted.last(), Some(&UnitKind::Migration));
    assert_eq!(summary.drain.stats.writes_succeeded, 50);
    assert_eq!(summary.drain.stats.migrations_succeeded, 1);
    assert!(summary.drain.stats.peak_concurrency <= 4);

    let rows = store.rows("testkeyspace", "testcf").await.unwrap();
    assert_eq!(rows.len(), 50);
    assert_eq!(rows[3][0], Value::BigInt(3));
    assert_eq!(rows[3][1], Value::BigInt(1_000_003));
    assert_eq!(rows[3][2], Value::Text("testcf-00003".to_string()));
    assert!(matches!(rows[3][3], Value::Int(_)));
    assert_eq!(store.replication_factor("testkeyspace").await, Some(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn rerunning_over_a_leftover_keyspace_starts_from_an_empty_table() {
    init_test_tracing();

    let store = MemoryStoreClient::new();

    let first = Arc::new(TestDriverConfigBuilder::new().row_count(10).build());
    StressRun::new(first, store.clone(), FakeCommandRunner::succeeding(&[]))
        .with_outcome_sink(MemoryOutcomeSink::new())
        .run()
        .await
        .unwrap();
    assert_eq!(store.rows("testkeyspace", "testcf").await.map(|rows| rows.len()), Some(10));

    let second = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(0)
            .migration_position(0)
            .build(),
    );
    let runner = FakeCommandRunner::succeeding(&[]);
    let summary = StressRun::new(second, store.clone(), runner.clone())
        .with_outcome_sink(MemoryOutcomeSink::new())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.submission.submitted, vec![UnitKind::Migration]);
    assert_eq!(runner.invocations().len(), 1);
    assert_eq!(store.rows("testkeyspace", "testcf").await, Some(vec![]));
}

/// Store rejecting every statement as if no node were reachable.
#[derive(Debug, Clone)]
struct UnreachableStore;

impl StoreClient for UnreachableStore {
    fn name() -> &'static str {
        "unreachable"
    }

    async fn execute(&self, _statement: &Statement) -> StressResult<()> {
        Err(stress_error!(
            ErrorKind::StoreConnectionFailed,
            "No store node is reachable"
        ))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_failures_abort_the_run() {
    init_test_tracing();

    let config = Arc::new(TestDriverConfigBuilder::new().build());
    let runner = FakeCommandRunner::succeeding(&[]);
    let run = StressRun::new(config, UnreachableStore, runner.clone());
    let phases = run.subscribe();

    let err = run.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreConnectionFailed);
    assert_eq!(*phases.borrow(), RunPhase::Provisioning);
    assert!(runner.invocations().is_empty());
}
