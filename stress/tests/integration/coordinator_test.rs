use std::sync::Arc;
use std::time::Duration;

use stress::coordinator::Coordinator;
use stress::error::ErrorKind;
use stress::migration::trigger::MigrationTrigger;
use stress::store::memory::MemoryStoreClient;
use stress::test_utils::command::{FakeCommandBehavior, FakeCommandRunner};
use stress::test_utils::config::TestDriverConfigBuilder;
use stress::test_utils::outcome::MemoryOutcomeSink;
use stress::test_utils::store::InstrumentedStoreClient;
use stress::types::Value;
use stress::workers::base::UnitKind;
use stress::workers::pool::WorkerPool;
use stress::workload::generator::{ColumnSynthesizer, TaskGenerator};
use stress::provision::provision_schema;
use telemetry::init_test_tracing;

fn expected_order(row_count: u64, position: u64) -> Vec<UnitKind> {
    let mut expected = Vec::new();
    for index in 0..row_count {
        expected.push(UnitKind::Write { index });
        if index == position {
            expected.push(UnitKind::Migration);
        }
    }
    if position == row_count {
        expected.push(UnitKind::Migration);
    }
    expected
}

#[tokio::test(flavor = "multi_thread")]
async fn writes_are_submitted_in_order_with_one_migration_after_the_position() {
    init_test_tracing();

    for (row_count, workers, position) in [(20, 3, 7), (5, 1, 0), (5, 2, 5), (0, 2, 0)] {
        let config = Arc::new(
            TestDriverConfigBuilder::new()
                .row_count(row_count)
                .workers(workers)
                .migration_position(position)
                .build(),
        );
        let store = MemoryStoreClient::new();
        provision_schema(&store, &config.schema).await.unwrap();

        let sink = MemoryOutcomeSink::new();
        let pool = WorkerPool::new(usize::from(workers), sink.clone()).unwrap();
        let runner = FakeCommandRunner::succeeding(&["repartitioning started"]);
        let trigger = MigrationTrigger::new(runner.clone(), config.migration.clone());
        let coordinator = Coordinator::new(config.clone(), pool.clone(), store.clone(), trigger);

        let synthesizer = ColumnSynthesizer::with_seed(&config.schema, 1_000_000, 1);
        let report = coordinator.run(TaskGenerator::new(row_count, synthesizer));

        assert_eq!(report.submitted, expected_order(row_count, position));
        assert_eq!(report.writes() as u64, row_count);
        assert_eq!(report.migrations(), 1);

        let drain = pool.drain(Duration::from_secs(10)).await;
        assert!(!drain.timed_out);
        assert_eq!(drain.stats.completed(), row_count + 1);
        assert_eq!(sink.len() as u64, row_count + 1);

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(
            invocations[0].to_string(),
            r#"/opt/cassandra/bin/nodetool -p 7100 -m {"column":"col1"} morphous testkeyspace testcf"#
        );

        let rows = store.rows("testkeyspace", "testcf").await.unwrap();
        assert_eq!(rows.len() as u64, row_count);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn no_more_units_than_workers_run_at_once() {
    init_test_tracing();

    let workers = 3;
    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(30)
            .workers(workers)
            .migration_position(15)
            .build(),
    );
    let store = InstrumentedStoreClient::new(MemoryStoreClient::new(), Duration::from_millis(10));
    provision_schema(&store, &config.schema).await.unwrap();

    let sink = MemoryOutcomeSink::new();
    let pool = WorkerPool::new(usize::from(workers), sink.clone()).unwrap();
    let runner = FakeCommandRunner::new(FakeCommandBehavior::Succeed {
        lines: vec![],
        delay: Duration::from_millis(50),
    });
    let trigger = MigrationTrigger::new(runner, config.migration.clone());
    let coordinator = Coordinator::new(config.clone(), pool.clone(), store.clone(), trigger);

    let synthesizer = ColumnSynthesizer::with_seed(&config.schema, 1_000_000, 2);
    coordinator.run(TaskGenerator::new(30, synthesizer));

    let drain = pool.drain(Duration::from_secs(10)).await;
    assert!(!drain.timed_out);
    assert!(drain.stats.peak_concurrency <= usize::from(workers));
    assert!(store.gauge().peak() <= usize::from(workers));
    assert_eq!(store.gauge().total(), 30);
    assert_eq!(store.gauge().current(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_writes_do_not_stop_later_writes() {
    init_test_tracing();

    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(12)
            .workers(2)
            .migration_position(3)
            .build(),
    );
    let store = MemoryStoreClient::new();
    provision_schema(&store, &config.schema).await.unwrap();

    let sink = MemoryOutcomeSink::new();
    let pool = WorkerPool::new(2, sink.clone()).unwrap();
    let trigger = MigrationTrigger::new(
        FakeCommandRunner::succeeding(&[]),
        config.migration.clone(),
    );
    let coordinator = Coordinator::new(config.clone(), pool.clone(), store.clone(), trigger);

    // Even rows carry text in a bigint column and are rejected by the store.
    let synthesizer = |index: u64| {
        let second = if index % 2 == 0 {
            Value::Text("not a number".to_string())
        } else {
            Value::BigInt(index as i64 + 1_000_000)
        };
        vec![
            Value::BigInt(index as i64),
            second,
            Value::Text(format!("testcf-{index:05}")),
            Value::Int(0),
        ]
    };
    let report = coordinator.run(TaskGenerator::new(12, synthesizer));
    assert_eq!(report.writes(), 12);

    let drain = pool.drain(Duration::from_secs(10)).await;
    assert_eq!(drain.stats.writes_failed, 6);
    assert_eq!(drain.stats.writes_succeeded, 6);
    assert_eq!(drain.stats.migrations_succeeded, 1);

    assert_eq!(sink.failed_writes(), vec![0, 2, 4, 6, 8, 10]);
    let failed = sink.write_outcome(10).unwrap();
    assert_eq!(failed.result.unwrap_err().kind(), ErrorKind::ConversionError);

    let rows = store.rows("testkeyspace", "testcf").await.unwrap();
    let keys: Vec<Value> = rows.into_iter().map(|row| row[0].clone()).collect();
    assert_eq!(
        keys,
        [1, 3, 5, 7, 9, 11]
            .into_iter()
            .map(Value::BigInt)
            .collect::<Vec<_>>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn hanging_migration_holds_its_slot_until_the_drain_times_out() {
    init_test_tracing();

    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(3)
            .workers(1)
            .migration_position(0)
            .build(),
    );
    let store = MemoryStoreClient::new();
    provision_schema(&store, &config.schema).await.unwrap();

    let sink = MemoryOutcomeSink::new();
    let pool = WorkerPool::new(1, sink.clone()).unwrap();
    let trigger = MigrationTrigger::new(FakeCommandRunner::hanging(), config.migration.clone());
    let coordinator = Coordinator::new(config.clone(), pool.clone(), store.clone(), trigger);

    let synthesizer = ColumnSynthesizer::with_seed(&config.schema, 1_000_000, 3);
    coordinator.run(TaskGenerator::new(3, synthesizer));

    // Write 0 takes the only slot first, the migration then keeps it forever.
    sink.wait_for_outcomes(1).await;

    let timeout = Duration::from_millis(200);
    let drain = pool.drain(timeout).await;

    assert!(drain.timed_out);
    assert!(drain.elapsed < timeout + Duration::from_secs(1));
    assert_eq!(drain.outstanding, 3);
    assert_eq!(drain.stats.writes_succeeded, 1);
    assert_eq!(drain.stats.running, 1);
    assert!(sink.migration_outcomes().is_empty());
}
