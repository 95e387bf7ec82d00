use std::sync::Arc;

use stress::error::ErrorKind;
use stress::failpoints::WRITE_UNIT__BEFORE_EXECUTE;
use stress::run::StressRun;
use stress::store::memory::MemoryStoreClient;
use stress::test_utils::command::FakeCommandRunner;
use stress::test_utils::config::TestDriverConfigBuilder;
use stress::test_utils::failpoints::CustomFailScenario;
use stress::test_utils::outcome::MemoryOutcomeSink;
use telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn injected_write_failures_are_recorded_and_the_run_continues() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(WRITE_UNIT__BEFORE_EXECUTE, "3*return(query)")]);

    let config = Arc::new(
        TestDriverConfigBuilder::new()
            .row_count(10)
            .workers(2)
            .migration_position(5)
            .build(),
    );
    let store = MemoryStoreClient::new();
    let sink = MemoryOutcomeSink::new();

    let summary = StressRun::new(config, store.clone(), FakeCommandRunner::succeeding(&[]))
        .with_outcome_sink(sink.clone())
        .run()
        .await
        .unwrap();

    assert!(!summary.drain.timed_out);
    assert_eq!(summary.drain.stats.writes_failed, 3);
    assert_eq!(summary.drain.stats.writes_succeeded, 7);
    assert_eq!(summary.drain.stats.migrations_succeeded, 1);

    let failed = sink.failed_writes();
    assert_eq!(failed.len(), 3);
    for index in failed {
        let outcome = sink.write_outcome(index).unwrap();
        assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::StoreQueryFailed);
    }

    let rows = store.rows("testkeyspace", "testcf").await.unwrap();
    assert_eq!(rows.len(), 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn migration_runs_even_when_every_write_fails() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(WRITE_UNIT__BEFORE_EXECUTE, "return(connection)")]);

    let config = Arc::new(TestDriverConfigBuilder::new().row_count(6).migration_position(2).build());
    let store = MemoryStoreClient::new();
    let runner = FakeCommandRunner::succeeding(&["started"]);
    let sink = MemoryOutcomeSink::new();

    let summary = StressRun::new(config, store.clone(), runner.clone())
        .with_outcome_sink(sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.drain.stats.writes_failed, 6);
    assert_eq!(summary.drain.stats.migrations_succeeded, 1);
    assert_eq!(runner.invocations().len(), 1);
    assert_eq!(store.rows("testkeyspace", "testcf").await, Some(vec![]));
}
