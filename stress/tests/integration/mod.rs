mod coordinator_test;
mod run_test;
