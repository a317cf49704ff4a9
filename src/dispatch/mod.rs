//! Concurrent per-project test execution

pub mod dispatcher;
pub mod executor;

pub use dispatcher::{run_tests_on, work_set};
pub use executor::{EXIT_DISPATCH_FAILED, EXIT_TIMED_OUT, TestCommand, TestedProject};
