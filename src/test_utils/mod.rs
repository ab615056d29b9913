//! Shared test helpers.

pub mod mocks;

/// Route this crate's logging to the test output.
pub fn init_logging() {
    log4rs_test_utils::test_logging::init_logging_once_for(["polls_backend"], None, None);
}
