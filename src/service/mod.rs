//! Poll creation and vote casting.

use std::future::Future;
use std::time::Duration;

use rocket::tokio::time::timeout;

use crate::error::{Error, Result};

pub mod polls;
pub mod ports;
pub mod resolver;

pub use polls::{CastVote, CreatePoll, PollService, VoteCount};
pub use resolver::CandidateResolver;

/// Settings for [`PollService`], normally taken from [`Config`](crate::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Upper bound on every individual storage call.
    pub storage_timeout: Option<Duration>,
    /// How many times a candidate name is looked up and created before a
    /// creation race is reported as a conflict.
    pub resolve_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_timeout: None,
            resolve_attempts: 3,
        }
    }
}

/// Optional time limit applied to storage calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Duration>);

impl Deadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Self(limit)
    }

    /// Await the given storage call, failing with [`Error::StorageTimeout`]
    /// if it takes too long. A timed-out call may still have committed.
    pub async fn run<T, F>(self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.0 {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(Error::StorageTimeout(limit)),
            },
            None => call.await,
        }
    }
}
