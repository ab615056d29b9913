//! Storage interfaces used by the poll service.
//!
//! MongoDB implementations live alongside [`Coll`](crate::model::mongodb::Coll).

use crate::error::Result;
use crate::model::{
    db::{candidate::NewCandidate, poll::Poll, user::User},
    mongodb::Id,
};

/// Persistence for shared candidates.
#[rocket::async_trait]
pub trait CandidateStore: Send + Sync {
    /// Atomically add `poll_id` to the candidate named exactly `name`.
    ///
    /// Returns the candidate's ID, or `None` if no candidate has that name.
    async fn attach_poll(&self, name: &str, poll_id: Id) -> Result<Option<Id>>;

    /// Insert a new candidate.
    ///
    /// Returns `None` if a candidate with the same name already exists; names
    /// must be unique even when two inserts race.
    async fn insert(&self, candidate: &NewCandidate) -> Result<Option<Id>>;
}

/// Persistence for polls and their embedded tallies.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    async fn insert(&self, poll: &Poll) -> Result<()>;

    async fn find(&self, id: Id) -> Result<Option<Poll>>;

    async fn find_by_user(&self, user: Id) -> Result<Vec<Poll>>;

    /// Atomically add one vote to the first entry for `cand_id` in the poll.
    ///
    /// Returns the new count, or `None` if the poll or the entry does not exist.
    async fn increment_vote(&self, poll_id: Id, cand_id: Id) -> Result<Option<u64>>;
}

/// Read access to user accounts.
#[rocket::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: Id) -> Result<Option<User>>;
}
