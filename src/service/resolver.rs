use std::future::Future;
use std::sync::Arc;

use log::debug;
use rocket::futures::future::try_join_all;

use crate::error::{Error, Result};
use crate::model::{db::candidate::NewCandidate, mongodb::Id};

use super::{ports::CandidateStore, Deadline};

/// Maps the candidate names of a new poll onto shared candidate identities.
pub struct CandidateResolver {
    candidates: Arc<dyn CandidateStore>,
    deadline: Deadline,
    attempts: u32,
}

impl CandidateResolver {
    pub fn new(candidates: Arc<dyn CandidateStore>, deadline: Deadline, attempts: u32) -> Self {
        Self {
            candidates,
            deadline,
            attempts: attempts.max(1),
        }
    }

    /// Resolve each name to a candidate ID, creating candidates as needed and
    /// associating every one of them with `poll_id`.
    ///
    /// The result has one ID per input name, in input order. Names are resolved
    /// concurrently and the first failure aborts the whole call; candidates
    /// created before the failure are kept.
    pub async fn resolve(&self, names: &[String], poll_id: Id) -> Result<Vec<Id>> {
        try_join_all(names.iter().map(|name| self.resolve_one(name, poll_id))).await
    }

    async fn resolve_one(&self, name: &str, poll_id: Id) -> Result<Id> {
        for attempt in 1..=self.attempts {
            if let Some(id) = self
                .call(name, self.candidates.attach_poll(name, poll_id))
                .await?
            {
                debug!("Candidate '{name}' ({id}) joined poll {poll_id}");
                return Ok(id);
            }

            let candidate = NewCandidate::new(name, poll_id);
            if let Some(id) = self.call(name, self.candidates.insert(&candidate)).await? {
                debug!("Created candidate '{name}' ({id}) for poll {poll_id}");
                return Ok(id);
            }

            // Another writer created the name between our lookup and insert.
            debug!("Candidate '{name}' appeared concurrently (attempt {attempt}), retrying");
        }

        Err(Error::Conflict(format!(
            "Candidate '{name}' could not be resolved after {} attempts",
            self.attempts
        )))
    }

    /// Run a store call under the deadline, attributing storage failures to `name`.
    async fn call<T, F>(&self, name: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.deadline.run(call).await.map_err(|err| match err {
            Error::Storage(reason) => Error::CandidateLookup {
                name: name.to_string(),
                reason,
            },
            other => other,
        })
    }
}
