use std::sync::Arc;

use log::{debug, info};
use mongodb::Database;

use crate::error::{Error, Result};
use crate::model::{
    db::{
        candidate::Candidate,
        poll::{Poll, PollCandidate, PollCore},
        user::User,
    },
    mongodb::{Coll, Id},
};

use super::{
    ports::{PollStore, UserDirectory},
    CandidateResolver, Deadline, ServiceConfig,
};

/// A request to create a poll on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePoll {
    pub prompt: String,
    pub candidates: Vec<String>,
    pub user: Id,
}

impl CreatePoll {
    fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::BadRequest("Poll prompt must not be blank".to_string()));
        }
        if self.candidates.is_empty() {
            return Err(Error::BadRequest(
                "Poll must have at least one candidate".to_string(),
            ));
        }
        if self.candidates.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::BadRequest(
                "Candidate names must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// A request to vote for a candidate in a poll. IDs are raw client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    pub poll_id: String,
    pub cand_id: String,
}

/// A candidate's tally in one poll, immediately after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCount {
    pub poll_id: Id,
    pub cand_id: Id,
    pub vote_count: u64,
}

/// Creates polls and records votes.
pub struct PollService {
    resolver: CandidateResolver,
    polls: Arc<dyn PollStore>,
    users: Arc<dyn UserDirectory>,
    deadline: Deadline,
}

impl PollService {
    pub fn new(
        resolver: CandidateResolver,
        polls: Arc<dyn PollStore>,
        users: Arc<dyn UserDirectory>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            resolver,
            polls,
            users,
            deadline: Deadline::new(config.storage_timeout),
        }
    }

    /// Build a service backed by the collections of the given database.
    pub fn from_db(db: &Database, config: ServiceConfig) -> Self {
        let deadline = Deadline::new(config.storage_timeout);
        let resolver = CandidateResolver::new(
            Arc::new(Coll::<Candidate>::from_db(db)),
            deadline,
            config.resolve_attempts,
        );
        Self::new(
            resolver,
            Arc::new(Coll::<Poll>::from_db(db)),
            Arc::new(Coll::<User>::from_db(db)),
            config,
        )
    }

    /// Create a poll whose candidates all start with zero votes.
    ///
    /// If candidate resolution fails, no poll is stored, but any candidates
    /// created along the way remain for later polls to reuse.
    pub async fn create_poll(&self, request: CreatePoll) -> Result<Poll> {
        request.validate()?;

        if self.deadline.run(self.users.find_user(request.user)).await?.is_none() {
            return Err(Error::UserNotFound(request.user));
        }

        let poll_id = Id::new();
        let cand_ids = self.resolver.resolve(&request.candidates, poll_id).await?;

        let poll = Poll {
            id: poll_id,
            poll: PollCore {
                prompt: request.prompt,
                user: request.user,
                candidates: cand_ids.into_iter().map(PollCandidate::new).collect(),
            },
        };
        self.deadline.run(self.polls.insert(&poll)).await?;

        info!(
            "User {} created poll {} with {} candidates",
            poll.user,
            poll.id,
            poll.candidates.len()
        );
        Ok(poll)
    }

    /// Add one vote for a candidate in a poll, returning the new tally.
    pub async fn cast_vote(&self, vote: CastVote) -> Result<VoteCount> {
        let poll_id = parse_id(&vote.poll_id)?;
        let cand_id = parse_id(&vote.cand_id)?;

        let poll = self
            .deadline
            .run(self.polls.find(poll_id))
            .await?
            .ok_or(Error::PollNotFound(poll_id))?;
        if poll.candidate(cand_id).is_none() {
            return Err(Error::CandidateNotInPoll { poll_id, cand_id });
        }

        // The increment is applied by the store, so concurrent votes never
        // overwrite each other. The entry can only vanish with the poll itself.
        let vote_count = self
            .deadline
            .run(self.polls.increment_vote(poll_id, cand_id))
            .await?
            .ok_or(Error::PollNotFound(poll_id))?;

        debug!("Candidate {cand_id} in poll {poll_id} now has {vote_count} votes");
        Ok(VoteCount {
            poll_id,
            cand_id,
            vote_count,
        })
    }

    /// All polls created by the given user.
    pub async fn list_polls(&self, user: Id) -> Result<Vec<Poll>> {
        self.deadline.run(self.polls.find_by_user(user)).await
    }
}

fn parse_id(raw: &str) -> Result<Id> {
    raw.parse().map_err(|_| Error::InvalidId(raw.to_string()))
}
