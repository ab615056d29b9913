use serde::{Deserialize, Serialize};

use crate::model::{db::poll::Poll, mongodb::Id};
use crate::service::{CreatePoll, VoteCount};

/// A poll to be created, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    pub prompt: String,
    pub candidates: Vec<String>,
}

impl PollSpec {
    /// Attach the creating user.
    pub fn by(self, user: Id) -> CreatePoll {
        CreatePoll {
            prompt: self.prompt,
            candidates: self.candidates,
            user,
        }
    }
}

/// A vote, as submitted by a client. The poll is named in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSpec {
    pub cand_id: String,
}

/// A candidate's entry in a poll, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub cand_id: String,
    pub vote_count: u64,
}

/// A poll, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDescription {
    pub id: String,
    pub prompt: String,
    pub user: String,
    pub candidates: Vec<CandidateDescription>,
}

impl From<Poll> for PollDescription {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id.to_string(),
            user: poll.user.to_string(),
            candidates: poll
                .candidates
                .iter()
                .map(|c| CandidateDescription {
                    cand_id: c.cand_id.to_string(),
                    vote_count: c.vote_count,
                })
                .collect(),
            prompt: poll.poll.prompt,
        }
    }
}

/// The outcome of a vote, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub poll_id: String,
    pub cand_id: String,
    pub vote_count: u64,
}

impl From<VoteCount> for VoteReceipt {
    fn from(count: VoteCount) -> Self {
        Self {
            poll_id: count.poll_id.to_string(),
            cand_id: count.cand_id.to_string(),
            vote_count: count.vote_count,
        }
    }
}
