use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A candidate's entry within one poll. The tally lives here rather than on
/// the shared [`Candidate`](super::candidate::Candidate), so each poll counts
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCandidate {
    pub cand_id: Id,
    pub vote_count: u64,
}

impl PollCandidate {
    /// A fresh entry with no votes.
    pub fn new(cand_id: Id) -> Self {
        Self {
            cand_id,
            vote_count: 0,
        }
    }
}

/// Core poll data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCore {
    pub prompt: String,
    /// The user who created the poll.
    pub user: Id,
    /// Fixed at creation; only the vote counts change afterwards.
    pub candidates: Vec<PollCandidate>,
}

impl PollCore {
    /// Get the entry for the given candidate, if it is part of this poll.
    pub fn candidate(&self, cand_id: Id) -> Option<&PollCandidate> {
        self.candidates.iter().find(|c| c.cand_id == cand_id)
    }

    /// Mutable version of [`Self::candidate`], for stores that tally in memory.
    #[cfg(test)]
    pub fn candidate_mut(&mut self, cand_id: Id) -> Option<&mut PollCandidate> {
        self.candidates.iter_mut().find(|c| c.cand_id == cand_id)
    }
}

/// A poll with its unique ID.
///
/// Unlike other documents, a poll's ID is chosen before it is inserted, since
/// its candidates must record the poll they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub poll: PollCore,
}

impl Deref for Poll {
    type Target = PollCore;

    fn deref(&self) -> &Self::Target {
        &self.poll
    }
}

impl DerefMut for Poll {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.poll
    }
}
