use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data. A candidate is shared by every poll that names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Unique across the whole collection; matched exactly and case-sensitively.
    pub name: String,
    /// Polls this candidate takes part in. Treated as a set.
    pub polls: Vec<Id>,
}

impl CandidateCore {
    /// A candidate seen for the first time, in the given poll.
    pub fn new(name: impl Into<String>, poll_id: Id) -> Self {
        Self {
            name: name.into(),
            polls: vec![poll_id],
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
