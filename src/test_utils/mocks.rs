//! In-memory implementations of the storage ports.
//!
//! They honour the same contract as the MongoDB implementations: candidate
//! names are unique and vote increments are atomic. Each store can be made to
//! yield, stall, or fail so tests can drive interleavings and error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{
    db::{
        candidate::{Candidate, NewCandidate},
        poll::Poll,
        user::User,
    },
    mongodb::Id,
};
use crate::service::ports::{CandidateStore, PollStore, UserDirectory};

/// Behaviour shared by the in-memory stores before each call.
#[derive(Default)]
struct Pacing {
    yields: bool,
    latency: Option<Duration>,
}

impl Pacing {
    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.yields {
            tokio::task::yield_now().await;
        }
    }
}

fn unavailable() -> Error {
    Error::Storage("connection refused".to_string())
}

// ============================================================================
// In-Memory Candidate Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryCandidateStore {
    by_name: RwLock<HashMap<String, Candidate>>,
    pacing: Pacing,
    fail_on: Option<String>,
    rival: Mutex<Option<(String, Id)>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the scheduler before every call, widening race windows.
    pub fn with_yields(mut self) -> Self {
        self.pacing.yields = true;
        self
    }

    /// Sleep before every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.pacing.latency = Some(latency);
        self
    }

    /// Fail every call concerning the given name.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    /// Simulate another writer creating `name` just before the next insert.
    /// Returns the ID that writer's candidate will get.
    pub fn create_before_next_insert(&self, name: &str) -> Id {
        let id = Id::new();
        *self.rival.lock().unwrap() = Some((name.to_string(), id));
        id
    }

    pub fn get(&self, id: Id) -> Option<Candidate> {
        self.by_name
            .read()
            .unwrap()
            .values()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn named(&self, name: &str) -> Option<Candidate> {
        self.by_name.read().unwrap().get(name).cloned()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.by_name
            .read()
            .unwrap()
            .values()
            .filter(|c| c.name == name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.by_name.read().unwrap().len()
    }

    fn check(&self, name: &str) -> Result<()> {
        match self.fail_on {
            Some(ref failing) if failing == name => Err(unavailable()),
            _ => Ok(()),
        }
    }
}

#[rocket::async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn attach_poll(&self, name: &str, poll_id: Id) -> Result<Option<Id>> {
        self.pacing.wait().await;
        self.check(name)?;
        let mut by_name = self.by_name.write().unwrap();
        Ok(by_name.get_mut(name).map(|candidate| {
            if !candidate.polls.contains(&poll_id) {
                candidate.polls.push(poll_id);
            }
            candidate.id
        }))
    }

    async fn insert(&self, candidate: &NewCandidate) -> Result<Option<Id>> {
        self.pacing.wait().await;
        self.check(&candidate.name)?;
        let mut by_name = self.by_name.write().unwrap();
        if let Some((name, id)) = self.rival.lock().unwrap().take() {
            by_name.insert(
                name.clone(),
                Candidate {
                    id,
                    candidate: NewCandidate::new(name, Id::new()),
                },
            );
        }
        if by_name.contains_key(&candidate.name) {
            return Ok(None);
        }
        let id = Id::new();
        by_name.insert(
            candidate.name.clone(),
            Candidate {
                id,
                candidate: candidate.clone(),
            },
        );
        Ok(Some(id))
    }
}

// ============================================================================
// In-Memory Poll Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryPollStore {
    polls: RwLock<HashMap<Id, Poll>>,
    pacing: Pacing,
    calls: AtomicUsize,
    failing: bool,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_yields(mut self) -> Self {
        self.pacing.yields = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.pacing.latency = Some(latency);
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Pre-populate with a poll.
    pub fn with_poll(self, poll: Poll) -> Self {
        self.polls.write().unwrap().insert(poll.id, poll);
        self
    }

    pub fn get(&self, id: Id) -> Option<Poll> {
        self.polls.read().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.polls.read().unwrap().len()
    }

    /// Number of calls made to the store so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pacing.wait().await;
        if self.failing {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[rocket::async_trait]
impl PollStore for InMemoryPollStore {
    async fn insert(&self, poll: &Poll) -> Result<()> {
        self.enter().await?;
        let mut polls = self.polls.write().unwrap();
        if polls.contains_key(&poll.id) {
            return Err(Error::Storage(format!("duplicate poll id {}", poll.id)));
        }
        polls.insert(poll.id, poll.clone());
        Ok(())
    }

    async fn find(&self, id: Id) -> Result<Option<Poll>> {
        self.enter().await?;
        Ok(self.get(id))
    }

    async fn find_by_user(&self, user: Id) -> Result<Vec<Poll>> {
        self.enter().await?;
        Ok(self
            .polls
            .read()
            .unwrap()
            .values()
            .filter(|p| p.user == user)
            .cloned()
            .collect())
    }

    async fn increment_vote(&self, poll_id: Id, cand_id: Id) -> Result<Option<u64>> {
        self.enter().await?;
        let mut polls = self.polls.write().unwrap();
        Ok(polls
            .get_mut(&poll_id)
            .and_then(|poll| poll.candidate_mut(cand_id))
            .map(|entry| {
                entry.vote_count += 1;
                entry.vote_count
            }))
    }
}

// ============================================================================
// In-Memory User Directory
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Id, User>>,
    pacing: Pacing,
    failing: bool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.pacing.latency = Some(latency);
        self
    }

    /// Fail every lookup.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[rocket::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: Id) -> Result<Option<User>> {
        self.pacing.wait().await;
        if self.failing {
            return Err(unavailable());
        }
        Ok(self.users.read().unwrap().get(&id).cloned())
    }
}
