use log::debug;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    poll::Poll,
    user::User,
};
use crate::service::ports::{CandidateStore, PollStore, UserDirectory};

use super::{errors::is_duplicate_key_error, Coll, Id};

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[rocket::async_trait]
impl CandidateStore for Coll<Candidate> {
    async fn attach_poll(&self, name: &str, poll_id: Id) -> Result<Option<Id>> {
        let update = doc! {
            "$addToSet": { "polls": poll_id }
        };
        let candidate = self
            .find_one_and_update(doc! { "name": name }, update, return_after())
            .await?;
        Ok(candidate.map(|c| c.id))
    }

    async fn insert(&self, candidate: &NewCandidate) -> Result<Option<Id>> {
        match self
            .retyped::<NewCandidate>()
            .insert_one(candidate, None)
            .await
        {
            Ok(result) => {
                let id = result.inserted_id.as_object_id().ok_or_else(|| {
                    Error::Storage(format!(
                        "Candidate '{}' was inserted without an object ID",
                        candidate.name
                    ))
                })?;
                Ok(Some(id.into()))
            }
            Err(err) if is_duplicate_key_error(&err) => {
                debug!("Candidate '{}' was created concurrently", candidate.name);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[rocket::async_trait]
impl PollStore for Coll<Poll> {
    async fn insert(&self, poll: &Poll) -> Result<()> {
        self.insert_one(poll, None).await?;
        Ok(())
    }

    async fn find(&self, id: Id) -> Result<Option<Poll>> {
        Ok(self.find_one(id.as_doc(), None).await?)
    }

    async fn find_by_user(&self, user: Id) -> Result<Vec<Poll>> {
        let polls = (**self)
            .find(doc! { "user": user }, None)
            .await?
            .try_collect()
            .await?;
        Ok(polls)
    }

    async fn increment_vote(&self, poll_id: Id, cand_id: Id) -> Result<Option<u64>> {
        let filter = doc! {
            "_id": poll_id,
            "candidates.cand_id": cand_id,
        };
        let update = doc! {
            "$inc": { "candidates.$.vote_count": 1 }
        };
        let poll = self
            .find_one_and_update(filter, update, return_after())
            .await?;
        Ok(poll.and_then(|p| p.candidate(cand_id).map(|c| c.vote_count)))
    }
}

#[rocket::async_trait]
impl UserDirectory for Coll<User> {
    async fn find_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.find_one(id.as_doc(), None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::db::poll::{PollCandidate, PollCore};

    #[backend_test]
    async fn candidate_names_are_unique(candidates: Coll<Candidate>) {
        let first_poll = Id::new();
        let second_poll = Id::new();

        let id = candidates
            .insert(&NewCandidate::new("Apple", first_poll))
            .await
            .unwrap()
            .unwrap();

        // A second insert under the same name is rejected by the index.
        let duplicate = candidates
            .insert(&NewCandidate::new("Apple", second_poll))
            .await
            .unwrap();
        assert_eq!(duplicate, None);

        // Attaching finds the original and records the new poll once.
        assert_eq!(
            candidates.attach_poll("Apple", second_poll).await.unwrap(),
            Some(id)
        );
        assert_eq!(
            candidates.attach_poll("Apple", second_poll).await.unwrap(),
            Some(id)
        );
        let stored = candidates.find_one(id.as_doc(), None).await.unwrap().unwrap();
        assert_eq!(stored.polls.len(), 2);
        assert!(stored.polls.contains(&first_poll));
        assert!(stored.polls.contains(&second_poll));

        // Names are case-sensitive.
        assert_eq!(candidates.attach_poll("apple", first_poll).await.unwrap(), None);
    }

    #[backend_test]
    async fn increment_targets_one_entry(polls: Coll<Poll>) {
        let apple = Id::new();
        let banana = Id::new();
        let poll = Poll {
            id: Id::new(),
            poll: PollCore {
                prompt: "Best fruit?".to_string(),
                user: Id::new(),
                candidates: vec![PollCandidate::new(apple), PollCandidate::new(banana)],
            },
        };
        PollStore::insert(&polls, &poll).await.unwrap();

        assert_eq!(polls.increment_vote(poll.id, apple).await.unwrap(), Some(1));
        assert_eq!(polls.increment_vote(poll.id, apple).await.unwrap(), Some(2));
        assert_eq!(polls.increment_vote(poll.id, Id::new()).await.unwrap(), None);
        assert_eq!(polls.increment_vote(Id::new(), apple).await.unwrap(), None);

        let stored = PollStore::find(&polls, poll.id).await.unwrap().unwrap();
        assert_eq!(stored.candidate(apple).unwrap().vote_count, 2);
        assert_eq!(stored.candidate(banana).unwrap().vote_count, 0);
        assert_eq!(polls.find_by_user(poll.user).await.unwrap(), vec![stored]);
    }
}
