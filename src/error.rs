use std::time::Duration;

use log::error;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, status::Custom, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::mongodb::Id;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is not a valid id")]
    InvalidId(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("No user found with id: {0}")]
    UserNotFound(Id),
    #[error("No poll found with id: {0}")]
    PollNotFound(Id),
    #[error("Candidate {cand_id} is not part of poll {poll_id}")]
    CandidateNotInPoll { poll_id: Id, cand_id: Id },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Failed to resolve candidate '{name}': {reason}")]
    CandidateLookup { name: String, reason: String },
    #[error("Storage call did not complete within {0:?}")]
    StorageTimeout(Duration),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl Error {
    /// Broad category of the error, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidId(_) | Self::BadRequest(_) => "validation",
            Self::UserNotFound(_) | Self::PollNotFound(_) | Self::CandidateNotInPoll { .. } => {
                "not_found"
            }
            Self::Conflict(_) => "conflict",
            Self::CandidateLookup { .. } | Self::StorageTimeout(_) | Self::Storage(_) => "storage",
        }
    }

    /// Specific error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "invalid_id",
            Self::BadRequest(_) => "bad_request",
            Self::UserNotFound(_) => "user_not_found",
            Self::PollNotFound(_) => "poll_not_found",
            Self::CandidateNotInPoll { .. } => "candidate_not_in_poll",
            Self::Conflict(_) => "conflict",
            Self::CandidateLookup { .. } => "candidate_lookup",
            Self::StorageTimeout(_) => "storage_timeout",
            Self::Storage(_) => "storage",
        }
    }

    /// The identifier the error is about, if any.
    pub fn offending_id(&self) -> Option<String> {
        match self {
            Self::InvalidId(id) => Some(id.clone()),
            Self::UserNotFound(id) | Self::PollNotFound(id) => Some(id.to_string()),
            Self::CandidateNotInPoll { cand_id, .. } => Some(cand_id.to_string()),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::InvalidId(_) | Self::BadRequest(_) => Status::BadRequest,
            Self::UserNotFound(_) | Self::PollNotFound(_) | Self::CandidateNotInPoll { .. } => {
                Status::NotFound
            }
            Self::Conflict(_) => Status::Conflict,
            Self::CandidateLookup { .. } | Self::StorageTimeout(_) => Status::ServiceUnavailable,
            Self::Storage(_) => Status::InternalServerError,
        }
    }
}

/// JSON body sent to clients in place of a successful response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        // Storage details stay in the server log.
        let message = match err.kind() {
            "storage" => {
                error!("{err}");
                match err {
                    Error::StorageTimeout(_) => "The storage layer did not respond in time",
                    _ => "The storage layer is unavailable",
                }
                .to_string()
            }
            _ => err.to_string(),
        };
        Self {
            kind: err.kind(),
            code: err.code(),
            message,
            id: err.offending_id(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        Custom(self.status(), Json(ErrorBody::from(&self))).respond_to(req)
    }
}
