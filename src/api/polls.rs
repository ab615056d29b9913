use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::poll::{PollDescription, PollSpec, VoteReceipt, VoteSpec},
    auth::AuthToken,
};
use crate::service::{CastVote, PollService};

pub fn routes() -> Vec<Route> {
    routes![create_poll, list_polls, cast_vote]
}

#[post("/polls", data = "<spec>", format = "json")]
async fn create_poll(
    token: AuthToken,
    spec: Json<PollSpec>,
    service: &State<PollService>,
) -> Result<Json<PollDescription>> {
    let poll = service.create_poll(spec.0.by(token.id())).await?;
    Ok(Json(poll.into()))
}

#[get("/polls")]
async fn list_polls(
    token: AuthToken,
    service: &State<PollService>,
) -> Result<Json<Vec<PollDescription>>> {
    let polls = service.list_polls(token.id()).await?;
    Ok(Json(polls.into_iter().map(PollDescription::from).collect()))
}

#[post("/polls/<poll_id>/votes", data = "<vote>", format = "json")]
async fn cast_vote(
    _token: AuthToken,
    poll_id: &str,
    vote: Json<VoteSpec>,
    service: &State<PollService>,
) -> Result<Json<VoteReceipt>> {
    let count = service
        .cast_vote(CastVote {
            poll_id: poll_id.to_string(),
            cand_id: vote.0.cand_id,
        })
        .await?;
    Ok(Json(count.into()))
}
