use rocket::serde::json::Json;
use rocket::{get, patch, post, State};

use crate::cache::CacheService;
use crate::config::Config;
use crate::db::Db;
use crate::email::EmailNotifier;
use crate::error::ApiResult;
use crate::match_sm;
use crate::models::{
    BuddyRespond, BuddyRespondResponse, ConfirmBuddyCompletion, ConfirmCompletionResponse,
    ConfirmResponse, ConfirmSessionCompletion, CreateSession, CreateSessionResponse, SessionData,
    UpdateSessionNotes, UpdateSessionNotesResponse,
};
use crate::session;

use super::CallerId;

#[post("/api/buddy/respond", format = "json", data = "<body>")]
pub fn respond_to_match(
    db: &State<Db>,
    config: &State<Config>,
    email: &State<EmailNotifier>,
    body: Json<BuddyRespond>,
) -> ApiResult<Json<BuddyRespondResponse>> {
    let outcome = match_sm::respond(db, config, &body.user_id, &body.match_id, &body.action)?;
    if let Some((user1_id, user2_id)) = &outcome.notify_match_accepted {
        email.notify_match_accepted(user1_id, user2_id, &body.match_id);
    }
    Ok(Json(outcome.response))
}

#[post("/api/session/create", format = "json", data = "<body>")]
pub fn create_session(
    db: &State<Db>,
    email: &State<EmailNotifier>,
    body: Json<CreateSession>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let (mut response, user1_id, user2_id) = session::create_session(
        db,
        &body.match_id,
        &body.venue_name,
        &body.time,
        &body.user1_challenge_id,
        &body.user2_challenge_id,
    )?;

    email.notify_session_scheduled(&user1_id, &user2_id, &response.venue_name, &response.scheduled_time);
    response.notifications_sent = email.is_enabled();

    Ok(Json(response))
}

#[get("/api/session/<id>")]
pub fn get_session(db: &State<Db>, id: &str, caller: CallerId) -> ApiResult<Json<SessionData>> {
    session::get_session(db, id, &caller.0).map(Json)
}

#[post("/api/session/<id>/confirm", format = "json", data = "<body>")]
pub async fn confirm_buddy_completion(
    db: &State<Db>,
    cache: &State<CacheService>,
    id: &str,
    caller: CallerId,
    body: Json<ConfirmBuddyCompletion>,
) -> ApiResult<Json<ConfirmResponse>> {
    session::confirm_buddy_completion(db, cache.inner(), id, &caller.0, &body.buddy_user_id)
        .await
        .map(Json)
}

#[post("/api/session/confirm-completion", format = "json", data = "<body>")]
pub async fn confirm_session_completion(
    db: &State<Db>,
    cache: &State<CacheService>,
    caller: CallerId,
    body: Json<ConfirmSessionCompletion>,
) -> ApiResult<Json<ConfirmCompletionResponse>> {
    session::confirm_session_completion(db, cache.inner(), &body.session_id, &caller.0)
        .await
        .map(Json)
}

#[patch("/api/session/<id>/notes", format = "json", data = "<body>")]
pub fn update_session_notes(
    db: &State<Db>,
    id: &str,
    caller: CallerId,
    body: Json<UpdateSessionNotes>,
) -> ApiResult<Json<UpdateSessionNotesResponse>> {
    session::update_session_notes(db, id, &caller.0, &body.notes).map(Json)
}
