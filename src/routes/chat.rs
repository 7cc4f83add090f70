use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::cache::CacheService;
use crate::chat;
use crate::db::Db;
use crate::error::ApiResult;
use crate::models::{ListMessagesResponse, SendChatMessage, SendChatMessageResponse};

use super::CallerId;

#[get("/api/chat/messages/<match_id>?<cursor>&<limit>")]
pub fn list_messages(
    db: &State<Db>,
    match_id: &str,
    caller: CallerId,
    cursor: Option<&str>,
    limit: Option<i64>,
) -> ApiResult<Json<ListMessagesResponse>> {
    chat::list_messages(db, &caller.0, match_id, cursor, limit.unwrap_or(50)).map(Json)
}

#[post("/api/chat/send", format = "json", data = "<body>")]
pub async fn send_message(
    db: &State<Db>,
    cache: &State<CacheService>,
    caller: CallerId,
    body: Json<SendChatMessage>,
) -> ApiResult<Json<SendChatMessageResponse>> {
    chat::send_message(db, cache.inner(), &caller.0, &body.match_id, &body.message)
        .await
        .map(Json)
}
