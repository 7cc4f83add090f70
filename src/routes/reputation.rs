use rocket::serde::json::Json;
use rocket::{get, State};

use crate::cache::CacheService;
use crate::db::Db;
use crate::error::ApiResult;
use crate::models::ReputationResponse;
use crate::reputation;

#[get("/api/user/reputation/<user_id>?<use_cache>")]
pub async fn get_reputation(
    db: &State<Db>,
    cache: &State<CacheService>,
    user_id: &str,
    use_cache: Option<bool>,
) -> ApiResult<Json<ReputationResponse>> {
    reputation::get_user_reputation(db, cache.inner(), user_id, use_cache.unwrap_or(true))
        .await
        .map(Json)
}
