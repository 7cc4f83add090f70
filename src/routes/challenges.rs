use rocket::serde::json::Json;
use rocket::{get, State};

use crate::cache::CacheService;
use crate::challenges;
use crate::db::Db;
use crate::error::ApiResult;
use crate::models::ChallengesResponse;

#[get("/api/challenges?<difficulty>")]
pub async fn list_challenges(
    db: &State<Db>,
    cache: &State<CacheService>,
    difficulty: Option<&str>,
) -> ApiResult<Json<ChallengesResponse>> {
    challenges::list_challenges(db, cache.inner(), difficulty).await.map(Json)
}
