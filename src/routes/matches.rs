use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::config::Config;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::geo;
use crate::matcher;
use crate::models::{AutoMatchResponse, BuddyCandidate, CandidatesResponse, DistanceResponse};

#[get("/api/matches/candidates/<user_id>?<radius_miles>")]
pub fn candidates(
    db: &State<Db>,
    user_id: &str,
    radius_miles: Option<f64>,
) -> ApiResult<Json<CandidatesResponse>> {
    let radius = radius_miles.unwrap_or(20.0);
    if !(1.0..=100.0).contains(&radius) {
        return Err(ApiError::Validation(
            "radius_miles must be 1..100".to_string(),
        ));
    }

    let candidates: Vec<BuddyCandidate> = geo::find_candidates_within_radius(db, user_id, radius);
    let total_found = candidates.len();
    Ok(Json(CandidatesResponse {
        candidates,
        total_found,
    }))
}

#[get("/api/matches/distance/<a>/<b>")]
pub fn distance(db: &State<Db>, a: &str, b: &str) -> ApiResult<Json<DistanceResponse>> {
    let distance_miles = geo::distance_between(db, a, b);
    if distance_miles.is_none() {
        let conn = db.conn();
        let both_known: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM user_profiles WHERE id IN (?1, ?2)",
                rusqlite::params![a, b],
                |r| r.get::<_, i64>(0),
            )
            .map(|c| c == 2)
            .unwrap_or(false);
        if !both_known {
            return Err(ApiError::NotFound(
                "one or both users are not known to the system".to_string(),
            ));
        }
    }

    Ok(Json(DistanceResponse {
        within_20_miles: distance_miles.is_some_and(|d| d <= 20.0),
        distance_miles,
    }))
}

#[post("/api/matches/auto/<user_id>?<radius_miles>")]
pub fn auto_match(
    db: &State<Db>,
    config: &State<Config>,
    user_id: &str,
    radius_miles: Option<f64>,
) -> ApiResult<Json<AutoMatchResponse>> {
    let radius = radius_miles.unwrap_or(config.default_match_radius_miles as f64);
    matcher::create_automatic_match(db, config, user_id, radius).map(Json)
}
