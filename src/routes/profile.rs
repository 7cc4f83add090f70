use rocket::serde::json::Json;
use rocket::{post, State};

use crate::db::Db;
use crate::error::ApiResult;
use crate::models::{CompleteProfile, CompleteProfileResponse};
use crate::profile;

#[post("/api/profile/complete", format = "json", data = "<body>")]
pub fn complete_profile(
    db: &State<Db>,
    body: Json<CompleteProfile>,
) -> ApiResult<Json<CompleteProfileResponse>> {
    profile::complete_profile(db, &body).map(Json)
}
