use rocket::serde::json::Json;
use rocket::State;

use crate::cache::CacheService;

#[rocket::get("/api/v1/health")]
pub fn health(cache: &State<CacheService>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "wingman-match-core",
        "version": env!("CARGO_PKG_VERSION"),
        "cache_fallback_hits": cache.fallback_hit_count()
    }))
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "rate_limited", "message": "Too many requests"}))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "not_found", "message": "Not found"}))
}
