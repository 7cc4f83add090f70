use rusqlite::params;

use crate::chat;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::matcher;
use crate::models::{CompleteProfile, CompleteProfileResponse};

/// `complete_profile(user_id, bio, location, travel_radius, photo_url)`. Auto
/// creates the placeholder UserProfile row (same dependency-creation pattern
/// as the matcher) before updating it, so this endpoint works as a user's
/// first touch with the system as well as a later edit.
pub fn complete_profile(db: &Db, input: &CompleteProfile) -> ApiResult<CompleteProfileResponse> {
    let bio = chat::sanitize_text(input.bio.trim());
    if bio.is_empty() || bio.chars().count() > 400 {
        return Err(ApiError::Validation(
            "bio must be 1..400 characters after sanitization".to_string(),
        ));
    }

    let lat = input.location.lat;
    let lng = input.location.lng;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::Validation("invalid latitude coordinate".to_string()));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::Validation("invalid longitude coordinate".to_string()));
    }

    if input.location.privacy_mode != "precise" && input.location.privacy_mode != "city_only" {
        return Err(ApiError::Validation(
            "privacy_mode must be 'precise' or 'city_only'".to_string(),
        ));
    }
    if input.location.privacy_mode == "city_only"
        && input.location.city.as_deref().unwrap_or("").trim().is_empty()
    {
        return Err(ApiError::Validation(
            "city is required when privacy_mode is city_only".to_string(),
        ));
    }

    if !(1..=50).contains(&input.travel_radius) {
        return Err(ApiError::Validation(
            "travel_radius must be 1..50 miles".to_string(),
        ));
    }

    matcher::ensure_user_profile(db, &input.user_id);

    let conn = db.conn();
    let now = chrono::Utc::now().to_rfc3339();

    let updated = conn.execute(
        "UPDATE user_profiles SET bio = ?1, photo_url = COALESCE(?2, photo_url), updated_at = ?3 WHERE id = ?4",
        params![bio, input.photo_url, now, input.user_id],
    )?;
    if updated == 0 {
        return Err(ApiError::NotFound(
            "user profile not found or could not be updated".to_string(),
        ));
    }

    let (stored_lat, stored_lng) = if input.location.privacy_mode == "city_only" {
        (0.0, 0.0)
    } else {
        (lat, lng)
    };
    let city = input.location.city.as_deref().map(str::trim);

    conn.execute(
        "INSERT INTO user_locations (user_id, lat, lng, city, travel_radius_miles, privacy_mode, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
            lat = excluded.lat, lng = excluded.lng, city = excluded.city,
            travel_radius_miles = excluded.travel_radius_miles,
            privacy_mode = excluded.privacy_mode, updated_at = excluded.updated_at",
        params![
            input.user_id,
            stored_lat,
            stored_lng,
            city,
            input.travel_radius,
            input.location.privacy_mode,
            now,
        ],
    )?;

    Ok(CompleteProfileResponse {
        success: true,
        ready_for_matching: true,
        user_id: input.user_id.clone(),
    })
}
