use rusqlite::params;

use crate::config::Config;
use crate::db::Db;
use crate::error::ApiResult;
use crate::geo;
use crate::models::{AutoMatchResponse, BuddyCandidate};

const EXPERIENCE_LEVELS: [(&str, i32); 3] =
    [("beginner", 1), ("intermediate", 2), ("advanced", 3)];

fn experience_rank(level: &str) -> i32 {
    EXPERIENCE_LEVELS
        .iter()
        .find(|(name, _)| *name == level)
        .map(|(_, rank)| *rank)
        .unwrap_or(1)
}

/// Deterministic pair key: `(min(a,b), max(a,b))`.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a < b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Idempotent upsert: create a placeholder profile if the referenced id has
/// no row yet, so referential integrity holds without a stack of
/// try/except fallbacks at every call site.
pub fn ensure_user_profile(db: &Db, user_id: &str) {
    let conn = db.conn();
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM user_profiles WHERE id = ?1",
            params![user_id],
            |r| r.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .unwrap_or(false);
    if exists {
        return;
    }

    let now = chrono::Utc::now().to_rfc3339();
    let short_id: String = user_id.chars().take(8).collect();
    conn.execute(
        "INSERT INTO user_profiles (id, email, display_name, bio, experience_level, confidence_archetype, photo_url, created_at, updated_at)
         VALUES (?1, ?2, NULL, ?3, ?4, ?5, NULL, ?6, ?6)",
        params![
            user_id,
            format!("user_{short_id}@wingmanmatch.temp"),
            "New WingmanMatch user",
            "beginner",
            "Naturalist",
            &now,
        ],
    )
    .ok();
}

fn find_existing_pending_match(db: &Db, user_id: &str) -> Option<(String, String)> {
    let conn = db.conn();
    conn.query_row(
        "SELECT id, CASE WHEN user1_id = ?1 THEN user2_id ELSE user1_id END
         FROM wingman_matches
         WHERE status = 'pending' AND (user1_id = ?1 OR user2_id = ?1)
         LIMIT 1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .ok()
}

fn candidate_profile(db: &Db, user_id: &str) -> Option<BuddyCandidate> {
    let conn = db.conn();
    conn.query_row(
        "SELECT ul.city, up.experience_level, up.confidence_archetype
         FROM user_profiles up
         LEFT JOIN user_locations ul ON ul.user_id = up.id
         WHERE up.id = ?1",
        params![user_id],
        |row| {
            Ok(BuddyCandidate {
                user_id: user_id.to_string(),
                city: row.get(0)?,
                distance_miles: 0.0,
                experience_level: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                confidence_archetype: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        },
    )
    .ok()
}

/// Any WingmanMatch row (regardless of status) between this pair created
/// within the recency window, keyed on the deterministic pair ordering.
fn recently_paired(db: &Db, a: &str, b: &str, window_days: i64) -> bool {
    let (lo, hi) = pair_key(a, b);
    let conn = db.conn();
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(window_days)).to_rfc3339();
    conn.query_row(
        "SELECT COUNT(*) FROM wingman_matches
         WHERE user1_id = ?1 AND user2_id = ?2 AND created_at >= ?3",
        params![lo, hi, cutoff],
        |r| r.get::<_, i64>(0),
    )
    .map(|c| c > 0)
    .unwrap_or(false)
}

/// `create_automatic_match(requester_id, radius_miles)`. See SPEC_FULL.md §3
/// (Matcher) for the full contract; this mirrors the original matcher's
/// ensure-profile → throttle → search → filter → select → insert pipeline.
pub fn create_automatic_match(
    db: &Db,
    config: &Config,
    requester_id: &str,
    radius_miles: f64,
) -> ApiResult<AutoMatchResponse> {
    ensure_user_profile(db, requester_id);

    if let Some((match_id, buddy_id)) = find_existing_pending_match(db, requester_id) {
        let buddy_profile = candidate_profile(db, &buddy_id);
        return Ok(AutoMatchResponse {
            success: true,
            message: "You already have a pending wingman match.".to_string(),
            match_id: Some(match_id),
            buddy_user_id: Some(buddy_id),
            buddy_profile,
        });
    }

    let requester_level = {
        let conn = db.conn();
        conn.query_row(
            "SELECT experience_level FROM user_profiles WHERE id = ?1",
            params![requester_id],
            |r| r.get::<_, Option<String>>(0),
        )
        .ok()
        .flatten()
        .unwrap_or_else(|| "beginner".to_string())
    };

    let candidates = geo::find_candidates_within_radius(db, requester_id, radius_miles);
    if candidates.is_empty() {
        let has_location = {
            let conn = db.conn();
            conn.query_row(
                "SELECT COUNT(*) FROM user_locations WHERE user_id = ?1",
                params![requester_id],
                |r| r.get::<_, i64>(0),
            )
            .map(|c| c > 0)
            .unwrap_or(false)
        };
        if !has_location {
            return Ok(AutoMatchResponse {
                success: false,
                message: "Complete your profile location before matching.".to_string(),
                match_id: None,
                buddy_user_id: None,
                buddy_profile: None,
            });
        }
    }

    let requester_rank = experience_rank(&requester_level);
    let mut compatible: Vec<BuddyCandidate> = candidates
        .into_iter()
        .filter(|c| (experience_rank(&c.experience_level) - requester_rank).abs() <= 1)
        .filter(|c| !recently_paired(db, requester_id, &c.user_id, config.recency_window_days))
        .collect();

    // Closest first; earliest candidate id breaks ties.
    compatible.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let chosen = match compatible.into_iter().next() {
        Some(c) => c,
        None => {
            return Ok(AutoMatchResponse {
                success: false,
                message: format!(
                    "No compatible wingman buddies found within {radius_miles:.0} miles. Try a wider radius or check back later."
                ),
                match_id: None,
                buddy_user_id: None,
                buddy_profile: None,
            });
        }
    };

    let match_id = insert_match_record(db, requester_id, &chosen.user_id)?;

    Ok(AutoMatchResponse {
        success: true,
        message: "Wingman buddy match created successfully!".to_string(),
        match_id: Some(match_id),
        buddy_user_id: Some(chosen.user_id.clone()),
        buddy_profile: Some(chosen),
    })
}

/// Insert a pending match with the deterministic pair key. If a concurrent
/// request already created the pending row for this pair (race observed via
/// the unique partial index), the loser returns the winner's row instead of
/// erroring.
fn insert_match_record(db: &Db, a: &str, b: &str) -> ApiResult<String> {
    let (user1_id, user2_id) = pair_key(a, b);
    let conn = db.conn();

    if let Some(id) = conn
        .query_row(
            "SELECT id FROM wingman_matches WHERE user1_id = ?1 AND user2_id = ?2 AND status = 'pending'",
            params![user1_id, user2_id],
            |r| r.get::<_, String>(0),
        )
        .ok()
    {
        return Ok(id);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    match conn.execute(
        "INSERT INTO wingman_matches (id, user1_id, user2_id, status, created_at, user1_reputation, user2_reputation)
         VALUES (?1, ?2, ?3, 'pending', ?4, 0, 0)",
        params![id, user1_id, user2_id, now],
    ) {
        Ok(_) => Ok(id),
        Err(e) if e.to_string().contains("UNIQUE") => conn
            .query_row(
                "SELECT id FROM wingman_matches WHERE user1_id = ?1 AND user2_id = ?2 AND status = 'pending'",
                params![user1_id, user2_id],
                |r| r.get::<_, String>(0),
            )
            .map_err(Into::into),
        Err(e) => Err(e.into()),
    }
}
