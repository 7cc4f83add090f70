use rusqlite::params;

use crate::cache::Cache;
use crate::db::Db;
use crate::error::ApiResult;
use crate::models::ReputationResponse;

const CACHE_TTL_SECS: u64 = 300;
const MIN_SCORE: i64 = -5;
const MAX_SCORE: i64 = 20;

fn cache_key(user_id: &str) -> String {
    format!("reputation:user:{user_id}")
}

fn badge_color(score: i64) -> &'static str {
    if score >= 10 {
        "gold"
    } else if score >= 0 {
        "green"
    } else {
        "red"
    }
}

struct RawCounts {
    completed_sessions: i64,
    no_shows: i64,
}

/// Recompute the reputation view from first principles: every match this
/// user is part of, every session on those matches, counted by outcome.
/// This is the read-side ground truth; `wingman_matches.user{1,2}_reputation`
/// is a write-side cache kept in lockstep by session.rs on each completion
/// (see SPEC_FULL.md §4's Open Question resolution — both are asserted equal
/// in tests rather than one being dropped in favor of the other).
fn compute_counts(conn: &rusqlite::Connection, user_id: &str) -> ApiResult<RawCounts> {
    let completed_sessions: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM wingman_sessions s
         JOIN wingman_matches m ON m.id = s.match_id
         WHERE s.status = 'completed'
           AND (
             (m.user1_id = ?1 AND s.user1_completed_confirmed_by_user2 = 1)
             OR (m.user2_id = ?1 AND s.user2_completed_confirmed_by_user1 = 1)
           )",
        params![user_id],
        |r| r.get(0),
    )?;

    let no_shows: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM wingman_sessions s
         JOIN wingman_matches m ON m.id = s.match_id
         WHERE s.status IN ('no_show', 'cancelled')
           AND (m.user1_id = ?1 OR m.user2_id = ?1)",
        params![user_id],
        |r| r.get(0),
    )?;

    Ok(RawCounts {
        completed_sessions,
        no_shows,
    })
}

/// `get_user_reputation(user_id, use_cache)`.
pub async fn get_user_reputation(
    db: &Db,
    cache: &dyn Cache,
    user_id: &str,
    use_cache: bool,
) -> ApiResult<ReputationResponse> {
    let key = cache_key(user_id);
    if use_cache {
        if let Some(cached) = cache.get(&key).await {
            if let Ok(resp) = serde_json::from_str::<ReputationResponse>(&cached) {
                return Ok(resp);
            }
        }
    }

    let counts = {
        let conn = db.conn();
        compute_counts(&conn, user_id)?
    };

    let score = (counts.completed_sessions - counts.no_shows).clamp(MIN_SCORE, MAX_SCORE);
    let resp = ReputationResponse {
        score,
        completed_sessions: counts.completed_sessions,
        no_shows: counts.no_shows,
        badge_color: badge_color(score).to_string(),
        cache_timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if let Ok(serialized) = serde_json::to_string(&resp) {
        cache.set(&key, &serialized, CACHE_TTL_SECS).await;
    }

    Ok(resp)
}

/// Invalidate the cached view for a user; called after any write that
/// changes their completed-session or no-show counts.
pub async fn invalidate(cache: &dyn Cache, user_id: &str) {
    cache.delete(&cache_key(user_id)).await;
}
