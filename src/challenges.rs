use rusqlite::params;

use crate::cache::Cache;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ApproachChallenge, ChallengesResponse};

const CACHE_TTL_SECS: u64 = 1800;
const VALID_DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];

fn cache_key(difficulty: Option<&str>) -> String {
    match difficulty {
        Some(d) => format!("challenges:difficulty:{d}"),
        None => "challenges:all".to_string(),
    }
}

/// `list_challenges(difficulty?)`. Read-through cache at TTL 1800s, keyed
/// separately per difficulty filter so a narrow read doesn't evict the
/// unfiltered catalog (or vice versa).
pub async fn list_challenges(
    db: &Db,
    cache: &dyn Cache,
    difficulty: Option<&str>,
) -> ApiResult<ChallengesResponse> {
    if let Some(d) = difficulty
        && !VALID_DIFFICULTIES.contains(&d)
    {
        return Err(ApiError::Validation(format!(
            "difficulty must be one of {VALID_DIFFICULTIES:?}"
        )));
    }

    let key = cache_key(difficulty);
    if let Some(cached) = cache.get(&key).await
        && let Ok(mut resp) = serde_json::from_str::<ChallengesResponse>(&cached)
    {
        resp.cached = true;
        return Ok(resp);
    }

    let conn = db.conn();
    let challenges: Vec<ApproachChallenge> = if let Some(d) = difficulty {
        let mut stmt = conn.prepare(
            "SELECT id, difficulty, title, description, points FROM approach_challenges WHERE difficulty = ?1 ORDER BY points ASC",
        )?;
        stmt.query_map(params![d], row_to_challenge)?
            .filter_map(|r| r.ok())
            .collect()
    } else {
        let mut stmt = conn.prepare(
            "SELECT id, difficulty, title, description, points FROM approach_challenges ORDER BY points ASC",
        )?;
        stmt.query_map([], row_to_challenge)?.filter_map(|r| r.ok()).collect()
    };
    drop(conn);

    let resp = ChallengesResponse {
        count: challenges.len(),
        challenges,
        difficulty_filter: difficulty.map(str::to_string),
        cached: false,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if let Ok(serialized) = serde_json::to_string(&resp) {
        cache.set(&key, &serialized, CACHE_TTL_SECS).await;
    }

    Ok(resp)
}

fn row_to_challenge(row: &rusqlite::Row) -> rusqlite::Result<ApproachChallenge> {
    Ok(ApproachChallenge {
        id: row.get(0)?,
        difficulty: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        points: row.get(4)?,
    })
}
