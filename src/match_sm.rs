use rusqlite::params;

use crate::config::Config;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::matcher;
use crate::models::BuddyRespondResponse;

/// Result of a `respond` call. `notify_match_accepted` carries the pair to
/// notify (best-effort, async, fired by the HTTP layer after this function's
/// transaction has already committed) when the action was an accept.
pub struct RespondOutcome {
    pub response: BuddyRespondResponse,
    pub notify_match_accepted: Option<(String, String)>,
}

/// pending → accepted | declined, guarded by "caller is a participant".
/// Any non-pending → * is rejected with conflict.
pub fn respond(
    db: &Db,
    config: &Config,
    caller_id: &str,
    match_id: &str,
    action: &str,
) -> ApiResult<RespondOutcome> {
    if action != "accept" && action != "decline" {
        return Err(ApiError::Validation(
            "action must be 'accept' or 'decline'".to_string(),
        ));
    }

    let conn = db.conn();
    let (user1_id, user2_id, status): (String, String, String) = conn
        .query_row(
            "SELECT user1_id, user2_id, status FROM wingman_matches WHERE id = ?1",
            params![match_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|_| ApiError::NotFound("match not found".to_string()))?;

    if caller_id != user1_id && caller_id != user2_id {
        return Err(ApiError::Forbidden(
            "caller is not a participant of this match".to_string(),
        ));
    }

    if status != "pending" {
        return Err(ApiError::Conflict(format!(
            "match is not pending (current status: {status})"
        )));
    }

    let new_status = if action == "accept" { "accepted" } else { "declined" };
    let rows = conn
        .execute(
            "UPDATE wingman_matches SET status = ?1 WHERE id = ?2 AND status = 'pending'",
            params![new_status, match_id],
        )
        .map_err(ApiError::from)?;
    drop(conn);

    if rows == 0 {
        // Lost the race: someone else's transition already committed.
        return Err(ApiError::Conflict(
            "match already transitioned".to_string(),
        ));
    }

    if action == "accept" {
        return Ok(RespondOutcome {
            response: BuddyRespondResponse {
                success: true,
                match_status: "accepted".to_string(),
                next_match: None,
            },
            notify_match_accepted: Some((user1_id, user2_id)),
        });
    }

    let next_match = matcher::create_automatic_match(
        db,
        config,
        caller_id,
        config.default_match_radius_miles as f64,
    )?;
    let next_match = if next_match.success { Some(next_match) } else { None };

    Ok(RespondOutcome {
        response: BuddyRespondResponse {
            success: true,
            match_status: "declined".to_string(),
            next_match,
        },
        notify_match_accepted: None,
    })
}
