use rusqlite::params;

use crate::cache::Cache;
use crate::chat;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ApproachChallenge, ConfirmCompletionResponse, ConfirmResponse, CreateSessionResponse,
    ReputationPreview, SessionData, UpdateSessionNotesResponse, WingmanSession,
};
use crate::reputation;

const ACTIVE_STATUSES: [&str; 2] = ["scheduled", "in_progress"];

struct MatchRow {
    user1_id: String,
    user2_id: String,
    status: String,
}

fn load_match(conn: &rusqlite::Connection, match_id: &str) -> Option<MatchRow> {
    conn.query_row(
        "SELECT user1_id, user2_id, status FROM wingman_matches WHERE id = ?1",
        params![match_id],
        |row| {
            Ok(MatchRow {
                user1_id: row.get(0)?,
                user2_id: row.get(1)?,
                status: row.get(2)?,
            })
        },
    )
    .ok()
}

fn challenge_exists(conn: &rusqlite::Connection, challenge_id: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM approach_challenges WHERE id = ?1",
        params![challenge_id],
        |r| r.get::<_, i64>(0),
    )
    .map(|c| c > 0)
    .unwrap_or(false)
}

/// `create_session(match_id, venue_name, scheduled_time, user1_challenge_id, user2_challenge_id)`.
/// Preconditions are checked in the order the original system's tests
/// assert them in: match existence/status, challenge validity, active
/// session exclusivity, then scheduled-time.
pub fn create_session(
    db: &Db,
    match_id: &str,
    venue_name: &str,
    scheduled_time: &str,
    user1_challenge_id: &str,
    user2_challenge_id: &str,
) -> ApiResult<(CreateSessionResponse, String, String)> {
    if venue_name.trim().is_empty() || venue_name.chars().count() > 200 {
        return Err(ApiError::Validation(
            "venue_name must be 1..200 characters".to_string(),
        ));
    }

    let scheduled_dt = chrono::DateTime::parse_from_rfc3339(scheduled_time)
        .map_err(|_| ApiError::Validation("scheduled_time must be a valid RFC3339 timestamp".to_string()))?;

    let conn = db.conn();
    let m = load_match(&conn, match_id).ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;
    if m.status != "accepted" {
        return Err(ApiError::Validation(format!(
            "Match status must be 'accepted' to create a session (current: {})",
            m.status
        )));
    }

    if !challenge_exists(&conn, user1_challenge_id) || !challenge_exists(&conn, user2_challenge_id) {
        return Err(ApiError::Validation(
            "One or both challenge IDs are invalid".to_string(),
        ));
    }

    let active_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM wingman_sessions WHERE match_id = ?1 AND status IN ('scheduled', 'in_progress')",
            params![match_id],
            |r| r.get(0),
        )
        .unwrap_or(0);
    if active_count > 0 {
        return Err(ApiError::Conflict(
            "This match already has an active session".to_string(),
        ));
    }

    if scheduled_dt <= chrono::Utc::now() {
        return Err(ApiError::Validation(
            "Scheduled time must be in the future".to_string(),
        ));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO wingman_sessions
            (id, match_id, user1_challenge_id, user2_challenge_id, venue_name, scheduled_time, status, notes, user1_completed_confirmed_by_user2, user2_completed_confirmed_by_user1, completed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'scheduled', '', 0, 0, NULL, ?7)",
        params![id, match_id, user1_challenge_id, user2_challenge_id, venue_name, scheduled_time, now],
    )?;
    drop(conn);

    chat::append_system_message(
        db,
        match_id,
        &format!("Session scheduled at {venue_name} on {scheduled_time}"),
    )?;

    Ok((
        CreateSessionResponse {
            success: true,
            session_id: id,
            scheduled_time: scheduled_time.to_string(),
            venue_name: venue_name.to_string(),
            notifications_sent: false,
        },
        m.user1_id,
        m.user2_id,
    ))
}

fn load_session(conn: &rusqlite::Connection, session_id: &str) -> Option<(WingmanSession, String)> {
    conn.query_row(
        "SELECT s.id, s.match_id, s.user1_challenge_id, s.user2_challenge_id, s.venue_name,
                s.scheduled_time, s.status, s.notes, s.user1_completed_confirmed_by_user2,
                s.user2_completed_confirmed_by_user1, s.completed_at, s.created_at, m.status
         FROM wingman_sessions s
         JOIN wingman_matches m ON m.id = s.match_id
         WHERE s.id = ?1",
        params![session_id],
        |row| {
            Ok((
                WingmanSession {
                    id: row.get(0)?,
                    match_id: row.get(1)?,
                    user1_challenge_id: row.get(2)?,
                    user2_challenge_id: row.get(3)?,
                    venue_name: row.get(4)?,
                    scheduled_time: row.get(5)?,
                    status: row.get(6)?,
                    notes: row.get(7)?,
                    user1_completed_confirmed_by_user2: row.get(8)?,
                    user2_completed_confirmed_by_user1: row.get(9)?,
                    completed_at: row.get(10)?,
                    created_at: row.get(11)?,
                },
                row.get(12)?,
            ))
        },
    )
    .ok()
}

fn load_challenge(conn: &rusqlite::Connection, id: &str) -> Option<ApproachChallenge> {
    conn.query_row(
        "SELECT id, difficulty, title, description, points FROM approach_challenges WHERE id = ?1",
        params![id],
        |row| {
            Ok(ApproachChallenge {
                id: row.get(0)?,
                difficulty: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                points: row.get(4)?,
            })
        },
    )
    .ok()
}

fn match_participants(conn: &rusqlite::Connection, match_id: &str) -> Option<(String, String)> {
    conn.query_row(
        "SELECT user1_id, user2_id FROM wingman_matches WHERE id = ?1",
        params![match_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .ok()
}

fn display_name(conn: &rusqlite::Connection, user_id: &str) -> Option<String> {
    conn.query_row(
        "SELECT display_name FROM user_profiles WHERE id = ?1",
        params![user_id],
        |r| r.get::<_, Option<String>>(0),
    )
    .ok()
    .flatten()
}

/// `get_session(session_id, caller_id)`: participant-only.
pub fn get_session(db: &Db, session_id: &str, caller_id: &str) -> ApiResult<SessionData> {
    let conn = db.conn();
    let (session, _match_status) =
        load_session(&conn, session_id).ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;
    let (user1_id, user2_id) = match_participants(&conn, &session.match_id)
        .ok_or_else(|| ApiError::NotFound("match not found".to_string()))?;

    if caller_id != user1_id && caller_id != user2_id {
        return Err(ApiError::Forbidden(
            "caller is not a participant of this session".to_string(),
        ));
    }

    let user1_challenge = load_challenge(&conn, &session.user1_challenge_id)
        .ok_or_else(|| ApiError::Internal("session references an unknown challenge".to_string()))?;
    let user2_challenge = load_challenge(&conn, &session.user2_challenge_id)
        .ok_or_else(|| ApiError::Internal("session references an unknown challenge".to_string()))?;

    let reputation_preview = ReputationPreview {
        user1_delta: user1_challenge.points,
        user2_delta: user2_challenge.points,
    };

    Ok(SessionData {
        user1_display_name: display_name(&conn, &user1_id),
        user2_display_name: display_name(&conn, &user2_id),
        user1_id,
        user2_id,
        user1_challenge,
        user2_challenge,
        reputation_preview,
        session,
    })
}

/// Atomically apply a confirmation flag flip and, if both flags are now
/// true, transition the session to completed and bump both reputation
/// counters on the match row. Returns (session_status, both_confirmed,
/// transitioned_to_completed).
fn apply_confirmation(
    db: &Db,
    session_id: &str,
    confirm_user1_side: bool,
    confirm_user2_side: bool,
) -> ApiResult<(String, bool, bool)> {
    let conn = db.conn();

    let (mut u1_confirmed, mut u2_confirmed, status, match_id, scheduled_time): (
        bool,
        bool,
        String,
        String,
        String,
    ) = conn
        .query_row(
            "SELECT user1_completed_confirmed_by_user2, user2_completed_confirmed_by_user1, status, match_id, scheduled_time
             FROM wingman_sessions WHERE id = ?1",
            params![session_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .map_err(|_| ApiError::NotFound("session not found".to_string()))?;

    if status == "completed" {
        return Ok((status, true, false));
    }

    let scheduled_dt = chrono::DateTime::parse_from_rfc3339(&scheduled_time)
        .map_err(|_| ApiError::Internal("stored scheduled_time is not valid RFC3339".to_string()))?;
    if chrono::Utc::now() < scheduled_dt {
        return Err(ApiError::TooEarly(
            "completion cannot be confirmed before the scheduled time".to_string(),
        ));
    }

    if confirm_user1_side {
        u1_confirmed = true;
    }
    if confirm_user2_side {
        u2_confirmed = true;
    }

    conn.execute(
        "UPDATE wingman_sessions SET user1_completed_confirmed_by_user2 = ?1, user2_completed_confirmed_by_user1 = ?2 WHERE id = ?3",
        params![u1_confirmed, u2_confirmed, session_id],
    )?;

    let both_confirmed = u1_confirmed && u2_confirmed;
    let mut transitioned = false;
    let mut new_status = status;

    if both_confirmed && new_status != "completed" {
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE wingman_sessions SET status = 'completed', completed_at = ?1 WHERE id = ?2",
            params![now, session_id],
        )?;
        conn.execute(
            "UPDATE wingman_matches SET user1_reputation = user1_reputation + 1, user2_reputation = user2_reputation + 1 WHERE id = ?1",
            params![match_id],
        )?;
        new_status = "completed".to_string();
        transitioned = true;
    }

    Ok((new_status, both_confirmed, transitioned))
}

/// `confirm_buddy_completion(session_id, caller_id, buddy_id)`: caller
/// vouches that buddy's attendance is confirmed.
pub async fn confirm_buddy_completion(
    db: &Db,
    cache: &dyn Cache,
    session_id: &str,
    caller_id: &str,
    buddy_id: &str,
) -> ApiResult<ConfirmResponse> {
    if caller_id == buddy_id {
        return Err(ApiError::Validation(
            "caller and buddy must be different participants".to_string(),
        ));
    }

    let match_id = {
        let conn = db.conn();
        let (_, match_id) =
            load_session(&conn, session_id).ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;
        match_id.match_id
    };

    let (user1_id, user2_id) = {
        let conn = db.conn();
        match_participants(&conn, &match_id).ok_or_else(|| ApiError::NotFound("match not found".to_string()))?
    };

    if (caller_id != user1_id && caller_id != user2_id) || (buddy_id != user1_id && buddy_id != user2_id) {
        return Err(ApiError::Forbidden(
            "caller and buddy must both be participants of this session's match".to_string(),
        ));
    }

    // Caller confirms buddy: flip the flag keyed to the buddy's side.
    let confirm_user1_side = caller_id == user2_id && buddy_id == user1_id;
    let confirm_user2_side = caller_id == user1_id && buddy_id == user2_id;

    let (status, both_confirmed, transitioned) =
        apply_confirmation(db, session_id, confirm_user1_side, confirm_user2_side)?;

    if transitioned {
        reputation::invalidate(cache, &user1_id).await;
        reputation::invalidate(cache, &user2_id).await;
        invalidate_session_cache(cache, &match_id).await;
    }

    Ok(ConfirmResponse {
        success: true,
        session_status: status,
        both_confirmed,
    })
}

/// `confirm_session_completion(session_id, caller_id)`: self-service
/// confirmation — flips the flag recording that the caller's own side is
/// done. See SPEC_FULL.md §4 for why this and `confirm_buddy_completion`
/// write to the same canonical flag pair.
pub async fn confirm_session_completion(
    db: &Db,
    cache: &dyn Cache,
    session_id: &str,
    caller_id: &str,
) -> ApiResult<ConfirmCompletionResponse> {
    let match_id = {
        let conn = db.conn();
        let (_, match_id) =
            load_session(&conn, session_id).ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;
        match_id.match_id
    };

    let (user1_id, user2_id) = {
        let conn = db.conn();
        match_participants(&conn, &match_id).ok_or_else(|| ApiError::NotFound("match not found".to_string()))?
    };

    let confirm_user1_side = caller_id == user1_id;
    let confirm_user2_side = caller_id == user2_id;
    if !confirm_user1_side && !confirm_user2_side {
        return Err(ApiError::Forbidden(
            "caller is not a participant of this session".to_string(),
        ));
    }

    let (status, both_confirmed, transitioned) =
        apply_confirmation(db, session_id, confirm_user1_side, confirm_user2_side)?;

    if transitioned {
        reputation::invalidate(cache, &user1_id).await;
        reputation::invalidate(cache, &user2_id).await;
        invalidate_session_cache(cache, &match_id).await;
    }

    Ok(ConfirmCompletionResponse {
        success: true,
        both_confirmed,
        reputation_updated: status == "completed",
        session_status: status,
    })
}

/// `update_session_notes(session_id, caller_id, notes)`: participant-only.
pub fn update_session_notes(
    db: &Db,
    session_id: &str,
    caller_id: &str,
    notes: &str,
) -> ApiResult<UpdateSessionNotesResponse> {
    let sanitized = chat::sanitize_text(notes);
    if sanitized.chars().count() > 2000 {
        return Err(ApiError::Validation(
            "notes must be at most 2000 characters after sanitization".to_string(),
        ));
    }

    let conn = db.conn();
    let (_, match_id) =
        load_session(&conn, session_id).ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;
    let (user1_id, user2_id) =
        match_participants(&conn, &match_id).ok_or_else(|| ApiError::NotFound("match not found".to_string()))?;

    if caller_id != user1_id && caller_id != user2_id {
        return Err(ApiError::Forbidden(
            "caller is not a participant of this session".to_string(),
        ));
    }

    conn.execute(
        "UPDATE wingman_sessions SET notes = ?1 WHERE id = ?2",
        params![sanitized, session_id],
    )?;

    Ok(UpdateSessionNotesResponse {
        success: true,
        updated_notes: sanitized,
    })
}

async fn invalidate_session_cache(cache: &dyn Cache, match_id: &str) {
    cache.delete(&format!("session:{match_id}")).await;
}
