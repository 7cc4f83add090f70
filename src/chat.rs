use rusqlite::params;

use crate::cache::Cache;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ChatMessage, ListMessagesResponse, SendChatMessageResponse};
use crate::rate_limit;

const SYSTEM_SENDER: &str = "system";

/// HTML-escape and strip control characters. No dedicated sanitization crate
/// appears anywhere in the surrounding corpus for this narrow
/// string-transformation need, so this is hand-rolled rather than reaching
/// for an unrelated dependency (see DESIGN.md).
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_participant(conn: &rusqlite::Connection, match_id: &str, user_id: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM wingman_matches WHERE id = ?1 AND (user1_id = ?2 OR user2_id = ?2)",
        params![match_id, user_id],
        |r| r.get::<_, i64>(0),
    )
    .map(|c| c > 0)
    .unwrap_or(false)
}

fn match_exists(conn: &rusqlite::Connection, match_id: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM wingman_matches WHERE id = ?1",
        params![match_id],
        |r| r.get::<_, i64>(0),
    )
    .map(|c| c > 0)
    .unwrap_or(false)
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_id: row.get(2)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// `list_messages(match_id, caller_id, cursor?, limit≤100)`.
pub fn list_messages(
    db: &Db,
    caller_id: &str,
    match_id: &str,
    cursor: Option<&str>,
    limit: i64,
) -> ApiResult<ListMessagesResponse> {
    let conn = db.conn();
    if !match_exists(&conn, match_id) {
        return Err(ApiError::NotFound("match not found".to_string()));
    }
    if !is_participant(&conn, match_id, caller_id) {
        return Err(ApiError::Forbidden(
            "caller is not a participant of this match".to_string(),
        ));
    }

    let limit = limit.clamp(1, 100);

    let mut messages: Vec<ChatMessage> = if let Some(cursor) = cursor {
        let mut stmt = conn.prepare(
            "SELECT id, match_id, sender_id, message, created_at FROM chat_messages
             WHERE match_id = ?1 AND created_at < ?2
             ORDER BY created_at DESC LIMIT ?3",
        )?;
        stmt.query_map(params![match_id, cursor, limit], row_to_message)?
            .filter_map(|r| r.ok())
            .collect()
    } else {
        let mut stmt = conn.prepare(
            "SELECT id, match_id, sender_id, message, created_at FROM chat_messages
             WHERE match_id = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        stmt.query_map(params![match_id, limit], row_to_message)?
            .filter_map(|r| r.ok())
            .collect()
    };

    let has_more = messages.len() as i64 == limit;
    let next_cursor = if has_more {
        messages.last().map(|m| m.created_at.clone())
    } else {
        None
    };

    messages.reverse();

    Ok(ListMessagesResponse {
        messages,
        has_more,
        next_cursor,
    })
}

/// `send_message(match_id, caller_id, text)`. Rate-limited (token bucket,
/// policy `chat`, capacity=1, refill=2/s), sanitized, length-checked.
pub async fn send_message(
    db: &Db,
    cache: &dyn Cache,
    caller_id: &str,
    match_id: &str,
    text: &str,
) -> ApiResult<SendChatMessageResponse> {
    {
        let conn = db.conn();
        if !match_exists(&conn, match_id) {
            return Err(ApiError::NotFound("match not found".to_string()));
        }
        if !is_participant(&conn, match_id, caller_id) {
            return Err(ApiError::Forbidden(
                "caller is not a participant of this match".to_string(),
            ));
        }
    }

    let rl = rate_limit::consume(cache, "chat", caller_id, 1.0).await;
    if !rl.allowed {
        return Err(ApiError::RateLimited {
            message: "Too many messages sent, slow down.".to_string(),
            retry_after_secs: rl.retry_after_secs,
        });
    }

    let sanitized = sanitize_text(text).trim().to_string();
    if sanitized.chars().count() < 2 || sanitized.chars().count() > 2000 {
        return Err(ApiError::Validation(
            "message must be 2..2000 characters after sanitization".to_string(),
        ));
    }

    let (id, created_at) = insert_message(db, match_id, caller_id, &sanitized)?;
    update_read_cursor(db, match_id, caller_id, &created_at)?;

    Ok(SendChatMessageResponse {
        success: true,
        message_id: id,
        created_at,
    })
}

/// System messages (session-scheduled notices, etc.) bypass rate limiting.
pub fn append_system_message(db: &Db, match_id: &str, text: &str) -> ApiResult<()> {
    insert_message(db, match_id, SYSTEM_SENDER, text)?;
    Ok(())
}

fn insert_message(
    db: &Db,
    match_id: &str,
    sender_id: &str,
    message: &str,
) -> ApiResult<(String, String)> {
    let conn = db.conn();
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO chat_messages (id, match_id, sender_id, message, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, match_id, sender_id, message, now],
    )?;
    Ok((id, now))
}

fn update_read_cursor(db: &Db, match_id: &str, user_id: &str, last_read_at: &str) -> ApiResult<()> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO chat_read_cursors (match_id, user_id, last_read_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(match_id, user_id) DO UPDATE SET last_read_at = excluded.last_read_at",
        params![match_id, user_id, last_read_at],
    )?;
    Ok(())
}
