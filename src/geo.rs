use rusqlite::params;

use crate::db::{great_circle_miles, Db};
use crate::models::BuddyCandidate;

const MAX_CANDIDATES: usize = 10;

/// Find up to 10 buddy candidates within `radius_miles` of `requester_id`,
/// sorted by ascending distance. Returns an empty list (not an error) if the
/// requester has no location on file or is in `city_only` privacy mode.
pub fn find_candidates_within_radius(
    db: &Db,
    requester_id: &str,
    radius_miles: f64,
) -> Vec<BuddyCandidate> {
    let conn = db.conn();

    let requester_loc: Option<(f64, f64, String)> = conn
        .query_row(
            "SELECT lat, lng, privacy_mode FROM user_locations WHERE user_id = ?1",
            params![requester_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .ok();

    let (lat, lng, privacy_mode) = match requester_loc {
        Some(v) => v,
        None => return Vec::new(),
    };

    if privacy_mode == "city_only" || (lat == 0.0 && lng == 0.0) {
        return Vec::new();
    }

    let mut stmt = conn
        .prepare(
            "SELECT ul.user_id, ul.city, up.experience_level, up.confidence_archetype,
                    great_circle_miles(?1, ?2, ul.lat, ul.lng) AS distance_miles
             FROM user_locations ul
             JOIN user_profiles up ON ul.user_id = up.id
             WHERE ul.user_id != ?3
               AND NOT (ul.lat = 0.0 AND ul.lng = 0.0)
               AND ul.privacy_mode != 'city_only'
               AND up.experience_level IS NOT NULL
               AND up.confidence_archetype IS NOT NULL
               AND great_circle_miles(?1, ?2, ul.lat, ul.lng) <= ?4
             ORDER BY distance_miles ASC
             LIMIT ?5",
        )
        .expect("find_candidates_within_radius query must be valid SQL");

    stmt.query_map(
        params![lat, lng, requester_id, radius_miles, MAX_CANDIDATES as i64],
        |row| {
            Ok(BuddyCandidate {
                user_id: row.get(0)?,
                city: row.get(1)?,
                experience_level: row.get(2)?,
                confidence_archetype: row.get(3)?,
                distance_miles: round1(row.get(4)?),
            })
        },
    )
    .expect("find_candidates_within_radius row mapping must succeed")
    .filter_map(|r| r.ok())
    .collect()
}

/// Distance between two users, or `None` if either has no location or is in
/// `city_only` mode.
pub fn distance_between(db: &Db, user_a: &str, user_b: &str) -> Option<f64> {
    let conn = db.conn();
    let loc_a = load_precise_location(&conn, user_a)?;
    let loc_b = load_precise_location(&conn, user_b)?;
    Some(round1(great_circle_miles(loc_a.0, loc_a.1, loc_b.0, loc_b.1)))
}

fn load_precise_location(conn: &rusqlite::Connection, user_id: &str) -> Option<(f64, f64)> {
    let row: Option<(f64, f64, String)> = conn
        .query_row(
            "SELECT lat, lng, privacy_mode FROM user_locations WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .ok();
    match row {
        Some((lat, lng, mode)) if mode != "city_only" && !(lat == 0.0 && lng == 0.0) => {
            Some((lat, lng))
        }
        _ => None,
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
