use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};

pub struct Db {
    pub conn: Mutex<Connection>,
}

/// Earth radius in miles, used by the `great_circle_miles` scalar function.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two lat/lng points, in miles.
/// Registered as a SQLite scalar function so candidate filtering happens
/// inside the query rather than in application code.
pub fn great_circle_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_MILES * c
}

fn register_functions(conn: &Connection) {
    conn.create_scalar_function(
        "great_circle_miles",
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let lat1: f64 = ctx.get(0)?;
            let lng1: f64 = ctx.get(1)?;
            let lat2: f64 = ctx.get(2)?;
            let lng2: f64 = ctx.get(3)?;
            Ok(great_circle_miles(lat1, lng1, lat2, lng2))
        },
    )
    .expect("Failed to register great_circle_miles");
}

impl Db {
    pub fn new(path: &str) -> Self {
        let conn = Connection::open(path).expect("Failed to open database");
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .expect("Failed to set pragmas");
        register_functions(&conn);
        let db = Db {
            conn: Mutex::new(conn),
        };
        db.migrate();
        db
    }

    /// Lock helper so call sites read `db.conn()` rather than
    /// `db.conn.lock().unwrap()` everywhere.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_profiles (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL DEFAULT '',
                display_name TEXT,
                bio TEXT NOT NULL DEFAULT '',
                experience_level TEXT,
                confidence_archetype TEXT,
                photo_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_locations (
                user_id TEXT PRIMARY KEY REFERENCES user_profiles(id) ON DELETE CASCADE,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                city TEXT,
                travel_radius_miles INTEGER NOT NULL DEFAULT 20,
                privacy_mode TEXT NOT NULL DEFAULT 'precise',
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS wingman_matches (
                id TEXT PRIMARY KEY,
                user1_id TEXT NOT NULL,
                user2_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                user1_reputation INTEGER NOT NULL DEFAULT 0,
                user2_reputation INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_matches_user1 ON wingman_matches(user1_id);
            CREATE INDEX IF NOT EXISTS idx_matches_user2 ON wingman_matches(user2_id);
            CREATE INDEX IF NOT EXISTS idx_matches_status ON wingman_matches(status);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_matches_pending_pair
                ON wingman_matches(user1_id, user2_id) WHERE status = 'pending';

            CREATE TABLE IF NOT EXISTS approach_challenges (
                id TEXT PRIMARY KEY,
                difficulty TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                points INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_challenges_difficulty ON approach_challenges(difficulty);

            CREATE TABLE IF NOT EXISTS wingman_sessions (
                id TEXT PRIMARY KEY,
                match_id TEXT NOT NULL REFERENCES wingman_matches(id) ON DELETE CASCADE,
                user1_challenge_id TEXT NOT NULL REFERENCES approach_challenges(id),
                user2_challenge_id TEXT NOT NULL REFERENCES approach_challenges(id),
                venue_name TEXT NOT NULL,
                scheduled_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled',
                notes TEXT NOT NULL DEFAULT '',
                user1_completed_confirmed_by_user2 INTEGER NOT NULL DEFAULT 0,
                user2_completed_confirmed_by_user1 INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_match ON wingman_sessions(match_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_status ON wingman_sessions(match_id, status);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                match_id TEXT NOT NULL REFERENCES wingman_matches(id) ON DELETE CASCADE,
                sender_id TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_match_created ON chat_messages(match_id, created_at);

            CREATE TABLE IF NOT EXISTS chat_read_cursors (
                match_id TEXT NOT NULL REFERENCES wingman_matches(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                last_read_at TEXT NOT NULL,
                PRIMARY KEY (match_id, user_id)
            );
            ",
        )
        .expect("Failed to run migrations");

        seed_approach_challenges(&conn);
    }
}

/// Seed the approach-challenge catalog if empty. Content is externally
/// managed in production; this is a development-friendly default set so the
/// matcher and session endpoints have real challenge ids to reference.
fn seed_approach_challenges(conn: &Connection) {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM approach_challenges", [], |r| r.get(0))
        .unwrap_or(0);
    if count > 0 {
        return;
    }

    let seed: &[(&str, &str, &str, &str, i64)] = &[
        (
            "chl_compliment_stranger",
            "beginner",
            "Compliment a stranger",
            "Give a genuine, specific compliment to someone you don't know.",
            1,
        ),
        (
            "chl_ask_for_directions",
            "beginner",
            "Ask for directions",
            "Strike up a conversation by asking someone for directions, even if you know the way.",
            1,
        ),
        (
            "chl_small_talk_barista",
            "beginner",
            "Small talk with a barista",
            "Make small talk while ordering instead of staying silent.",
            1,
        ),
        (
            "chl_get_a_number",
            "intermediate",
            "Get a phone number",
            "Have a conversation that ends with exchanging contact info.",
            2,
        ),
        (
            "chl_group_approach",
            "intermediate",
            "Approach a group",
            "Introduce yourself to a group of two or more people.",
            2,
        ),
        (
            "chl_ask_out_directly",
            "intermediate",
            "Ask someone out directly",
            "Invite someone you just met to a specific activity, time, and place.",
            2,
        ),
        (
            "chl_cold_approach_day",
            "advanced",
            "Daytime cold approach",
            "Approach someone you've never met in a public daytime setting with no pretext.",
            3,
        ),
        (
            "chl_public_speaking_intro",
            "advanced",
            "Public self-introduction",
            "Introduce yourself to an entire group or room, unprompted.",
            3,
        ),
        (
            "chl_handle_rejection",
            "advanced",
            "Handle a rejection gracefully",
            "Approach knowing rejection is likely, and respond to a 'no' with grace.",
            3,
        ),
    ];

    for (id, difficulty, title, description, points) in seed {
        conn.execute(
            "INSERT INTO approach_challenges (id, difficulty, title, description, points) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, difficulty, title, description, points],
        )
        .ok();
    }
}
