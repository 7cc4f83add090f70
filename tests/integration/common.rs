use rocket::local::blocking::Client;
use wingman_match_core::config::Config;

/// Wrapper around Client that auto-deletes the temp DB on drop.
/// Uses Option<Client> so we can drop the DB connection before deleting the file.
pub struct TestClient {
    client: Option<Client>,
    db_path: String,
}

impl Drop for TestClient {
    fn drop(&mut self) {
        // Drop client first to release SQLite connection (WAL mode holds the file)
        drop(self.client.take());
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_path));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_path));
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().unwrap()
    }
}

pub fn test_client() -> TestClient {
    let db_path = format!(
        "/tmp/wingman_test_{}.db",
        uuid::Uuid::new_v4().to_string().split('-').next().unwrap()
    );

    let config = Config {
        database_path: db_path.clone(),
        test_auth_enabled: true,
        ..Config::default()
    };

    let rocket = wingman_match_core::rocket_with_config(config);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestClient { client: Some(client), db_path }
}

/// Stand-in auth header for a test user, accepted because `test_auth_enabled` is set.
pub fn auth(user_id: &str) -> rocket::http::Header<'static> {
    rocket::http::Header::new("X-Test-User-Id", user_id.to_string())
}

/// Complete a profile at the given coordinates in `precise` mode.
pub fn complete_profile(client: &Client, user_id: &str, lat: f64, lng: f64) {
    use rocket::http::{ContentType, Status};
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"user_id":"{user_id}","bio":"Working on my confidence, one approach at a time.",
                "location":{{"lat":{lat},"lng":{lng},"privacy_mode":"precise"}},
                "travel_radius":25}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok, "complete_profile failed for {user_id}");
}

/// Run the automatic matcher for `user_id` and return the parsed response body.
pub fn auto_match(client: &Client, user_id: &str) -> serde_json::Value {
    use rocket::http::Status;
    let res = client.post(format!("/api/matches/auto/{user_id}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    res.into_json().unwrap()
}

/// Create two matched, mutually-accepted users and return their ids plus the match id.
pub fn make_accepted_match(client: &Client) -> (String, String, String) {
    use rocket::http::{ContentType, Status};

    let user_a = format!("user_{}", uuid::Uuid::new_v4());
    let user_b = format!("user_{}", uuid::Uuid::new_v4());

    complete_profile(client, &user_a, 40.7128, -74.0060);
    complete_profile(client, &user_b, 40.7130, -74.0062);

    let match_resp = auto_match(client, &user_a);
    assert_eq!(match_resp["success"], true, "auto_match did not succeed: {match_resp}");
    let match_id = match_resp["match_id"].as_str().unwrap().to_string();

    let res = client
        .post("/api/buddy/respond")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"user_id":"{user_a}","match_id":"{match_id}","action":"accept"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    (user_a, user_b, match_id)
}
