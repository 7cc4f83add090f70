use rocket::http::{ContentType, Status};

use crate::common::{auto_match, complete_profile, test_client};

#[test]
fn test_candidates_within_radius() {
    let client = test_client();
    complete_profile(&client, "requester", 40.7128, -74.0060);
    complete_profile(&client, "nearby", 40.7130, -74.0062);

    let res = client
        .get("/api/matches/candidates/requester?radius_miles=20")
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["total_found"], 1);
    assert_eq!(body["candidates"][0]["user_id"], "nearby");
}

#[test]
fn test_candidates_invalid_radius_rejected() {
    let client = test_client();
    let res = client
        .get("/api/matches/candidates/requester?radius_miles=0")
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_distance_between_known_users() {
    let client = test_client();
    complete_profile(&client, "a", 40.7128, -74.0060);
    complete_profile(&client, "b", 40.7130, -74.0062);

    let res = client.get("/api/matches/distance/a/b").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["distance_miles"].as_f64().unwrap() < 1.0);
    assert_eq!(body["within_20_miles"], true);
}

#[test]
fn test_distance_unknown_users_not_found() {
    let client = test_client();
    let res = client.get("/api/matches/distance/ghost1/ghost2").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_auto_match_creates_deterministic_pair() {
    let client = test_client();
    complete_profile(&client, "alice", 40.7128, -74.0060);
    complete_profile(&client, "bob", 40.7130, -74.0062);

    let resp_a = auto_match(&client, "alice");
    assert_eq!(resp_a["success"], true);
    assert_eq!(resp_a["buddy_user_id"], "bob");
    let match_id_a = resp_a["match_id"].as_str().unwrap().to_string();

    // Re-requesting with an existing pending match returns the same match,
    // regardless of which participant calls it.
    let resp_b = auto_match(&client, "bob");
    assert_eq!(resp_b["match_id"].as_str().unwrap(), match_id_a);
}

#[test]
fn test_auto_match_no_location_fails_gracefully() {
    let client = test_client();
    let res = client.post("/api/matches/auto/ghost").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["success"], false);
    assert!(body["match_id"].is_null());
}

#[test]
fn test_respond_decline_reopens_matching() {
    let client = test_client();
    complete_profile(&client, "alice", 40.7128, -74.0060);
    complete_profile(&client, "bob", 40.7130, -74.0062);

    let resp = auto_match(&client, "alice");
    let match_id = resp["match_id"].as_str().unwrap().to_string();

    let res = client
        .post("/api/buddy/respond")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"user_id":"alice","match_id":"{match_id}","action":"decline"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["match_status"], "declined");

    // The declined match still counts against the pair's recency cooldown,
    // so a fresh auto-match attempt finds no compatible candidate.
    let next = auto_match(&client, "alice");
    assert_eq!(next["success"], false);
}

#[test]
fn test_respond_non_participant_forbidden() {
    let client = test_client();
    complete_profile(&client, "alice", 40.7128, -74.0060);
    complete_profile(&client, "bob", 40.7130, -74.0062);

    let resp = auto_match(&client, "alice");
    let match_id = resp["match_id"].as_str().unwrap().to_string();

    let res = client
        .post("/api/buddy/respond")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"user_id":"mallory","match_id":"{match_id}","action":"accept"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Forbidden);
}
