use std::thread::sleep;
use std::time::Duration;

use rocket::http::{ContentType, Status};

use crate::common::{auth, make_accepted_match, test_client};

fn near_future_rfc3339(secs: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::seconds(secs)).to_rfc3339()
}

fn create_session_body(match_id: &str, scheduled_time: &str) -> String {
    format!(
        r#"{{"match_id":"{match_id}","venue_name":"Riverside Cafe","time":"{scheduled_time}",
            "user1_challenge_id":"chl_compliment_stranger","user2_challenge_id":"chl_get_a_number"}}"#
    )
}

#[test]
fn test_create_session_success() {
    let client = test_client();
    let (_user_a, _user_b, match_id) = make_accepted_match(&client);

    let res = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["venue_name"], "Riverside Cafe");
    assert!(!body["session_id"].as_str().unwrap().is_empty());
}

#[test]
fn test_create_session_match_not_found() {
    let client = test_client();
    let res = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body("nonexistent-match", &near_future_rfc3339(3600)))
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_create_session_match_not_accepted() {
    let client = test_client();
    crate::common::complete_profile(&client, "alice", 40.7128, -74.0060);
    crate::common::complete_profile(&client, "bob", 40.7130, -74.0062);
    let resp = crate::common::auto_match(&client, "alice");
    let match_id = resp["match_id"].as_str().unwrap().to_string();

    // Match is still pending — never responded to.
    let res = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_create_session_invalid_challenge_ids() {
    let client = test_client();
    let (_user_a, _user_b, match_id) = make_accepted_match(&client);

    let body = format!(
        r#"{{"match_id":"{match_id}","venue_name":"Riverside Cafe","time":"{}",
            "user1_challenge_id":"not-a-real-challenge","user2_challenge_id":"chl_get_a_number"}}"#,
        near_future_rfc3339(3600)
    );
    let res = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_create_session_past_scheduled_time_rejected() {
    let client = test_client();
    let (_user_a, _user_b, match_id) = make_accepted_match(&client);

    let res = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(-3600)))
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_create_session_active_session_already_exists() {
    let client = test_client();
    let (_user_a, _user_b, match_id) = make_accepted_match(&client);

    let first = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    assert_eq!(first.status(), Status::Ok);

    let second = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(7200)))
        .dispatch();
    assert_eq!(second.status(), Status::Conflict);
}

#[test]
fn test_get_session_requires_participant() {
    let client = test_client();
    let (user_a, _user_b, match_id) = make_accepted_match(&client);

    let create = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    let created: serde_json::Value = create.into_json().unwrap();
    let session_id = created["session_id"].as_str().unwrap();

    let res = client
        .get(format!("/api/session/{session_id}"))
        .header(auth(&user_a))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client
        .get(format!("/api/session/{session_id}"))
        .header(auth("mallory"))
        .dispatch();
    assert_eq!(res.status(), Status::Forbidden);
}

#[test]
fn test_confirmation_before_scheduled_time_is_too_early() {
    let client = test_client();
    let (user_a, user_b, match_id) = make_accepted_match(&client);

    let create = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    let created: serde_json::Value = create.into_json().unwrap();
    let session_id = created["session_id"].as_str().unwrap();

    let res = client
        .post(format!("/api/session/{session_id}/confirm"))
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"buddy_user_id":"{user_b}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "too_early");
}

#[test]
fn test_dual_self_confirmation_completes_session_and_updates_reputation() {
    let client = test_client();
    let (user_a, user_b, match_id) = make_accepted_match(&client);

    let create = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(1)))
        .dispatch();
    let created: serde_json::Value = create.into_json().unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    sleep(Duration::from_millis(1200));

    let res = client
        .post("/api/session/confirm-completion")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"session_id":"{session_id}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["both_confirmed"], false);
    assert_eq!(body["session_status"], "scheduled");

    let res = client
        .post("/api/session/confirm-completion")
        .header(ContentType::JSON)
        .header(auth(&user_b))
        .body(format!(r#"{{"session_id":"{session_id}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["both_confirmed"], true);
    assert_eq!(body["reputation_updated"], true);
    assert_eq!(body["session_status"], "completed");

    // Re-confirming an already-completed session is idempotent.
    let res = client
        .post("/api/session/confirm-completion")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"session_id":"{session_id}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["session_status"], "completed");

    let res = client
        .get(format!("/api/user/reputation/{user_a}?use_cache=false"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let rep: serde_json::Value = res.into_json().unwrap();
    assert_eq!(rep["completed_sessions"], 1);
    assert_eq!(rep["no_shows"], 0);
    assert_eq!(rep["score"], 1);
    assert_eq!(rep["badge_color"], "green");
}

#[test]
fn test_buddy_confirmation_path_completes_session() {
    let client = test_client();
    let (user_a, user_b, match_id) = make_accepted_match(&client);

    let create = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(1)))
        .dispatch();
    let created: serde_json::Value = create.into_json().unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    sleep(Duration::from_millis(1200));

    // user_a vouches that user_b showed up.
    let res = client
        .post(format!("/api/session/{session_id}/confirm"))
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"buddy_user_id":"{user_b}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["both_confirmed"], false);

    // user_b returns the favor, vouching for user_a — completes the pair.
    let res = client
        .post(format!("/api/session/{session_id}/confirm"))
        .header(ContentType::JSON)
        .header(auth(&user_b))
        .body(format!(r#"{{"buddy_user_id":"{user_a}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["both_confirmed"], true);
    assert_eq!(body["session_status"], "completed");
}

#[test]
fn test_update_session_notes() {
    let client = test_client();
    let (user_a, _user_b, match_id) = make_accepted_match(&client);

    let create = client
        .post("/api/session/create")
        .header(ContentType::JSON)
        .body(create_session_body(&match_id, &near_future_rfc3339(3600)))
        .dispatch();
    let created: serde_json::Value = create.into_json().unwrap();
    let session_id = created["session_id"].as_str().unwrap();

    let res = client
        .patch(format!("/api/session/{session_id}/notes"))
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(r#"{"notes":"Went well, <script>alert(1)</script> grabbed coffee after."}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["updated_notes"].as_str().unwrap().contains("&lt;script&gt;"));
}
