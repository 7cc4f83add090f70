use rocket::http::{ContentType, Status};

use crate::common::{auth, make_accepted_match, test_client};

#[test]
fn test_send_and_list_messages() {
    let client = test_client();
    let (user_a, user_b, match_id) = make_accepted_match(&client);

    let res = client
        .post("/api/chat/send")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"match_id":"{match_id}","message":"Hey, ready for Saturday?"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let sent: serde_json::Value = res.into_json().unwrap();
    assert_eq!(sent["success"], true);

    let res = client
        .get(format!("/api/chat/messages/{match_id}"))
        .header(auth(&user_b))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["message"], "Hey, ready for Saturday?");
    assert_eq!(messages[0]["sender_id"], user_a);
}

#[test]
fn test_send_message_non_participant_forbidden() {
    let client = test_client();
    let (_user_a, _user_b, match_id) = make_accepted_match(&client);

    let res = client
        .post("/api/chat/send")
        .header(ContentType::JSON)
        .header(auth("mallory"))
        .body(format!(r#"{{"match_id":"{match_id}","message":"intruding"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Forbidden);
}

#[test]
fn test_send_message_too_short_rejected() {
    let client = test_client();
    let (user_a, _user_b, match_id) = make_accepted_match(&client);

    let res = client
        .post("/api/chat/send")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"match_id":"{match_id}","message":"h"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_chat_rate_limit_enforced() {
    let client = test_client();
    let (user_a, _user_b, match_id) = make_accepted_match(&client);

    // Token bucket for the "chat" policy has capacity 1: the first send
    // succeeds, an immediate second one is rejected.
    let first = client
        .post("/api/chat/send")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"match_id":"{match_id}","message":"First message"}}"#))
        .dispatch();
    assert_eq!(first.status(), Status::Ok);

    let second = client
        .post("/api/chat/send")
        .header(ContentType::JSON)
        .header(auth(&user_a))
        .body(format!(r#"{{"match_id":"{match_id}","message":"Second message"}}"#))
        .dispatch();
    assert_eq!(second.status(), Status::TooManyRequests);
    let body: serde_json::Value = second.into_json().unwrap();
    assert_eq!(body["error"], "rate_limited");
}

#[test]
fn test_chat_pagination_cursor() {
    let client = test_client();
    let (user_a, _user_b, match_id) = make_accepted_match(&client);

    // Each send is separated enough to clear the chat rate limit (refill
    // rate 2 tokens/sec, capacity 1).
    for i in 0..3 {
        let res = client
            .post("/api/chat/send")
            .header(ContentType::JSON)
            .header(auth(&user_a))
            .body(format!(r#"{{"match_id":"{match_id}","message":"message number {i}"}}"#))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        std::thread::sleep(std::time::Duration::from_millis(600));
    }

    let res = client
        .get(format!("/api/chat/messages/{match_id}?limit=2"))
        .header(auth(&user_a))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let page1 = body["messages"].as_array().unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(body["has_more"], true);
    let cursor = body["next_cursor"].as_str().unwrap().to_string();
    let cursor_encoded = cursor.replace('+', "%2B").replace(':', "%3A");

    let res = client
        .get(format!("/api/chat/messages/{match_id}?limit=2&cursor={cursor_encoded}"))
        .header(auth(&user_a))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let page2 = body["messages"].as_array().unwrap();
    assert_eq!(page2.len(), 1);
    assert_eq!(body["has_more"], false);
}
