use rocket::http::{ContentType, Status};

use crate::common::test_client;

#[test]
fn test_complete_profile_success() {
    let client = test_client();
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"alice","bio":"Shy but working on it.",
                "location":{"lat":40.7128,"lng":-74.0060,"privacy_mode":"precise"},
                "travel_radius":20}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["ready_for_matching"], true);
    assert_eq!(body["user_id"], "alice");
}

#[test]
fn test_complete_profile_empty_bio_rejected() {
    let client = test_client();
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"bob","bio":"   ",
                "location":{"lat":40.7128,"lng":-74.0060,"privacy_mode":"precise"},
                "travel_radius":20}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "validation");
}

#[test]
fn test_complete_profile_invalid_latitude_rejected() {
    let client = test_client();
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"bob","bio":"Hello there",
                "location":{"lat":400.0,"lng":-74.0060,"privacy_mode":"precise"},
                "travel_radius":20}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_complete_profile_city_only_requires_city() {
    let client = test_client();
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"carol","bio":"Hello there",
                "location":{"lat":40.7128,"lng":-74.0060,"privacy_mode":"city_only"},
                "travel_radius":20}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);

    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"carol","bio":"Hello there",
                "location":{"lat":40.7128,"lng":-74.0060,"city":"New York","privacy_mode":"city_only"},
                "travel_radius":20}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn test_complete_profile_travel_radius_out_of_range() {
    let client = test_client();
    let res = client
        .post("/api/profile/complete")
        .header(ContentType::JSON)
        .body(
            r#"{"user_id":"dave","bio":"Hello there",
                "location":{"lat":40.7128,"lng":-74.0060,"privacy_mode":"precise"},
                "travel_radius":100}"#,
        )
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}
