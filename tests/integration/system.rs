use rocket::http::Status;

use crate::common::test_client;

#[test]
fn test_health() {
    let client = test_client();
    let res = client.get("/api/v1/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["cache_fallback_hits"].as_u64().is_some());
}

#[test]
fn test_not_found_catcher() {
    let client = test_client();
    let res = client.get("/api/nonexistent/route").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
