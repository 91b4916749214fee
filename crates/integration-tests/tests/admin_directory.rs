//! Directory API against a running admin server.

use reqwest::{StatusCode, header};
use serde_json::{Value, json};

use saakie_integration_tests::{admin_base_url, admin_cookie, client, unique};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin server");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_directory_requires_session() {
    let resp = client()
        .get(format!("{}/directory/users", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin server");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
#[ignore = "Requires running admin server and SAAKIE_ADMIN_COOKIE"]
async fn test_create_update_delete_round_trip() {
    let cookie = admin_cookie().expect("SAAKIE_ADMIN_COOKIE must be set");
    let client = client();
    let base_url = admin_base_url();
    let email = format!("{}@saakie.in", unique("it"));

    let resp = client
        .post(format!("{base_url}/directory/users"))
        .header(header::COOKIE, &cookie)
        .json(&json!({"name": "Integration Shopper", "email": email, "role": "MANAGER"}))
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("json body");
    let id = created["user"]["id"].as_i64().expect("numeric id");

    let resp = client
        .post(format!("{base_url}/directory/users"))
        .header(header::COOKIE, &cookie)
        .json(&json!({"name": "Duplicate", "email": email}))
        .send()
        .await
        .expect("duplicate request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .get(format!("{base_url}/directory/users?search={email}"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("list request");
    let page: Value = resp.json().await.expect("json body");
    assert_eq!(page["pagination"]["total"], 1);

    let resp = client
        .put(format!("{base_url}/directory/users/{id}"))
        .header(header::COOKIE, &cookie)
        .json(&json!({"status": "SUSPENDED"}))
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("json body");
    assert_eq!(updated["user"]["status"], "SUSPENDED");
    assert_eq!(updated["user"]["role"], "MANAGER");

    let resp = client
        .delete(format!("{base_url}/directory/users/{id}"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("delete request");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/directory/users/{id}"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("detail request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
