//! Identity webhook against a running admin server.

use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};

use saakie_admin::identity::SvixVerifier;
use saakie_integration_tests::{admin_base_url, client, unique};

async fn deliver(client: &Client, verifier: Option<&SvixVerifier>, payload: &Value) -> StatusCode {
    let body = payload.to_string();
    let mut request = client
        .post(format!("{}/webhooks/identity", admin_base_url()))
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(verifier) = verifier {
        let msg_id = unique("msg");
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = verifier
            .sign(&msg_id, &timestamp, body.as_bytes())
            .expect("sign payload");
        request = request
            .header("svix-id", msg_id)
            .header("svix-timestamp", timestamp)
            .header("svix-signature", signature);
    }

    request
        .body(body)
        .send()
        .await
        .expect("Failed to reach admin server")
        .status()
}

#[tokio::test]
#[ignore = "Requires running admin server with IDENTITY_WEBHOOK_SECRET set"]
async fn test_unsigned_delivery_is_rejected() {
    let status = deliver(&client(), None, &json!({"type": "user.created", "data": {}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server and IDENTITY_WEBHOOK_SECRET"]
async fn test_user_lifecycle() {
    let secret = std::env::var("IDENTITY_WEBHOOK_SECRET").expect("IDENTITY_WEBHOOK_SECRET");
    let verifier = SvixVerifier::from_secret(&secret).expect("valid secret");
    let client = client();
    let external_id = unique("user");
    let email = format!("{external_id}@saakie.in");

    let user = |first_name: &str| {
        json!({
            "id": external_id,
            "first_name": first_name,
            "last_name": "Sen",
            "email_addresses": [{"id": "idn_1", "email_address": email}],
            "primary_email_address_id": "idn_1",
            "phone_numbers": []
        })
    };

    let created = json!({"type": "user.created", "data": user("Rupa")});
    assert_eq!(deliver(&client, Some(&verifier), &created).await, StatusCode::OK);

    let updated = json!({"type": "user.updated", "data": user("Roopa")});
    assert_eq!(deliver(&client, Some(&verifier), &updated).await, StatusCode::OK);

    let deleted = json!({"type": "user.deleted", "data": {"id": external_id, "deleted": true}});
    assert_eq!(deliver(&client, Some(&verifier), &deleted).await, StatusCode::OK);

    let again = deliver(&client, Some(&verifier), &deleted).await;
    assert_eq!(again, StatusCode::NOT_FOUND);
}
