//! Stripe webhook integration tests: signature checks and idempotency.

mod common;

use common::TestHarness;
use serde_json::json;

/// Build a `checkout.session.completed` event payload.
fn checkout_completed_event(
    session_id: &str,
    user_id: &str,
    credits: &str,
    payment_status: &str,
) -> String {
    json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_status": payment_status,
                "amount_total": 2000,
                "metadata": {
                    "user_id": user_id,
                    "credits": credits,
                    "package_id": "standard"
                }
            }
        }
    })
    .to_string()
}

async fn account_credits(harness: &TestHarness) -> i64 {
    let response = harness
        .server
        .get("/v1/account")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["credits"].as_i64().unwrap()
}

#[tokio::test]
async fn paid_session_credits_the_account() {
    let harness = TestHarness::new().await;

    // Account exists (created with 3 signup credits).
    assert_eq!(account_credits(&harness).await, 3);

    let payload = checkout_completed_event(
        "cs_test_1",
        &harness.test_user_id.to_string(),
        "500",
        "paid",
    );

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
        .text(payload)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);

    assert_eq!(account_credits(&harness).await, 503);
}

#[tokio::test]
async fn replayed_event_credits_only_once() {
    let harness = TestHarness::new().await;
    assert_eq!(account_credits(&harness).await, 3);

    let payload = checkout_completed_event(
        "cs_test_replay",
        &harness.test_user_id.to_string(),
        "100",
        "paid",
    );

    for _ in 0..3 {
        harness
            .server
            .post("/webhooks/stripe")
            .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
            .text(payload.clone())
            .await
            .assert_status_ok();
    }

    // The session id deduplicates; only the first delivery credits.
    assert_eq!(account_credits(&harness).await, 103);
}

#[tokio::test]
async fn invalid_signature_is_rejected() {
    let harness = TestHarness::new().await;
    assert_eq!(account_credits(&harness).await, 3);

    let payload = checkout_completed_event(
        "cs_test_forged",
        &harness.test_user_id.to_string(),
        "500",
        "paid",
    );

    let ts = chrono::Utc::now().timestamp();
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", format!("t={ts},v1=deadbeef"))
        .text(payload)
        .await;

    response.assert_status_bad_request();
    assert_eq!(account_credits(&harness).await, 3);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/webhooks/stripe")
        .text("{}")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let harness = TestHarness::new().await;

    let payload = checkout_completed_event(
        "cs_test_stale",
        &harness.test_user_id.to_string(),
        "500",
        "paid",
    );

    // Sign with a timestamp far outside the tolerance window.
    let ts = chrono::Utc::now().timestamp() - 3600;
    let sig = imglens_service::crypto::hmac_sha256_hex(
        common::TEST_WEBHOOK_SECRET,
        &format!("{ts}.{payload}"),
    );

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", format!("t={ts},v1={sig}"))
        .text(payload)
        .await;

    response.assert_status_bad_request();
    assert_eq!(account_credits(&harness).await, 3);
}

#[tokio::test]
async fn unpaid_session_is_acknowledged_without_credit() {
    let harness = TestHarness::new().await;
    assert_eq!(account_credits(&harness).await, 3);

    let payload = checkout_completed_event(
        "cs_test_unpaid",
        &harness.test_user_id.to_string(),
        "500",
        "unpaid",
    );

    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
        .text(payload)
        .await
        .assert_status_ok();

    assert_eq!(account_credits(&harness).await, 3);
}

#[tokio::test]
async fn invalid_metadata_is_acknowledged_without_credit() {
    let harness = TestHarness::new().await;
    assert_eq!(account_credits(&harness).await, 3);

    let payload = json!({
        "id": "evt_bad_meta",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_bad_meta",
                "payment_status": "paid",
                "metadata": {}
            }
        }
    })
    .to_string();

    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
        .text(payload)
        .await
        .assert_status_ok();

    assert_eq!(account_credits(&harness).await, 3);
}

#[tokio::test]
async fn unrelated_event_types_are_acknowledged() {
    let harness = TestHarness::new().await;

    let payload = json!({
        "id": "evt_other",
        "type": "invoice.paid",
        "data": { "object": {} }
    })
    .to_string();

    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
        .text(payload)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn payment_for_unknown_account_is_acknowledged() {
    let harness = TestHarness::new().await;

    // No account has been created for this user id.
    let stranger = imglens_core::UserId::generate();
    let payload =
        checkout_completed_event("cs_test_stranger", &stranger.to_string(), "500", "paid");

    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::sign_webhook(&payload))
        .text(payload)
        .await
        .assert_status_ok();
}
