//! Checkout endpoint integration tests.
//!
//! Session creation against the live Stripe API is exercised manually; these
//! tests cover the request validation and configuration gating that never
//! leave the service.

mod common;

use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn unknown_package_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/checkout/session")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "packageId": "mega" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn checkout_without_stripe_is_unavailable() {
    let harness = TestHarness::without_stripe().await;

    let response = harness
        .server
        .post("/v1/checkout/session")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "packageId": "starter" }))
        .await;

    assert_eq!(response.status_code(), 503);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "payments_unavailable");
}

#[tokio::test]
async fn webhook_without_stripe_is_unavailable() {
    let harness = TestHarness::without_stripe().await;

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", "t=0,v1=abc")
        .text("{}")
        .await;

    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn checkout_without_auth_fails() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/checkout/session")
        .json(&json!({ "packageId": "starter" }))
        .await;

    response.assert_status_unauthorized();
}
