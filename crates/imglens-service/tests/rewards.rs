//! Check-in and referral reward integration tests.

mod common;

use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn credits_for(harness: &TestHarness, auth: &str) -> i64 {
    let response = harness
        .server
        .get("/v1/account")
        .add_header("authorization", auth)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["credits"].as_i64().unwrap()
}

// ============================================================================
// Daily check-in
// ============================================================================

#[tokio::test]
async fn checkin_grants_reward_once_per_day() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/checkin")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["checkedIn"], true);
    assert_eq!(body["alreadyCheckedIn"], false);
    assert_eq!(body["credits"], 4); // 3 signup + 1 reward
    assert!(body["checkinDay"].as_str().unwrap().len() == 10);

    // Second claim the same day is a no-op.
    let response = harness
        .server
        .post("/v1/checkin")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["checkedIn"], true);
    assert_eq!(body["alreadyCheckedIn"], true);
    assert_eq!(body["credits"], 4);

    assert_eq!(credits_for(&harness, &harness.user_auth_header()).await, 4);
}

#[tokio::test]
async fn checkin_status_reflects_claim() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/checkin/status")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["checkedInToday"], false);

    harness
        .server
        .post("/v1/checkin")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/checkin/status")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["checkedInToday"], true);
}

#[tokio::test]
async fn checkin_without_auth_fails() {
    let harness = TestHarness::new().await;
    harness
        .server
        .post("/v1/checkin")
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Referrals
// ============================================================================

async fn inviter_code(harness: &TestHarness) -> String {
    let response = harness
        .server
        .get("/v1/referral/code")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn referral_code_is_stable_across_calls() {
    let harness = TestHarness::new().await;

    let first = inviter_code(&harness).await;
    let second = inviter_code(&harness).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);

    let response = harness
        .server
        .get("/v1/referral/code")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["url"].as_str().unwrap().contains(&first));
}

#[tokio::test]
async fn referral_claim_rewards_the_inviter_once() {
    let harness = TestHarness::new().await;
    let code = inviter_code(&harness).await;

    let invitee_auth = TestHarness::other_user_auth_header();
    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", invitee_auth.as_str())
        .json(&json!({ "code": code }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["claimed"], true);
    assert_eq!(body["reward"], 20);
    assert_eq!(body["inviterCredits"], 23); // 3 signup + 20 reward

    // The inviter received the reward; the invitee balance is unchanged.
    assert_eq!(credits_for(&harness, &harness.user_auth_header()).await, 23);
    assert_eq!(credits_for(&harness, &invitee_auth).await, 3);

    // A second claim by the same invitee is declined.
    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", invitee_auth.as_str())
        .json(&json!({ "code": code }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["claimed"], false);
    assert_eq!(body["alreadyClaimed"], true);
    assert_eq!(credits_for(&harness, &harness.user_auth_header()).await, 23);
}

#[tokio::test]
async fn referral_claim_reads_code_from_cookie() {
    let harness = TestHarness::new().await;
    let code = inviter_code(&harness).await;

    let invitee_auth = TestHarness::other_user_auth_header();
    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", invitee_auth.as_str())
        .add_header("cookie", format!("imglens_ref={code}; theme=dark"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["claimed"], true);
}

#[tokio::test]
async fn referral_claim_rejects_own_code() {
    let harness = TestHarness::new().await;
    let code = inviter_code(&harness).await;

    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": code }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn referral_claim_rejects_unknown_code() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "NOSUCH01" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn referral_claim_requires_a_code() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn invitee_with_prior_activity_is_not_eligible() {
    let harness = TestHarness::new().await;
    let code = inviter_code(&harness).await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": []
        })))
        .mount(&harness.provider)
        .await;

    // The invitee runs a search before claiming, so they are no longer a
    // genuinely new account.
    let invitee_auth = TestHarness::other_user_auth_header();
    harness
        .server
        .post("/v1/search")
        .add_header("authorization", invitee_auth.as_str())
        .json(&json!({ "imageUrl": "https://example.com/cat.jpg" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/referral/claim")
        .add_header("authorization", invitee_auth.as_str())
        .json(&json!({ "code": code }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["claimed"], false);
    assert_eq!(body["reason"], "not_eligible");

    // The inviter received nothing.
    assert_eq!(credits_for(&harness, &harness.user_auth_header()).await, 3);
}
