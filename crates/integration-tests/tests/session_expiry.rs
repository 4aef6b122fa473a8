//! Request interceptor behaviour against a mock backend.
//!
//! - the stored credential is sent as a bearer header
//! - a 401 from any endpoint clears both persisted session keys
//! - other error bodies reach the caller unchanged

#![allow(clippy::unwrap_used)]

use radapos_client::ApiError;
use radapos_client::session::{LogoutReason, Navigation};
use radapos_client::storage::{KeyValueStore, keys};
use radapos_core::Role;
use radapos_integration_tests::{TEST_TOKEN, TestContext, identity};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn assert_session_cleared(ctx: &TestContext) {
    assert_eq!(ctx.store.get(keys::ACCESS_TOKEN).unwrap(), None);
    assert_eq!(ctx.store.get(keys::USER).unwrap(), None);
    assert!(!ctx.session.is_active());
}

#[tokio::test]
async fn test_bearer_header_sent() {
    let ctx = TestContext::signed_in(Role::Cashier).await;
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let list = ctx.client.list_notifications().await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_no_bearer_when_signed_out() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    ctx.client.list_products().await.unwrap();

    let requests = ctx.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_login_persists_session() {
    let ctx = TestContext::new().await;
    let mut nav = ctx.session.subscribe();
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "wanjiku@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "user": {"id": 7, "name": "Wanjiku", "email": "wanjiku@example.com", "role": "VENDOR"}
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let who = ctx
        .client
        .login("wanjiku@example.com", &SecretString::from("hunter22"))
        .await
        .unwrap();

    assert_eq!(who.role, Role::Vendor);
    assert_eq!(ctx.store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("fresh-token"));
    assert!(ctx.session.is_active());
    assert_eq!(nav.try_recv().unwrap(), Navigation::Landing(Role::Vendor));
}

#[tokio::test]
async fn test_unauthorized_clears_session_on_any_endpoint() {
    for endpoint in ["wallet", "products", "stats", "report"] {
        let ctx = TestContext::signed_in(Role::Vendor).await;
        let mut nav = ctx.session.subscribe();
        Mock::given(any())
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Token has expired"})))
            .mount(&ctx.server)
            .await;

        let err = match endpoint {
            "wallet" => ctx.client.wallet().await.unwrap_err(),
            "products" => ctx.client.list_vendor_products().await.unwrap_err(),
            "stats" => ctx.client.dashboard_stats().await.unwrap_err(),
            _ => ctx.client.shift_report().await.unwrap_err(),
        };

        assert!(matches!(err, ApiError::Unauthorized), "{endpoint}: {err}");
        assert_session_cleared(&ctx);
        assert_eq!(
            nav.try_recv().unwrap(),
            Navigation::Login {
                reason: LogoutReason::Unauthorized
            }
        );
    }
}

#[tokio::test]
async fn test_unauthorized_on_login_also_clears() {
    let ctx = TestContext::signed_in(Role::Cashier).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Bad credentials"})))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .client
        .login("wanjiku@example.com", &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_session_cleared(&ctx);
}

#[tokio::test]
async fn test_backend_message_surfaced() {
    let ctx = TestContext::signed_in(Role::Vendor).await;
    Mock::given(method("POST"))
        .and(path("/vendor/wallet/request-withdrawal"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Minimum withdrawal is 100"})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let err = ctx
        .client
        .request_withdrawal(
            radapos_core::Money::from_shillings(50),
            radapos_core::Money::from_shillings(1_000),
        )
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Minimum withdrawal is 100");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Not a 401, so the session survives.
    assert!(ctx.session.is_active());
    assert_eq!(ctx.session.identity(), Some(identity(Role::Vendor)));
}

#[tokio::test]
async fn test_overdraw_never_sent() {
    let ctx = TestContext::signed_in(Role::Vendor).await;

    let err = ctx
        .client
        .request_withdrawal(
            radapos_core::Money::from_shillings(5_000),
            radapos_core::Money::from_shillings(1_000),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(ctx.server.received_requests().await.unwrap().is_empty());
}
