//! Forgot-password and reset-password flows.

use axum::http::StatusCode;
use chrono::TimeDelta;
use serde_json::json;

use stockmate_integration_tests::{PASSWORD, TestContext, TestResponse};

const NEW_PASSWORD: &str = "a brand new secret";

async fn forgot(ctx: &TestContext, email: &str) -> TestResponse {
    ctx.post(
        "/api/shop/forgot-password",
        None,
        json!({ "email": email }),
    )
    .await
}

async fn reset(ctx: &TestContext, token: &str, email: &str, password: &str) -> TestResponse {
    ctx.post(
        &format!("/api/shop/reset-password/{token}"),
        None,
        json!({ "email": email, "password": password }),
    )
    .await
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    let sent_before = ctx.notifier.sent().len();

    let known = forgot(&ctx, "owner@shop.test").await;
    let unknown = forgot(&ctx, "nobody@shop.test").await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.status, unknown.status);
    assert_eq!(known.bytes, unknown.bytes);
    assert_eq!(ctx.notifier.sent().len(), sent_before + 1);
    assert!(ctx.last_reset_url("nobody@shop.test").is_none());
}

#[tokio::test]
async fn test_reset_link_shape() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;

    let url = ctx
        .last_reset_url("owner@shop.test")
        .expect("reset link was sent");
    assert_eq!(url.host_str(), Some("stockmate.test"));
    assert!(url.path().starts_with("/reset-password/"));
    assert_eq!(url.query(), Some("email=owner%40shop.test"));
    let token = ctx.last_reset_token("owner@shop.test").unwrap_or_default();
    assert_eq!(token.len(), 43);
}

#[tokio::test]
async fn test_reset_replaces_password_once() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;
    let token = ctx.last_reset_token("owner@shop.test").unwrap_or_default();

    let response = reset(&ctx, &token, "owner@shop.test", NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(
        ctx.login("owner@shop.test", NEW_PASSWORD).await.status,
        StatusCode::OK
    );
    assert_eq!(
        ctx.login("owner@shop.test", PASSWORD).await.status,
        StatusCode::UNAUTHORIZED
    );

    let reused = reset(&ctx, &token, "owner@shop.test", "yet another secret").await;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        ctx.login("owner@shop.test", NEW_PASSWORD).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_expired_reset_token_leaves_password_alone() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;
    let token = ctx.last_reset_token("owner@shop.test").unwrap_or_default();

    ctx.advance(TimeDelta::minutes(16));
    let response = reset(&ctx, &token, "owner@shop.test", NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Verification code has expired"));

    assert_eq!(
        ctx.login("owner@shop.test", PASSWORD).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_reset_token_bound_to_its_email() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    ctx.signed_in_shop("other@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;
    let token = ctx.last_reset_token("owner@shop.test").unwrap_or_default();

    let response = reset(&ctx, &token, "other@shop.test", NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        ctx.login("other@shop.test", PASSWORD).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_weak_new_password_keeps_token_usable() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;
    let token = ctx.last_reset_token("owner@shop.test").unwrap_or_default();

    let weak = reset(&ctx, &token, "owner@shop.test", "short").await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let ok = reset(&ctx, &token, "owner@shop.test", NEW_PASSWORD).await;
    assert_eq!(ok.status, StatusCode::OK);
}

#[tokio::test]
async fn test_second_request_supersedes_first_link() {
    let ctx = TestContext::new();
    ctx.signed_in_shop("owner@shop.test").await;
    forgot(&ctx, "owner@shop.test").await;
    let first = ctx.last_reset_token("owner@shop.test").unwrap_or_default();
    forgot(&ctx, "owner@shop.test").await;
    let second = ctx.last_reset_token("owner@shop.test").unwrap_or_default();
    assert_ne!(first, second);

    let stale = reset(&ctx, &first, "owner@shop.test", NEW_PASSWORD).await;
    assert_eq!(stale.status, StatusCode::BAD_REQUEST);
    let fresh = reset(&ctx, &second, "owner@shop.test", NEW_PASSWORD).await;
    assert_eq!(fresh.status, StatusCode::OK);
}
