//! End-to-end test support for the StockMate API.
//!
//! Each [`TestContext`] owns a full router over a fresh in-memory store,
//! a manual clock and a recording notifier, so tests can read OTP codes
//! and reset links, move time forward, and drive requests with
//! `tower::ServiceExt::oneshot` without any external services.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockmate-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{SubsecRound, TimeDelta, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

use stockmate_core::{Email, ShopId};
use stockmate_server::config::ServerConfig;
use stockmate_server::db::{MemoryStore, Stores};
use stockmate_server::routes;
use stockmate_server::services::auth::SessionSigner;
use stockmate_server::services::clock::ManualClock;
use stockmate_server::services::email::RecordingNotifier;
use stockmate_server::state::AppState;

/// Password used by [`TestContext::signed_in_shop`].
pub const PASSWORD: &str = "correct horse battery";

const SESSION_SECRET: &str = "Kx9#mP2$vL7nQ4wR8tY3zB6cF1hJ5gD0";
const BASE_URL: &str = "https://stockmate.test";
const BODY_LIMIT: usize = 1024 * 1024;

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// The raw body, for byte-for-byte comparisons.
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// The `"error"` message of an error body.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// A running application plus handles on its injected collaborators.
pub struct TestContext {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Application with login allowed before verification.
    #[must_use]
    pub fn new() -> Self {
        Self::build(false, SESSION_SECRET)
    }

    /// Application that rejects login until the OTP step is done.
    #[must_use]
    pub fn requiring_verified_login() -> Self {
        Self::build(true, SESSION_SECRET)
    }

    /// Application signing sessions with a different key.
    #[must_use]
    pub fn with_session_secret(secret: &str) -> Self {
        Self::build(false, secret)
    }

    fn build(require_verified_login: bool, session_secret: &str) -> Self {
        let config = ServerConfig {
            database_url: SecretString::from("memory://".to_string()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: Url::parse(BASE_URL).expect("valid base url"),
            session_secret: SecretString::from(session_secret.to_string()),
            require_verified_login,
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let clock = Arc::new(ManualClock::new(Utc::now().trunc_subsecs(0)));
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::new(
            config,
            Stores::memory(Arc::new(MemoryStore::new())),
            notifier.clone(),
            clock.clone(),
        )
        .expect("Failed to create application state");

        Self {
            app: routes::app(state),
            clock,
            notifier,
        }
    }

    /// Move the shared clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        self.clock.advance(delta);
    }

    /// Send one request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    // =========================================================================
    // Account helpers
    // =========================================================================

    /// Register `email` with [`PASSWORD`].
    pub async fn register(&self, email: &str) -> TestResponse {
        self.post(
            "/api/shop/register",
            None,
            json!({
                "name": "Corner Shop",
                "email": email,
                "password": PASSWORD,
                "phone": "555-0100",
                "address": "1 High St",
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/shop/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> TestResponse {
        self.post(
            "/api/shop/verify-otp",
            None,
            json!({ "email": email, "otp": otp }),
        )
        .await
    }

    /// Register, verify and log in; returns the bearer token.
    pub async fn signed_in_shop(&self, email: &str) -> String {
        assert_eq!(self.register(email).await.status, StatusCode::CREATED);
        let otp = self.last_otp(email).expect("OTP was sent");
        assert_eq!(self.verify_otp(email, &otp).await.status, StatusCode::OK);

        let login = self.login(email, PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK);
        login.body["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }

    /// A token for `shop_id` signed with this application's key, whether or
    /// not the shop exists.
    #[must_use]
    pub fn session_for(&self, shop_id: i32) -> String {
        let signer = SessionSigner::new(
            &SecretString::from(SESSION_SECRET.to_string()),
            self.clock.clone(),
        )
        .expect("valid signing key");
        signer.issue(ShopId::new(shop_id))
    }

    /// The most recent OTP emailed to `email`.
    #[must_use]
    pub fn last_otp(&self, email: &str) -> Option<String> {
        self.notifier.last_otp(&Email::parse(email).ok()?)
    }

    /// The most recent reset link emailed to `email`.
    #[must_use]
    pub fn last_reset_url(&self, email: &str) -> Option<Url> {
        let link = self.notifier.last_reset_url(&Email::parse(email).ok()?)?;
        Url::parse(&link).ok()
    }

    /// The token segment of the most recent reset link.
    #[must_use]
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let url = self.last_reset_url(email)?;
        url.path_segments()?.next_back().map(str::to_string)
    }

    // =========================================================================
    // Resource helpers
    // =========================================================================

    /// Create a warehouse; returns its ID.
    pub async fn create_warehouse(&self, token: &str, name: &str, capacity: i64) -> i64 {
        let response = self
            .post(
                "/api/warehouse",
                Some(token),
                json!({ "name": name, "location": "Dock 4", "capacity": capacity }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().expect("warehouse id")
    }

    /// Create an item in `warehouse_id`; returns the full response.
    pub async fn create_item(&self, token: &str, warehouse_id: i64, sku: &str) -> TestResponse {
        self.post(
            "/api/inventory",
            Some(token),
            json!({
                "warehouse_id": warehouse_id,
                "product_name": "Widget",
                "sku": sku,
                "quantity": 12,
                "price": "4.50",
                "category": "parts",
            }),
        )
        .await
    }
}
