//! Access gate for protected routes.
//!
//! Provides an extractor that resolves a bearer token to the acting shop.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::ShopAccount;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// Reads `Authorization: Bearer <token>`, verifies the token, and loads the
/// shop it names. Handlers receive the account and scope every storage call
/// to its ID.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireShop(shop): RequireShop,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", shop.name)
/// }
/// ```
pub struct RequireShop(pub ShopAccount);

impl FromRequestParts<AppState> for RequireShop {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let shop = state.accounts().authenticate(token).await?;

        tracing::Span::current().record("shop_id", tracing::field::display(shop.id));
        set_sentry_user(&shop.id);

        Ok(Self(shop))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn test_missing_or_wrong_scheme() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer  ")), None);
    }
}
