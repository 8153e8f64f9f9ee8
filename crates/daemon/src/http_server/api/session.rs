//! Resolving the caller's identity from a request.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use common::prelude::Username;

use super::error::ApiError;
use crate::ServiceState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";
/// Alternate header carrying either a raw token or a `session=<token>`
/// cookie string.
pub const X_SESSION: &str = "x-session";

/// The authenticated owner of a request.
///
/// Handlers that take a `Session` are only reached with a valid token; the
/// extractor rejects everything else with `403`.
#[derive(Debug, Clone)]
pub struct Session(pub Username);

#[async_trait]
impl FromRequestParts<ServiceState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let tokens = session_tokens(&parts.headers);
        let resolved = tokens
            .iter()
            .find_map(|token| state.sessions().resolve(Some(token.as_str())));
        match resolved {
            Some(username) => Ok(Session(username)),
            None => {
                tracing::debug!(presented = tokens.len(), "unauthenticated request");
                Err(ApiError::Unauthorized("authentication required".to_string()))
            }
        }
    }
}

/// Every session token presented with the request, in order of precedence:
/// the `session` cookie, the `X-Session` header, then
/// `Authorization: Bearer`. The first one that resolves wins, so a stale
/// cookie does not shadow a valid header.
pub fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    let mut tokens = Vec::new();

    if let Some(cookie) = CookieJar::from_headers(headers).get(SESSION_COOKIE) {
        tokens.push(cookie.value().to_string());
    }

    if let Some(value) = headers.get(X_SESSION).and_then(|v| v.to_str().ok()) {
        tokens.push(token_from_forwarded(value));
    }

    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        tokens.push(token.trim().to_string());
    }

    tokens.retain(|token| !token.is_empty());
    tokens
}

/// `X-Session` may hold a whole cookie string forwarded by a proxy.
fn token_from_forwarded(value: &str) -> String {
    value
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .unwrap_or(value)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn first(map: &HeaderMap) -> Option<String> {
        session_tokens(map).into_iter().next()
    }

    #[test]
    fn test_no_token() {
        assert!(session_tokens(&HeaderMap::new()).is_empty());
        assert!(session_tokens(&headers(&[("authorization", "Basic abc")])).is_empty());
    }

    #[test]
    fn test_each_source() {
        assert_eq!(
            first(&headers(&[("cookie", "theme=dark; session=tok1")])).as_deref(),
            Some("tok1")
        );
        assert_eq!(
            first(&headers(&[("x-session", "tok2")])).as_deref(),
            Some("tok2")
        );
        assert_eq!(
            first(&headers(&[("x-session", "a=b; session=tok3")])).as_deref(),
            Some("tok3")
        );
        assert_eq!(
            first(&headers(&[("authorization", "Bearer tok4")])).as_deref(),
            Some("tok4")
        );
    }

    #[test]
    fn test_precedence() {
        let all = headers(&[
            ("authorization", "Bearer bearer"),
            ("x-session", "forwarded"),
            ("cookie", "session=cookie"),
        ]);
        assert_eq!(session_tokens(&all), vec!["cookie", "forwarded", "bearer"]);

        let no_cookie = headers(&[("authorization", "Bearer bearer"), ("x-session", "forwarded")]);
        assert_eq!(session_tokens(&no_cookie), vec!["forwarded", "bearer"]);
    }
}
