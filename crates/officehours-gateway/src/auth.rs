// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the gateway.
//!
//! The gateway sits behind an auth proxy. Requests must carry the shared
//! bearer token, and the proxy states who the caller is in the `x-user-id`
//! and `x-user-role` headers. With no token configured every request is
//! rejected.

use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};

use officehours_core::{Role, UserId};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects everything.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that checks `Authorization: Bearer <token>`.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.bearer_token.as_deref() else {
        tracing::error!("gateway has no bearer token configured, rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// The caller as asserted by the upstream proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    fn from_headers(headers: &axum::http::HeaderMap) -> Result<Self, ApiError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let raw_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
        let user_id = raw_id
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| ApiError::BadRequest(format!("{USER_ID_HEADER} must be an integer")))?;

        let raw_role = header(USER_ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ROLE_HEADER} header")))?;
        let role = Role::from_str(&raw_role.to_ascii_lowercase())
            .map_err(|_| ApiError::BadRequest(format!("unknown role `{raw_role}`")))?;
        // System is reserved for the scheduler.
        if role == Role::System {
            return Err(ApiError::Forbidden("the system role cannot be asserted".into()));
        }

        Ok(Self { user_id, role })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    fn headers(id: Option<&'static str>, role: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(USER_ID_HEADER, HeaderValue::from_static(id));
        }
        if let Some(role) = role {
            map.insert(USER_ROLE_HEADER, HeaderValue::from_static(role));
        }
        map
    }

    #[test]
    fn debug_redacts_token() {
        let config = AuthConfig {
            bearer_token: Some("secret-token".to_string()),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }

    #[test]
    fn identity_parses_headers() {
        let id = Identity::from_headers(&headers(Some("42"), Some("TA"))).unwrap();
        assert_eq!(
            id,
            Identity {
                user_id: UserId(42),
                role: Role::Ta
            }
        );
    }

    #[test]
    fn identity_rejections() {
        assert!(matches!(
            Identity::from_headers(&headers(None, Some("student"))),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            Identity::from_headers(&headers(Some("abc"), Some("student"))),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            Identity::from_headers(&headers(Some("1"), Some("dean"))),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            Identity::from_headers(&headers(Some("1"), Some("system"))),
            Err(ApiError::Forbidden(_))
        ));
    }
}
