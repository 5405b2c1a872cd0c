use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware. This is the whole of the auth
/// collaborator: seller identity travels separately in `X-Seller-Id` and is
/// validated by the handlers, never here.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `SHOPKIT_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("SHOPKIT_API_KEYS").unwrap_or_default();
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "SHOPKIT_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "SHOPKIT_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

#[derive(Debug, Serialize)]
struct UnauthorizedBody {
    error: &'static str,
    code: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(UnauthorizedBody {
                error: "missing or invalid bearer token",
                code: "UNAUTHORIZED",
            }),
        )
            .into_response(),
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
