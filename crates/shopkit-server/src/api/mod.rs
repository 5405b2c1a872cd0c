mod related;

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use shopkit_core::TenantScope;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Budget for one related-products request, in milliseconds.
    pub related_deadline_ms: u64,
}

/// Wire-level error: `{ "error": <short message>, "code": <UPPER_SNAKE> }`.
/// Messages never carry SQL, paths, or other internals.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INVALID_ARGUMENT",
        }
    }

    pub fn not_found() -> Self {
        Self {
            error: "product not found".to_string(),
            code: "NOT_FOUND",
        }
    }

    pub fn cancelled() -> Self {
        Self {
            error: "request deadline exceeded".to_string(),
            code: "CANCELLED",
        }
    }

    pub fn internal() -> Self {
        Self {
            error: "internal server error".to_string(),
            code: "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            "INVALID_ARGUMENT" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CANCELLED" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Extracts the required `X-Seller-Id` header as a [`TenantScope`].
///
/// A missing or malformed header is `InvalidArgument`, not `Unauthorized`:
/// the seller id is a business parameter, orthogonal to the bearer token.
pub struct SellerId(pub TenantScope);

impl<S: Send + Sync> FromRequestParts<S> for SellerId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-seller-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(TenantScope::new)
            .map(SellerId)
            .ok_or_else(|| {
                ApiError::invalid_argument(
                    "X-Seller-Id header is required and must be a positive integer",
                )
            })
    }
}

pub(super) fn map_db_error(request_id: &str, error: &shopkit_db::DbError) -> ApiError {
    match error {
        shopkit_db::DbError::DeadlineExceeded => {
            tracing::warn!(request_id, "catalog query hit the request deadline");
            ApiError::cancelled()
        }
        other => {
            tracing::error!(request_id, error = %other, "catalog query failed");
            ApiError::internal()
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-seller-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/products/{id}/related",
            get(related::get_related_products),
        )
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        )))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match shopkit_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(request_id = %req_id.0, error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_maps_to_bad_request() {
        let response = ApiError::invalid_argument("bad page").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn cancelled_maps_to_gateway_timeout() {
        let response = ApiError::cancelled().into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn internal_error_hides_details() {
        let error = map_db_error("req-1", &shopkit_db::DbError::NotFound);
        assert_eq!(error.code, "INTERNAL_ERROR");
        assert_eq!(error.error, "internal server error");
    }

    #[test]
    fn deadline_exceeded_surfaces_as_cancelled() {
        let error = map_db_error("req-1", &shopkit_db::DbError::DeadlineExceeded);
        assert_eq!(error.code, "CANCELLED");
    }

    #[test]
    fn api_error_serializes_to_wire_body() {
        let json = serde_json::to_value(ApiError::not_found()).expect("serialize");
        assert_eq!(json["error"], "product not found");
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
