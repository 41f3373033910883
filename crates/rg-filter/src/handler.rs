//! HTTP adapters for the revocation filter.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::any,
};

use crate::filter::{DenyReason, RevocationFilter, Verdict};

/// Forward-auth endpoint path.
pub const VERIFY_PATH: &str = "/verify";

/// Shared state for the filter adapters.
#[derive(Debug, Clone)]
pub struct FilterState {
    /// The filter consulted for every request.
    pub filter: Arc<RevocationFilter>,
}

impl FilterState {
    /// Creates a new filter state.
    pub fn new(filter: RevocationFilter) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }
}

/// Creates the forward-auth router.
///
/// | Method | Path      | Handler  |
/// |--------|-----------|----------|
/// | any    | `/verify` | `verify` |
pub fn filter_router() -> Router<FilterState> {
    Router::new().route(VERIFY_PATH, any(verify))
}

/// Extracts the bearer credential from the `Authorization` header.
#[must_use]
pub fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware rejecting requests whose bearer token has been revoked.
///
/// Requests without a bearer credential pass through untouched; whether
/// they need one is the business of downstream authentication.
///
/// ```ignore
/// let app = Router::new()
///     .route("/api", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, revocation_guard));
/// ```
pub async fn revocation_guard(
    State(state): State<FilterState>,
    request: Request,
    next: Next,
) -> Response {
    let credential = bearer_credential(request.headers()).map(str::to_owned);
    let verdict = match credential {
        Some(credential) => state.filter.check(&credential).await,
        None => Verdict::Allow,
    };

    match verdict {
        Verdict::Allow => next.run(request).await,
        Verdict::Deny(reason) => unauthorized(&reason),
    }
}

/// `/verify`
///
/// # Responses
///
/// - 204 No Content: forward the original request
/// - 401 Unauthorized: the token is revoked, or its status is unknown under
///   a fail-closed policy
async fn verify(State(state): State<FilterState>, headers: HeaderMap) -> Response {
    let verdict = match bearer_credential(&headers) {
        Some(credential) => state.filter.check(credential).await,
        None => Verdict::Allow,
    };

    match verdict {
        Verdict::Allow => StatusCode::NO_CONTENT.into_response(),
        Verdict::Deny(reason) => unauthorized(&reason),
    }
}

fn unauthorized(reason: &DenyReason) -> Response {
    let challenge = format!("Bearer error=\"invalid_token\", error_description=\"{reason}\"");
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        headers.insert(header::WWW_AUTHENTICATE, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
