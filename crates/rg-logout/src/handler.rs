//! Back-channel logout endpoint.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, State, rejection::FormRejection},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;

use crate::error::{ErrorResponse, LogoutError};
use crate::ingestion::LogoutIngestion;

/// Path the identity provider posts logout tokens to.
pub const BACKCHANNEL_LOGOUT_PATH: &str = "/backchannel-logout";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Form body of a back-channel logout request.
#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    /// The signed logout token.
    pub logout_token: String,
}

/// Shared state for the logout endpoint.
#[derive(Debug, Clone)]
pub struct LogoutState {
    /// Ingestion service writing revocations.
    pub ingestion: Arc<LogoutIngestion>,
}

impl LogoutState {
    /// Creates a new logout state.
    pub fn new(ingestion: LogoutIngestion) -> Self {
        Self {
            ingestion: Arc::new(ingestion),
        }
    }
}

/// Creates the logout router.
///
/// | Method | Path                   | Handler              |
/// |--------|------------------------|----------------------|
/// | POST   | `/backchannel-logout`  | `backchannel_logout` |
pub fn logout_router() -> Router<LogoutState> {
    Router::new()
        .route(BACKCHANNEL_LOGOUT_PATH, post(backchannel_logout))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// POST `/backchannel-logout`
///
/// # Responses
///
/// - 200 OK, empty body: revocations recorded
/// - 400 Bad Request: missing `logout_token` or malformed token
/// - 413 Payload Too Large: body above [`MAX_BODY_BYTES`]
/// - 501 Not Implemented: required claims missing
/// - 503 Service Unavailable: the store write failed
async fn backchannel_logout(
    State(state): State<LogoutState>,
    form: Result<Form<LogoutForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return rejection_response(&rejection),
    };

    match state.ingestion.ingest(&form.logout_token).await {
        Ok(_) => no_store(StatusCode::OK.into_response()),
        Err(ref err) => error_response(err),
    }
}

fn rejection_response(rejection: &FormRejection) -> Response {
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    tracing::warn!(%status, reason = %rejection.body_text(), "rejected back-channel logout request");

    let body = ErrorResponse {
        error: "invalid_request".to_string(),
        error_description: Some(rejection.body_text()),
    };
    no_store((status, Json(body)).into_response())
}

fn error_response(err: &LogoutError) -> Response {
    match err {
        LogoutError::StoreUnavailable(_) => {
            tracing::error!(error = %err, "back-channel logout not recorded");
        }
        LogoutError::Malformed(_) | LogoutError::Unsupported(_) => {
            tracing::warn!(error = %err, "back-channel logout rejected");
        }
    }

    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    no_store((status, Json(err.to_error_response())).into_response())
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
