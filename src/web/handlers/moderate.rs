// The moderation endpoint.
//
// OPTIONS -> 204, no body (CORS preflight)
// POST    -> run the pipeline
// other   -> 405 {"error":"method_not_allowed"}
//
// POST returns 400 {"error":"text_required"} for a missing, non-string or
// empty `text` (or a body that isn't JSON at all or can't be read, such as
// one over MAX_BODY_BYTES), and 500
// {"error":"moderation_failed"} for any operational failure. Failure detail
// goes to the server log only.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{error, warn};

use crate::moderation::ModerationRequest;
use crate::web::{api_error, AppState};

pub async fn moderate(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        Method::POST => match body {
            Ok(body) => moderate_post(&state, &body).await,
            Err(rejection) => {
                warn!(status = %rejection.status(), "Unreadable request body: {rejection}");
                api_error(StatusCode::BAD_REQUEST, "text_required")
            }
        },
        _ => api_error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
    }
}

async fn moderate_post(state: &AppState, body: &[u8]) -> Response {
    let request = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| ModerationRequest::from_json(&value));
    let Some(request) = request else {
        return api_error(StatusCode::BAD_REQUEST, "text_required");
    };

    match state.moderator.moderate(&request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!(error = ?e, "Moderation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "moderation_failed")
        }
    }
}
