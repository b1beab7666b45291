use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{ErrorResponse, MessageResponse, SignUpRequest},
        error::SignupError,
        services::sign_up,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/signup", post(sign_up_with_email_and_password))
}

/// An unreadable body is answered with 200 and an error payload; signup failures with 401.
#[instrument(skip(state, payload))]
pub async fn sign_up_with_email_and_password(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "unable to parse request body");
            return Json(ErrorResponse {
                error: "unable to parse request body".into(),
            })
            .into_response();
        }
    };

    match sign_up(state.store.as_ref(), payload).await {
        Ok(outcome) => {
            info!(
                user_id = %outcome.user.id,
                account_id = %outcome.account.id,
                provider = ?outcome.account.provider,
                "sign up successful"
            );
            Json(MessageResponse {
                message: "sign up successful",
            })
            .into_response()
        }
        Err(e) => {
            match &e {
                SignupError::Internal(detail) => error!(error = %detail, "signup failed"),
                SignupError::Validation(v) => {
                    warn!(fields = ?v.fields().collect::<Vec<_>>(), "signup rejected")
                }
                other => warn!(error = %other, "signup rejected"),
            }
            e.into_response()
        }
    }
}
