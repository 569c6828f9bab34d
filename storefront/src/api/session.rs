//! Mock sign-in endpoints.
//!
//! - GET /api/v1/session - Current session
//! - POST /api/v1/session/login - Sign in, waiting for the simulated check
//! - POST /api/v1/session/logout - Sign out

#![allow(clippy::missing_errors_doc)]

use super::dispatch_and_settle;
use crate::app::StorefrontAction;
use crate::features::session::{SessionAction, SessionError, SessionState, User};
use crate::server::state::AppState;
use axum::{extract::State, Json};
use keystore_web::{ApiJson, AppError, CorrelationId};
use serde::Deserialize;

/// Request body for signing in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

/// Rejects the request unless an administrator is signed in
///
/// `401` for anonymous sessions, `403` for customers.
pub(crate) async fn require_admin(state: &AppState) -> Result<User, AppError> {
    let session = state.store.state(|s| s.session.clone()).await;
    match session.require_admin() {
        Ok(user) => Ok(user.clone()),
        Err(error @ SessionError::NotAdmin) if session.is_authenticated() => {
            Err(AppError::forbidden(error.to_string()))
        },
        Err(_) => Err(AppError::unauthorized("Sign in to continue")),
    }
}

/// Get the current session.
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.store.state(|s| s.session.clone()).await)
}

/// Sign in.
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/session/login \
///   -H "Content-Type: application/json" \
///   -d '{"email": "admin@keystore.ru", "password": "admin"}'
/// ```
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<User>, AppError> {
    tracing::info!(correlation_id = %correlation_id.0, "Signing in");

    let produced = dispatch_and_settle(
        &state.store,
        SessionAction::Login {
            email: request.email,
            password: request.password,
        }
        .into(),
        state.action_timeout,
    )
    .await?;

    for action in produced {
        match action {
            StorefrontAction::Session(SessionAction::LoginSucceeded { user }) => return Ok(Json(user)),
            StorefrontAction::Session(SessionAction::LoginRejected { reason }) => {
                return Err(AppError::validation(reason));
            },
            _ => {},
        }
    }

    Err(AppError::internal("Sign-in did not complete"))
}

/// Sign out.
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionState>, AppError> {
    state.store.send(SessionAction::Logout.into()).await?;
    Ok(Json(state.store.state(|s| s.session.clone()).await))
}
