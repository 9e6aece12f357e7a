//! HTTP routes over [`CertificateService`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use certdesk_ca::CertificateService;
use certdesk_core::{
    resolve_actor, ActionResponse, CertdeskError, CertificateList, CreateCertificateRequest,
    CreateUserRequest, DeleteUserRequest, HistoryList, LoginRequest, RevokeCertificateRequest,
    SuccessResponse, UserList, UserResponse, CALLER_HEADER,
};

use crate::error::ApiError;

type AppState = Arc<CertificateService>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the API router.
pub fn router(service: Arc<CertificateService>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/certificates", get(list_certificates))
        .route("/api/certificate/create", post(create_certificate))
        .route("/api/certificate/revoke", post(revoke_certificate))
        .route("/api/history", get(list_history))
        .route(
            "/api/users",
            get(list_users).post(create_user).delete(delete_user),
        )
        .route("/api/users/login", post(login))
        .with_state(service)
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "OK"
}

async fn list_certificates(State(service): State<AppState>) -> Json<CertificateList> {
    Json(CertificateList {
        certificates: service.list_certificates().await,
    })
}

async fn create_certificate(
    State(service): State<AppState>,
    payload: Result<Json<CreateCertificateRequest>, JsonRejection>,
) -> ApiResult<ActionResponse> {
    let req = body(payload)?;
    let actor = resolve_actor(req.username.as_deref());
    let message = service
        .create_certificate(&req.domain, &req.additional_param, actor)
        .await?;
    Ok(Json(ActionResponse {
        success: true,
        message,
    }))
}

async fn revoke_certificate(
    State(service): State<AppState>,
    payload: Result<Json<RevokeCertificateRequest>, JsonRejection>,
) -> ApiResult<ActionResponse> {
    let req = body(payload)?;
    let actor = resolve_actor(req.username.as_deref());
    let message = service.revoke_certificate(&req.id, actor).await?;
    Ok(Json(ActionResponse {
        success: true,
        message,
    }))
}

async fn list_history(State(service): State<AppState>) -> Json<HistoryList> {
    Json(HistoryList {
        history: service.list_history().await,
    })
}

async fn list_users(State(service): State<AppState>) -> Json<UserList> {
    Json(UserList {
        users: service.list_users().await,
    })
}

async fn login(
    State(service): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let req = body(payload)?;
    let user = service.login(&req.username, &req.password).await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

async fn create_user(
    State(service): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let req = body(payload)?;
    let user = service
        .create_user(caller(&headers), &req.username, &req.password, &req.role)
        .await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

async fn delete_user(
    State(service): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let req = body(payload)?;
    service.delete_user(caller(&headers), &req.id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ── Helpers ─────────────────────────────────────────────────────────

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError(CertdeskError::validation(e.body_text())))
}

fn caller(headers: &HeaderMap) -> Option<&str> {
    headers.get(CALLER_HEADER).and_then(|v| v.to_str().ok())
}
