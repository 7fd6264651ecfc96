//! Axum JSON gateway.
//!
//! The identity provider in front of this service resolves authentication
//! and forwards the actor's username in a trusted header; every protected
//! handler resolves that username to a profile and asks `can()` before
//! doing anything. Role checks never happen anywhere else.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::cases::{CaseRegistry, ExtensionOutcome};
use crate::config::BrandingDefaults;
use crate::db::{
    AuditStore, CaseDraft, CaseFilter, CaseStatus, Database, ProfileRecord, ProfileStore,
    RegisterProfileParams, SettingsStore,
};
use crate::error::{CaseError, ChannelError, DatabaseError, ExportError, ProfileError, ValidationErrors};
use crate::stats::case_statistics;
use crate::users::{Action, ProfileDirectory, Role, active_role, can};

use super::types::{
    AuditListQuery, AuditListResponse, CaseDetailResponse, CaseListQuery, CaseListResponse,
    ExtensionResponse, MessageResponse, PendingUsersResponse, ProfileResponse,
    RegisterCaseResponse, SettingsResponse, SettingsUpdateRequest, StatusUpdateRequest,
    StatusUpdateResponse,
};

/// Header carrying the authenticated username, set by the identity proxy.
const ACTOR_HEADER: &str = "x-actor-username";

const EXPORT_FILENAME: &str = "reporte_casos_comunitarios.csv";
const DEFAULT_AUDIT_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub registry: Arc<CaseRegistry>,
    pub profiles: Arc<ProfileDirectory>,
    pub branding: BrandingDefaults,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, branding: BrandingDefaults) -> Self {
        Self {
            registry: Arc::new(CaseRegistry::new(Arc::clone(&db))),
            profiles: Arc::new(ProfileDirectory::new(Arc::clone(&db))),
            db,
            branding,
        }
    }
}

/// Gateway error envelope. Domain errors map onto HTTP statuses here and
/// nowhere else.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    AccessDenied,
    NotFound,
    Validation(ValidationErrors),
    Transition(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": "No autenticado."}),
            ),
            Self::AccessDenied => (
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "Acceso denegado."}),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": "No encontrado."}),
            ),
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": "Por favor corrige los errores del formulario.",
                    "fields": errors,
                }),
            ),
            Self::Transition(requested) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": format!("Estado no válido: '{requested}'.")
                }),
            ),
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({"error": message}))
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "gateway internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "Error interno del servidor."}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::Validation(errors) => Self::Validation(errors),
            CaseError::AccessDenied => Self::AccessDenied,
            CaseError::NotFound => Self::NotFound,
            CaseError::TransitionNotAllowed { requested } => Self::Transition(requested),
            CaseError::Database(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation(errors) => Self::Validation(errors),
            ProfileError::AccessDenied => Self::AccessDenied,
            ProfileError::NotFound => Self::NotFound,
            ProfileError::Database(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self::Internal(err.to_string())
    }
}

async fn require_actor(state: &AppState, headers: &HeaderMap) -> Result<ProfileRecord, ApiError> {
    let username = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    state
        .profiles
        .resolve_actor(username)
        .await?
        .ok_or(ApiError::Unauthorized)
}

fn require_role(actor: &ProfileRecord, action: Action) -> Result<Role, ApiError> {
    match active_role(actor) {
        Some(role) if can(role, action) => Ok(role),
        _ => Err(ApiError::AccessDenied),
    }
}

fn filter_from_query(query: CaseListQuery) -> Result<CaseFilter, ApiError> {
    let status = match query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        None => None,
        Some(raw) => Some(CaseStatus::from_db_value(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("Estado desconocido: '{raw}'."))
        })?),
    };

    Ok(CaseFilter {
        judge_id: None,
        status,
        judge_username: query.judge.filter(|value| !value.trim().is_empty()),
        date_from: query.date_from,
        date_to: query.date_to,
        query: query.q.filter(|value| !value.trim().is_empty()),
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        // Profiles
        .route("/api/profiles/register", post(register_profile_handler))
        .route("/api/admin/pending-users", get(pending_users_handler))
        .route("/api/admin/users/{id}/approve", post(approve_user_handler))
        .route("/api/admin/users/{id}/reject", post(reject_user_handler))
        // Cases
        .route(
            "/api/cases",
            get(list_cases_handler).post(register_case_handler),
        )
        .route(
            "/api/cases/{number}",
            get(case_detail_handler)
                .put(update_case_handler)
                .delete(delete_case_handler),
        )
        .route("/api/cases/{number}/status", post(case_status_handler))
        .route(
            "/api/cases/{number}/extension",
            post(case_extension_handler),
        )
        // Admin panel
        .route("/api/admin/stats", get(admin_stats_handler))
        .route("/api/admin/audit", get(audit_list_handler))
        .route("/api/admin/export.csv", get(export_csv_handler))
        // Settings
        .route(
            "/api/settings",
            get(settings_get_handler).put(settings_put_handler),
        )
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until interrupted.
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<(), ChannelError> {
    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "gateway".to_string(),
                reason: format!("failed to bind to {addr}: {e}"),
            })?;
    let bound = listener
        .local_addr()
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: format!("failed to get local addr: {e}"),
        })?;
    tracing::info!(addr = %bound, "web gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: e.to_string(),
        })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("web gateway shutting down");
}

// --- Handlers ---

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn register_profile_handler(
    State(state): State<AppState>,
    Json(params): Json<RegisterProfileParams>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let profile = state.profiles.register(&params).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            message: "Tu solicitud ha sido enviada. El administrador revisará tu registro."
                .to_string(),
            profile,
        }),
    ))
}

async fn pending_users_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PendingUsersResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let pending = state.profiles.pending(&actor).await?;
    Ok(Json(PendingUsersResponse { pending }))
}

async fn approve_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let approved = state.profiles.approve(&actor, id).await?;
    let role_label = approved.role.map(Role::label).unwrap_or("?");
    Ok(Json(ProfileResponse {
        message: format!(
            "Usuario '{}' aprobado como {}.",
            approved.display_name(),
            role_label
        ),
        profile: approved,
    }))
}

async fn reject_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    state.profiles.reject(&actor, id).await?;
    Ok(Json(MessageResponse {
        message: "Usuario rechazado y eliminado correctamente.".to_string(),
    }))
}

async fn list_cases_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<CaseListResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let filter = filter_from_query(query)?;
    let cases = state.registry.list(&actor, filter).await?;
    Ok(Json(CaseListResponse {
        total: cases.len(),
        cases,
    }))
}

async fn register_case_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<CaseDraft>,
) -> Result<(StatusCode, Json<RegisterCaseResponse>), ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let case = state.registry.register(&actor, &draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterCaseResponse {
            message: format!(
                "Caso registrado con éxito. Número de caso: {}",
                case.case_number
            ),
            case,
        }),
    ))
}

async fn case_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
) -> Result<Json<CaseDetailResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let (case, report) = state.registry.detail(&actor, &number, Utc::now()).await?;
    Ok(Json(CaseDetailResponse {
        case,
        deadline: report.into(),
    }))
}

async fn update_case_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
    Json(draft): Json<CaseDraft>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let case = state.registry.update(&actor, &number, &draft).await?;
    Ok(Json(StatusUpdateResponse {
        message: format!("Caso {} actualizado correctamente.", case.case_number),
        case,
    }))
}

async fn delete_case_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    state.registry.delete(&actor, &number).await?;
    Ok(Json(MessageResponse {
        message: format!("Caso {number} eliminado correctamente."),
    }))
}

async fn case_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let case = state
        .registry
        .transition_status(&actor, &number, request.status)
        .await?;
    Ok(Json(StatusUpdateResponse {
        message: format!("Estado del caso actualizado a: {}.", case.status.label()),
        case,
    }))
}

async fn case_extension_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
) -> Result<Json<ExtensionResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    let outcome = state.registry.grant_extension(&actor, &number).await?;
    let response = match outcome {
        ExtensionOutcome::Granted(case) => ExtensionResponse {
            message: "Prórroga de 15 días concedida. El plazo ahora es de 30 días.".to_string(),
            warning: None,
            case,
        },
        ExtensionOutcome::AlreadyGranted(case) => ExtensionResponse {
            message: "Sin cambios.".to_string(),
            warning: Some("Ya se ha concedido una prórroga para este caso.".to_string()),
            case,
        },
    };
    Ok(Json(response))
}

async fn admin_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<crate::stats::CaseStatistics>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    require_role(&actor, Action::ViewStatistics)?;
    let filter = filter_from_query(query)?;
    let cases = state.registry.list(&actor, filter).await?;
    Ok(Json(case_statistics(&cases)))
}

async fn audit_list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<AuditListResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    require_role(&actor, Action::ViewAuditLog)?;
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, 1000);
    let entries = state.db.list_audit_entries(limit).await?;
    Ok(Json(AuditListResponse { entries }))
}

async fn export_csv_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    require_role(&actor, Action::ExportCases)?;

    let cases = state.registry.list(&actor, CaseFilter::default()).await?;
    let judge_names: HashMap<Uuid, String> = state
        .db
        .list_profiles()
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile.username))
        .collect();

    let mut body = Vec::new();
    crate::export::write_cases_csv(&mut body, &cases, &judge_names)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}

async fn settings_get_handler(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.db.load_platform_settings(&state.branding).await?;
    Ok(Json(SettingsResponse { settings }))
}

async fn settings_put_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SettingsUpdateRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let actor = require_actor(&state, &headers).await?;
    require_role(&actor, Action::EditSettings)?;
    let settings = state
        .db
        .update_platform_settings(&state.branding, &request.into_params())
        .await?;
    Ok(Json(SettingsResponse { settings }))
}
