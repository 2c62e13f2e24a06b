// src/handlers/scans.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::access::{EmployeeLocation, ScanOutcome},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    /// Número de série do leitor
    #[schema(example = 100200)]
    pub reader_id: i64,

    #[schema(example = 3735928559_i64)]
    pub tag_uid: i64,

    /// Momento da leitura; ausente => agora
    pub timestamp: Option<DateTime<Utc>>,
}

// POST /api/scans
#[utoipa::path(
    post,
    path = "/api/scans",
    tag = "Scans",
    request_body = ScanPayload,
    responses(
        (status = 200, description = "Leitura processada", body = ScanOutcome),
        (status = 202, description = "Leitura ignorada (leitor, tag, atribuição ou porta não resolvidos)")
    ),
    params(("x-ingest-key" = String, Header, description = "Chave da ponte de leitores"))
)]
pub async fn ingest_scan(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let scanned_at = payload.timestamp.unwrap_or_else(Utc::now);

    let outcome = app_state
        .scan_service
        .process_scan(payload.reader_id, payload.tag_uid, scanned_at)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(match outcome {
        Some(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    })
}

// GET /api/organizations/{organization_id}/employees/{employee_id}/zone
#[utoipa::path(
    get,
    path = "/api/organizations/{organization_id}/employees/{employee_id}/zone",
    tag = "Scans",
    responses((status = 200, description = "Zona atual reconstruída do histórico", body = EmployeeLocation)),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("employee_id" = Uuid, Path, description = "ID do funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee_zone(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, employee_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let employee = app_state
        .scan_service
        .employee_in_organization(organization_id, employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let mut conn = app_state
        .db_pool
        .acquire()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    let current_zone_id = app_state
        .scan_service
        .reconstruct_current_zone(&mut conn, employee.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(EmployeeLocation { employee_id: employee.id, current_zone_id }))
}
