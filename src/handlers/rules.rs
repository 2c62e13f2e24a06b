// src/handlers/rules.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::access::{AccessType, ZoneAccessRule, ZoneRuleAssignment},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRulePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Sala de servidores")]
    pub title: String,

    #[schema(example = "TIME_LIMITED")]
    pub access_type: AccessType,

    /// Obrigatório para TIME_LIMITED
    #[schema(example = 30)]
    pub max_duration_minutes: Option<i32>,
}

// POST /api/organizations/{organization_id}/rules
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/rules",
    tag = "Access Rules",
    request_body = CreateRulePayload,
    responses((status = 201, description = "Regra criada", body = ZoneAccessRule)),
    params(("organization_id" = Uuid, Path, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateRulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rule = app_state
        .rule_service
        .create_rule(organization_id, &payload.title, payload.access_type, payload.max_duration_minutes)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(rule)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachRulePayload {
    pub zone_id: Uuid,

    #[validate(length(min = 1, message = "Informe pelo menos um cargo."))]
    pub position_ids: Vec<Uuid>,
}

// POST /api/organizations/{organization_id}/rules/{rule_id}/zones
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/rules/{rule_id}/zones",
    tag = "Access Rules",
    request_body = AttachRulePayload,
    responses(
        (status = 201, description = "Regra aplicada à zona", body = ZoneRuleAssignment),
        (status = 403, description = "Zona ou cargo de outra organização"),
        (status = 409, description = "Regra já aplicada à zona")
    ),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("rule_id" = Uuid, Path, description = "ID da regra")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AttachRulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let assignment = app_state
        .rule_service
        .attach_rule(organization_id, rule_id, payload.zone_id, &payload.position_ids)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// POST /api/organizations/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}",
    tag = "Access Rules",
    responses(
        (status = 200, description = "Cargo incluído", body = ZoneRuleAssignment),
        (status = 409, description = "Cargo já incluído")
    ),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("assignment_id" = Uuid, Path, description = "ID da atribuição"),
        ("position_id" = Uuid, Path, description = "ID do cargo")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_position(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, assignment_id, position_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let assignment = app_state
        .rule_service
        .add_position(organization_id, assignment_id, position_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignment))
}

// DELETE /api/organizations/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}
#[utoipa::path(
    delete,
    path = "/api/organizations/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}",
    tag = "Access Rules",
    responses(
        (status = 200, description = "Cargo removido", body = ZoneRuleAssignment),
        (status = 409, description = "Último cargo da atribuição")
    ),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("assignment_id" = Uuid, Path, description = "ID da atribuição"),
        ("position_id" = Uuid, Path, description = "ID do cargo")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_position(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, assignment_id, position_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let assignment = app_state
        .rule_service
        .remove_position(organization_id, assignment_id, position_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignment))
}

// DELETE /api/organizations/{organization_id}/rule-assignments/{assignment_id}
#[utoipa::path(
    delete,
    path = "/api/organizations/{organization_id}/rule-assignments/{assignment_id}",
    tag = "Access Rules",
    responses((status = 204, description = "Regra removida da zona")),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("assignment_id" = Uuid, Path, description = "ID da atribuição")
    ),
    security(("api_jwt" = []))
)]
pub async fn detach_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    app_state
        .rule_service
        .detach_rule(organization_id, assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
