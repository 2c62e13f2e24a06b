// src/handlers/rfid.rs

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
    models::access::{RfidReader, RfidTag, TagAssignment},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReaderPayload {
    #[validate(range(min = 1, message = "O número de série deve ser positivo."))]
    #[schema(example = 100200)]
    pub serial_number: i64,

    /// Porta onde o leitor está montado
    pub door_id: Option<Uuid>,
}

// POST /api/organizations/{organization_id}/readers
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/readers",
    tag = "RFID",
    request_body = CreateReaderPayload,
    responses(
        (status = 201, description = "Leitor cadastrado", body = RfidReader),
        (status = 409, description = "Número de série ou porta já em uso")
    ),
    params(("organization_id" = Uuid, Path, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_reader(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateReaderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let reader = app_state
        .rfid_service
        .create_reader(organization_id, payload.serial_number, payload.door_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(reader)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachReaderPayload {
    /// `null` desmonta o leitor
    pub door_id: Option<Uuid>,
}

// PUT /api/organizations/{organization_id}/readers/{reader_id}/door
#[utoipa::path(
    put,
    path = "/api/organizations/{organization_id}/readers/{reader_id}/door",
    tag = "RFID",
    request_body = AttachReaderPayload,
    responses((status = 200, description = "Leitor montado na porta", body = RfidReader)),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("reader_id" = Uuid, Path, description = "ID do leitor")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_reader(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, reader_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AttachReaderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let reader = app_state
        .rfid_service
        .attach_reader(organization_id, reader_id, payload.door_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(reader))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagPayload {
    #[schema(example = 3735928559_i64)]
    pub uid: i64,
}

// POST /api/organizations/{organization_id}/tags
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/tags",
    tag = "RFID",
    request_body = CreateTagPayload,
    responses(
        (status = 201, description = "Tag cadastrada", body = RfidTag),
        (status = 409, description = "UID já cadastrado")
    ),
    params(("organization_id" = Uuid, Path, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_tag(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let tag = app_state
        .rfid_service
        .create_tag(organization_id, payload.uid)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(tag)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTagPayload {
    /// `null` recolhe a tag
    pub employee_id: Option<Uuid>,
}

// POST /api/organizations/{organization_id}/tags/{tag_id}/assignments
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/tags/{tag_id}/assignments",
    tag = "RFID",
    request_body = AssignTagPayload,
    responses((status = 201, description = "Nova atribuição registrada", body = TagAssignment)),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("tag_id" = Uuid, Path, description = "ID da tag")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_tag(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, tag_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignTagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let assignment = app_state
        .rfid_service
        .assign_tag(organization_id, tag_id, payload.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}
