// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::access::{Notification, NotificationViewer},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    pub employee_id: Option<Uuid>,
    /// Só as ainda não lidas pelo administrador
    #[serde(default)]
    pub unread_only: bool,
}

// GET /api/organizations/{organization_id}/notifications
#[utoipa::path(
    get,
    path = "/api/organizations/{organization_id}/notifications",
    tag = "Notifications",
    responses((status = 200, description = "Notificações mais recentes", body = Vec<Notification>)),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ListNotificationsQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(organization_id): Path<Uuid>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let notifications = app_state
        .notification_repo
        .list_for_organization(&app_state.db_pool, organization_id, query.employee_id, query.unread_only)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(notifications))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadPayload {
    #[schema(example = "admin")]
    pub viewer: NotificationViewer,
}

// PATCH /api/organizations/{organization_id}/notifications/{notification_id}/read
#[utoipa::path(
    patch,
    path = "/api/organizations/{organization_id}/notifications/{notification_id}/read",
    tag = "Notifications",
    request_body = MarkReadPayload,
    responses((status = 200, description = "Notificação marcada como lida", body = Notification)),
    params(
        ("organization_id" = Uuid, Path, description = "ID da organização"),
        ("notification_id" = Uuid, Path, description = "ID da notificação")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((organization_id, notification_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MarkReadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let notification = app_state
        .notification_repo
        .mark_read(&app_state.db_pool, organization_id, notification_id, payload.viewer)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::NotFound(format!("Notificação {}", notification_id)).to_api_error(&locale))?;

    Ok(Json(notification))
}
