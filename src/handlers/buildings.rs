// src/handlers/buildings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::building::{BuildingLayout, DoorSide, Floor, Rect, Zone, ZoneGeometryUpdate},
    services::zone_service::NewZone,
};

// =============================================================================
//  1. PRÉDIOS & ANDARES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Sede Central")]
    pub title: String,

    /// Retângulo da primeira zona (padrão 0,0,10,10)
    #[validate(nested)]
    pub first_zone: Option<Rect>,

    /// Lado da primeira porta de entrada (padrão bottom)
    #[schema(example = "bottom")]
    pub entrance_side: Option<DoorSide>,
}

// POST /api/organizations/{organization_id}/buildings
#[utoipa::path(
    post,
    path = "/api/organizations/{organization_id}/buildings",
    tag = "Buildings",
    request_body = CreateBuildingPayload,
    responses(
        (status = 201, description = "Prédio criado com andar, zona e entrada", body = BuildingLayout),
        (status = 403, description = "Organização de outro dono")
    ),
    params(("organization_id" = Uuid, Path, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_owner(user.0, organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let layout = app_state
        .zone_service
        .create_building(organization_id, &payload.title, payload.first_zone, payload.entrance_side)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(layout)))
}

// POST /api/buildings/{building_id}/floors
#[utoipa::path(
    post,
    path = "/api/buildings/{building_id}/floors",
    tag = "Buildings",
    responses((status = 201, description = "Novo andar no topo do prédio", body = Floor)),
    params(("building_id" = Uuid, Path, description = "ID do prédio")),
    security(("api_jwt" = []))
)]
pub async fn create_floor(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let floor = app_state
        .zone_service
        .create_floor(building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(floor)))
}

// =============================================================================
//  2. ZONAS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesQuery {
    /// Filtra por andar
    pub floor_id: Option<Uuid>,
    /// Inclui as zonas de transição (padrão true)
    pub include_transitions: Option<bool>,
}

// GET /api/buildings/{building_id}/zones
#[utoipa::path(
    get,
    path = "/api/buildings/{building_id}/zones",
    tag = "Zones",
    responses((status = 200, description = "Zonas do prédio", body = Vec<Zone>)),
    params(
        ("building_id" = Uuid, Path, description = "ID do prédio"),
        ListZonesQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_zones(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Query(query): Query<ListZonesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let zones = app_state
        .zone_service
        .list_zones(building_id, query.floor_id, query.include_transitions.unwrap_or(true))
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(zones))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateZonePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Almoxarifado")]
    pub title: String,

    /// Obrigatório para zonas comuns; ignorado em zonas de transição
    pub floor_id: Option<Uuid>,

    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    pub x: i32,
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    pub y: i32,

    #[validate(range(min = 2, max = 1_000_000, message = "A largura deve estar entre 2 e 1000000."))]
    #[schema(example = 4)]
    pub width: i32,

    #[validate(range(min = 2, max = 1_000_000, message = "A altura deve estar entre 2 e 1000000."))]
    #[schema(example = 4)]
    pub height: i32,

    #[serde(default)]
    pub is_transition_between_floors: bool,
}

// POST /api/buildings/{building_id}/zones
#[utoipa::path(
    post,
    path = "/api/buildings/{building_id}/zones",
    tag = "Zones",
    request_body = CreateZonePayload,
    responses(
        (status = 201, description = "Zona criada", body = Zone),
        (status = 422, description = "Sem contato com o escopo ou sobreposição")
    ),
    params(("building_id" = Uuid, Path, description = "ID do prédio")),
    security(("api_jwt" = []))
)]
pub async fn create_zone(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<CreateZonePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let new_zone = NewZone {
        floor_id: payload.floor_id,
        title: payload.title,
        rect: Rect::new(payload.x, payload.y, payload.width, payload.height),
        is_transition: payload.is_transition_between_floors,
    };

    let zone = app_state
        .zone_service
        .create_zone(building_id, new_zone)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(zone)))
}

// PATCH /api/buildings/{building_id}/zones/{zone_id}/geometry
#[utoipa::path(
    patch,
    path = "/api/buildings/{building_id}/zones/{zone_id}/geometry",
    tag = "Zones",
    request_body = ZoneGeometryUpdate,
    responses(
        (status = 200, description = "Layout atualizado do prédio", body = BuildingLayout),
        (status = 422, description = "Geometria inválida (detalhes em `details.code`)")
    ),
    params(
        ("building_id" = Uuid, Path, description = "ID do prédio"),
        ("zone_id" = Uuid, Path, description = "ID da zona")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_zone_geometry(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((building_id, zone_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ZoneGeometryUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let layout = app_state
        .zone_service
        .update_geometry(building_id, zone_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(layout))
}

// =============================================================================
//  3. PORTAS
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntranceDoorPayload {
    pub zone_id: Uuid,
    pub floor_id: Uuid,
    #[schema(example = "bottom")]
    pub side: DoorSide,
}

// POST /api/buildings/{building_id}/doors/entrance
#[utoipa::path(
    post,
    path = "/api/buildings/{building_id}/doors/entrance",
    tag = "Doors",
    request_body = CreateEntranceDoorPayload,
    responses(
        (status = 201, description = "Porta de entrada criada", body = BuildingLayout),
        (status = 422, description = "Sem espaço livre no lado pedido")
    ),
    params(("building_id" = Uuid, Path, description = "ID do prédio")),
    security(("api_jwt" = []))
)]
pub async fn create_entrance_door(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<CreateEntranceDoorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let layout = app_state
        .door_service
        .create_entrance_door(building_id, payload.zone_id, payload.floor_id, payload.side)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(layout)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegularDoorPayload {
    pub zone_from_id: Uuid,
    pub zone_to_id: Uuid,
    pub floor_id: Uuid,
}

// POST /api/buildings/{building_id}/doors
#[utoipa::path(
    post,
    path = "/api/buildings/{building_id}/doors",
    tag = "Doors",
    request_body = CreateRegularDoorPayload,
    responses(
        (status = 201, description = "Porta criada entre as zonas", body = BuildingLayout),
        (status = 422, description = "Zonas não adjacentes ou sem espaço na borda")
    ),
    params(("building_id" = Uuid, Path, description = "ID do prédio")),
    security(("api_jwt" = []))
)]
pub async fn create_regular_door(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<CreateRegularDoorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let layout = app_state
        .door_service
        .create_regular_door(building_id, payload.zone_from_id, payload.zone_to_id, payload.floor_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(layout)))
}

// DELETE /api/buildings/{building_id}/doors/{door_id}
#[utoipa::path(
    delete,
    path = "/api/buildings/{building_id}/doors/{door_id}",
    tag = "Doors",
    responses(
        (status = 200, description = "Porta removida", body = BuildingLayout),
        (status = 409, description = "Última entrada do prédio ou última porta entre as zonas")
    ),
    params(
        ("building_id" = Uuid, Path, description = "ID do prédio"),
        ("door_id" = Uuid, Path, description = "ID da porta")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_door(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((building_id, door_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .org_repo
        .validate_building_owner(user.0, building_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let layout = app_state
        .door_service
        .delete_door(building_id, door_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zone_payload_rejects_coordinates_outside_the_allowed_area() {
        let payload: CreateZonePayload = serde_json::from_value(json!({
            "title": "Depósito",
            "x": i32::MAX - 1,
            "y": 0,
            "width": 4,
            "height": 4
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("x"));
    }

    #[test]
    fn first_zone_of_a_building_is_validated_too() {
        let payload: CreateBuildingPayload = serde_json::from_value(json!({
            "title": "Sede",
            "firstZone": { "x": 0, "y": -2_000_000, "width": 10, "height": 10 }
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: CreateBuildingPayload = serde_json::from_value(json!({ "title": "Sede" })).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn geometry_update_bounds_every_field() {
        let update = ZoneGeometryUpdate { x: Some(i32::MAX - 1), width: Some(4), ..Default::default() };
        assert!(update.validate().is_err());

        let update = ZoneGeometryUpdate { height: Some(2_000_000), ..Default::default() };
        assert!(update.validate().is_err());

        let update = ZoneGeometryUpdate { x: Some(-3), width: Some(7), ..Default::default() };
        assert!(update.validate().is_ok());
    }
}
