// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Buildings ---
        handlers::buildings::create_building,
        handlers::buildings::create_floor,

        // --- Zones ---
        handlers::buildings::list_zones,
        handlers::buildings::create_zone,
        handlers::buildings::update_zone_geometry,

        // --- Doors ---
        handlers::buildings::create_entrance_door,
        handlers::buildings::create_regular_door,
        handlers::buildings::delete_door,

        // --- RFID ---
        handlers::rfid::create_reader,
        handlers::rfid::attach_reader,
        handlers::rfid::create_tag,
        handlers::rfid::assign_tag,

        // --- Access Rules ---
        handlers::rules::create_rule,
        handlers::rules::attach_rule,
        handlers::rules::add_position,
        handlers::rules::remove_position,
        handlers::rules::detach_rule,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,

        // --- Scans ---
        handlers::scans::ingest_scan,
        handlers::scans::get_employee_zone,
    ),
    components(
        schemas(
            // --- Building ---
            models::building::Rect,
            models::building::DoorSide,
            models::building::Building,
            models::building::Floor,
            models::building::Zone,
            models::building::Door,
            models::building::BuildingLayout,
            models::building::ZoneGeometryUpdate,

            // --- Access ---
            models::access::AccessType,
            models::access::NotificationKind,
            models::access::NotificationViewer,
            models::access::RfidReader,
            models::access::RfidTag,
            models::access::TagAssignment,
            models::access::ZoneAccessRule,
            models::access::ZoneRuleAssignment,
            models::access::Notification,
            models::access::ScanOutcome,
            models::access::EmployeeLocation,

            // --- Payloads ---
            handlers::buildings::CreateBuildingPayload,
            handlers::buildings::CreateZonePayload,
            handlers::buildings::CreateEntranceDoorPayload,
            handlers::buildings::CreateRegularDoorPayload,
            handlers::rfid::CreateReaderPayload,
            handlers::rfid::AttachReaderPayload,
            handlers::rfid::CreateTagPayload,
            handlers::rfid::AssignTagPayload,
            handlers::rules::CreateRulePayload,
            handlers::rules::AttachRulePayload,
            handlers::notifications::MarkReadPayload,
            handlers::scans::ScanPayload,
        )
    ),
    tags(
        (name = "Buildings", description = "Prédios e Andares"),
        (name = "Zones", description = "Zonas e Geometria"),
        (name = "Doors", description = "Portas de Entrada e Portas entre Zonas"),
        (name = "RFID", description = "Leitores, Tags e Atribuições"),
        (name = "Access Rules", description = "Regras de Acesso por Zona e Cargo"),
        (name = "Notifications", description = "Alertas de Zona Proibida e Tempo Excedido"),
        (name = "Scans", description = "Leituras RFID e Localização de Funcionários")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/organizations/{organization_id}/buildings",
            "/api/buildings/{building_id}/zones/{zone_id}/geometry",
            "/api/buildings/{building_id}/doors/{door_id}",
            "/api/organizations/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}",
            "/api/scans",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota sem documentação: {}", path);
        }
    }
}
