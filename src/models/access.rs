// src/models/access.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "zone_access_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    TimeLimited,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ForbiddenZone,
    TimeLimitExceeded,
}

// --- Pessoas ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "Maria Souza")]
    pub full_name: String,
    pub current_zone_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "Técnico de Manutenção")]
    pub title: String,
}

// --- RFID ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RfidReader {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = 100200)]
    pub serial_number: i64,
    pub door_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RfidTag {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = 3735928559_i64)]
    pub uid: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagAssignment {
    pub id: Uuid,
    pub tag_id: Uuid,
    /// `None` quando a tag foi recolhida
    pub employee_id: Option<Uuid>,
    pub change_date_and_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub id: i64,
    pub reader_id: Uuid,
    pub tag_id: Uuid,
    pub door_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Uma leitura já resolvida para a porta atravessada, na ordem do histórico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct DoorPassage {
    pub scanned_at: DateTime<Utc>,
    pub zone_from_id: Option<Uuid>,
    pub zone_to_id: Uuid,
}

// --- Regras ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAccessRule {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "Sala de servidores")]
    pub title: String,
    pub access_type: AccessType,
    #[schema(example = 30)]
    pub max_duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRuleAssignment {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub zone_id: Uuid,
    pub position_ids: Vec<Uuid>,
}

/// Visão "achatada" de uma atribuição: o tipo da regra junto com os cargos cobertos.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ZoneRuleView {
    pub assignment_id: Uuid,
    pub zone_id: Uuid,
    pub access_type: AccessType,
    pub max_duration_minutes: Option<i32>,
    pub position_ids: Vec<Uuid>,
}

// --- Notificações ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    pub zone_id: Uuid,
    pub kind: NotificationKind,
    #[schema(example = "Unauthorized Zone Access")]
    pub title: String,
    pub message: String,
    pub is_read_by_employee: bool,
    pub is_read_by_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Resultado do processamento de uma leitura.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub scan_id: i64,
    pub employee_id: Uuid,
    pub previous_zone_id: Option<Uuid>,
    pub current_zone_id: Option<Uuid>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLocation {
    pub employee_id: Uuid,
    pub current_zone_id: Option<Uuid>,
}

/// Quem está marcando a notificação como lida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum NotificationViewer {
    Employee,
    Admin,
}
