// src/models/building.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Geometria ---

// Área permitida: coordenadas em [MIN_COORDINATE, MAX_COORDINATE] e lados até MAX_ZONE_SIZE.
// Com esses limites `x + width` cabe folgado em i32.
pub const MIN_COORDINATE: i32 = -1_000_000;
pub const MAX_COORDINATE: i32 = 1_000_000;
pub const MAX_ZONE_SIZE: i32 = 1_000_000;

/// Retângulo alinhado aos eixos, em unidades inteiras.
/// O eixo Y cresce "para baixo": a borda inferior é `y + height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct Rect {
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    #[schema(example = 0)]
    pub x: i32,
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    #[schema(example = 0)]
    pub y: i32,
    #[validate(range(min = 2, max = 1_000_000, message = "A largura deve estar entre 2 e 1000000."))]
    #[schema(example = 4)]
    pub width: i32,
    #[validate(range(min = 2, max = 1_000_000, message = "A altura deve estar entre 2 e 1000000."))]
    #[schema(example = 4)]
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Dentro da área permitida (bordas inclusas).
    pub fn is_within_bounds(&self) -> bool {
        let coordinate = MIN_COORDINATE..=MAX_COORDINATE;
        coordinate.contains(&self.x)
            && coordinate.contains(&self.y)
            && self.width <= MAX_ZONE_SIZE
            && self.height <= MAX_ZONE_SIZE
    }

    /// Comprimento do lado informado.
    pub fn side_length(&self, side: DoorSide) -> i32 {
        match side {
            DoorSide::Top | DoorSide::Bottom => self.width,
            DoorSide::Left | DoorSide::Right => self.height,
        }
    }

    /// Intervalo `[início, fim)` ocupado pelo lado, no eixo paralelo a ele.
    pub fn side_span(&self, side: DoorSide) -> (i32, i32) {
        match side {
            DoorSide::Top | DoorSide::Bottom => (self.x, self.right()),
            DoorSide::Left | DoorSide::Right => (self.y, self.bottom()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "door_side", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DoorSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl DoorSide {
    pub fn opposite(self) -> Self {
        match self {
            DoorSide::Top => DoorSide::Bottom,
            DoorSide::Bottom => DoorSide::Top,
            DoorSide::Left => DoorSide::Right,
            DoorSide::Right => DoorSide::Left,
        }
    }
}

// --- Entidades ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    #[schema(example = "Acme Logística")]
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "Sede Central")]
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: Uuid,
    pub building_id: Uuid,
    #[schema(example = 1)]
    pub floor_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub building_id: Uuid,
    /// `None` para zonas de transição (escadas, elevadores)
    pub floor_id: Option<Uuid>,
    #[schema(example = "Recepção")]
    pub title: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rect: Rect,
    pub is_transition_between_floors: bool,
    pub photo: Option<String>,
}

impl Zone {
    /// Duas zonas são comparáveis (sobreposição, contato) se estão no mesmo andar
    /// ou se alguma delas é de transição.
    pub fn shares_scope_with(&self, other: &Zone) -> bool {
        self.is_transition_between_floors
            || other.is_transition_between_floors
            || self.floor_id == other.floor_id
    }

    /// Visível a partir do andar informado.
    pub fn visible_from_floor(&self, floor_id: Uuid) -> bool {
        self.is_transition_between_floors || self.floor_id == Some(floor_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub id: Uuid,
    pub floor_id: Uuid,
    /// `None` em portas de entrada (o "lado de fora" do prédio)
    pub zone_from_id: Option<Uuid>,
    pub zone_to_id: Uuid,
    pub is_entrance: bool,
    pub entrance_door_side: Option<DoorSide>,
    pub created_at: DateTime<Utc>,
}

impl Door {
    /// Par de zonas de uma porta comum, `None` para portas de entrada.
    pub fn zone_pair(&self) -> Option<(Uuid, Uuid)> {
        self.zone_from_id.map(|from| (from, self.zone_to_id))
    }

    pub fn connects(&self, a: Uuid, b: Uuid) -> bool {
        match self.zone_pair() {
            Some((from, to)) => (from == a && to == b) || (from == b && to == a),
            None => false,
        }
    }
}

/// Resposta completa das operações de geometria: o estado atualizado do prédio.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildingLayout {
    pub building: Building,
    pub floors: Vec<Floor>,
    pub zones: Vec<Zone>,
    pub doors: Vec<Door>,
}

/// Pedido de redimensionamento/movimentação. Campos ausentes mantêm o valor atual.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneGeometryUpdate {
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    #[schema(example = 0)]
    pub x: Option<i32>,
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Coordenada fora da área permitida."))]
    #[schema(example = 0)]
    pub y: Option<i32>,
    #[validate(range(min = 2, max = 1_000_000, message = "A largura deve estar entre 2 e 1000000."))]
    #[schema(example = 6)]
    pub width: Option<i32>,
    #[validate(range(min = 2, max = 1_000_000, message = "A altura deve estar entre 2 e 1000000."))]
    #[schema(example = 4)]
    pub height: Option<i32>,
}
