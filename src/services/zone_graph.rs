// src/services/zone_graph.rs

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::building::{Door, Rect, Zone};
use crate::services::geometry::{intersection_length, MIN_CONNECTION_LENGTH};

/// Cópia de trabalho das coordenadas, válida apenas dentro de uma transação.
pub type CoordinateMap = HashMap<Uuid, Rect>;

/// Snapshot das zonas e portas de um prédio, carregado uma vez por operação.
#[derive(Debug, Clone, Default)]
pub struct ZoneGraph {
    pub zones: Vec<Zone>,
    pub doors: Vec<Door>,
}

impl ZoneGraph {
    pub fn new(zones: Vec<Zone>, doors: Vec<Door>) -> Self {
        Self { zones, doors }
    }

    pub fn zone(&self, zone_id: Uuid) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    /// Zonas visíveis a partir de um andar: as do próprio andar e, se pedido,
    /// todas as zonas de transição do prédio. Sem andar, devolve o prédio inteiro.
    pub fn zones_in_scope(&self, floor_id: Option<Uuid>, include_transitions: bool) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|z| match floor_id {
                Some(floor_id) => {
                    z.floor_id == Some(floor_id)
                        || (include_transitions && z.is_transition_between_floors)
                }
                None => true,
            })
            .collect()
    }

    /// Zonas comparáveis com `zone` (mesmo andar ou transição), exceto ela mesma.
    pub fn scope_of(&self, zone: &Zone) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|other| other.id != zone.id && zone.shares_scope_with(other))
            .collect()
    }

    pub fn regular_doors(&self) -> impl Iterator<Item = &Door> {
        self.doors.iter().filter(|d| !d.is_entrance && d.zone_from_id.is_some())
    }

    pub fn entrance_doors(&self) -> impl Iterator<Item = &Door> {
        self.doors.iter().filter(|d| d.is_entrance)
    }

    pub fn doors_between(&self, a: Uuid, b: Uuid) -> usize {
        self.regular_doors().filter(|d| d.connects(a, b)).count()
    }
}

pub fn build_coordinate_map<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> CoordinateMap {
    zones.into_iter().map(|z| (z.id, z.rect)).collect()
}

/// Zonas que encostam no candidato com pelo menos `MIN_CONNECTION_LENGTH` de borda.
pub fn find_intersecting<'a>(candidate: &Rect, zones: &[&'a Zone]) -> Vec<&'a Zone> {
    zones
        .iter()
        .copied()
        .filter(|z| intersection_length(candidate, &z.rect) >= MIN_CONNECTION_LENGTH)
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::building::{Door, DoorSide, Rect, Zone};

    pub fn zone(building_id: Uuid, floor_id: Uuid, rect: Rect) -> Zone {
        Zone {
            id: Uuid::new_v4(),
            building_id,
            floor_id: Some(floor_id),
            title: "zona".into(),
            rect,
            is_transition_between_floors: false,
            photo: None,
        }
    }

    pub fn transition_zone(building_id: Uuid, rect: Rect) -> Zone {
        Zone {
            floor_id: None,
            is_transition_between_floors: true,
            ..zone(building_id, Uuid::nil(), rect)
        }
    }

    pub fn door(floor_id: Uuid, from: &Zone, to: &Zone) -> Door {
        Door {
            id: Uuid::new_v4(),
            floor_id,
            zone_from_id: Some(from.id),
            zone_to_id: to.id,
            is_entrance: false,
            entrance_door_side: None,
            created_at: Utc::now(),
        }
    }

    pub fn entrance(floor_id: Uuid, to: &Zone, side: DoorSide) -> Door {
        Door {
            id: Uuid::new_v4(),
            floor_id,
            zone_from_id: None,
            zone_to_id: to.id,
            is_entrance: true,
            entrance_door_side: Some(side),
            created_at: Utc::now(),
        }
    }
}
