// src/services/zone_validator.rs

use uuid::Uuid;

use crate::common::error::GeometryError;
use crate::models::building::{DoorSide, Rect, Zone};
use crate::services::geometry::{
    door_slots, free_segments, intersection, intersection_length, merge_segments, overlap,
    DOOR_WIDTH, MIN_CONNECTION_LENGTH,
};

pub const MIN_ZONE_SIZE: i32 = 2;

/// Demanda x oferta de espaço para portas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorCapacity {
    pub required: i32,
    pub available: i32,
}

impl DoorCapacity {
    pub fn is_feasible(&self) -> bool {
        self.available >= self.required
    }
}

pub fn require_within_bounds(rect: &Rect) -> Result<(), GeometryError> {
    if !rect.is_within_bounds() {
        return Err(GeometryError::OutOfBounds { rect: *rect });
    }
    Ok(())
}

/// Tamanho mínimo e área permitida.
pub fn require_dimensions(rect: &Rect) -> Result<(), GeometryError> {
    if rect.width < MIN_ZONE_SIZE || rect.height < MIN_ZONE_SIZE {
        return Err(GeometryError::InvalidDimensions {
            width: rect.width,
            height: rect.height,
        });
    }
    require_within_bounds(rect)
}

/// A nova zona precisa encostar em alguma zona do escopo com pelo menos 2 unidades,
/// a menos que seja a primeira zona do prédio.
pub fn require_connects_to_scope(
    candidate: &Rect,
    scope: &[&Zone],
    building_is_empty: bool,
) -> Result<(), GeometryError> {
    if building_is_empty {
        return Ok(());
    }

    let best = scope
        .iter()
        .map(|z| intersection_length(candidate, &z.rect))
        .max()
        .unwrap_or(0);

    match best {
        0 => Err(GeometryError::NoIntersectionWithScope),
        len if len < MIN_CONNECTION_LENGTH => Err(GeometryError::InsufficientIntersectionLength {
            required: MIN_CONNECTION_LENGTH,
            available: len,
        }),
        _ => Ok(()),
    }
}

pub fn require_no_overlap(
    zone_id: Option<Uuid>,
    candidate: &Rect,
    zones: &[&Zone],
) -> Result<(), GeometryError> {
    match zones
        .iter()
        .find(|z| Some(z.id) != zone_id && overlap(candidate, &z.rect))
    {
        Some(other) => Err(GeometryError::OverlapDetected {
            zone_id,
            other_zone_id: other.id,
        }),
        None => Ok(()),
    }
}

/// Espaço para `existing_on_side + 1` portas de entrada no lado `side` da zona.
/// O trecho coberto por zonas vizinhas encostadas naquele lado não está disponível.
pub fn entrance_door_capacity(
    zone: &Rect,
    side: DoorSide,
    other_zones: &[Rect],
    existing_on_side: usize,
) -> DoorCapacity {
    let occupied: Vec<(i32, i32)> = other_zones
        .iter()
        .filter_map(|other| intersection(zone, other))
        .filter(|hit| hit.side == side)
        .map(|hit| (hit.start, hit.end))
        .collect();

    let free = free_segments(zone.side_span(side), &merge_segments(occupied));

    DoorCapacity {
        required: existing_on_side as i32 + 1,
        available: door_slots(&free),
    }
}

pub fn require_entrance_door_space(
    zone_id: Uuid,
    zone: &Rect,
    side: DoorSide,
    other_zones: &[Rect],
    existing_on_side: usize,
) -> Result<(), GeometryError> {
    let capacity = entrance_door_capacity(zone, side, other_zones, existing_on_side);
    if !capacity.is_feasible() {
        return Err(GeometryError::EntranceDoorNoSpace {
            zone_id,
            side,
            required: capacity.required,
            available: capacity.available,
        });
    }
    Ok(())
}

/// A borda compartilhada precisa de `(existing + 1) * 2` unidades.
pub fn regular_door_capacity(zone_a: &Rect, zone_b: &Rect, existing_count: usize) -> DoorCapacity {
    DoorCapacity {
        required: (existing_count as i32 + 1) * DOOR_WIDTH,
        available: intersection_length(zone_a, zone_b),
    }
}

pub fn require_regular_door_space(
    (id_a, zone_a): (Uuid, &Rect),
    (id_b, zone_b): (Uuid, &Rect),
    existing_count: usize,
) -> Result<(), GeometryError> {
    let capacity = regular_door_capacity(zone_a, zone_b, existing_count);
    if capacity.available == 0 {
        return Err(GeometryError::ZonesNotAdjacent { zone_a: id_a, zone_b: id_b });
    }
    if !capacity.is_feasible() {
        return Err(GeometryError::RegularDoorNoSpace {
            door_id: None,
            zone_a: id_a,
            zone_b: id_b,
            required: capacity.required,
            available: capacity.available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::zone_graph::fixtures::zone;
    use crate::models::building::{MAX_COORDINATE, MAX_ZONE_SIZE, MIN_COORDINATE};

    #[test]
    fn first_zone_of_building_needs_no_neighbour() {
        assert!(require_connects_to_scope(&Rect::new(20, 20, 2, 2), &[], true).is_ok());
        assert_eq!(
            require_connects_to_scope(&Rect::new(20, 20, 2, 2), &[], false),
            Err(GeometryError::NoIntersectionWithScope)
        );
    }

    #[test]
    fn scenario_a_placement() {
        let (building, floor) = (Uuid::new_v4(), Uuid::new_v4());
        let z1 = zone(building, floor, Rect::new(0, 0, 4, 4));
        let z2 = zone(building, floor, Rect::new(4, 0, 4, 4));
        let scope = vec![&z1, &z2];

        let z3 = Rect::new(0, 4, 4, 4);
        assert!(require_connects_to_scope(&z3, &scope, false).is_ok());
        assert!(require_no_overlap(None, &z3, &scope).is_ok());

        let z4 = Rect::new(20, 20, 2, 2);
        assert_eq!(
            require_connects_to_scope(&z4, &scope, false),
            Err(GeometryError::NoIntersectionWithScope)
        );
    }

    #[test]
    fn one_unit_contact_is_not_enough() {
        let (building, floor) = (Uuid::new_v4(), Uuid::new_v4());
        let z1 = zone(building, floor, Rect::new(0, 0, 4, 4));
        let result = require_connects_to_scope(&Rect::new(4, 3, 2, 2), &[&z1], false);
        assert_eq!(
            result,
            Err(GeometryError::InsufficientIntersectionLength { required: 2, available: 1 })
        );
    }

    #[test]
    fn overlap_names_the_other_zone_and_ignores_itself() {
        let (building, floor) = (Uuid::new_v4(), Uuid::new_v4());
        let z1 = zone(building, floor, Rect::new(0, 0, 4, 4));

        let err = require_no_overlap(None, &Rect::new(2, 2, 4, 4), &[&z1]).unwrap_err();
        assert_eq!(err, GeometryError::OverlapDetected { zone_id: None, other_zone_id: z1.id });

        assert!(require_no_overlap(Some(z1.id), &Rect::new(0, 0, 5, 5), &[&z1]).is_ok());
    }

    #[test]
    fn rejects_zones_smaller_than_two_units() {
        assert!(require_dimensions(&Rect::new(0, 0, 2, 2)).is_ok());
        assert_eq!(
            require_dimensions(&Rect::new(0, 0, 1, 5)),
            Err(GeometryError::InvalidDimensions { width: 1, height: 5 })
        );
    }

    #[test]
    fn rejects_zones_outside_the_allowed_area() {
        let far = Rect::new(i32::MAX - 1, 0, 4, 4);
        assert_eq!(require_dimensions(&far), Err(GeometryError::OutOfBounds { rect: far }));

        let huge = Rect::new(0, 0, 2, MAX_ZONE_SIZE + 1);
        assert!(matches!(require_dimensions(&huge), Err(GeometryError::OutOfBounds { .. })));

        assert!(require_dimensions(&Rect::new(MIN_COORDINATE, MAX_COORDINATE, MAX_ZONE_SIZE, 2)).is_ok());
    }

    #[test]
    fn entrance_capacity_subtracts_neighbour_coverage() {
        // Lado direito de 0..6 em y; vizinho cobre y 2..4
        let zone = Rect::new(0, 0, 4, 6);
        let neighbour = Rect::new(4, 2, 4, 2);

        let cap = entrance_door_capacity(&zone, DoorSide::Right, &[neighbour], 0);
        assert_eq!(cap, DoorCapacity { required: 1, available: 2 });

        // Duas portas já existentes ocupam os dois trechos livres
        assert!(!entrance_door_capacity(&zone, DoorSide::Right, &[neighbour], 2).is_feasible());

        // O vizinho não interfere em outro lado
        assert_eq!(entrance_door_capacity(&zone, DoorSide::Left, &[neighbour], 0).available, 3);
    }

    #[test]
    fn entrance_capacity_ignores_fragmented_single_units() {
        let zone = Rect::new(0, 0, 5, 4);
        // Cobertura em x 1..2 e 3..5 deixa apenas trechos de 1 unidade
        let others = [Rect::new(1, 4, 1, 2), Rect::new(3, 4, 2, 2)];
        let cap = entrance_door_capacity(&zone, DoorSide::Bottom, &others, 0);
        assert_eq!(cap.available, 0);
        assert!(require_entrance_door_space(Uuid::nil(), &zone, DoorSide::Bottom, &others, 0).is_err());
    }

    #[test]
    fn entrance_capacity_is_monotonic_in_existing_doors() {
        let zone = Rect::new(0, 0, 8, 4);
        for existing in 0..6 {
            let cap = entrance_door_capacity(&zone, DoorSide::Top, &[], existing);
            // 8 unidades => 4 portas
            assert_eq!(cap.is_feasible(), existing < 4);
        }
    }

    #[test]
    fn regular_door_capacity_counts_existing_doors() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 4, 4);
        assert!(require_regular_door_space((Uuid::nil(), &a), (Uuid::nil(), &b), 0).is_ok());
        assert!(require_regular_door_space((Uuid::nil(), &a), (Uuid::nil(), &b), 1).is_ok());
        assert!(matches!(
            require_regular_door_space((Uuid::nil(), &a), (Uuid::nil(), &b), 2),
            Err(GeometryError::RegularDoorNoSpace { required: 6, available: 4, .. })
        ));
    }

    #[test]
    fn regular_door_requires_adjacent_zones() {
        let a = Rect::new(0, 0, 4, 4);
        let far = Rect::new(10, 0, 4, 4);
        assert!(matches!(
            require_regular_door_space((Uuid::nil(), &a), (Uuid::nil(), &far), 0),
            Err(GeometryError::ZonesNotAdjacent { .. })
        ));
    }
}
