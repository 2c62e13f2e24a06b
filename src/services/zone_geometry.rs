// src/services/zone_geometry.rs

use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::common::error::{AppError, GeometryError, SizeBound};
use crate::models::building::{DoorSide, Rect, ZoneGeometryUpdate};
use crate::services::geometry::{intersection_length, overlap, DOOR_WIDTH};
use crate::services::zone_graph::{build_coordinate_map, CoordinateMap, ZoneGraph};
use crate::services::zone_validator::{entrance_door_capacity, require_dimensions, require_within_bounds};

/// Variações pedidas para a zona alvo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryDeltas {
    pub dx: i32,
    pub dy: i32,
    pub dw: i32,
    pub dh: i32,
}

impl GeometryDeltas {
    /// Deslocamento de cada borda, na ordem em que são aplicadas (X, WIDTH, Y, HEIGHT).
    /// A borda oposta à coordenada anda `coordenada + tamanho`.
    fn edge_moves(&self) -> [(DoorSide, i32); 4] {
        [
            (DoorSide::Left, self.dx),
            (DoorSide::Right, self.dx.saturating_add(self.dw)),
            (DoorSide::Top, self.dy),
            (DoorSide::Bottom, self.dy.saturating_add(self.dh)),
        ]
    }
}

/// Resultado de um planejamento: as novas coordenadas e quais zonas mudaram.
#[derive(Debug, Clone)]
pub struct GeometryPlan {
    pub coordinates: CoordinateMap,
    pub changed: Vec<Uuid>,
}

// Uma coordenada que anda `coordinate_delta` exige que o tamanho compense:
// a borda oposta fica parada ou se move para dentro (nunca "passa" da borda fixa).
fn check_axis_coupling(
    coordinate: &'static str,
    size: &'static str,
    coordinate_delta: i32,
    size_delta: i32,
) -> Result<(), GeometryError> {
    let required = match coordinate_delta {
        d if d > 0 && size_delta > -d => SizeBound::AtMost(-d),
        d if d < 0 && size_delta < -d => SizeBound::AtLeast(-d),
        _ => return Ok(()),
    };
    Err(GeometryError::CoordinateSizeMismatch {
        coordinate,
        size,
        coordinate_delta,
        required,
        actual: size_delta,
    })
}

pub fn compute_deltas(current: &Rect, update: &ZoneGeometryUpdate) -> Result<GeometryDeltas, GeometryError> {
    let requested = Rect::new(
        update.x.unwrap_or(current.x),
        update.y.unwrap_or(current.y),
        update.width.unwrap_or(current.width),
        update.height.unwrap_or(current.height),
    );
    let diff = |new: i32, old: i32| new.checked_sub(old).ok_or(GeometryError::OutOfBounds { rect: requested });

    let deltas = GeometryDeltas {
        dx: diff(requested.x, current.x)?,
        dy: diff(requested.y, current.y)?,
        dw: diff(requested.width, current.width)?,
        dh: diff(requested.height, current.height)?,
    };

    if deltas == GeometryDeltas::default() {
        return Err(GeometryError::AtLeastOneFieldRequired);
    }

    check_axis_coupling("x", "width", deltas.dx, deltas.dw)?;
    check_axis_coupling("y", "height", deltas.dy, deltas.dh)?;

    require_dimensions(&requested)?;

    Ok(deltas)
}

/// A zona está inteiramente além da borda `edge` do alvo.
fn is_beyond(edge: DoorSide, target: &Rect, other: &Rect) -> bool {
    match edge {
        DoorSide::Left => other.right() <= target.x,
        DoorSide::Right => other.x >= target.right(),
        DoorSide::Top => other.bottom() <= target.y,
        DoorSide::Bottom => other.y >= target.bottom(),
    }
}

/// BFS pelas portas comuns a partir do alvo, coletando as zonas além da borda.
/// As arestas são derivadas das coordenadas ATUAIS: uma porta cujas zonas já
/// não se tocam não é atravessada.
pub fn collect_wing(graph: &ZoneGraph, coords: &CoordinateMap, target: Uuid, edge: DoorSide) -> Vec<Uuid> {
    let Some(target_rect) = coords.get(&target).copied() else {
        return Vec::new();
    };

    let mut visited = HashSet::from([target]);
    let mut queue = VecDeque::from([target]);
    let mut wing = Vec::new();

    while let Some(current) = queue.pop_front() {
        for (from, to) in graph.regular_doors().filter_map(|d| d.zone_pair()) {
            let neighbour = match current {
                c if c == from => to,
                c if c == to => from,
                _ => continue,
            };
            if visited.contains(&neighbour) {
                continue;
            }
            let (Some(a), Some(b)) = (coords.get(&from), coords.get(&to)) else {
                continue;
            };
            if intersection_length(a, b) == 0 {
                continue;
            }
            if !is_beyond(edge, &target_rect, &coords[&neighbour]) {
                continue;
            }
            visited.insert(neighbour);
            wing.push(neighbour);
            queue.push_back(neighbour);
        }
    }
    wing
}

// Soma verificada: estourar i32 ou sair da área permitida invalida o plano.
fn shift(value: i32, delta: i32, rect: &Rect) -> Result<i32, GeometryError> {
    value.checked_add(delta).ok_or(GeometryError::OutOfBounds { rect: *rect })
}

fn move_edge(
    coords: &mut CoordinateMap,
    graph: &ZoneGraph,
    target: Uuid,
    edge: DoorSide,
    delta: i32,
) -> Result<(), GeometryError> {
    let wing = collect_wing(graph, coords, target, edge);
    let negated = delta.checked_neg();

    if let Some(rect) = coords.get_mut(&target) {
        let before = *rect;
        let shrink = negated.ok_or(GeometryError::OutOfBounds { rect: before })?;
        match edge {
            DoorSide::Left => {
                rect.x = shift(rect.x, delta, &before)?;
                rect.width = shift(rect.width, shrink, &before)?;
            }
            DoorSide::Right => rect.width = shift(rect.width, delta, &before)?,
            DoorSide::Top => {
                rect.y = shift(rect.y, delta, &before)?;
                rect.height = shift(rect.height, shrink, &before)?;
            }
            DoorSide::Bottom => rect.height = shift(rect.height, delta, &before)?,
        }
        require_within_bounds(rect)?;
    }

    // A ala inteira translada junto, preservando o arranjo interno
    for zone_id in wing {
        if let Some(rect) = coords.get_mut(&zone_id) {
            let before = *rect;
            match edge {
                DoorSide::Left | DoorSide::Right => rect.x = shift(rect.x, delta, &before)?,
                DoorSide::Top | DoorSide::Bottom => rect.y = shift(rect.y, delta, &before)?,
            }
            require_within_bounds(rect)?;
        }
    }
    Ok(())
}

/// Revalida o prédio inteiro com as coordenadas propostas.
pub fn validate_layout(graph: &ZoneGraph, coords: &CoordinateMap) -> Result<(), GeometryError> {
    // (a) portas comuns: cada par precisa de 2 unidades por porta
    let mut seen_pairs = HashSet::new();
    for door in graph.regular_doors() {
        let Some((from, to)) = door.zone_pair() else { continue };
        let key = if from < to { (from, to) } else { (to, from) };
        if !seen_pairs.insert(key) {
            continue;
        }
        let (Some(a), Some(b)) = (coords.get(&from), coords.get(&to)) else { continue };

        let available = intersection_length(a, b);
        if available == 0 {
            return Err(GeometryError::DisconnectionWouldResult {
                door_id: door.id,
                zone_a: from,
                zone_b: to,
            });
        }
        let required = graph.doors_between(from, to) as i32 * DOOR_WIDTH;
        if available < required {
            return Err(GeometryError::RegularDoorNoSpace {
                door_id: Some(door.id),
                zone_a: from,
                zone_b: to,
                required,
                available,
            });
        }
    }

    // (b) portas de entrada: demanda por (zona, lado) contra o trecho livre do lado
    let mut seen_sides = HashSet::new();
    for door in graph.entrance_doors() {
        let Some(side) = door.entrance_door_side else { continue };
        if !seen_sides.insert((door.zone_to_id, side)) {
            continue;
        }
        let Some(rect) = coords.get(&door.zone_to_id) else { continue };

        let on_side = graph
            .entrance_doors()
            .filter(|d| d.zone_to_id == door.zone_to_id && d.entrance_door_side == Some(side))
            .count();
        let others: Vec<Rect> = graph
            .zones
            .iter()
            .filter(|z| z.id != door.zone_to_id && z.visible_from_floor(door.floor_id))
            .filter_map(|z| coords.get(&z.id).copied())
            .collect();

        let capacity = entrance_door_capacity(rect, side, &others, on_side - 1);
        if !capacity.is_feasible() {
            return Err(GeometryError::EntranceDoorNoSpace {
                zone_id: door.zone_to_id,
                side,
                required: capacity.required,
                available: capacity.available,
            });
        }
    }

    // (c) nenhuma sobreposição dentro do mesmo escopo
    for (i, a) in graph.zones.iter().enumerate() {
        for b in graph.zones.iter().skip(i + 1) {
            if !a.shares_scope_with(b) {
                continue;
            }
            if let (Some(ra), Some(rb)) = (coords.get(&a.id), coords.get(&b.id)) {
                if overlap(ra, rb) {
                    return Err(GeometryError::OverlapDetected {
                        zone_id: Some(a.id),
                        other_zone_id: b.id,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Planeja a mudança de geometria de uma zona: calcula os deltas, propaga cada
/// um pela ala conectada e revalida o prédio. Nada é persistido aqui.
pub fn plan_geometry_change(
    graph: &ZoneGraph,
    zone_id: Uuid,
    update: &ZoneGeometryUpdate,
) -> Result<GeometryPlan, AppError> {
    let zone = graph
        .zone(zone_id)
        .ok_or_else(|| AppError::NotFound(format!("Zona {}", zone_id)))?;

    let deltas = compute_deltas(&zone.rect, update)?;

    let original = build_coordinate_map(&graph.zones);
    let mut coords = original.clone();

    for (edge, delta) in deltas.edge_moves() {
        if delta != 0 {
            move_edge(&mut coords, graph, zone_id, edge, delta)?;
        }
    }

    validate_layout(graph, &coords)?;

    let changed = graph
        .zones
        .iter()
        .map(|z| z.id)
        .filter(|id| coords.get(id) != original.get(id))
        .collect();

    Ok(GeometryPlan { coordinates: coords, changed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::building::{Door, Zone, MAX_COORDINATE};
    use crate::services::zone_graph::fixtures::{door, entrance, zone};

    struct Floorplan {
        floor: Uuid,
        building: Uuid,
        zones: Vec<Zone>,
        doors: Vec<Door>,
    }

    impl Floorplan {
        fn new() -> Self {
            Self { floor: Uuid::new_v4(), building: Uuid::new_v4(), zones: vec![], doors: vec![] }
        }

        fn add(&mut self, rect: Rect) -> Zone {
            let z = zone(self.building, self.floor, rect);
            self.zones.push(z.clone());
            z
        }

        fn connect(&mut self, a: &Zone, b: &Zone) -> Uuid {
            let d = door(self.floor, a, b);
            let id = d.id;
            self.doors.push(d);
            id
        }

        fn graph(&self) -> ZoneGraph {
            ZoneGraph::new(self.zones.clone(), self.doors.clone())
        }
    }

    fn update(x: Option<i32>, y: Option<i32>, width: Option<i32>, height: Option<i32>) -> ZoneGeometryUpdate {
        ZoneGeometryUpdate { x, y, width, height }
    }

    #[test]
    fn unchanged_request_is_rejected() {
        let current = Rect::new(0, 0, 4, 4);
        assert_eq!(
            compute_deltas(&current, &update(Some(0), None, Some(4), None)),
            Err(GeometryError::AtLeastOneFieldRequired)
        );
    }

    #[test]
    fn moving_left_edge_requires_width_compensation() {
        let current = Rect::new(0, 0, 4, 4);

        let err = compute_deltas(&current, &update(Some(2), None, None, None)).unwrap_err();
        assert_eq!(
            err,
            GeometryError::CoordinateSizeMismatch {
                coordinate: "x",
                size: "width",
                coordinate_delta: 2,
                required: SizeBound::AtMost(-2),
                actual: 0,
            }
        );

        let err = compute_deltas(&current, &update(None, Some(-3), None, Some(5))).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::CoordinateSizeMismatch { required: SizeBound::AtLeast(3), actual: 1, .. }
        ));

        // Borda direita parada
        assert!(compute_deltas(&current, &update(Some(2), None, Some(2), None)).is_ok());
        // Borda esquerda cresce para fora e a direita também
        assert!(compute_deltas(&current, &update(Some(-1), None, Some(7), None)).is_ok());
    }

    #[test]
    fn resulting_zone_must_stay_at_least_two_units() {
        let current = Rect::new(0, 0, 4, 4);
        assert_eq!(
            compute_deltas(&current, &update(Some(3), None, Some(1), None)),
            Err(GeometryError::InvalidDimensions { width: 1, height: 4 })
        );
    }

    #[test]
    fn coordinates_near_integer_limits_are_rejected_without_overflow() {
        let current = Rect::new(0, 0, 4, 4);

        let err = compute_deltas(&current, &update(Some(i32::MAX - 1), None, Some(4), None)).unwrap_err();
        assert!(matches!(err, GeometryError::CoordinateSizeMismatch { coordinate: "x", .. }));

        // Subtração que estouraria i32
        let far = Rect::new(-5, 0, 4, 4);
        assert_eq!(
            compute_deltas(&far, &update(Some(i32::MAX), None, None, None)),
            Err(GeometryError::OutOfBounds { rect: Rect::new(i32::MAX, 0, 4, 4) })
        );

        // Coupling ok, mas o resultado sai da área permitida
        let err = compute_deltas(&current, &update(Some(-2_000_000), None, Some(2_000_004), None)).unwrap_err();
        assert!(matches!(err, GeometryError::OutOfBounds { .. }));
    }

    #[test]
    fn dragging_a_wing_past_the_allowed_area_is_rejected() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(MAX_COORDINATE - 10, 0, 4, 4));
        let z2 = plan.add(Rect::new(MAX_COORDINATE - 6, 0, 4, 4));
        plan.connect(&z1, &z2);

        // A borda direita de Z1 anda +8 e empurra Z2 para além do limite
        let err = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(12), None)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidGeometry(GeometryError::OutOfBounds { rect }) if rect == Rect::new(MAX_COORDINATE + 2, 0, 4, 4)
        ));
    }

    #[test]
    fn scenario_b_shrinking_width_drags_connected_neighbour() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        let z2 = plan.add(Rect::new(4, 0, 4, 4));
        plan.connect(&z1, &z2);

        let result = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(2), None)).unwrap();

        assert_eq!(result.coordinates[&z1.id], Rect::new(0, 0, 2, 4));
        assert_eq!(result.coordinates[&z2.id], Rect::new(2, 0, 4, 4));
        assert_eq!(intersection_length(&result.coordinates[&z1.id], &result.coordinates[&z2.id]), 4);
        assert_eq!(result.changed, vec![z1.id, z2.id]);
    }

    #[test]
    fn scenario_b_shrinking_shared_edge_below_door_width_names_the_door() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        let z2 = plan.add(Rect::new(4, 2, 4, 4)); // borda compartilhada y 2..4
        let door_id = plan.connect(&z1, &z2);

        let err = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, None, Some(3))).unwrap_err();
        match err {
            AppError::InvalidGeometry(GeometryError::RegularDoorNoSpace { door_id: Some(id), required, available, .. }) => {
                assert_eq!(id, door_id);
                assert_eq!((required, available), (2, 1));
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn losing_contact_entirely_is_a_disconnection() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        let z2 = plan.add(Rect::new(4, 2, 4, 4));
        let door_id = plan.connect(&z1, &z2);

        let err = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, None, Some(2))).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidGeometry(GeometryError::DisconnectionWouldResult { door_id: id, .. }) if id == door_id
        ));
    }

    #[test]
    fn growth_translates_whole_wing_rigidly() {
        // Z0 | Z1 | Z2 | Z3 em fila, todas ligadas por portas
        let mut plan = Floorplan::new();
        let z0 = plan.add(Rect::new(-4, 0, 4, 4));
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        let z2 = plan.add(Rect::new(4, 0, 4, 4));
        let z3 = plan.add(Rect::new(8, 0, 4, 4));
        plan.connect(&z0, &z1);
        plan.connect(&z1, &z2);
        plan.connect(&z3, &z2);

        // Borda direita de Z1 anda +3
        let result = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(7), None)).unwrap();
        let c = &result.coordinates;
        assert_eq!(c[&z0.id], z0.rect);
        assert_eq!(c[&z1.id], Rect::new(0, 0, 7, 4));
        assert_eq!(c[&z2.id].x - z2.rect.x, 3);
        assert_eq!(c[&z3.id].x - z3.rect.x, 3);
        // Arranjo relativo da ala preservado
        assert_eq!(c[&z3.id].x - c[&z2.id].x, z3.rect.x - z2.rect.x);

        // Borda esquerda de Z1 anda -2 (cresce para a esquerda)
        let result = plan_geometry_change(&plan.graph(), z1.id, &update(Some(-2), None, Some(6), None)).unwrap();
        let c = &result.coordinates;
        assert_eq!(c[&z1.id], Rect::new(-2, 0, 6, 4));
        assert_eq!(c[&z0.id], Rect::new(-6, 0, 4, 4));
        assert_eq!(c[&z2.id], z2.rect);
        assert_eq!(result.changed, vec![z0.id, z1.id]);
    }

    #[test]
    fn zones_without_doors_are_not_dragged_and_overlap_is_caught() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        let z2 = plan.add(Rect::new(4, 0, 4, 4));

        let err = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(6), None)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidGeometry(GeometryError::OverlapDetected { other_zone_id, .. }) if other_zone_id == z2.id
        ));
    }

    #[test]
    fn zones_on_other_floors_do_not_overlap() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        plan.zones.push(zone(plan.building, Uuid::new_v4(), Rect::new(4, 0, 4, 4)));

        assert!(plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(6), None)).is_ok());
    }

    #[test]
    fn entrance_doors_must_still_fit_after_shrink() {
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 4, 4));
        plan.doors.push(entrance(plan.floor, &z1, DoorSide::Bottom));
        plan.doors.push(entrance(plan.floor, &z1, DoorSide::Bottom));

        let err = plan_geometry_change(&plan.graph(), z1.id, &update(None, None, Some(3), None)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidGeometry(GeometryError::EntranceDoorNoSpace { required: 2, available: 1, .. })
        ));
    }

    #[test]
    fn entrance_space_covered_by_neighbour_is_not_available() {
        // Zona de baixo cobre x 5..6 da borda inferior de Z1
        let mut plan = Floorplan::new();
        let z1 = plan.add(Rect::new(0, 0, 6, 4));
        plan.add(Rect::new(5, 4, 4, 4));
        plan.doors.push(entrance(plan.floor, &z1, DoorSide::Bottom));
        plan.doors.push(entrance(plan.floor, &z1, DoorSide::Bottom));

        // Borda esquerda anda +2: sobra x 2..5 livre, espaço para uma porta só
        let err = plan_geometry_change(&plan.graph(), z1.id, &update(Some(2), None, Some(4), None)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidGeometry(GeometryError::EntranceDoorNoSpace { required: 2, available: 1, .. })
        ));
    }

    #[test]
    fn bfs_skips_doors_whose_zones_no_longer_touch() {
        let mut plan = Floorplan::new();
        let target = plan.add(Rect::new(0, 0, 4, 4));
        let right = plan.add(Rect::new(4, 0, 4, 4));
        let far = plan.add(Rect::new(8, 0, 4, 4));
        plan.connect(&target, &right);
        plan.connect(&right, &far);
        let graph = plan.graph();

        let mut coords = build_coordinate_map(&graph.zones);
        assert_eq!(collect_wing(&graph, &coords, target.id, DoorSide::Right), vec![right.id, far.id]);

        // Um passo anterior afastou `far`: a porta right-far deixa de ser aresta
        coords.insert(far.id, Rect::new(9, 0, 4, 4));
        assert_eq!(collect_wing(&graph, &coords, target.id, DoorSide::Right), vec![right.id]);
    }

    #[test]
    fn bfs_only_follows_zones_beyond_the_moving_edge() {
        let mut plan = Floorplan::new();
        let target = plan.add(Rect::new(0, 0, 4, 4));
        let below = plan.add(Rect::new(0, 4, 4, 4));
        let right = plan.add(Rect::new(4, 0, 4, 4));
        plan.connect(&target, &below);
        plan.connect(&target, &right);
        plan.doors.push(entrance(plan.floor, &target, DoorSide::Top));
        let graph = plan.graph();
        let coords = build_coordinate_map(&graph.zones);

        assert_eq!(collect_wing(&graph, &coords, target.id, DoorSide::Bottom), vec![below.id]);
        assert_eq!(collect_wing(&graph, &coords, target.id, DoorSide::Right), vec![right.id]);
        assert!(collect_wing(&graph, &coords, target.id, DoorSide::Top).is_empty());
    }

    #[test]
    fn unknown_zone_is_not_found() {
        let plan = Floorplan::new();
        assert!(matches!(
            plan_geometry_change(&plan.graph(), Uuid::new_v4(), &update(Some(1), None, None, None)),
            Err(AppError::NotFound(_))
        ));
    }
}
