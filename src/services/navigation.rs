// src/services/navigation.rs

use uuid::Uuid;

use crate::models::access::DoorPassage;

/// Transição de estado ao passar por uma porta. `None` significa "fora do prédio".
///
/// - Porta de entrada (`zone_from_id = None`): alterna entre fora e `zone_to`.
/// - Porta comum: troca de lado se o funcionário estiver em uma das pontas.
///   Se não estiver em nenhuma (leitura perdida), assume `zone_to`. É uma
///   recuperação de melhor esforço, não uma máquina de estados estrita.
pub fn determine_new_zone(current: Option<Uuid>, zone_from_id: Option<Uuid>, zone_to_id: Uuid) -> Option<Uuid> {
    match zone_from_id {
        None if current == Some(zone_to_id) => None,
        None => Some(zone_to_id),
        Some(_) if current == Some(zone_to_id) => zone_from_id,
        Some(from) if current == Some(from) => Some(zone_to_id),
        Some(_) => Some(zone_to_id),
    }
}

/// Reproduz o histórico (já ordenado) a partir de "fora do prédio".
pub fn replay<'a>(passages: impl IntoIterator<Item = &'a DoorPassage>) -> Option<Uuid> {
    passages
        .into_iter()
        .fold(None, |current, p| determine_new_zone(current, p.zone_from_id, p.zone_to_id))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::access::DoorPassage;

    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, 0).unwrap()
    }

    pub fn entrance(zone: Uuid, hour: u32, minute: u32) -> DoorPassage {
        DoorPassage { scanned_at: at(hour, minute), zone_from_id: None, zone_to_id: zone }
    }

    pub fn door(from: Uuid, to: Uuid, hour: u32, minute: u32) -> DoorPassage {
        DoorPassage { scanned_at: at(hour, minute), zone_from_id: Some(from), zone_to_id: to }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn entrance_door_toggles_between_outside_and_zone() {
        let hall = Uuid::new_v4();
        assert_eq!(determine_new_zone(None, None, hall), Some(hall));
        assert_eq!(determine_new_zone(Some(hall), None, hall), None);
    }

    #[test]
    fn entrance_scan_from_another_zone_enters_the_entrance_zone() {
        let (hall, office) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(determine_new_zone(Some(office), None, hall), Some(hall));
    }

    #[test]
    fn regular_door_swaps_sides() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(determine_new_zone(Some(a), Some(a), b), Some(b));
        assert_eq!(determine_new_zone(Some(b), Some(a), b), Some(a));
    }

    // Política de melhor esforço: leitura que não bate com a posição atual leva a `zone_to`.
    #[test]
    fn mismatched_scan_falls_back_to_zone_to() {
        let (a, b, elsewhere) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(determine_new_zone(None, Some(a), b), Some(b));
        assert_eq!(determine_new_zone(Some(elsewhere), Some(a), b), Some(b));
    }

    // Leitura dupla rápida na mesma porta desfaz a passagem: o registro não distingue
    // "passou duas vezes" de "leitor disparou duas vezes".
    #[test]
    fn double_scan_on_same_door_returns_to_origin() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let history = [entrance(a, 9, 0), door(a, b, 9, 5), door(a, b, 9, 5)];
        assert_eq!(replay(&history), Some(a));
    }

    #[test]
    fn replay_follows_a_full_visit() {
        let (hall, office) = (Uuid::new_v4(), Uuid::new_v4());
        let history = [
            entrance(hall, 8, 0),
            door(hall, office, 8, 10),
            door(hall, office, 12, 0),
        ];
        assert_eq!(replay(&history), Some(hall));

        let history = [entrance(hall, 8, 0), entrance(hall, 18, 0)];
        assert_eq!(replay(&history), None);
        assert_eq!(replay(&[]), None);
    }

    #[test]
    fn replay_is_a_pure_function_of_history() {
        let (hall, office, lab) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let history = vec![
            entrance(hall, 8, 0),
            door(hall, office, 8, 10),
            door(office, lab, 9, 0),
        ];
        let first = replay(&history);
        let second = replay(&history.clone());
        assert_eq!(first, second);
        assert_eq!(first, Some(lab));
    }
}
