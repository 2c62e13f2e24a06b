// src/services/access_evaluator.rs

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::access::{AccessType, DoorPassage, ZoneRuleView};
use crate::services::navigation::determine_new_zone;

pub const FORBIDDEN_TITLE: &str = "Unauthorized Zone Access";
pub const TIME_LIMIT_TITLE: &str = "Zone Time Limit Exceeded";

fn covering<'a>(position_id: Uuid, rules: &'a [ZoneRuleView]) -> impl Iterator<Item = &'a ZoneRuleView> {
    rules.iter().filter(move |r| r.position_ids.contains(&position_id))
}

/// Proibido se todos os cargos do funcionário estão cobertos por alguma regra da zona
/// e ao menos uma das regras que cobrem é FORBIDDEN.
/// Um cargo sem regra nenhuma libera o acesso (fail-open).
pub fn is_forbidden(position_ids: &[Uuid], rules: &[ZoneRuleView]) -> bool {
    if position_ids.is_empty() {
        return false;
    }

    let all_covered = position_ids.iter().all(|p| covering(*p, rules).next().is_some());
    let any_forbidden = position_ids
        .iter()
        .any(|p| covering(*p, rules).any(|r| r.access_type == AccessType::Forbidden));

    all_covered && any_forbidden
}

/// Limite efetivo em minutos: para cada cargo, o maior limite entre as regras TIME_LIMITED
/// que o cobrem; depois o maior entre os cargos. `None` se algum cargo não está coberto.
pub fn effective_time_limit(position_ids: &[Uuid], rules: &[ZoneRuleView]) -> Option<i32> {
    if position_ids.is_empty() {
        return None;
    }

    position_ids
        .iter()
        .map(|p| {
            covering(*p, rules)
                .filter(|r| r.access_type == AccessType::TimeLimited)
                .filter_map(|r| r.max_duration_minutes)
                .max()
        })
        .collect::<Option<Vec<i32>>>()?
        .into_iter()
        .max()
}

/// Minutos inteiros passados em `zone_id`, contando só o que está depois de `boundary`.
/// O histórico é reproduzido inteiro (para saber onde o funcionário estava), mas cada
/// intervalo é cortado na fronteira. Se ainda estiver na zona, conta até `now`.
pub fn minutes_in_zone(
    passages: &[DoorPassage],
    zone_id: Uuid,
    boundary: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    let clipped = |from: DateTime<Utc>, to: DateTime<Utc>| {
        let start = from.max(boundary);
        if to > start { (to - start).num_seconds() } else { 0 }
    };

    let mut current: Option<Uuid> = None;
    let mut entered_at: Option<DateTime<Utc>> = None;
    let mut seconds = 0_i64;

    for passage in passages.iter().filter(|p| p.scanned_at <= now) {
        let next = determine_new_zone(current, passage.zone_from_id, passage.zone_to_id);

        if current == Some(zone_id) && next != Some(zone_id) {
            if let Some(start) = entered_at.take() {
                seconds += clipped(start, passage.scanned_at);
            }
        } else if current != Some(zone_id) && next == Some(zone_id) {
            entered_at = Some(passage.scanned_at);
        }

        current = next;
    }

    if let Some(start) = entered_at {
        seconds += clipped(start, now);
    }

    seconds / 60
}

/// Meia-noite do dia de `now` no fuso informado.
pub fn day_start_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(tz).date_naive();
    local_date
        .and_time(NaiveTime::MIN)
        .and_local_timezone(tz.clone())
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Meia-noite inexistente (horário de verão): usa a meia-noite UTC da mesma data
        .unwrap_or_else(|| local_date.and_time(NaiveTime::MIN).and_utc())
}

pub fn local_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start_in(now, &Local)
}

/// A fronteira de reinício: a última notificação de limite de hoje, senão a meia-noite.
pub fn restart_boundary(last_violation_today: Option<DateTime<Utc>>, day_start: DateTime<Utc>) -> DateTime<Utc> {
    match last_violation_today {
        Some(at) if at > day_start => at,
        _ => day_start,
    }
}

pub fn forbidden_message(employee_name: &str, zone_title: &str) -> String {
    format!("{} entered restricted zone \"{}\".", employee_name, zone_title)
}

pub fn time_limit_message(employee_name: &str, zone_title: &str, minutes: i64, limit: i32) -> String {
    format!(
        "{} has spent {} minutes in zone \"{}\" (limit {} minutes).",
        employee_name, minutes, zone_title, limit
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::navigation::fixtures::{at, door, entrance};

    fn rule(zone_id: Uuid, access_type: AccessType, minutes: Option<i32>, positions: &[Uuid]) -> ZoneRuleView {
        ZoneRuleView {
            assignment_id: Uuid::new_v4(),
            zone_id,
            access_type,
            max_duration_minutes: minutes,
            position_ids: positions.to_vec(),
        }
    }

    #[test]
    fn forbidden_requires_every_position_covered() {
        let zone = Uuid::new_v4();
        let (guard, cleaner) = (Uuid::new_v4(), Uuid::new_v4());
        let rules = vec![rule(zone, AccessType::Forbidden, None, &[guard])];

        assert!(is_forbidden(&[guard], &rules));
        // O segundo cargo não tem regra: fail-open
        assert!(!is_forbidden(&[guard, cleaner], &rules));
        // Sem cargos não há o que avaliar
        assert!(!is_forbidden(&[], &rules));
    }

    #[test]
    fn forbidden_needs_at_least_one_forbidden_rule() {
        let zone = Uuid::new_v4();
        let (guard, cleaner) = (Uuid::new_v4(), Uuid::new_v4());
        let limited = rule(zone, AccessType::TimeLimited, Some(30), &[guard, cleaner]);
        assert!(!is_forbidden(&[guard, cleaner], &[limited.clone()]));

        let forbidden = rule(zone, AccessType::Forbidden, None, &[cleaner]);
        assert!(is_forbidden(&[guard, cleaner], &[limited, forbidden]));
    }

    #[test]
    fn effective_limit_is_max_of_per_position_max() {
        let zone = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rules = vec![
            rule(zone, AccessType::TimeLimited, Some(10), &[a]),
            rule(zone, AccessType::TimeLimited, Some(20), &[a]),
            rule(zone, AccessType::TimeLimited, Some(15), &[b]),
        ];
        assert_eq!(effective_time_limit(&[a, b], &rules), Some(20));
        assert_eq!(effective_time_limit(&[b], &rules), Some(15));
    }

    #[test]
    fn effective_limit_is_none_when_a_position_is_uncovered() {
        let zone = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rules = vec![
            rule(zone, AccessType::TimeLimited, Some(10), &[a]),
            rule(zone, AccessType::Forbidden, None, &[b]),
        ];
        assert_eq!(effective_time_limit(&[a, b], &rules), None);
        assert_eq!(effective_time_limit(&[], &rules), None);
    }

    #[test]
    fn minutes_accumulate_across_visits() {
        let (hall, lab) = (Uuid::new_v4(), Uuid::new_v4());
        let history = [
            entrance(hall, 8, 0),
            door(hall, lab, 8, 0),
            door(hall, lab, 8, 20),
            door(hall, lab, 10, 0),
            door(lab, hall, 10, 15),
        ];
        assert_eq!(minutes_in_zone(&history, lab, at(0, 0), at(12, 0)), 35);
        assert_eq!(minutes_in_zone(&history, hall, at(0, 0), at(12, 0)), 100 + 105);
    }

    #[test]
    fn scenario_d_open_interval_counts_until_now_and_boundary_resets() {
        let zone = Uuid::new_v4();
        let history = [entrance(zone, 9, 0)];
        let midnight = at(0, 0);

        let at_931 = minutes_in_zone(&history, zone, restart_boundary(None, midnight), at(9, 31));
        assert!(at_931 >= 30);

        // A notificação das 09:31 vira a nova fronteira
        let boundary = restart_boundary(Some(at(9, 31)), midnight);
        assert_eq!(minutes_in_zone(&history, zone, boundary, at(9, 32)), 1);
    }

    #[test]
    fn interval_straddling_boundary_is_clipped() {
        let (hall, lab) = (Uuid::new_v4(), Uuid::new_v4());
        let history = [entrance(hall, 8, 0), door(hall, lab, 8, 0), door(lab, hall, 9, 0)];
        assert_eq!(minutes_in_zone(&history, lab, at(8, 45), at(12, 0)), 15);
        assert_eq!(minutes_in_zone(&history, lab, at(9, 30), at(12, 0)), 0);
    }

    #[test]
    fn scans_after_now_are_ignored() {
        let zone = Uuid::new_v4();
        let history = [entrance(zone, 9, 0), entrance(zone, 11, 0)];
        assert_eq!(minutes_in_zone(&history, zone, at(0, 0), at(10, 0)), 60);
    }

    #[test]
    fn partial_minutes_are_floored() {
        let zone = Uuid::new_v4();
        let history = [entrance(zone, 9, 0)];
        let now = at(9, 29) + chrono::Duration::seconds(59);
        assert_eq!(minutes_in_zone(&history, zone, at(0, 0), now), 29);
    }

    #[test]
    fn restart_boundary_ignores_violations_from_before_today() {
        let midnight = at(0, 0);
        let yesterday = midnight - chrono::Duration::hours(2);
        assert_eq!(restart_boundary(Some(yesterday), midnight), midnight);
        assert_eq!(restart_boundary(None, midnight), midnight);
    }

    #[test]
    fn day_start_in_utc_is_midnight() {
        assert_eq!(day_start_in(at(15, 42), &Utc), at(0, 0));
    }
}
