// src/services/time_limit_sweep.rs

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, EmployeeRepository, NotificationRepository, OrganizationRepository, RuleRepository, ScanRepository},
    models::access::{DoorPassage, NotificationKind, ZoneRuleView},
    services::{
        access_evaluator::{
            effective_time_limit, local_day_start, minutes_in_zone, restart_boundary, time_limit_message, TIME_LIMIT_TITLE,
        },
        notification_service::{NotificationDraft, NotificationService},
        scan_service::ScanService,
    },
};

/// Excedeu o limite: minutos contados e o limite efetivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub minutes: i64,
    pub limit: i32,
}

/// Decisão para um funcionário em uma zona, sem acesso ao banco.
pub fn evaluate_time_limit(
    position_ids: &[Uuid],
    rules: &[ZoneRuleView],
    passages: &[DoorPassage],
    zone_id: Uuid,
    boundary: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<Violation> {
    let limit = effective_time_limit(position_ids, rules)?;
    let minutes = minutes_in_zone(passages, zone_id, boundary, now);
    (minutes >= i64::from(limit)).then_some(Violation { minutes, limit })
}

/// Garante uma execução por vez: se a anterior ainda está rodando, a nova é pulada.
#[derive(Clone, Default)]
pub struct SweepGuard {
    running: Arc<Mutex<()>>,
}

impl SweepGuard {
    pub async fn run_exclusive<F, Fut, T>(&self, job: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _lock = self.running.try_lock().ok()?;
        Some(job().await)
    }
}

/// Fontes de dados de uma passada. Separadas do banco para que a passada em si
/// (isolamento de falhas por zona e por funcionário) seja testável.
#[async_trait]
trait SweepSource: Sync {
    async fn time_limited_zones(&self) -> Result<Vec<(Uuid, Uuid)>, AppError>;

    async fn zone_rules(&self, zone_id: Uuid) -> Result<Vec<ZoneRuleView>, AppError>;

    async fn employees_active_since(&self, organization_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Uuid>, AppError>;

    /// `true` quando uma notificação foi emitida.
    async fn check_employee(
        &self,
        employee_id: Uuid,
        zone_id: Uuid,
        rules: &[ZoneRuleView],
        day_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}

async fn sweep_zones<S: SweepSource>(source: &S, day_start: DateTime<Utc>, now: DateTime<Utc>) -> Result<SweepStats, AppError> {
    let mut stats = SweepStats::default();

    for (zone_id, organization_id) in source.time_limited_zones().await? {
        // Falha ao carregar uma zona não interrompe as demais
        let rules = match source.zone_rules(zone_id).await {
            Ok(rules) => rules,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!("Zona {} ignorada nesta verificação (regras): {}", zone_id, e);
                continue;
            }
        };
        let employees = match source.employees_active_since(organization_id, day_start).await {
            Ok(employees) => employees,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!("Zona {} ignorada nesta verificação (leituras): {}", zone_id, e);
                continue;
            }
        };

        for employee_id in employees {
            stats.checked += 1;
            // Falha de um funcionário não interrompe os demais
            match source.check_employee(employee_id, zone_id, &rules, day_start, now).await {
                Ok(true) => stats.notified += 1,
                Ok(false) => {}
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!("Funcionário {} na zona {}: {}", employee_id, zone_id, e);
                }
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SweepStats {
    checked: usize,
    notified: usize,
    failed: usize,
}

#[derive(Clone)]
pub struct TimeLimitSweeper {
    pool: PgPool,
    rule_repo: RuleRepository,
    scan_repo: ScanRepository,
    employee_repo: EmployeeRepository,
    building_repo: BuildingRepository,
    org_repo: OrganizationRepository,
    notification_repo: NotificationRepository,
    scan_service: ScanService,
    notifications: NotificationService,
    guard: SweepGuard,
}

impl TimeLimitSweeper {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        rule_repo: RuleRepository,
        scan_repo: ScanRepository,
        employee_repo: EmployeeRepository,
        building_repo: BuildingRepository,
        org_repo: OrganizationRepository,
        notification_repo: NotificationRepository,
        scan_service: ScanService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            rule_repo,
            scan_repo,
            employee_repo,
            building_repo,
            org_repo,
            notification_repo,
            scan_service,
            notifications,
            guard: SweepGuard::default(),
        }
    }

    /// Inicia o laço periódico em segundo plano.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!("⏱️ Verificação de tempo em zona a cada {:?}", every);
            loop {
                ticker.tick().await;
                let sweeper = self.clone();
                // Em tarefa separada para que um tick lento não segure o próximo
                tokio::spawn(async move { sweeper.run_once().await });
            }
        })
    }

    /// Uma passada completa. Retorna `false` se outra passada já estava em andamento.
    pub async fn run_once(&self) -> bool {
        let now = Utc::now();
        match self.guard.run_exclusive(|| self.sweep(now)).await {
            Some(Ok(stats)) => {
                tracing::debug!(
                    "Verificação concluída: {} avaliações, {} notificações, {} falhas",
                    stats.checked,
                    stats.notified,
                    stats.failed
                );
                true
            }
            Some(Err(e)) => {
                tracing::error!("Falha na verificação de tempo em zona: {}", e);
                true
            }
            None => {
                tracing::warn!("Verificação anterior ainda em andamento; pulando esta");
                false
            }
        }
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepStats, AppError> {
        sweep_zones(self, local_day_start(now), now).await
    }

    async fn evaluate_employee(
        &self,
        employee_id: Uuid,
        zone_id: Uuid,
        rules: &[ZoneRuleView],
        day_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let positions = self.employee_repo.position_ids(&self.pool, employee_id).await?;
        if effective_time_limit(&positions, rules).is_none() {
            return Ok(false);
        }

        let last = self
            .notification_repo
            .last_notified_since(&self.pool, employee_id, zone_id, NotificationKind::TimeLimitExceeded, day_start)
            .await?;
        let boundary = restart_boundary(last, day_start);

        let mut conn = self.pool.acquire().await?;
        let passages = self.scan_service.passages_for_employee(&mut conn, employee_id).await?;
        drop(conn);

        let Some(violation) = evaluate_time_limit(&positions, rules, &passages, zone_id, boundary, now) else {
            return Ok(false);
        };

        let employee = self
            .employee_repo
            .find(&self.pool, employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Funcionário {}", employee_id)))?;
        let zone_title = self
            .building_repo
            .find_zone(&self.pool, zone_id)
            .await?
            .map(|z| z.title)
            .unwrap_or_default();
        let org = self
            .org_repo
            .find(&self.pool, employee.organization_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organização {}", employee.organization_id)))?;

        let draft = NotificationDraft {
            organization_id: employee.organization_id,
            employee_id,
            zone_id,
            kind: NotificationKind::TimeLimitExceeded,
            title: TIME_LIMIT_TITLE.to_string(),
            message: time_limit_message(&employee.full_name, &zone_title, violation.minutes, violation.limit),
        };
        self.notifications.notify(draft, org.owner_id).await?;

        Ok(true)
    }
}

#[async_trait]
impl SweepSource for TimeLimitSweeper {
    async fn time_limited_zones(&self) -> Result<Vec<(Uuid, Uuid)>, AppError> {
        self.rule_repo.time_limited_zones(&self.pool).await
    }

    async fn zone_rules(&self, zone_id: Uuid) -> Result<Vec<ZoneRuleView>, AppError> {
        self.rule_repo.rules_for_zone(&self.pool, zone_id).await
    }

    async fn employees_active_since(&self, organization_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Uuid>, AppError> {
        self.scan_repo.employees_scanned_since(&self.pool, organization_id, since).await
    }

    async fn check_employee(
        &self,
        employee_id: Uuid,
        zone_id: Uuid,
        rules: &[ZoneRuleView],
        day_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.evaluate_employee(employee_id, zone_id, rules, day_start, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access::AccessType;
    use crate::services::navigation::fixtures::{at, door, entrance};

    fn limited(zone_id: Uuid, minutes: i32, positions: &[Uuid]) -> ZoneRuleView {
        ZoneRuleView {
            assignment_id: Uuid::new_v4(),
            zone_id,
            access_type: AccessType::TimeLimited,
            max_duration_minutes: Some(minutes),
            position_ids: positions.to_vec(),
        }
    }

    #[test]
    fn scenario_d_fires_once_then_boundary_moves() {
        let zone = Uuid::new_v4();
        let position = Uuid::new_v4();
        let rules = vec![limited(zone, 30, &[position])];
        let history = [entrance(zone, 9, 0)];
        let midnight = at(0, 0);

        let first = evaluate_time_limit(&[position], &rules, &history, zone, restart_boundary(None, midnight), at(9, 31));
        assert_eq!(first, Some(Violation { minutes: 31, limit: 30 }));

        let boundary = restart_boundary(Some(at(9, 31)), midnight);
        assert_eq!(evaluate_time_limit(&[position], &rules, &history, zone, boundary, at(9, 32)), None);
    }

    #[test]
    fn uncovered_position_is_never_limited() {
        let zone = Uuid::new_v4();
        let (covered, free) = (Uuid::new_v4(), Uuid::new_v4());
        let rules = vec![limited(zone, 1, &[covered])];
        let history = [entrance(zone, 9, 0)];

        assert_eq!(
            evaluate_time_limit(&[covered, free], &rules, &history, zone, at(0, 0), at(18, 0)),
            None
        );
    }

    #[test]
    fn time_outside_the_zone_does_not_count() {
        let (hall, lab) = (Uuid::new_v4(), Uuid::new_v4());
        let position = Uuid::new_v4();
        let rules = vec![limited(lab, 30, &[position])];
        let history = [entrance(hall, 8, 0), door(hall, lab, 9, 0), door(hall, lab, 9, 20)];

        assert_eq!(evaluate_time_limit(&[position], &rules, &history, lab, at(0, 0), at(12, 0)), None);
    }

    #[tokio::test]
    async fn overlapping_run_is_skipped() {
        let guard = SweepGuard::default();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run_exclusive(|| async move {
                        started_tx.send(()).unwrap();
                        release_rx.await.unwrap();
                        "first"
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        assert_eq!(guard.run_exclusive(|| async { "second" }).await, None);

        release_tx.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Some("first"));

        // Liberado, a próxima passada roda normalmente
        assert_eq!(guard.run_exclusive(|| async { "third" }).await, Some("third"));
    }

    struct ScriptedSource {
        zones: Vec<(Uuid, Uuid)>,
        broken_zone: Uuid,
        employees: Vec<Uuid>,
        broken_employee: Uuid,
        checked: std::sync::Mutex<Vec<(Uuid, Uuid)>>,
    }

    #[async_trait]
    impl SweepSource for ScriptedSource {
        async fn time_limited_zones(&self) -> Result<Vec<(Uuid, Uuid)>, AppError> {
            Ok(self.zones.clone())
        }

        async fn zone_rules(&self, zone_id: Uuid) -> Result<Vec<ZoneRuleView>, AppError> {
            if zone_id == self.broken_zone {
                return Err(AppError::NotFound(format!("Zona {}", zone_id)));
            }
            Ok(vec![limited(zone_id, 30, &[])])
        }

        async fn employees_active_since(&self, _: Uuid, _: DateTime<Utc>) -> Result<Vec<Uuid>, AppError> {
            Ok(self.employees.clone())
        }

        async fn check_employee(
            &self,
            employee_id: Uuid,
            zone_id: Uuid,
            _: &[ZoneRuleView],
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<bool, AppError> {
            self.checked.lock().unwrap().push((employee_id, zone_id));
            if employee_id == self.broken_employee {
                return Err(AppError::NotFound(format!("Funcionário {}", employee_id)));
            }
            Ok(true)
        }
    }

    #[tokio::test]
    async fn failing_zone_or_employee_does_not_stop_the_sweep() {
        let org = Uuid::new_v4();
        let (broken_zone, healthy_zone) = (Uuid::new_v4(), Uuid::new_v4());
        let (broken_employee, healthy_employee) = (Uuid::new_v4(), Uuid::new_v4());
        let source = ScriptedSource {
            zones: vec![(broken_zone, org), (healthy_zone, org)],
            broken_zone,
            employees: vec![broken_employee, healthy_employee],
            broken_employee,
            checked: Default::default(),
        };

        let stats = sweep_zones(&source, at(0, 0), at(12, 0)).await.unwrap();

        assert_eq!(stats, SweepStats { checked: 2, notified: 1, failed: 2 });
        assert_eq!(
            *source.checked.lock().unwrap(),
            vec![(broken_employee, healthy_zone), (healthy_employee, healthy_zone)]
        );
    }
}
