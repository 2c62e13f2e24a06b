// src/services/scan_service.rs

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, EmployeeRepository, OrganizationRepository, RfidRepository, RuleRepository, ScanRepository},
    models::access::{DoorPassage, Employee, Notification, NotificationKind, ScanOutcome, ZoneRuleView},
    services::{
        access_evaluator::{forbidden_message, is_forbidden, FORBIDDEN_TITLE},
        navigation::replay,
        notification_service::{NotificationDraft, NotificationService},
    },
};

#[derive(Clone)]
pub struct ScanService {
    pool: PgPool,
    scan_repo: ScanRepository,
    rfid_repo: RfidRepository,
    employee_repo: EmployeeRepository,
    building_repo: BuildingRepository,
    rule_repo: RuleRepository,
    org_repo: OrganizationRepository,
    notifications: NotificationService,
}

impl ScanService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        scan_repo: ScanRepository,
        rfid_repo: RfidRepository,
        employee_repo: EmployeeRepository,
        building_repo: BuildingRepository,
        rule_repo: RuleRepository,
        org_repo: OrganizationRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            scan_repo,
            rfid_repo,
            employee_repo,
            building_repo,
            rule_repo,
            org_repo,
            notifications,
        }
    }

    /// Histórico de portas da tag atual do funcionário, desde que ela foi atribuída a ele.
    pub async fn passages_for_employee(&self, conn: &mut PgConnection, employee_id: Uuid) -> Result<Vec<DoorPassage>, AppError> {
        let Some(assignment) = self
            .rfid_repo
            .current_assignment_for_employee(&mut *conn, employee_id)
            .await?
        else {
            return Ok(Vec::new());
        };

        self.scan_repo
            .passages_for_tag(conn, assignment.tag_id, assignment.change_date_and_time)
            .await
    }

    /// Zona atual reconstruída do zero a partir do histórico completo.
    pub async fn reconstruct_current_zone(&self, conn: &mut PgConnection, employee_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let passages = self.passages_for_employee(conn, employee_id).await?;
        Ok(replay(&passages))
    }

    pub async fn employee_in_organization(&self, organization_id: Uuid, employee_id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .find(&self.pool, employee_id)
            .await?
            .filter(|e| e.organization_id == organization_id)
            .ok_or_else(|| AppError::NotFound(format!("Funcionário {}", employee_id)))
    }

    /// Processa uma leitura vinda do hardware.
    /// Leitor, tag, atribuição ou porta que não se resolvem => `Ok(None)` sem gravar nada.
    pub async fn process_scan(
        &self,
        reader_serial: i64,
        tag_uid: i64,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<ScanOutcome>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Leituras do mesmo leitor são processadas em série
        self.scan_repo.lock_reader(&mut *tx, reader_serial).await?;

        let Some(reader) = self.rfid_repo.find_reader_by_serial(&mut *tx, reader_serial).await? else {
            tracing::warn!("Leitura ignorada: leitor {} desconhecido", reader_serial);
            return Ok(None);
        };
        let Some(tag) = self.rfid_repo.find_tag_by_uid(&mut *tx, tag_uid).await? else {
            tracing::warn!("Leitura ignorada: tag {} desconhecida", tag_uid);
            return Ok(None);
        };
        if tag.organization_id != reader.organization_id {
            tracing::warn!("Leitura ignorada: tag {} e leitor {} de organizações diferentes", tag_uid, reader_serial);
            return Ok(None);
        }
        let Some(employee_id) = self
            .rfid_repo
            .assignment_at(&mut *tx, tag.id, scanned_at)
            .await?
            .and_then(|a| a.employee_id)
        else {
            tracing::warn!("Leitura ignorada: tag {} sem funcionário", tag_uid);
            return Ok(None);
        };
        let Some(door_id) = reader.door_id else {
            tracing::warn!("Leitura ignorada: leitor {} não está montado em uma porta", reader_serial);
            return Ok(None);
        };
        let Some(employee) = self.employee_repo.find(&mut *tx, employee_id).await? else {
            return Ok(None);
        };

        let scan = self
            .scan_repo
            .insert_scan(&mut *tx, reader.id, tag.id, Some(door_id), scanned_at)
            .await?;

        let current_zone_id = self.reconstruct_current_zone(&mut tx, employee.id).await?;
        self.employee_repo
            .update_current_zone(&mut *tx, employee.id, current_zone_id)
            .await?;

        tx.commit().await?;

        // A notificação vai depois do commit: a leitura fica gravada mesmo se o envio falhar
        let notification = match current_zone_id {
            Some(zone_id) => self.check_forbidden(&employee, zone_id).await?,
            None => None,
        };

        Ok(Some(ScanOutcome {
            scan_id: scan.id,
            employee_id: employee.id,
            previous_zone_id: employee.current_zone_id,
            current_zone_id,
            notification,
        }))
    }

    async fn check_forbidden(
        &self,
        employee: &Employee,
        zone_id: Uuid,
    ) -> Result<Option<Notification>, AppError> {
        let rules = self.rule_repo.rules_for_zone(&self.pool, zone_id).await?;
        if rules.is_empty() {
            return Ok(None);
        }
        let positions = self.employee_repo.position_ids(&self.pool, employee.id).await?;
        if !is_forbidden(&positions, &rules) {
            return Ok(None);
        }

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

        let Some(draft) = forbidden_draft(employee, zone_id, &zone_title, &positions, &rules) else {
            return Ok(None);
        };
        let notification = self.notifications.notify(draft, org.owner_id).await?;
        Ok(Some(notification))
    }
}

/// Notificação de zona proibida para o funcionário que acabou de entrar em `zone_id`,
/// dadas as regras da zona. `None` quando o acesso é permitido.
pub fn forbidden_draft(
    employee: &Employee,
    zone_id: Uuid,
    zone_title: &str,
    position_ids: &[Uuid],
    rules: &[ZoneRuleView],
) -> Option<NotificationDraft> {
    is_forbidden(position_ids, rules).then(|| NotificationDraft {
        organization_id: employee.organization_id,
        employee_id: employee.id,
        zone_id,
        kind: NotificationKind::ForbiddenZone,
        title: FORBIDDEN_TITLE.to_string(),
        message: forbidden_message(&employee.full_name, zone_title),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::access::AccessType;
    use crate::services::navigation::fixtures::{door, entrance};
    use crate::services::notification_service::{fixtures::MemorySink, RealtimeHub};

    fn forbidden_rule(zone_id: Uuid, position_id: Uuid) -> ZoneRuleView {
        ZoneRuleView {
            assignment_id: Uuid::new_v4(),
            zone_id,
            access_type: AccessType::Forbidden,
            max_duration_minutes: None,
            position_ids: vec![position_id],
        }
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            full_name: "Maria Souza".into(),
            current_zone_id: None,
        }
    }

    #[tokio::test]
    async fn entering_forbidden_zone_notifies_once_per_entry() {
        let (forbidden, hall) = (Uuid::new_v4(), Uuid::new_v4());
        let position = Uuid::new_v4();
        let rules = vec![forbidden_rule(forbidden, position)];
        let worker = employee();

        let sink = Arc::new(MemorySink::default());
        let service = NotificationService::new(sink.clone(), RealtimeHub::new(8));

        // entra em F, sai, entra de novo, passa para o hall
        let scans = [
            entrance(forbidden, 9, 0),
            entrance(forbidden, 9, 10),
            entrance(forbidden, 9, 20),
            door(forbidden, hall, 9, 30),
        ];
        let mut history = Vec::new();
        let mut created_after_each_scan = Vec::new();

        for scan in scans {
            history.push(scan);
            if let Some(zone_id) = replay(&history) {
                let zone_rules: Vec<ZoneRuleView> = rules.iter().filter(|r| r.zone_id == zone_id).cloned().collect();
                if let Some(draft) = forbidden_draft(&worker, zone_id, "Sala de Servidores", &[position], &zone_rules) {
                    service.notify(draft, Uuid::new_v4()).await.unwrap();
                }
            }
            created_after_each_scan.push(sink.created.lock().unwrap().len());
        }

        assert_eq!(created_after_each_scan, vec![1, 1, 2, 2]);

        let created = sink.created.lock().unwrap();
        assert!(created.iter().all(|n| n.title == "Unauthorized Zone Access" && n.zone_id == forbidden));
        assert!(created[0].message.contains("Sala de Servidores"));
    }

    #[test]
    fn uncovered_position_does_not_produce_a_draft() {
        let zone = Uuid::new_v4();
        let rules = vec![forbidden_rule(zone, Uuid::new_v4())];
        assert!(forbidden_draft(&employee(), zone, "F", &[Uuid::new_v4()], &rules).is_none());
    }
}
