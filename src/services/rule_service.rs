// src/services/rule_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, EmployeeRepository, RuleRepository},
    models::access::{AccessType, ZoneAccessRule, ZoneRuleAssignment},
};

/// TIME_LIMITED exige duração positiva; FORBIDDEN não aceita duração.
pub fn check_rule_shape(access_type: AccessType, max_duration_minutes: Option<i32>) -> Result<(), AppError> {
    match (access_type, max_duration_minutes) {
        (AccessType::TimeLimited, Some(minutes)) if minutes > 0 => Ok(()),
        (AccessType::TimeLimited, _) => Err(AppError::InvariantViolation(
            "Regras TIME_LIMITED precisam de uma duração máxima positiva".into(),
        )),
        (AccessType::Forbidden, None) => Ok(()),
        (AccessType::Forbidden, Some(_)) => Err(AppError::InvariantViolation(
            "Regras FORBIDDEN não têm duração máxima".into(),
        )),
    }
}

#[derive(Clone)]
pub struct RuleService {
    pool: PgPool,
    repo: RuleRepository,
    building_repo: BuildingRepository,
    employee_repo: EmployeeRepository,
}

impl RuleService {
    pub fn new(
        pool: PgPool,
        repo: RuleRepository,
        building_repo: BuildingRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self { pool, repo, building_repo, employee_repo }
    }

    pub async fn create_rule(
        &self,
        organization_id: Uuid,
        title: &str,
        access_type: AccessType,
        max_duration_minutes: Option<i32>,
    ) -> Result<ZoneAccessRule, AppError> {
        check_rule_shape(access_type, max_duration_minutes)?;
        self.repo
            .create_rule(&self.pool, organization_id, title, access_type, max_duration_minutes)
            .await
    }

    /// Todos os cargos precisam existir e ser da organização.
    async fn require_positions(&self, conn: &mut PgConnection, organization_id: Uuid, position_ids: &[Uuid]) -> Result<(), AppError> {
        let found = self.employee_repo.find_positions(conn, position_ids).await?;

        for id in position_ids {
            match found.iter().find(|p| p.id == *id) {
                None => return Err(AppError::NotFound(format!("Cargo {}", id))),
                Some(p) if p.organization_id != organization_id => {
                    return Err(AppError::CrossOrganization(format!("O cargo {} pertence a outra organização", id)));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Aplica a regra a uma zona para um conjunto (não vazio) de cargos.
    pub async fn attach_rule(
        &self,
        organization_id: Uuid,
        rule_id: Uuid,
        zone_id: Uuid,
        position_ids: &[Uuid],
    ) -> Result<ZoneRuleAssignment, AppError> {
        if position_ids.is_empty() {
            return Err(AppError::InvariantViolation("Informe pelo menos um cargo".into()));
        }

        let mut tx = self.pool.begin().await?;

        let rule = self
            .repo
            .find_rule(&mut *tx, rule_id)
            .await?
            .filter(|r| r.organization_id == organization_id)
            .ok_or_else(|| AppError::NotFound(format!("Regra {}", rule_id)))?;

        let zone = self
            .building_repo
            .find_zone(&mut *tx, zone_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Zona {}", zone_id)))?;
        let zone_org = self
            .building_repo
            .find_building(&mut *tx, zone.building_id)
            .await?
            .map(|b| b.organization_id);
        if zone_org != Some(rule.organization_id) {
            return Err(AppError::CrossOrganization(format!(
                "A zona {} não pertence à organização da regra",
                zone_id
            )));
        }

        self.require_positions(&mut tx, organization_id, position_ids).await?;

        let assignment_id = self.repo.create_assignment(&mut *tx, rule_id, zone_id).await?;
        for position_id in position_ids {
            self.repo.add_assignment_position(&mut *tx, assignment_id, *position_id).await?;
        }

        let assignment = self
            .repo
            .lock_assignment(&mut *tx, organization_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Atribuição {}", assignment_id)))?;

        tx.commit().await?;
        Ok(assignment)
    }

    pub async fn add_position(
        &self,
        organization_id: Uuid,
        assignment_id: Uuid,
        position_id: Uuid,
    ) -> Result<ZoneRuleAssignment, AppError> {
        let mut tx = self.pool.begin().await?;

        let assignment = self
            .repo
            .lock_assignment(&mut *tx, organization_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Atribuição {}", assignment_id)))?;

        if assignment.position_ids.contains(&position_id) {
            return Err(AppError::Conflict(format!("O cargo {} já está nesta atribuição", position_id)));
        }
        self.require_positions(&mut tx, organization_id, &[position_id]).await?;
        self.repo.add_assignment_position(&mut *tx, assignment_id, position_id).await?;

        let updated = ZoneRuleAssignment {
            position_ids: assignment.position_ids.iter().copied().chain([position_id]).collect(),
            ..assignment
        };
        tx.commit().await?;
        Ok(updated)
    }

    /// Remover o último cargo deixaria a atribuição vazia: use `detach_rule`.
    pub async fn remove_position(
        &self,
        organization_id: Uuid,
        assignment_id: Uuid,
        position_id: Uuid,
    ) -> Result<ZoneRuleAssignment, AppError> {
        let mut tx = self.pool.begin().await?;

        let assignment = self
            .repo
            .lock_assignment(&mut *tx, organization_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Atribuição {}", assignment_id)))?;

        if !assignment.position_ids.contains(&position_id) {
            return Err(AppError::NotFound(format!("Cargo {} na atribuição", position_id)));
        }
        if assignment.position_ids.len() <= 1 {
            return Err(AppError::InvariantViolation(
                "Não é possível remover o último cargo; remova a regra da zona".into(),
            ));
        }

        self.repo.remove_assignment_position(&mut *tx, assignment_id, position_id).await?;

        let updated = ZoneRuleAssignment {
            position_ids: assignment.position_ids.iter().copied().filter(|p| *p != position_id).collect(),
            ..assignment
        };
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn detach_rule(&self, organization_id: Uuid, assignment_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_assignment(&mut *tx, organization_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Atribuição {}", assignment_id)))?;
        self.repo.delete_assignment(&mut *tx, assignment_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_limited_rules_need_a_positive_duration() {
        assert!(check_rule_shape(AccessType::TimeLimited, Some(30)).is_ok());
        assert!(matches!(
            check_rule_shape(AccessType::TimeLimited, None),
            Err(AppError::InvariantViolation(_))
        ));
        assert!(check_rule_shape(AccessType::TimeLimited, Some(0)).is_err());
    }

    #[test]
    fn forbidden_rules_have_no_duration() {
        assert!(check_rule_shape(AccessType::Forbidden, None).is_ok());
        assert!(check_rule_shape(AccessType::Forbidden, Some(10)).is_err());
    }
}
