// src/db/rule_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access::{AccessType, ZoneAccessRule, ZoneRuleAssignment, ZoneRuleView};

#[derive(Clone)]
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  REGRAS
    // =========================================================================

    pub async fn create_rule<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        title: &str,
        access_type: AccessType,
        max_duration_minutes: Option<i32>,
    ) -> Result<ZoneAccessRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rule = sqlx::query_as::<_, ZoneAccessRule>(
            r#"
            INSERT INTO zone_access_rules (organization_id, title, access_type, max_duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, title, access_type, max_duration_minutes
            "#,
        )
        .bind(organization_id)
        .bind(title)
        .bind(access_type)
        .bind(max_duration_minutes)
        .fetch_one(executor)
        .await?;

        Ok(rule)
    }

    pub async fn find_rule<'e, E>(&self, executor: E, rule_id: Uuid) -> Result<Option<ZoneAccessRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rule = sqlx::query_as::<_, ZoneAccessRule>(
            "SELECT id, organization_id, title, access_type, max_duration_minutes FROM zone_access_rules WHERE id = $1",
        )
        .bind(rule_id)
        .fetch_optional(executor)
        .await?;

        Ok(rule)
    }

    // =========================================================================
    //  ATRIBUIÇÕES REGRA -> ZONA
    // =========================================================================

    pub async fn create_assignment<'e, E>(&self, executor: E, rule_id: Uuid, zone_id: Uuid) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO zone_rule_assignments (rule_id, zone_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(rule_id)
        .bind(zone_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A regra já está atribuída a esta zona"))
    }

    pub async fn add_assignment_position<'e, E>(&self, executor: E, assignment_id: Uuid, position_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO zone_rule_assignment_positions (assignment_id, position_id) VALUES ($1, $2)")
            .bind(assignment_id)
            .bind(position_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "O cargo já está nesta atribuição"))?;

        Ok(())
    }

    pub async fn remove_assignment_position<'e, E>(&self, executor: E, assignment_id: Uuid, position_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM zone_rule_assignment_positions WHERE assignment_id = $1 AND position_id = $2",
        )
        .bind(assignment_id)
        .bind(position_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Atribuição com seus cargos, restrita à organização dona da regra.
    /// `FOR UPDATE` na atribuição serializa alterações concorrentes da lista de cargos.
    pub async fn lock_assignment<'e, E>(&self, executor: E, organization_id: Uuid, assignment_id: Uuid) -> Result<Option<ZoneRuleAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, ZoneRuleAssignment>(
            r#"
            SELECT a.id, a.rule_id, a.zone_id,
                   ARRAY(
                       SELECT p.position_id FROM zone_rule_assignment_positions p
                       WHERE p.assignment_id = a.id
                       ORDER BY p.position_id
                   ) AS position_ids
            FROM zone_rule_assignments a
            JOIN zone_access_rules r ON r.id = a.rule_id
            WHERE a.id = $1 AND r.organization_id = $2
            FOR UPDATE OF a
            "#,
        )
        .bind(assignment_id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;

        Ok(assignment)
    }

    pub async fn delete_assignment<'e, E>(&self, executor: E, assignment_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM zone_rule_assignments WHERE id = $1")
            .bind(assignment_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  LEITURA PARA AVALIAÇÃO
    // =========================================================================

    pub async fn rules_for_zone<'e, E>(&self, executor: E, zone_id: Uuid) -> Result<Vec<ZoneRuleView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let views = sqlx::query_as::<_, ZoneRuleView>(
            r#"
            SELECT a.id AS assignment_id, a.zone_id, r.access_type, r.max_duration_minutes,
                   ARRAY(
                       SELECT p.position_id FROM zone_rule_assignment_positions p
                       WHERE p.assignment_id = a.id
                   ) AS position_ids
            FROM zone_rule_assignments a
            JOIN zone_access_rules r ON r.id = a.rule_id
            WHERE a.zone_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(zone_id)
        .fetch_all(executor)
        .await?;

        Ok(views)
    }

    /// Zonas com pelo menos uma regra TIME_LIMITED, com a organização dona da regra.
    pub async fn time_limited_zones<'e, E>(&self, executor: E) -> Result<Vec<(Uuid, Uuid)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let zones = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT DISTINCT a.zone_id, r.organization_id
            FROM zone_rule_assignments a
            JOIN zone_access_rules r ON r.id = a.rule_id
            WHERE r.access_type = 'TIME_LIMITED'
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(zones)
    }
}
