// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access::{Employee, Position};

/// Funcionários e cargos são cadastrados por outro módulo; aqui só lemos o que
/// as regras de acesso precisam e atualizamos o cache de localização.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find<'e, E>(&self, executor: E, employee_id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, organization_id, full_name, current_zone_id FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(executor)
        .await?;

        Ok(employee)
    }

    pub async fn position_ids<'e, E>(&self, executor: E, employee_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT position_id FROM employee_positions WHERE employee_id = $1 ORDER BY position_id",
        )
        .bind(employee_id)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    pub async fn find_positions<'e, E>(&self, executor: E, position_ids: &[Uuid]) -> Result<Vec<Position>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let positions = sqlx::query_as::<_, Position>(
            "SELECT id, organization_id, title FROM positions WHERE id = ANY($1)",
        )
        .bind(position_ids)
        .fetch_all(executor)
        .await?;

        Ok(positions)
    }

    pub async fn update_current_zone<'e, E>(&self, executor: E, employee_id: Uuid, zone_id: Option<Uuid>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE employees SET current_zone_id = $2 WHERE id = $1")
            .bind(employee_id)
            .bind(zone_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
