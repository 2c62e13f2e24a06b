// src/db/rfid_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access::{RfidReader, RfidTag, TagAssignment};

#[derive(Clone)]
pub struct RfidRepository {
    pool: PgPool,
}

impl RfidRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- LEITORES ---

    pub async fn create_reader<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        serial_number: i64,
        door_id: Option<Uuid>,
    ) -> Result<RfidReader, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RfidReader>(
            r#"
            INSERT INTO rfid_readers (organization_id, serial_number, door_id)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, serial_number, door_id
            "#,
        )
        .bind(organization_id)
        .bind(serial_number)
        .bind(door_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Número de série ou porta já em uso"))
    }

    pub async fn find_reader<'e, E>(&self, executor: E, organization_id: Uuid, reader_id: Uuid) -> Result<Option<RfidReader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reader = sqlx::query_as::<_, RfidReader>(
            "SELECT id, organization_id, serial_number, door_id FROM rfid_readers WHERE id = $1 AND organization_id = $2",
        )
        .bind(reader_id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;

        Ok(reader)
    }

    pub async fn find_reader_by_serial<'e, E>(&self, executor: E, serial_number: i64) -> Result<Option<RfidReader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reader = sqlx::query_as::<_, RfidReader>(
            "SELECT id, organization_id, serial_number, door_id FROM rfid_readers WHERE serial_number = $1",
        )
        .bind(serial_number)
        .fetch_optional(executor)
        .await?;

        Ok(reader)
    }

    pub async fn set_reader_door<'e, E>(&self, executor: E, reader_id: Uuid, door_id: Option<Uuid>) -> Result<RfidReader, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RfidReader>(
            r#"
            UPDATE rfid_readers SET door_id = $2
            WHERE id = $1
            RETURNING id, organization_id, serial_number, door_id
            "#,
        )
        .bind(reader_id)
        .bind(door_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A porta já possui um leitor"))
    }

    // --- TAGS ---

    pub async fn create_tag<'e, E>(&self, executor: E, organization_id: Uuid, uid: i64) -> Result<RfidTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RfidTag>(
            r#"
            INSERT INTO rfid_tags (organization_id, uid)
            VALUES ($1, $2)
            RETURNING id, organization_id, uid
            "#,
        )
        .bind(organization_id)
        .bind(uid)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Tag já cadastrada"))
    }

    pub async fn find_tag<'e, E>(&self, executor: E, organization_id: Uuid, tag_id: Uuid) -> Result<Option<RfidTag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tag = sqlx::query_as::<_, RfidTag>(
            "SELECT id, organization_id, uid FROM rfid_tags WHERE id = $1 AND organization_id = $2",
        )
        .bind(tag_id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;

        Ok(tag)
    }

    pub async fn find_tag_by_uid<'e, E>(&self, executor: E, uid: i64) -> Result<Option<RfidTag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tag = sqlx::query_as::<_, RfidTag>("SELECT id, organization_id, uid FROM rfid_tags WHERE uid = $1")
            .bind(uid)
            .fetch_optional(executor)
            .await?;

        Ok(tag)
    }

    // --- ATRIBUIÇÕES ---

    pub async fn insert_assignment<'e, E>(
        &self,
        executor: E,
        tag_id: Uuid,
        employee_id: Option<Uuid>,
        changed_at: DateTime<Utc>,
    ) -> Result<TagAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, TagAssignment>(
            r#"
            INSERT INTO tag_assignments (tag_id, employee_id, change_date_and_time)
            VALUES ($1, $2, $3)
            RETURNING id, tag_id, employee_id, change_date_and_time
            "#,
        )
        .bind(tag_id)
        .bind(employee_id)
        .bind(changed_at)
        .fetch_one(executor)
        .await?;

        Ok(assignment)
    }

    /// Atribuição vigente de uma tag no instante informado.
    pub async fn assignment_at<'e, E>(&self, executor: E, tag_id: Uuid, at: DateTime<Utc>) -> Result<Option<TagAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, TagAssignment>(
            r#"
            SELECT id, tag_id, employee_id, change_date_and_time
            FROM tag_assignments
            WHERE tag_id = $1 AND change_date_and_time <= $2
            ORDER BY change_date_and_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(tag_id)
        .bind(at)
        .fetch_optional(executor)
        .await?;

        Ok(assignment)
    }

    /// A tag atual do funcionário: entre as tags cuja atribuição mais recente aponta para
    /// ele, a atribuída por último.
    pub async fn current_assignment_for_employee<'e, E>(&self, executor: E, employee_id: Uuid) -> Result<Option<TagAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, TagAssignment>(
            r#"
            SELECT id, tag_id, employee_id, change_date_and_time
            FROM (
                SELECT DISTINCT ON (ta.tag_id) ta.id, ta.tag_id, ta.employee_id, ta.change_date_and_time
                FROM tag_assignments ta
                WHERE ta.tag_id IN (SELECT tag_id FROM tag_assignments WHERE employee_id = $1)
                ORDER BY ta.tag_id, ta.change_date_and_time DESC, ta.id DESC
            ) latest
            WHERE latest.employee_id = $1
            ORDER BY latest.change_date_and_time DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(executor)
        .await?;

        Ok(assignment)
    }
}
