// src/db/scan_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access::{DoorPassage, ScanEvent};

#[derive(Clone)]
pub struct ScanRepository {
    pool: PgPool,
}

impl ScanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serializa as leituras de um mesmo leitor até o fim da transação.
    pub async fn lock_reader<'e, E>(&self, executor: E, serial_number: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(serial_number)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn insert_scan<'e, E>(
        &self,
        executor: E,
        reader_id: Uuid,
        tag_id: Uuid,
        door_id: Option<Uuid>,
        scanned_at: DateTime<Utc>,
    ) -> Result<ScanEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let scan = sqlx::query_as::<_, ScanEvent>(
            r#"
            INSERT INTO scan_events (reader_id, tag_id, door_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, reader_id, tag_id, door_id, created_at
            "#,
        )
        .bind(reader_id)
        .bind(tag_id)
        .bind(door_id)
        .bind(scanned_at)
        .fetch_one(executor)
        .await?;

        Ok(scan)
    }

    /// Histórico ordenado de portas atravessadas com a tag a partir de `since`.
    /// Leituras sem porta (leitor solto) ficam de fora.
    pub async fn passages_for_tag<'e, E>(&self, executor: E, tag_id: Uuid, since: DateTime<Utc>) -> Result<Vec<DoorPassage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let passages = sqlx::query_as::<_, DoorPassage>(
            r#"
            SELECT s.created_at AS scanned_at, d.zone_from_id, d.zone_to_id
            FROM scan_events s
            JOIN doors d ON d.id = s.door_id
            WHERE s.tag_id = $1 AND s.created_at >= $2
            ORDER BY s.created_at, s.id
            "#,
        )
        .bind(tag_id)
        .bind(since)
        .fetch_all(executor)
        .await?;

        Ok(passages)
    }

    /// Funcionários (de uma organização) com pelo menos uma leitura desde `since`,
    /// resolvidos pela atribuição vigente da tag no momento de cada leitura.
    pub async fn employees_scanned_since<'e, E>(&self, executor: E, organization_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT a.employee_id
            FROM scan_events s
            JOIN rfid_tags t ON t.id = s.tag_id
            CROSS JOIN LATERAL (
                SELECT ta.employee_id
                FROM tag_assignments ta
                WHERE ta.tag_id = s.tag_id AND ta.change_date_and_time <= s.created_at
                ORDER BY ta.change_date_and_time DESC, ta.id DESC
                LIMIT 1
            ) a
            WHERE s.created_at >= $2
              AND t.organization_id = $1
              AND a.employee_id IS NOT NULL
            "#,
        )
        .bind(organization_id)
        .bind(since)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }
}
