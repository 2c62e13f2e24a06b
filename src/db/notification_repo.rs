// src/db/notification_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access::{Notification, NotificationKind, NotificationViewer};
use crate::services::notification_service::NotificationDraft;

const NOTIFICATION_COLUMNS: &str = "id, organization_id, employee_id, zone_id, kind, title, message, \
     is_read_by_employee, is_read_by_admin, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert<'e, E>(&self, executor: E, draft: &NotificationDraft) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO notifications (organization_id, employee_id, zone_id, kind, title, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(draft.organization_id)
            .bind(draft.employee_id)
            .bind(draft.zone_id)
            .bind(draft.kind)
            .bind(&draft.title)
            .bind(&draft.message)
            .fetch_one(executor)
            .await?;

        Ok(notification)
    }

    /// Momento da última notificação do tipo para o par funcionário/zona desde `since`.
    pub async fn last_notified_since<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        zone_id: Uuid,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let last = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r#"
            SELECT MAX(created_at)
            FROM notifications
            WHERE employee_id = $1 AND zone_id = $2 AND kind = $3 AND created_at >= $4
            "#,
        )
        .bind(employee_id)
        .bind(zone_id)
        .bind(kind)
        .bind(since)
        .fetch_one(executor)
        .await?;

        Ok(last)
    }

    pub async fn list_for_organization<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        employee_id: Option<Uuid>,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR employee_id = $2)
              AND (NOT $3 OR NOT is_read_by_admin)
            ORDER BY created_at DESC
            LIMIT 200
            "#
        );
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(organization_id)
            .bind(employee_id)
            .bind(unread_only)
            .fetch_all(executor)
            .await?;

        Ok(notifications)
    }

    pub async fn mark_read<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        notification_id: Uuid,
        viewer: NotificationViewer,
    ) -> Result<Option<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let column = match viewer {
            NotificationViewer::Employee => "is_read_by_employee",
            NotificationViewer::Admin => "is_read_by_admin",
        };
        let sql = format!(
            r#"
            UPDATE notifications SET {column} = TRUE
            WHERE id = $1 AND organization_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(notification_id)
            .bind(organization_id)
            .fetch_optional(executor)
            .await?;

        Ok(notification)
    }
}
