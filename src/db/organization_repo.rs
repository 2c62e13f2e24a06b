// src/db/organization_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::building::Organization;

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find<'e, E>(&self, executor: E, organization_id: Uuid) -> Result<Option<Organization>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;

        Ok(org)
    }

    /// Verificação de autorização usada por todas as rotas administrativas.
    /// Organização inexistente => NotFound; outro dono => AccessDenied.
    pub async fn validate_owner(&self, user_id: Uuid, organization_id: Uuid) -> Result<Organization, AppError> {
        let org = self
            .find(&self.pool, organization_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organização {}", organization_id)))?;

        if org.owner_id != user_id {
            tracing::warn!("Usuário {} tentou acessar a organização {}", user_id, organization_id);
            return Err(AppError::AccessDenied);
        }

        Ok(org)
    }

    /// Mesma verificação para rotas que recebem só o prédio.
    pub async fn validate_building_owner(&self, user_id: Uuid, building_id: Uuid) -> Result<Organization, AppError> {
        let org_id = sqlx::query_scalar::<_, Uuid>("SELECT organization_id FROM buildings WHERE id = $1")
            .bind(building_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prédio {}", building_id)))?;

        self.validate_owner(user_id, org_id).await
    }
}
