// src/db/building_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::building::{Building, Door, DoorSide, Floor, Rect, Zone};

const ZONE_COLUMNS: &str =
    "id, building_id, floor_id, title, x, y, width, height, is_transition_between_floors, photo";

const DOOR_COLUMNS: &str =
    "d.id, d.floor_id, d.zone_from_id, d.zone_to_id, d.is_entrance, d.entrance_door_side, d.created_at";

#[derive(Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  PRÉDIOS & ANDARES
    // =========================================================================

    pub async fn create_building<'e, E>(&self, executor: E, organization_id: Uuid, title: &str) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (organization_id, title)
            VALUES ($1, $2)
            RETURNING id, organization_id, title, created_at
            "#,
        )
        .bind(organization_id)
        .bind(title)
        .fetch_one(executor)
        .await?;

        Ok(building)
    }

    pub async fn find_building<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Option<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            "SELECT id, organization_id, title, created_at FROM buildings WHERE id = $1",
        )
        .bind(building_id)
        .fetch_optional(executor)
        .await?;

        Ok(building)
    }

    /// Trava a linha do prédio até o fim da transação.
    /// Toda mutação de geometria passa por aqui antes de ler o snapshot.
    pub async fn lock_building<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Option<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            "SELECT id, organization_id, title, created_at FROM buildings WHERE id = $1 FOR UPDATE",
        )
        .bind(building_id)
        .fetch_optional(executor)
        .await?;

        Ok(building)
    }

    pub async fn next_floor_number<'e, E>(&self, executor: E, building_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(floor_number), 0) + 1 FROM floors WHERE building_id = $1",
        )
        .bind(building_id)
        .fetch_one(executor)
        .await?;

        Ok(next)
    }

    pub async fn create_floor<'e, E>(&self, executor: E, building_id: Uuid, floor_number: i32) -> Result<Floor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Floor>(
            r#"
            INSERT INTO floors (building_id, floor_number)
            VALUES ($1, $2)
            RETURNING id, building_id, floor_number
            "#,
        )
        .bind(building_id)
        .bind(floor_number)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Andar já existe neste prédio"))
    }

    pub async fn find_floor<'e, E>(&self, executor: E, floor_id: Uuid) -> Result<Option<Floor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floor = sqlx::query_as::<_, Floor>("SELECT id, building_id, floor_number FROM floors WHERE id = $1")
            .bind(floor_id)
            .fetch_optional(executor)
            .await?;

        Ok(floor)
    }

    pub async fn list_floors<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<Floor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floors = sqlx::query_as::<_, Floor>(
            "SELECT id, building_id, floor_number FROM floors WHERE building_id = $1 ORDER BY floor_number",
        )
        .bind(building_id)
        .fetch_all(executor)
        .await?;

        Ok(floors)
    }

    // =========================================================================
    //  ZONAS
    // =========================================================================

    pub async fn list_zones<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<Zone>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ZONE_COLUMNS} FROM zones WHERE building_id = $1 ORDER BY id");
        let zones = sqlx::query_as::<_, Zone>(&sql)
            .bind(building_id)
            .fetch_all(executor)
            .await?;

        Ok(zones)
    }

    pub async fn find_zone<'e, E>(&self, executor: E, zone_id: Uuid) -> Result<Option<Zone>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ZONE_COLUMNS} FROM zones WHERE id = $1");
        let zone = sqlx::query_as::<_, Zone>(&sql)
            .bind(zone_id)
            .fetch_optional(executor)
            .await?;

        Ok(zone)
    }

    pub async fn insert_zone<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        floor_id: Option<Uuid>,
        title: &str,
        rect: Rect,
        is_transition: bool,
    ) -> Result<Zone, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO zones (building_id, floor_id, title, x, y, width, height, is_transition_between_floors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ZONE_COLUMNS}
            "#
        );
        let zone = sqlx::query_as::<_, Zone>(&sql)
            .bind(building_id)
            .bind(floor_id)
            .bind(title)
            .bind(rect.x)
            .bind(rect.y)
            .bind(rect.width)
            .bind(rect.height)
            .bind(is_transition)
            .fetch_one(executor)
            .await?;

        Ok(zone)
    }

    pub async fn update_zone_rect<'e, E>(&self, executor: E, zone_id: Uuid, rect: Rect) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE zones SET x = $2, y = $3, width = $4, height = $5 WHERE id = $1")
            .bind(zone_id)
            .bind(rect.x)
            .bind(rect.y)
            .bind(rect.width)
            .bind(rect.height)
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  PORTAS
    // =========================================================================

    pub async fn list_doors<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<Door>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {DOOR_COLUMNS}
            FROM doors d
            JOIN floors f ON f.id = d.floor_id
            WHERE f.building_id = $1
            ORDER BY d.created_at, d.id
            "#
        );
        let doors = sqlx::query_as::<_, Door>(&sql)
            .bind(building_id)
            .fetch_all(executor)
            .await?;

        Ok(doors)
    }

    pub async fn find_door<'e, E>(&self, executor: E, door_id: Uuid) -> Result<Option<Door>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DOOR_COLUMNS} FROM doors d WHERE d.id = $1");
        let door = sqlx::query_as::<_, Door>(&sql)
            .bind(door_id)
            .fetch_optional(executor)
            .await?;

        Ok(door)
    }

    /// Prédio e organização a que uma porta pertence (via andar).
    pub async fn door_owner<'e, E>(&self, executor: E, door_id: Uuid) -> Result<Option<(Uuid, Uuid)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owner = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT b.id, b.organization_id
            FROM doors d
            JOIN floors f ON f.id = d.floor_id
            JOIN buildings b ON b.id = f.building_id
            WHERE d.id = $1
            "#,
        )
        .bind(door_id)
        .fetch_optional(executor)
        .await?;

        Ok(owner)
    }

    pub async fn insert_door<'e, E>(
        &self,
        executor: E,
        floor_id: Uuid,
        zone_from_id: Option<Uuid>,
        zone_to_id: Uuid,
        entrance_door_side: Option<DoorSide>,
    ) -> Result<Door, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let door = sqlx::query_as::<_, Door>(
            r#"
            INSERT INTO doors (floor_id, zone_from_id, zone_to_id, is_entrance, entrance_door_side)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, floor_id, zone_from_id, zone_to_id, is_entrance, entrance_door_side, created_at
            "#,
        )
        .bind(floor_id)
        .bind(zone_from_id)
        .bind(zone_to_id)
        .bind(zone_from_id.is_none())
        .bind(entrance_door_side)
        .fetch_one(executor)
        .await?;

        Ok(door)
    }

    pub async fn delete_door<'e, E>(&self, executor: E, door_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM doors WHERE id = $1")
            .bind(door_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
