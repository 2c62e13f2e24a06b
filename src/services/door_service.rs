// src/services/door_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BuildingRepository,
    models::building::{BuildingLayout, DoorSide, Zone},
    services::{
        zone_graph::ZoneGraph,
        zone_service::ZoneService,
        zone_validator::{require_entrance_door_space, require_regular_door_space},
    },
};

#[derive(Clone)]
pub struct DoorService {
    pool: PgPool,
    repo: BuildingRepository,
    zone_service: ZoneService,
}

fn find_zone<'a>(graph: &'a ZoneGraph, zone_id: Uuid) -> Result<&'a Zone, AppError> {
    graph
        .zone(zone_id)
        .ok_or_else(|| AppError::NotFound(format!("Zona {}", zone_id)))
}

impl DoorService {
    pub fn new(pool: PgPool, repo: BuildingRepository, zone_service: ZoneService) -> Self {
        Self { pool, repo, zone_service }
    }

    async fn require_floor(&self, conn: &mut sqlx::PgConnection, building_id: Uuid, floor_id: Uuid) -> Result<(), AppError> {
        self.repo
            .find_floor(conn, floor_id)
            .await?
            .filter(|f| f.building_id == building_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Andar {}", floor_id)))
    }

    pub async fn create_entrance_door(
        &self,
        building_id: Uuid,
        zone_id: Uuid,
        floor_id: Uuid,
        side: DoorSide,
    ) -> Result<BuildingLayout, AppError> {
        let mut tx = self.pool.begin().await?;
        let building = self.zone_service.lock(&mut tx, building_id).await?;
        self.require_floor(&mut tx, building_id, floor_id).await?;

        let graph = self.zone_service.load_graph(&mut tx, building_id).await?;
        let zone = find_zone(&graph, zone_id)?;

        if !zone.visible_from_floor(floor_id) {
            return Err(AppError::NotFound(format!("Zona {} no andar {}", zone_id, floor_id)));
        }

        let existing = graph
            .entrance_doors()
            .filter(|d| d.zone_to_id == zone_id && d.entrance_door_side == Some(side))
            .count();
        let others: Vec<_> = graph
            .zones
            .iter()
            .filter(|z| z.id != zone_id && z.visible_from_floor(floor_id))
            .map(|z| z.rect)
            .collect();

        require_entrance_door_space(zone_id, &zone.rect, side, &others, existing)?;

        let door = self.repo.insert_door(&mut *tx, floor_id, None, zone_id, Some(side)).await?;
        let layout = self.zone_service.load_layout(&mut tx, building).await?;
        tx.commit().await?;

        tracing::info!("🚪 Porta de entrada {} criada na zona {}", door.id, zone_id);
        Ok(layout)
    }

    pub async fn create_regular_door(
        &self,
        building_id: Uuid,
        zone_from_id: Uuid,
        zone_to_id: Uuid,
        floor_id: Uuid,
    ) -> Result<BuildingLayout, AppError> {
        if zone_from_id == zone_to_id {
            return Err(AppError::InvariantViolation("Uma porta precisa ligar duas zonas diferentes".into()));
        }

        let mut tx = self.pool.begin().await?;
        let building = self.zone_service.lock(&mut tx, building_id).await?;
        self.require_floor(&mut tx, building_id, floor_id).await?;

        // O snapshot só contém zonas deste prédio: zona de outro prédio vira NotFound
        let graph = self.zone_service.load_graph(&mut tx, building_id).await?;
        let from = find_zone(&graph, zone_from_id)?;
        let to = find_zone(&graph, zone_to_id)?;

        for zone in [from, to] {
            if !zone.visible_from_floor(floor_id) {
                return Err(AppError::NotFound(format!("Zona {} no andar {}", zone.id, floor_id)));
            }
        }

        let existing = graph.doors_between(zone_from_id, zone_to_id);
        require_regular_door_space((from.id, &from.rect), (to.id, &to.rect), existing)?;

        let door = self
            .repo
            .insert_door(&mut *tx, floor_id, Some(zone_from_id), zone_to_id, None)
            .await?;
        let layout = self.zone_service.load_layout(&mut tx, building).await?;
        tx.commit().await?;

        tracing::info!("🚪 Porta {} criada entre {} e {}", door.id, zone_from_id, zone_to_id);
        Ok(layout)
    }

    /// Remove uma porta, preservando a última entrada do prédio e a última porta de cada par.
    pub async fn delete_door(&self, building_id: Uuid, door_id: Uuid) -> Result<BuildingLayout, AppError> {
        let mut tx = self.pool.begin().await?;
        let building = self.zone_service.lock(&mut tx, building_id).await?;

        let graph = self.zone_service.load_graph(&mut tx, building_id).await?;
        let door = graph
            .doors
            .iter()
            .find(|d| d.id == door_id)
            .ok_or_else(|| AppError::NotFound(format!("Porta {}", door_id)))?;

        match door.zone_pair() {
            None if graph.entrance_doors().count() <= 1 => {
                return Err(AppError::InvariantViolation(
                    "Não é possível remover a última porta de entrada do prédio".into(),
                ));
            }
            Some((from, to)) if graph.doors_between(from, to) <= 1 => {
                return Err(AppError::InvariantViolation(format!(
                    "Não é possível remover a última porta entre as zonas {} e {}",
                    from, to
                )));
            }
            _ => {}
        }

        self.repo.delete_door(&mut *tx, door_id).await?;
        let layout = self.zone_service.load_layout(&mut tx, building).await?;
        tx.commit().await?;

        Ok(layout)
    }
}
