// src/services/zone_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BuildingRepository,
    models::building::{Building, BuildingLayout, DoorSide, Floor, Rect, Zone, ZoneGeometryUpdate},
    services::{
        zone_geometry::plan_geometry_change,
        zone_graph::ZoneGraph,
        zone_validator::{require_connects_to_scope, require_dimensions, require_entrance_door_space, require_no_overlap},
    },
};

pub const DEFAULT_FIRST_ZONE: Rect = Rect::new(0, 0, 10, 10);
pub const DEFAULT_FIRST_ZONE_TITLE: &str = "Main hall";

/// Pedido de criação de zona já validado pelo handler.
#[derive(Debug, Clone)]
pub struct NewZone {
    pub floor_id: Option<Uuid>,
    pub title: String,
    pub rect: Rect,
    pub is_transition: bool,
}

#[derive(Clone)]
pub struct ZoneService {
    pool: PgPool,
    repo: BuildingRepository,
}

impl ZoneService {
    pub fn new(pool: PgPool, repo: BuildingRepository) -> Self {
        Self { pool, repo }
    }

    /// Carrega o snapshot do prédio dentro da transação (zonas + portas).
    pub async fn load_graph(&self, conn: &mut PgConnection, building_id: Uuid) -> Result<ZoneGraph, AppError> {
        let zones = self.repo.list_zones(&mut *conn, building_id).await?;
        let doors = self.repo.list_doors(&mut *conn, building_id).await?;
        Ok(ZoneGraph::new(zones, doors))
    }

    pub async fn load_layout(&self, conn: &mut PgConnection, building: Building) -> Result<BuildingLayout, AppError> {
        let floors = self.repo.list_floors(&mut *conn, building.id).await?;
        let graph = self.load_graph(conn, building.id).await?;
        Ok(BuildingLayout {
            building,
            floors,
            zones: graph.zones,
            doors: graph.doors,
        })
    }

    /// Trava o prédio; falha com NotFound se não existir.
    pub async fn lock(&self, conn: &mut PgConnection, building_id: Uuid) -> Result<Building, AppError> {
        self.repo
            .lock_building(conn, building_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prédio {}", building_id)))
    }

    // --- PRÉDIOS ---

    /// Cria o prédio já utilizável: andar 1, uma primeira zona e uma porta de entrada.
    pub async fn create_building(
        &self,
        organization_id: Uuid,
        title: &str,
        first_zone: Option<Rect>,
        entrance_side: Option<DoorSide>,
    ) -> Result<BuildingLayout, AppError> {
        let rect = first_zone.unwrap_or(DEFAULT_FIRST_ZONE);
        let side = entrance_side.unwrap_or(DoorSide::Bottom);
        require_dimensions(&rect)?;

        let mut tx = self.pool.begin().await?;

        let building = self.repo.create_building(&mut *tx, organization_id, title).await?;
        let floor = self.repo.create_floor(&mut *tx, building.id, 1).await?;
        let zone = self
            .repo
            .insert_zone(&mut *tx, building.id, Some(floor.id), DEFAULT_FIRST_ZONE_TITLE, rect, false)
            .await?;

        require_entrance_door_space(zone.id, &zone.rect, side, &[], 0)?;
        self.repo.insert_door(&mut *tx, floor.id, None, zone.id, Some(side)).await?;

        let layout = self.load_layout(&mut tx, building).await?;
        tx.commit().await?;

        tracing::info!("🏢 Prédio {} criado para a organização {}", layout.building.id, organization_id);
        Ok(layout)
    }

    pub async fn create_floor(&self, building_id: Uuid) -> Result<Floor, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock(&mut tx, building_id).await?;

        let number = self.repo.next_floor_number(&mut *tx, building_id).await?;
        let floor = self.repo.create_floor(&mut *tx, building_id, number).await?;

        tx.commit().await?;
        Ok(floor)
    }

    // --- ZONAS ---

    pub async fn create_zone(&self, building_id: Uuid, new_zone: NewZone) -> Result<Zone, AppError> {
        require_dimensions(&new_zone.rect)?;

        let mut tx = self.pool.begin().await?;
        self.lock(&mut tx, building_id).await?;

        let floor_id = match (new_zone.is_transition, new_zone.floor_id) {
            (true, _) => None,
            (false, Some(floor_id)) => {
                let floor = self
                    .repo
                    .find_floor(&mut *tx, floor_id)
                    .await?
                    .filter(|f| f.building_id == building_id)
                    .ok_or_else(|| AppError::NotFound(format!("Andar {}", floor_id)))?;
                Some(floor.id)
            }
            (false, None) => {
                return Err(AppError::NotFound("Andar não informado para zona comum".into()));
            }
        };

        let graph = self.load_graph(&mut tx, building_id).await?;
        // Zona de transição enxerga o prédio inteiro; zona comum enxerga o próprio andar + transições
        let scope = graph.zones_in_scope(floor_id, true);

        require_connects_to_scope(&new_zone.rect, &scope, graph.zones.is_empty())?;
        require_no_overlap(None, &new_zone.rect, &scope)?;

        let zone = self
            .repo
            .insert_zone(&mut *tx, building_id, floor_id, &new_zone.title, new_zone.rect, new_zone.is_transition)
            .await?;

        tx.commit().await?;
        Ok(zone)
    }

    /// Zonas do prédio, filtradas por andar quando informado.
    pub async fn list_zones(&self, building_id: Uuid, floor_id: Option<Uuid>, include_transitions: bool) -> Result<Vec<Zone>, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.repo
            .find_building(&mut *conn, building_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prédio {}", building_id)))?;

        let graph = self.load_graph(&mut conn, building_id).await?;
        Ok(graph
            .zones_in_scope(floor_id, include_transitions)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Redimensiona/move uma zona, propagando para as zonas conectadas por portas.
    /// Tudo ou nada: qualquer violação aborta a transação antes de gravar.
    pub async fn update_geometry(
        &self,
        building_id: Uuid,
        zone_id: Uuid,
        update: &ZoneGeometryUpdate,
    ) -> Result<BuildingLayout, AppError> {
        let mut tx = self.pool.begin().await?;
        let building = self.lock(&mut tx, building_id).await?;

        let graph = self.load_graph(&mut tx, building_id).await?;
        let plan = plan_geometry_change(&graph, zone_id, update)?;

        for id in &plan.changed {
            if let Some(rect) = plan.coordinates.get(id) {
                self.repo.update_zone_rect(&mut *tx, *id, *rect).await?;
            }
        }

        let layout = self.load_layout(&mut tx, building).await?;
        tx.commit().await?;

        tracing::info!(
            "📐 Geometria da zona {} atualizada ({} zonas movidas)",
            zone_id,
            plan.changed.len()
        );
        Ok(layout)
    }
}
